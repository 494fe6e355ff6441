#![allow(dead_code)]
use async_trait::async_trait;
use hostpulse::core::{Output, Snapshot};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;
use tokio::sync::Notify;

/// A mock Output that keeps every line it receives.
#[derive(Clone, Debug, Default)]
pub struct CapturingOutput {
    pub lines: Arc<Mutex<Vec<String>>>,
    pub notifier: Arc<Notify>,
}

impl CapturingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.lines()
            .iter()
            .map(|line| serde_json::from_str(line).expect("line is not a snapshot"))
            .collect()
    }

    pub async fn wait_for_lines(&self, target: usize, timeout_duration: Duration) {
        let wait_future = async {
            loop {
                let notified = self.notifier.notified();
                if self.lines.lock().unwrap().len() >= target {
                    break;
                }
                notified.await;
            }
        };

        tokio::time::timeout(timeout_duration, wait_future)
            .await
            .expect("Timed out waiting for snapshots");
    }
}

#[async_trait]
impl Output for CapturingOutput {
    fn name(&self) -> &str {
        "capturing_mock"
    }

    async fn write_line(&self, line: &str) -> anyhow::Result<()> {
        self.lines.lock().unwrap().push(line.to_string());
        self.notifier.notify_waiters();
        Ok(())
    }
}

/// A mock Output that always fails and counts its attempts.
#[derive(Clone, Debug, Default)]
pub struct FailingOutput {
    pub attempts: Arc<AtomicUsize>,
}

#[async_trait]
impl Output for FailingOutput {
    fn name(&self) -> &str {
        "failing_mock"
    }

    async fn write_line(&self, _line: &str) -> anyhow::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("sink is closed")
    }
}
