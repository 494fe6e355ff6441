//! Manages the lifecycle of all spawned tasks in the application.
use futures::future::join_all;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

type NamedHandle = (String, JoinHandle<()>);

/// A centralized manager for all spawned tasks.
///
/// This struct is responsible for:
/// - Spawning tasks and keeping track of their `JoinHandle`s.
/// - Stopping them, either by awaiting them after the shutdown signal or by
///   aborting them when the process has to stop right away.
#[derive(Clone, Debug)]
pub struct TaskManager {
    handles: Arc<Mutex<Vec<NamedHandle>>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl TaskManager {
    /// Creates a new `TaskManager`.
    pub fn new(shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            handles: Arc::new(Mutex::new(Vec::new())),
            shutdown_rx,
        }
    }

    fn take_handles(&self) -> Vec<NamedHandle> {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    /// Spawns a new task and adds its handle to the manager.
    pub fn spawn<F>(&self, name: impl Into<String>, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        debug!(task_name = %name, "Spawning task");
        let handle = tokio::spawn(future);
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((name, handle));
    }

    /// Returns a clone of the shutdown receiver.
    pub fn get_shutdown_rx(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// Number of tasks currently tracked.
    pub fn task_count(&self) -> usize {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Waits for all managed tasks to complete.
    pub async fn shutdown(self) {
        let handles = self.take_handles();
        info!(
            "TaskManager shutting down. Waiting for {} tasks to complete...",
            handles.len()
        );

        let (task_names, handles): (Vec<String>, Vec<JoinHandle<()>>) =
            handles.into_iter().unzip();
        debug!(tasks = ?task_names, "Awaiting all tasks.");

        let results = join_all(handles).await;

        let mut panics = 0;
        for (task_name, result) in task_names.iter().zip(results) {
            match result {
                Ok(()) => debug!(task_name = %task_name, "Task shut down gracefully."),
                Err(e) => {
                    error!(task_name = %task_name, error = %e, "Task panicked during shutdown.");
                    panics += 1;
                }
            }
        }

        if panics > 0 {
            error!("{} tasks panicked during shutdown", panics);
        } else {
            info!("All tasks shut down gracefully.");
        }
    }

    /// Aborts every managed task without waiting for the shutdown signal.
    pub async fn abort_all(self) {
        let handles = self.take_handles();
        info!("TaskManager aborting {} tasks.", handles.len());
        for (_, handle) in &handles {
            handle.abort();
        }
        // Cancelled tasks resolve with a `JoinError` that is expected here.
        join_all(handles.into_iter().map(|(_, handle)| handle)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_waits_for_tasks() {
        let (tx, rx) = watch::channel(false);
        let manager = TaskManager::new(rx);
        let finished = Arc::new(std::sync::atomic::AtomicBool::new(false));

        let mut shutdown_rx = manager.get_shutdown_rx();
        let flag = finished.clone();
        manager.spawn("worker", async move {
            let _ = shutdown_rx.changed().await;
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
        });
        assert_eq!(manager.task_count(), 1);

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), manager.shutdown())
            .await
            .unwrap();
        assert!(finished.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_abort_all_stops_tasks_that_ignore_shutdown() {
        let (_tx, rx) = watch::channel(false);
        let manager = TaskManager::new(rx);
        manager.spawn("sleeper", async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });

        tokio::time::timeout(Duration::from_secs(1), manager.abort_all())
            .await
            .unwrap();
    }
}
