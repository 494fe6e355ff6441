use super::{parse_u64, read_source, SampleError, SensorError};
use crate::core::{Reading, Sensor};
use async_trait::async_trait;
use std::path::PathBuf;

const NET_DEV_PATH: &str = "/proc/net/dev";
const ORIGIN: &str = "/proc/net/dev";

// Column offsets after the "iface:" label.
const RX_BYTES: usize = 0;
const TX_BYTES: usize = 8;

/// Byte counters for one network interface, passed through as reported.
#[derive(Debug, Clone)]
pub struct NetworkSensor {
    interface: String,
    source: PathBuf,
}

impl NetworkSensor {
    pub fn new(interface: impl Into<String>) -> Self {
        Self::with_source(interface, NET_DEV_PATH)
    }

    pub fn with_source(interface: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            interface: interface.into(),
            source: source.into(),
        }
    }
}

/// Finds `interface` in `/proc/net/dev` content and returns its `tx` and `rx`
/// byte counters.
pub fn parse_net_dev(content: &str, interface: &str) -> Result<Vec<Reading>, SensorError> {
    // Header lines carry no ':' and are skipped by the split. The label may be
    // glued to the first counter ("eth0:123"), so split on ':' rather than on
    // whitespace.
    for (label, counters) in content.lines().filter_map(|line| line.split_once(':')) {
        if label.trim() != interface {
            continue;
        }
        let fields: Vec<&str> = counters.split_whitespace().collect();
        if fields.len() <= TX_BYTES {
            return Err(SensorError::format(
                ORIGIN,
                format!("interface {interface} has {} counters", fields.len()),
            ));
        }
        let rx = fields[RX_BYTES];
        let tx = fields[TX_BYTES];
        parse_u64(ORIGIN, rx)?;
        parse_u64(ORIGIN, tx)?;
        return Ok(vec![
            Reading::new(format!("{interface} tx"), tx),
            Reading::new(format!("{interface} rx"), rx),
        ]);
    }

    Err(SensorError::NotFound {
        kind: "network interface",
        name: interface.to_string(),
    })
}

#[async_trait]
impl Sensor for NetworkSensor {
    fn name(&self) -> &str {
        "network"
    }

    async fn sample(&self) -> Result<Vec<Reading>, SampleError> {
        let content = read_source(&self.source).await?;
        Ok(parse_net_dev(&content, &self.interface)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NET_DEV: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo:  123456     100    0    0    0     0          0         0   123456     100    0    0    0     0       0          0
  eth0: 9876543    5000    0    0    0     0          0        10  1234567    4000    0    0    0     0       0          0
";

    #[test]
    fn test_parse_net_dev() {
        let readings = parse_net_dev(NET_DEV, "eth0").unwrap();
        assert_eq!(
            readings,
            vec![
                Reading::new("eth0 tx", "1234567"),
                Reading::new("eth0 rx", "9876543"),
            ]
        );
    }

    #[test]
    fn test_parse_net_dev_label_glued_to_counter() {
        let content = "wlan0:42 1 0 0 0 0 0 0 84 2 0 0 0 0 0 0\n";
        let readings = parse_net_dev(content, "wlan0").unwrap();
        assert_eq!(readings[0], Reading::new("wlan0 tx", "84"));
        assert_eq!(readings[1], Reading::new("wlan0 rx", "42"));
    }

    #[test]
    fn test_parse_net_dev_missing_interface() {
        let err = parse_net_dev(NET_DEV, "eth1").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "network interface eth1 not found");
    }

    #[test]
    fn test_parse_net_dev_truncated_line() {
        let err = parse_net_dev("eth0: 1 2 3\n", "eth0").unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_parse_net_dev_prefix_is_not_a_match() {
        let content = "eth00: 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16\n";
        assert!(parse_net_dev(content, "eth0").unwrap_err().is_not_found());
    }
}
