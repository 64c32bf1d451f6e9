//! Global timing configuration with compile-time defaults and runtime overrides
//!
//! Default values are defined as compile-time constants, but can be overridden
//! once at program startup via CLI arguments or the library API.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Compile-time defaults as public constants
/// Default sleep between listener polls that found nothing, in milliseconds
pub const DEFAULT_LISTENER_POLL_INTERVAL_MS: u64 = 1;
/// Default time to keep listening after the last request, in milliseconds
pub const DEFAULT_SETTLE_TIME_MS: u64 = 10_000;
/// Default size of the listener's receive buffer in bytes
pub const DEFAULT_RECV_BUFFER_BYTES: usize = 1024;

/// Timing values that can be overridden at runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Sleep between listener polls that found nothing
    pub listener_poll_interval: Duration,
    /// Time to keep listening after the sender finishes
    pub settle_time: Duration,
    /// Listener receive buffer size
    pub recv_buffer_bytes: usize,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            listener_poll_interval: Duration::from_millis(DEFAULT_LISTENER_POLL_INTERVAL_MS),
            settle_time: Duration::from_millis(DEFAULT_SETTLE_TIME_MS),
            recv_buffer_bytes: DEFAULT_RECV_BUFFER_BYTES,
        }
    }
}

// Runtime override storage - set once at program startup
static OVERRIDE_CONFIG: OnceCell<TimingConfig> = OnceCell::new();

/// Get the listener idle poll interval
pub fn listener_poll_interval() -> Duration {
    OVERRIDE_CONFIG
        .get()
        .map(|c| c.listener_poll_interval)
        .unwrap_or_else(|| Duration::from_millis(DEFAULT_LISTENER_POLL_INTERVAL_MS))
}

/// Get the post-send settle time
pub fn settle_time() -> Duration {
    OVERRIDE_CONFIG
        .get()
        .map(|c| c.settle_time)
        .unwrap_or_else(|| Duration::from_millis(DEFAULT_SETTLE_TIME_MS))
}

/// Get the listener receive buffer size
pub fn recv_buffer_bytes() -> usize {
    OVERRIDE_CONFIG
        .get()
        .map(|c| c.recv_buffer_bytes)
        .unwrap_or(DEFAULT_RECV_BUFFER_BYTES)
}

/// Set the global timing configuration
///
/// This should be called once at program startup if custom timing is needed.
/// Returns the rejected configuration if one has already been set.
pub fn set_config(config: TimingConfig) -> Result<(), TimingConfig> {
    OVERRIDE_CONFIG.set(config)
}

/// Check if custom timing configuration has been set
pub fn is_custom_config_set() -> bool {
    OVERRIDE_CONFIG.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_default_values() {
        // If no custom config is set, these should use defaults
        if !is_custom_config_set() {
            assert_eq!(
                listener_poll_interval(),
                Duration::from_millis(DEFAULT_LISTENER_POLL_INTERVAL_MS)
            );
            assert_eq!(settle_time(), Duration::from_millis(DEFAULT_SETTLE_TIME_MS));
            assert_eq!(recv_buffer_bytes(), DEFAULT_RECV_BUFFER_BYTES);
        } else {
            assert!(recv_buffer_bytes() > 0);
        }
    }

    #[test]
    #[serial]
    fn test_custom_config_detection() {
        // OnceCell is global and persists across tests, so the set may lose
        // to an earlier one; either way a config is in place afterwards.
        let config = TimingConfig {
            listener_poll_interval: Duration::from_millis(2),
            settle_time: Duration::from_millis(500),
            recv_buffer_bytes: 2048,
        };
        let _ = set_config(config);
        assert!(is_custom_config_set());
        assert!(recv_buffer_bytes() >= DEFAULT_RECV_BUFFER_BYTES);
    }

    #[test]
    fn test_defaults_are_reasonable() {
        let defaults = TimingConfig::default();
        assert!(defaults.listener_poll_interval <= Duration::from_millis(100));
        assert_eq!(defaults.settle_time, Duration::from_secs(10));
        // Large enough for an IP header plus our full echo request
        assert!(defaults.recv_buffer_bytes >= 20 + crate::packet::ECHO_PACKET_LEN);
    }
}
