//! Configuration types for survey runs

use super::range::RangeSpec;
use crate::config::timing;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default reply log file name
pub const DEFAULT_LOG_PATH: &str = "autoping.log";

/// Configuration for a survey run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    /// Ranges to probe, in the order they were listed
    pub ranges: Vec<RangeSpec>,
    /// File the listener appends reply records to
    pub log_path: PathBuf,
    /// How long to keep listening after the last request (default: 10s)
    pub settle_time: Duration,
    /// Sleep between listener polls that found nothing (default: 1ms)
    pub poll_interval: Duration,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            ranges: Vec::new(),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            settle_time: timing::settle_time(),
            poll_interval: timing::listener_poll_interval(),
        }
    }
}

impl SurveyConfig {
    /// Create a new SurveyConfig builder
    pub fn builder() -> SurveyConfigBuilder {
        SurveyConfigBuilder::new()
    }

    /// Total number of addresses covered by valid ranges
    pub fn address_count(&self) -> u64 {
        self.ranges.iter().map(RangeSpec::len).sum()
    }

    /// Validate the configuration
    ///
    /// Range ordering (end before start) is checked when the ranges are
    /// built, so that error keeps its own variant.
    pub fn validate(&self) -> Result<(), String> {
        if self.ranges.is_empty() {
            return Err("At least one range must be specified".to_string());
        }
        if self.log_path.as_os_str().is_empty() {
            return Err("log_path must not be empty".to_string());
        }
        if self.poll_interval.is_zero() {
            return Err("poll_interval must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Builder for SurveyConfig
pub struct SurveyConfigBuilder {
    config: SurveyConfig,
}

impl SurveyConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: SurveyConfig::default(),
        }
    }

    /// Add one range
    pub fn range(mut self, spec: RangeSpec) -> Self {
        self.config.ranges.push(spec);
        self
    }

    /// Add several ranges
    pub fn ranges(mut self, specs: impl IntoIterator<Item = RangeSpec>) -> Self {
        self.config.ranges.extend(specs);
        self
    }

    /// Set the reply log path
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_path = path.into();
        self
    }

    /// Set the settle time
    pub fn settle_time(mut self, settle: Duration) -> Self {
        self.config.settle_time = settle;
        self
    }

    /// Set the listener poll interval
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<SurveyConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for SurveyConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn spec(a: [u8; 4], b: [u8; 4]) -> RangeSpec {
        RangeSpec::new(Ipv4Addr::from(a), Ipv4Addr::from(b))
    }

    #[test]
    fn test_builder() {
        let config = SurveyConfig::builder()
            .range(spec([10, 0, 0, 1], [10, 0, 0, 3]))
            .ranges([spec([10, 0, 1, 0], [10, 0, 1, 9])])
            .log_path("/tmp/replies.log")
            .settle_time(Duration::from_secs(2))
            .poll_interval(Duration::from_millis(5))
            .build()
            .unwrap();

        assert_eq!(config.ranges.len(), 2);
        assert_eq!(config.address_count(), 13);
        assert_eq!(config.log_path, PathBuf::from("/tmp/replies.log"));
        assert_eq!(config.settle_time, Duration::from_secs(2));
        assert_eq!(config.poll_interval, Duration::from_millis(5));
    }

    #[test]
    fn test_validation() {
        assert!(SurveyConfig::builder().build().is_err());

        let result = SurveyConfig::builder()
            .range(spec([10, 0, 0, 1], [10, 0, 0, 1]))
            .log_path("")
            .build();
        assert!(result.is_err());

        let result = SurveyConfig::builder()
            .range(spec([10, 0, 0, 1], [10, 0, 0, 1]))
            .poll_interval(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_reversed_range_passes_builder() {
        // Reported as InvalidRange when the survey builds its ranges
        let config = SurveyConfig::builder()
            .range(spec([10, 0, 0, 9], [10, 0, 0, 1]))
            .build()
            .unwrap();
        assert_eq!(config.address_count(), 0);
    }

    #[test]
    fn test_serializes() {
        let config = SurveyConfig::builder()
            .range(spec([192, 0, 2, 0], [192, 0, 2, 255]))
            .build()
            .unwrap();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["ranges"][0]["end"], "192.0.2.255");

        // Only settings the survey acts on are persisted
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, ["log_path", "poll_interval", "ranges", "settle_time"]);
    }
}
