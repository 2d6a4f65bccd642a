//! Installer configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::transport::ApplyTime;

/// Minimum time a caller must have left before an upload may start
///
/// Image uploads to a BMC routinely take several minutes; starting one with
/// less time than this risks cutting the transfer short mid-flash.
pub const MIN_UPLOAD_BUDGET: Duration = Duration::from_secs(10 * 60);

/// Default interval between status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Tunables for [`FirmwareInstaller`](crate::installer::FirmwareInstaller)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    /// Budget required before an upload starts
    #[serde(with = "duration_secs")]
    pub min_upload_budget: Duration,

    /// Apply time to request instead of the provider default
    pub apply_time: Option<ApplyTime>,

    /// Explicit update targets; empty lets the device choose
    pub targets: Vec<String>,

    /// Interval between polls while waiting for completion
    #[serde(with = "duration_secs")]
    pub poll_interval: Duration,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            min_upload_budget: MIN_UPLOAD_BUDGET,
            apply_time: None,
            targets: Vec::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl InstallerConfig {
    /// Override the minimum upload budget
    pub fn with_min_upload_budget(mut self, budget: Duration) -> Self {
        self.min_upload_budget = budget;
        self
    }

    /// Request a specific apply time
    pub fn with_apply_time(mut self, apply_time: ApplyTime) -> Self {
        self.apply_time = Some(apply_time);
        self
    }

    /// Restrict the update to explicit targets
    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.targets = targets;
        self
    }

    /// Change the polling interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_budget_is_ten_minutes() {
        let config = InstallerConfig::default();
        assert_eq!(config.min_upload_budget, Duration::from_secs(600));
        assert_eq!(config.apply_time, None);
        assert!(config.targets.is_empty());
    }

    #[test]
    fn test_partial_config_fills_defaults() -> Result<(), serde_json::Error> {
        let config: InstallerConfig =
            serde_json::from_str(r#"{"apply_time": "Immediate", "poll_interval": 2}"#)?;
        assert_eq!(config.apply_time, Some(ApplyTime::Immediate));
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.min_upload_budget, MIN_UPLOAD_BUDGET);
        Ok(())
    }
}
