//! Network load lookup for the time-of-day multiplier.

use std::fmt;
use std::str::FromStr;

use chrono::{Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Current network load class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkLoad {
    /// Congested network, prices go up.
    High,
    /// Normal conditions.
    #[default]
    Medium,
    /// Quiet network, prices go down.
    Low,
}

impl NetworkLoad {
    /// Price multiplier for this load.
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::High => 1.2,
            Self::Medium => 1.0,
            Self::Low => 0.8,
        }
    }

    /// Get the load name as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for NetworkLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkLoad {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown network load: {other}")),
        }
    }
}

/// The network status collaborator could not answer.
#[derive(Debug, Clone, thiserror::Error)]
#[error("network status unavailable: {0}")]
pub struct NetworkStatusError(pub String);

/// Source of the current network load.
pub trait NetworkStatusProvider: Send + Sync {
    /// Current load class.
    ///
    /// # Errors
    ///
    /// Returns an error if the status cannot be determined.
    fn current(&self) -> Result<NetworkLoad, NetworkStatusError>;
}

/// Current load, defaulting to [`NetworkLoad::Medium`] when the provider fails.
pub fn current_load(provider: &dyn NetworkStatusProvider) -> NetworkLoad {
    provider.current().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Network status unavailable, assuming medium load");
        NetworkLoad::Medium
    })
}

/// A provider that always reports the same load.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticNetworkStatus(pub NetworkLoad);

impl NetworkStatusProvider for StaticNetworkStatus {
    fn current(&self) -> Result<NetworkLoad, NetworkStatusError> {
        Ok(self.0)
    }
}

/// Classifies load by the current UTC hour.
///
/// Hours in `peak_hours` are high load, hours in `off_peak_hours` are low
/// load, everything else is medium. Prices computed with this provider
/// depend on the wall clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyNetworkStatus {
    /// UTC hours (0-23) classified as high load.
    pub peak_hours: Vec<u32>,
    /// UTC hours (0-23) classified as low load.
    pub off_peak_hours: Vec<u32>,
}

impl Default for HourlyNetworkStatus {
    fn default() -> Self {
        Self {
            peak_hours: (12..=20).collect(),
            off_peak_hours: (0..=5).collect(),
        }
    }
}

impl HourlyNetworkStatus {
    /// Load class for a given UTC hour.
    #[must_use]
    pub fn load_at(&self, hour: u32) -> NetworkLoad {
        if self.peak_hours.contains(&hour) {
            NetworkLoad::High
        } else if self.off_peak_hours.contains(&hour) {
            NetworkLoad::Low
        } else {
            NetworkLoad::Medium
        }
    }
}

impl NetworkStatusProvider for HourlyNetworkStatus {
    fn current(&self) -> Result<NetworkLoad, NetworkStatusError> {
        Ok(self.load_at(Utc::now().hour()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unavailable;

    impl NetworkStatusProvider for Unavailable {
        fn current(&self) -> Result<NetworkLoad, NetworkStatusError> {
            Err(NetworkStatusError("timeout".into()))
        }
    }

    #[test]
    fn failing_provider_means_medium() {
        assert_eq!(current_load(&Unavailable), NetworkLoad::Medium);
        assert_eq!(
            current_load(&StaticNetworkStatus(NetworkLoad::High)),
            NetworkLoad::High
        );
    }

    #[test]
    fn hourly_classification() {
        let hourly = HourlyNetworkStatus::default();
        assert_eq!(hourly.load_at(14), NetworkLoad::High);
        assert_eq!(hourly.load_at(3), NetworkLoad::Low);
        assert_eq!(hourly.load_at(9), NetworkLoad::Medium);
    }

    #[test]
    fn parses_load_names() {
        assert_eq!("HIGH".parse::<NetworkLoad>().unwrap(), NetworkLoad::High);
        assert!("busy".parse::<NetworkLoad>().is_err());
    }
}
