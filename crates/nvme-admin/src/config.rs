//! Device handle configuration
//!
//! Tunables applied to every command a handle issues.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one device handle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Per-command timeout; `None` leaves the driver default in place
    pub timeout: Option<Duration>,

    /// Upper bound on the namespace scan in `identify()`
    ///
    /// Controllers may report a namespace count far beyond what is
    /// populated (256 observed on one virtualized platform), so the
    /// reported count is advisory and the scan stops here.
    pub max_namespaces: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            timeout: None, // driver default
            max_namespaces: 1024,
        }
    }
}

impl DeviceConfig {
    /// Timeout in the millisecond encoding the command structure carries
    ///
    /// Zero means "use the driver's default timeout".
    pub fn timeout_ms(&self) -> u32 {
        self.timeout
            .map_or(0, |t| t.as_millis().min(u32::MAX as u128) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DeviceConfig::default();
        assert!(config.timeout.is_none());
        assert_eq!(config.max_namespaces, 1024);
        assert_eq!(config.timeout_ms(), 0);
    }

    #[test]
    fn test_timeout_ms() {
        let config = DeviceConfig {
            timeout: Some(Duration::from_secs(30)),
            ..Default::default()
        };
        assert_eq!(config.timeout_ms(), 30_000);
    }

    #[test]
    fn test_serialization() {
        let config = DeviceConfig {
            timeout: Some(Duration::from_millis(2500)),
            max_namespaces: 64,
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: DeviceConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.timeout, config.timeout);
        assert_eq!(parsed.max_namespaces, 64);
    }
}
