//! Controller configuration, read from the environment.

use crate::error::ControllerError;
use std::env;
use std::time::Duration;

const DEFAULT_POLL_INTERVAL_SECS: u64 = 900;
const DEFAULT_FAILED_RETRY_INTERVAL_SECS: u64 = 60;

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Namespace to watch (`WATCH_NAMESPACE`); all namespaces when unset
    pub watch_namespace: Option<String>,

    /// How often upstream registries are checked for updates
    /// (`REGISTRY_POLL_INTERVAL_SECS`)
    pub poll_interval: Duration,

    /// How long a Failed object waits before it is retried
    /// (`FAILED_RETRY_INTERVAL_SECS`)
    pub failed_retry_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watch_namespace: None,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            failed_retry_interval: Duration::from_secs(DEFAULT_FAILED_RETRY_INTERVAL_SECS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ControllerError> {
        let watch_namespace = lookup("WATCH_NAMESPACE").filter(|ns| !ns.trim().is_empty());

        let seconds = |key: &str, default: u64| -> Result<Duration, ControllerError> {
            match lookup(key) {
                None => Ok(Duration::from_secs(default)),
                Some(value) => match value.trim().parse::<u64>() {
                    Ok(0) | Err(_) => Err(ControllerError::InvalidConfig(format!(
                        "{key} must be a positive number of seconds, got {value:?}"
                    ))),
                    Ok(secs) => Ok(Duration::from_secs(secs)),
                },
            }
        };

        Ok(Self {
            watch_namespace,
            poll_interval: seconds("REGISTRY_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?,
            failed_retry_interval: seconds(
                "FAILED_RETRY_INTERVAL_SECS",
                DEFAULT_FAILED_RETRY_INTERVAL_SECS,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ControllerError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(load(&[]).unwrap(), Config::default());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("WATCH_NAMESPACE", "openshift-marketplace"),
            ("REGISTRY_POLL_INTERVAL_SECS", "30"),
            ("FAILED_RETRY_INTERVAL_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.watch_namespace.as_deref(), Some("openshift-marketplace"));
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.failed_retry_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_blank_namespace_means_all() {
        assert_eq!(load(&[("WATCH_NAMESPACE", " ")]).unwrap().watch_namespace, None);
    }

    #[test]
    fn test_invalid_interval() {
        assert!(matches!(
            load(&[("REGISTRY_POLL_INTERVAL_SECS", "soon")]),
            Err(ControllerError::InvalidConfig(_))
        ));
        assert!(matches!(
            load(&[("FAILED_RETRY_INTERVAL_SECS", "0")]),
            Err(ControllerError::InvalidConfig(_))
        ));
    }
}
