// Manager configuration
//
// Defaults match a freshly constructed manager. `from_env` layers
// `COURIER_*` environment variables on top.

use serde::{Deserialize, Serialize};

use crate::application::engine::constants::DEFAULT_INTERNET_CHECK_LOCATIONS;
use crate::domain::AdmissionPolicy;
use crate::error::{ManagerError, Result};

pub const ENV_ASYNCHRONOUS: &str = "COURIER_ASYNCHRONOUS";
pub const ENV_TIMEOUT_MS: &str = "COURIER_TIMEOUT_MS";
pub const ENV_ONLY_HTTPS: &str = "COURIER_ONLY_HTTPS";
pub const ENV_BASE_URL: &str = "COURIER_BASE_URL";
pub const ENV_QUEUE_ADMISSION: &str = "COURIER_QUEUE_ADMISSION";
pub const ENV_CHECK_LOCATIONS: &str = "COURIER_CHECK_LOCATIONS";

/// Construction-time and runtime settings of a `RequestManager`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Fixed at construction
    pub asynchronous: bool,
    /// Milliseconds, 0 = no timeout
    pub timeout_ms: u64,
    pub is_only_https: bool,
    /// Prefix applied to relative urls
    pub base_url: String,
    /// Probed in order by `is_internet_available`
    pub internet_check_locations: Vec<String>,
    pub admission_policy: AdmissionPolicy,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            asynchronous: true,
            timeout_ms: 0,
            is_only_https: true,
            base_url: String::new(),
            internet_check_locations: DEFAULT_INTERNET_CHECK_LOCATIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            admission_policy: AdmissionPolicy::Wait,
        }
    }
}

impl ManagerConfig {
    pub fn new(asynchronous: bool) -> Self {
        Self {
            asynchronous,
            ..Default::default()
        }
    }

    /// Load from `COURIER_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (unset keys keep their defaults)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup(ENV_ASYNCHRONOUS) {
            config.asynchronous = parse_bool(&v)
                .ok_or_else(|| ManagerError::InvalidArgument("asynchronous is not boolean".into()))?;
        }

        if let Some(v) = lookup(ENV_TIMEOUT_MS) {
            config.timeout_ms = v.trim().parse().map_err(|_| {
                ManagerError::InvalidArgument(format!("timeout must be a non negative integer: {}", v))
            })?;
        }

        if let Some(v) = lookup(ENV_ONLY_HTTPS) {
            config.is_only_https = parse_bool(&v)
                .ok_or_else(|| ManagerError::InvalidArgument("is_only_https is not boolean".into()))?;
        }

        if let Some(v) = lookup(ENV_BASE_URL) {
            config.base_url = v.trim().to_string();
        }

        if let Some(v) = lookup(ENV_QUEUE_ADMISSION) {
            config.admission_policy = v.parse().map_err(ManagerError::InvalidArgument)?;
        }

        if let Some(v) = lookup(ENV_CHECK_LOCATIONS) {
            config.internet_check_locations = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
