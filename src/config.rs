use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_MAX_CONCURRENT_WORKERS: usize = 100;
const MIN_MAX_CONCURRENT_WORKERS: usize = 1;
const MAX_MAX_CONCURRENT_WORKERS: usize = 10_000;

const DEFAULT_PER_REGION_RATE_LIMIT: u32 = 5;
const MIN_PER_REGION_RATE_LIMIT: u32 = 1;
const MAX_PER_REGION_RATE_LIMIT: u32 = 100;

const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 20;
const MAX_MAX_RETRY_ATTEMPTS: u32 = 1000;

const DEFAULT_SAFETY_DEADLINE_SECS: u64 = 600;

const DEFAULT_CACHE_EXT: &str = "json";

/// All tunables the Lifecycle Controller (§4.7) needs at init. Unknown fields in a loaded
/// config file are a startup error -- we never silently ignore a typo'd option.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SchedulerConfig {
    /// AWS regions to enumerate. Must be non-empty.
    pub regions: Vec<String>,

    /// Resource-type filter. `["all"]` (the default) expands to the full supported registry.
    pub resource_types: Vec<String>,

    /// Size of the worker pool.
    pub max_concurrent_workers: usize,

    /// Token-bucket rate (== burst) applied per region, in requests/sec.
    pub per_region_rate_limit: u32,

    /// Emit periodic per-region dispatch-rate debug logging.
    pub enable_debug_metrics: bool,

    /// Directory backing the on-disk response cache. `None` disables cache bypass entirely.
    pub cache_dir: Option<PathBuf>,

    /// Time-to-live for cached responses.
    #[serde(with = "humantime_secs")]
    pub cache_ttl: Duration,

    /// File extension used for cached response files.
    pub cache_ext: String,

    /// Upper bound on throttle-retry attempts per work item before it is treated as a
    /// non-retryable failure.
    pub max_retry_attempts: u32,

    /// Wall-clock safety deadline for the whole run, in seconds.
    pub safety_deadline_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            regions: Vec::new(),
            resource_types: vec!["all".to_string()],
            max_concurrent_workers: DEFAULT_MAX_CONCURRENT_WORKERS,
            per_region_rate_limit: DEFAULT_PER_REGION_RATE_LIMIT,
            enable_debug_metrics: false,
            cache_dir: None,
            cache_ttl: Duration::from_secs(0),
            cache_ext: DEFAULT_CACHE_EXT.to_string(),
            max_retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
            safety_deadline_secs: DEFAULT_SAFETY_DEADLINE_SECS,
        }
    }
}

impl SchedulerConfig {
    pub fn safety_deadline(&self) -> Duration {
        Duration::from_secs(self.safety_deadline_secs)
    }

    /// Validates the configured bounds. Called once at init; any failure is a fatal
    /// configuration error and the scheduler refuses to start.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.regions.is_empty() {
            return Err(ConfigError::NoRegions);
        }
        if !(MIN_MAX_CONCURRENT_WORKERS..=MAX_MAX_CONCURRENT_WORKERS)
            .contains(&self.max_concurrent_workers)
        {
            return Err(ConfigError::OutOfBounds {
                field: "max_concurrent_workers",
                value: self.max_concurrent_workers as i64,
                min: MIN_MAX_CONCURRENT_WORKERS as i64,
                max: MAX_MAX_CONCURRENT_WORKERS as i64,
            });
        }
        if !(MIN_PER_REGION_RATE_LIMIT..=MAX_PER_REGION_RATE_LIMIT)
            .contains(&self.per_region_rate_limit)
        {
            return Err(ConfigError::OutOfBounds {
                field: "per_region_rate_limit",
                value: self.per_region_rate_limit as i64,
                min: MIN_PER_REGION_RATE_LIMIT as i64,
                max: MAX_PER_REGION_RATE_LIMIT as i64,
            });
        }
        if self.max_retry_attempts > MAX_MAX_RETRY_ATTEMPTS {
            return Err(ConfigError::OutOfBounds {
                field: "max_retry_attempts",
                value: self.max_retry_attempts as i64,
                min: 0,
                max: MAX_MAX_RETRY_ATTEMPTS as i64,
            });
        }
        if self.safety_deadline_secs == 0 {
            return Err(ConfigError::OutOfBounds {
                field: "safety_deadline_secs",
                value: 0,
                min: 1,
                max: i64::MAX,
            });
        }
        Ok(())
    }

    /// Loads a YAML config file and overlays CLI-provided overrides on top of it, the way the
    /// teacher layers file config underneath explicit flags.
    pub fn load(path: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
                serde_yaml::from_str(&contents)
                    .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?
            }
            None => SchedulerConfig::default(),
        };
        if config.resource_types.is_empty() {
            config.resource_types = vec!["all".to_string()];
        }
        Ok(config)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("at least one region is required")]
    NoRegions,

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfBounds {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// `serde_with`-style helper so `Duration` can round-trip through a plain integer number of
/// seconds in the YAML config, keeping the on-disk representation primitive rather than pulling
/// in a duration-specific serde crate for one field.
mod humantime_secs {
    use super::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
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
    fn default_config_rejects_empty_regions() {
        let config = SchedulerConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::NoRegions)));
    }

    #[test]
    fn accepts_a_minimal_valid_config() {
        let config = SchedulerConfig {
            regions: vec!["us-east-1".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_worker_count_out_of_bounds() {
        let config = SchedulerConfig {
            regions: vec!["us-east-1".to_string()],
            max_concurrent_workers: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfBounds { field: "max_concurrent_workers", .. })
        ));
    }

    #[test]
    fn rejects_rate_limit_out_of_bounds() {
        let config = SchedulerConfig {
            regions: vec!["us-east-1".to_string()],
            per_region_rate_limit: 101,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfBounds { field: "per_region_rate_limit", .. })
        ));
    }

    #[test]
    fn empty_resource_type_filter_falls_back_to_all() {
        let config = SchedulerConfig::load(None).expect("default load never fails");
        assert_eq!(config.resource_types, vec!["all".to_string()]);
    }
}
