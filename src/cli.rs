//! CLI surface: every configuration option as a flag, merged over an optional YAML config
//! file, with explicit flags layered on top of file-backed defaults.

use std::path::PathBuf;

use clap::Parser;

use crate::config::SchedulerConfig;

#[derive(Debug, Parser)]
#[command(version, about = "Concurrent, rate-limited AWS resource enumeration over Cloud Control")]
pub struct Cli {
    /// Path to a YAML config file providing defaults; CLI flags below override it.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// AWS regions to enumerate. Overrides the config file's `regions` when given.
    #[arg(long, value_delimiter = ',')]
    pub regions: Vec<String>,

    /// Resource-type filter; `all` expands to the full supported registry.
    #[arg(long, value_delimiter = ',')]
    pub resource_types: Vec<String>,

    /// Size of the worker pool.
    #[arg(long)]
    pub max_concurrent_workers: Option<usize>,

    /// Token-bucket rate (== burst) applied per region, in requests/sec.
    #[arg(long)]
    pub per_region_rate_limit: Option<u32>,

    /// Emit periodic per-region dispatch-rate debug logging.
    #[arg(long)]
    pub enable_debug_metrics: bool,

    /// Directory backing the on-disk response cache.
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Time-to-live for cached responses, in seconds.
    #[arg(long)]
    pub cache_ttl_seconds: Option<u64>,

    /// File extension used for cached response files.
    #[arg(long)]
    pub cache_ext: Option<String>,

    /// Upper bound on throttle-retry attempts per work item.
    #[arg(long)]
    pub max_retry_attempts: Option<u32>,

    /// Wall-clock safety deadline for the whole run, in seconds.
    #[arg(long)]
    pub safety_deadline_secs: Option<u64>,

    /// Named AWS profile to resolve credentials from.
    #[arg(long)]
    pub profile: Option<String>,
}

impl Cli {
    /// Loads the config file (if any), then overlays any flags the user actually passed.
    pub fn resolve_config(&self) -> Result<SchedulerConfig, crate::config::ConfigError> {
        let mut config = SchedulerConfig::load(self.config.as_deref())?;

        if !self.regions.is_empty() {
            config.regions = self.regions.clone();
        }
        if !self.resource_types.is_empty() {
            config.resource_types = self.resource_types.clone();
        }
        if let Some(workers) = self.max_concurrent_workers {
            config.max_concurrent_workers = workers;
        }
        if let Some(rate) = self.per_region_rate_limit {
            config.per_region_rate_limit = rate;
        }
        if self.enable_debug_metrics {
            config.enable_debug_metrics = true;
        }
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = Some(dir.clone());
        }
        if let Some(secs) = self.cache_ttl_seconds {
            config.cache_ttl = std::time::Duration::from_secs(secs);
        }
        if let Some(ext) = &self.cache_ext {
            config.cache_ext = ext.clone();
        }
        if let Some(attempts) = self.max_retry_attempts {
            config.max_retry_attempts = attempts;
        }
        if let Some(secs) = self.safety_deadline_secs {
            config.safety_deadline_secs = secs;
        }

        config.validate()?;
        Ok(config)
    }
}
