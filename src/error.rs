use thiserror::Error;

/// Fatal errors that abort the scheduler before or during a run.
///
/// Per-(type, region) API errors are deliberately *not* represented here: they are
/// classified, logged, and absorbed by the worker loop (see [`crate::worker`]) so that one
/// region or resource type failing can never fail the overall run.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("failed to resolve credentials/config for region {region}: {source}")]
    CloudAuth {
        region: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("no client registered for service {service} in region {region}")]
    MissingClient { service: String, region: String },

    #[error("zero regions configured; at least one region is required")]
    NoRegions,
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
