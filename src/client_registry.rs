//! The Client Registry: one pre-built Cloud Control client per `(service, region)` pair,
//! retries disabled at the SDK level because retry is owned by the scheduler, not the SDK.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::SdkConfig;
use aws_sdk_cloudcontrol::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_cloudcontrol::operation::list_resources::ListResourcesError as SdkListResourcesError;
use aws_sdk_cloudcontrol::Client as SdkClient;
use serde::{Deserialize, Serialize};

use crate::cache::ResponseCache;
use crate::work_item::ClientKey;

pub const PAGE_SIZE: i32 = 100;

/// One page of `ListResources` results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListResourcesPage {
    pub resources: Vec<ResourceDescription>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDescription {
    pub identifier: String,
    /// Opaque JSON, as returned by Cloud Control.
    pub properties: String,
}

/// Error codes the SDK publishes for `ThrottlingException` and friends, used only as a fallback
/// when an error doesn't match one of the typed variants below.
const THROTTLING_ERROR_CODES: &[&str] = &[
    "ThrottlingException",
    "Throttling",
    "TooManyRequestsException",
    "RequestLimitExceeded",
    "SlowDown",
];

/// The only enumeration API the core drives. Abstracted behind a trait so tests can substitute
/// an in-memory fake and so a cache-aware decorator can wrap a real client transparently.
#[async_trait]
pub trait CloudControlClient: Send + Sync {
    async fn list_resources(
        &self,
        type_name: &str,
        page_token: Option<String>,
    ) -> Result<ListResourcesPage, ListResourcesError>;
}

/// Error classification for a single `ListResources` call. Kinds, not raw SDK types, cross this
/// boundary -- the worker loop only ever matches on this enum.
#[derive(Debug, Clone)]
pub enum ListResourcesError {
    /// Recoverable: retry with backoff from the Rate Governor, unbounded *kind* but bounded in
    /// practice by `max_retry_attempts`.
    Throttling { message: String },
    /// Non-retryable, local to this (type, region): the key is marked completed so the ledger
    /// progresses (auth denial, unsupported action, unknown type).
    NonRetryable { message: String },
}

impl std::fmt::Display for ListResourcesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Throttling { message } => write!(f, "throttled: {message}"),
            Self::NonRetryable { message } => write!(f, "non-retryable: {message}"),
        }
    }
}

/// Classifies the whole `SdkError`, not just a modeled service error: a timeout, a dispatch
/// failure, or a malformed response never reach a typed Cloud Control variant at all, and
/// `SdkError::into_service_error` panics if called on one of those. Everything that isn't a
/// modeled service error falls into the catch-all "fail open, not a crash" bucket.
fn classify_sdk_error<R>(err: &SdkError<SdkListResourcesError, R>) -> ListResourcesError {
    match err.as_service_error() {
        Some(service_err) => classify(service_err),
        None => ListResourcesError::NonRetryable {
            message: err.to_string(),
        },
    }
}

/// Classifies a modeled Cloud Control error, preferring its typed variants and falling back to a
/// code-string match only for unmodeled/opaque errors -- textual error-kind matching is a
/// fallback only.
fn classify(err: &SdkListResourcesError) -> ListResourcesError {
    match err {
        SdkListResourcesError::ThrottlingException(e) => ListResourcesError::Throttling {
            message: e.to_string(),
        },
        SdkListResourcesError::TypeNotFoundException(e) => ListResourcesError::NonRetryable {
            message: e.to_string(),
        },
        SdkListResourcesError::UnsupportedActionException(e) => ListResourcesError::NonRetryable {
            message: e.to_string(),
        },
        SdkListResourcesError::InvalidCredentialsException(e) => ListResourcesError::NonRetryable {
            message: e.to_string(),
        },
        other => {
            if let Some(code) = other.code() {
                if THROTTLING_ERROR_CODES.contains(&code) {
                    return ListResourcesError::Throttling {
                        message: other.to_string(),
                    };
                }
            }
            ListResourcesError::NonRetryable {
                message: other.to_string(),
            }
        }
    }
}

/// Thin wrapper around the real `aws-sdk-cloudcontrol` client.
pub struct AwsCloudControlClient {
    inner: SdkClient,
}

impl AwsCloudControlClient {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        // SDK-level retries are disabled: the scheduler, not the SDK, owns retry (§4.1). Double
        // retry would otherwise silently stack the scheduler's backoff on top of the SDK's.
        let client_config = aws_sdk_cloudcontrol::config::Builder::from(sdk_config)
            .retry_config(RetryConfig::disabled())
            .build();
        Self {
            inner: SdkClient::from_conf(client_config),
        }
    }
}

#[async_trait]
impl CloudControlClient for AwsCloudControlClient {
    async fn list_resources(
        &self,
        type_name: &str,
        page_token: Option<String>,
    ) -> Result<ListResourcesPage, ListResourcesError> {
        let output = self
            .inner
            .list_resources()
            .type_name(type_name)
            .max_results(PAGE_SIZE)
            .set_next_token(page_token)
            .send()
            .await
            .map_err(|sdk_err| classify_sdk_error(&sdk_err))?;

        let resources = output
            .resource_descriptions()
            .iter()
            .map(|r| ResourceDescription {
                identifier: r.identifier().unwrap_or_default().to_string(),
                properties: r.properties().unwrap_or_default().to_string(),
            })
            .collect();

        Ok(ListResourcesPage {
            resources,
            next_token: output.next_token().map(str::to_string),
        })
    }
}

/// Wraps an inner client with the on-disk response cache: a cache hit is served from disk with
/// no network call, a miss falls through to `inner` and, for a single-page result, populates the
/// cache for next time. Multi-page results are never cached -- caching only the first page of a
/// paginated result would make the second page look like a fresh hit with no continuation, so
/// pagination always goes live.
pub struct CachedCloudControlClient {
    inner: Arc<dyn CloudControlClient>,
    cache: Arc<dyn ResponseCache>,
    region: String,
}

impl CachedCloudControlClient {
    pub fn new(inner: Arc<dyn CloudControlClient>, cache: Arc<dyn ResponseCache>, region: impl Into<String>) -> Self {
        Self { inner, cache, region: region.into() }
    }
}

#[async_trait]
impl CloudControlClient for CachedCloudControlClient {
    async fn list_resources(
        &self,
        type_name: &str,
        page_token: Option<String>,
    ) -> Result<ListResourcesPage, ListResourcesError> {
        if page_token.is_none() && self.cache.hit(type_name, &self.region).await {
            if let Some(page) = self.cache.load(type_name, &self.region).await {
                return Ok(page);
            }
        }

        let page = self.inner.list_resources(type_name, page_token.clone()).await?;
        if page_token.is_none() {
            self.cache.store(type_name, &self.region, &page).await;
        }
        Ok(page)
    }
}

/// Pre-built clients keyed by `(service, region)`. Immutable after init, so reads from worker
/// tasks never contend with each other or with a writer.
#[derive(Clone)]
pub struct ClientRegistry {
    clients: Arc<HashMap<ClientKey, Arc<dyn CloudControlClient>>>,
}

impl ClientRegistry {
    pub fn new(clients: HashMap<ClientKey, Arc<dyn CloudControlClient>>) -> Self {
        Self {
            clients: Arc::new(clients),
        }
    }

    /// Builds one client per (service, region) pair found among `resource_types` × `regions`.
    /// Cloud Control is a single physical API, so every key maps to an equivalent client
    /// configured from that region's `SdkConfig` -- the per-service key is retained for
    /// diagnostics and to keep this registry extensible to per-service tuning later. When `cache`
    /// is `Some`, every client is wrapped in a [`CachedCloudControlClient`] so a cache hit never
    /// reaches the network.
    pub fn build(
        resource_types: &[&'static str],
        regions: &[String],
        configs: &HashMap<String, SdkConfig>,
        cache: Option<&Arc<dyn ResponseCache>>,
    ) -> Result<Self, crate::error::SchedulerError> {
        let global_region = vec![crate::registry::GLOBAL_SERVICE_REGION.to_string()];
        let mut clients: HashMap<ClientKey, Arc<dyn CloudControlClient>> = HashMap::new();
        for resource_type in resource_types {
            let applicable_regions: &[String] = if crate::registry::is_global_service(resource_type) {
                &global_region
            } else {
                regions
            };
            for region in applicable_regions {
                let key = ClientKey::new(resource_type, region);
                if clients.contains_key(&key) {
                    continue;
                }
                let sdk_config = configs.get(region).ok_or_else(|| {
                    crate::error::SchedulerError::MissingClient {
                        service: crate::registry::service_name(resource_type).to_string(),
                        region: region.clone(),
                    }
                })?;
                let raw: Arc<dyn CloudControlClient> = Arc::new(AwsCloudControlClient::new(sdk_config));
                let client = match cache {
                    Some(cache) => {
                        Arc::new(CachedCloudControlClient::new(raw, cache.clone(), region.clone()))
                            as Arc<dyn CloudControlClient>
                    }
                    None => raw,
                };
                clients.insert(key, client);
            }
        }
        Ok(Self::new(clients))
    }

    /// Returns the pre-built client for `(service, region)`, or a fatal misconfiguration error.
    /// Never silently creates a client on demand (§4.1).
    pub fn get(&self, key: &ClientKey) -> Result<Arc<dyn CloudControlClient>, crate::error::SchedulerError> {
        self.clients.get(key).cloned().ok_or_else(|| {
            let parts: Vec<&str> = key.to_string().splitn(2, ':').collect();
            crate::error::SchedulerError::MissingClient {
                service: parts.first().unwrap_or(&"?").to_string(),
                region: parts.get(1).unwrap_or(&"?").to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct FakeClient;

    #[async_trait]
    impl CloudControlClient for FakeClient {
        async fn list_resources(
            &self,
            _type_name: &str,
            _page_token: Option<String>,
        ) -> Result<ListResourcesPage, ListResourcesError> {
            Ok(ListResourcesPage::default())
        }
    }

    #[test]
    fn classify_sdk_error_handles_non_service_variants_without_panicking() {
        let err: SdkError<SdkListResourcesError, String> = SdkError::timeout_error(
            std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out waiting for a connection"),
        );
        let classified = classify_sdk_error(&err);
        assert!(matches!(classified, ListResourcesError::NonRetryable { .. }));
    }

    #[test]
    fn get_returns_missing_client_error_for_unknown_key() {
        let registry = ClientRegistry::new(HashMap::new());
        let key = ClientKey::new("AWS::S3::Bucket", "us-east-1");
        let err = registry.get(&key).unwrap_err();
        assert!(matches!(err, crate::error::SchedulerError::MissingClient { .. }));
    }

    #[tokio::test]
    async fn get_returns_the_registered_client() {
        let key = ClientKey::new("AWS::S3::Bucket", "us-east-1");
        let mut clients: HashMap<ClientKey, Arc<dyn CloudControlClient>> = HashMap::new();
        clients.insert(key.clone(), Arc::new(FakeClient));
        let registry = ClientRegistry::new(clients);

        let client = registry.get(&key).expect("client should be present");
        let page = client.list_resources("AWS::S3::Bucket", None).await.unwrap();
        assert!(page.resources.is_empty());
    }

    struct CountingClient {
        calls: AtomicU32,
    }

    #[async_trait]
    impl CloudControlClient for CountingClient {
        async fn list_resources(
            &self,
            _type_name: &str,
            _page_token: Option<String>,
        ) -> Result<ListResourcesPage, ListResourcesError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ListResourcesPage {
                resources: vec![ResourceDescription { identifier: "live".into(), properties: "{}".into() }],
                next_token: None,
            })
        }
    }

    #[derive(Default)]
    struct FakeCache {
        is_hit: bool,
        stored: Mutex<Vec<ListResourcesPage>>,
    }

    #[async_trait]
    impl ResponseCache for FakeCache {
        async fn hit(&self, _resource_type: &str, _region: &str) -> bool {
            self.is_hit
        }

        async fn load(&self, _resource_type: &str, _region: &str) -> Option<ListResourcesPage> {
            self.is_hit.then(|| ListResourcesPage {
                resources: vec![ResourceDescription { identifier: "cached".into(), properties: "{}".into() }],
                next_token: None,
            })
        }

        async fn store(&self, _resource_type: &str, _region: &str, page: &ListResourcesPage) {
            self.stored.lock().unwrap().push(page.clone());
        }
    }

    #[tokio::test]
    async fn cached_client_serves_from_cache_without_touching_inner() {
        let inner = Arc::new(CountingClient { calls: AtomicU32::new(0) });
        let cache: Arc<dyn ResponseCache> = Arc::new(FakeCache { is_hit: true, ..Default::default() });
        let client = CachedCloudControlClient::new(inner.clone(), cache, "us-east-1");

        let page = client.list_resources("AWS::S3::Bucket", None).await.unwrap();

        assert_eq!(page.resources[0].identifier, "cached");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cached_client_falls_through_and_stores_on_miss() {
        let inner = Arc::new(CountingClient { calls: AtomicU32::new(0) });
        let fake_cache = Arc::new(FakeCache { is_hit: false, ..Default::default() });
        let cache: Arc<dyn ResponseCache> = fake_cache.clone();
        let client = CachedCloudControlClient::new(inner.clone(), cache, "us-east-1");

        let page = client.list_resources("AWS::S3::Bucket", None).await.unwrap();

        assert_eq!(page.resources[0].identifier, "live");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fake_cache.stored.lock().unwrap().len(), 1);
    }
}
