//! The response cache's file layout and hashing policy are out of scope for this crate; what
//! the scheduler owns is the lookup and read/write contract. The cached body is returned,
//! transparently, by
//! [`CachedCloudControlClient`](crate::client_registry::CachedCloudControlClient), a decorator
//! wrapping an inner client: when `hit` answers true the worker skips the rate limiter, and the
//! decorator serves the page straight off disk instead of making a network call.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tracing::warn;

use crate::client_registry::ListResourcesPage;

/// Cache lookup and read/write contract. A `true` result from `hit` is the *cache bypass*
/// property: the caller must not consume a rate-limiter token for this call. `load` and `store`
/// give a cache-aware client something to actually serve; both default to no-ops so a cache that
/// only ever wants to report misses (or whose `hit` already folds in a read, like a future
/// content-addressed cache) doesn't have to implement them.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn hit(&self, resource_type: &str, region: &str) -> bool;

    /// Reads the cached page for an exact (type, region) match. Only meaningful after `hit`
    /// answers true; a `None` here despite a prior `true` hit (e.g. a concurrent evict) falls
    /// through to a live call.
    async fn load(&self, _resource_type: &str, _region: &str) -> Option<ListResourcesPage> {
        None
    }

    /// Persists a freshly-fetched page so a later identical call can be served from cache.
    async fn store(&self, _resource_type: &str, _region: &str, _page: &ListResourcesPage) {}
}

/// Always reports a miss -- used when `cache_dir` is not configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

#[async_trait]
impl ResponseCache for NoCache {
    async fn hit(&self, _resource_type: &str, _region: &str) -> bool {
        false
    }
}

/// A minimal file-presence-and-age cache: a hit is a readable file at
/// `{cache_dir}/{region}_{sanitized_type}.{ext}` younger than `ttl`. This is deliberately not
/// the source tool's cache layout or hashing scheme (that policy is explicitly out of scope) --
/// it is the simplest implementation that satisfies the lookup contract above, so the
/// `cache-dir`/`cache-ttl-seconds`/`cache-ext` options have somewhere to land.
#[derive(Debug, Clone)]
pub struct FsResponseCache {
    cache_dir: PathBuf,
    ttl: Duration,
    ext: String,
}

impl FsResponseCache {
    pub fn new(cache_dir: PathBuf, ttl: Duration, ext: impl Into<String>) -> Self {
        Self {
            cache_dir,
            ttl,
            ext: ext.into(),
        }
    }

    fn path_for(&self, resource_type: &str, region: &str) -> PathBuf {
        let sanitized_type = resource_type.replace("::", "_");
        self.cache_dir
            .join(format!("{region}_{sanitized_type}.{}", self.ext))
    }
}

#[async_trait]
impl ResponseCache for FsResponseCache {
    async fn hit(&self, resource_type: &str, region: &str) -> bool {
        let path = self.path_for(resource_type, region);
        matches!(is_fresh(&path, self.ttl).await, Ok(true))
    }

    async fn load(&self, resource_type: &str, region: &str) -> Option<ListResourcesPage> {
        let path = self.path_for(resource_type, region);
        let bytes = tokio::fs::read(&path).await.ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(page) => Some(page),
            Err(err) => {
                warn!(%err, path = %path.display(), "cache entry unreadable, treating as a miss");
                None
            }
        }
    }

    async fn store(&self, resource_type: &str, region: &str, page: &ListResourcesPage) {
        // Only a complete, single-page result is safe to cache: caching just the first page of a
        // paginated result would make a later second-page fetch look like a fresh hit with
        // nowhere to continue from.
        if page.next_token.is_some() {
            return;
        }
        let path = self.path_for(resource_type, region);
        let bytes = match serde_json::to_vec(page) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(%err, "failed to serialize response for caching");
                return;
            }
        };
        if let Err(err) = tokio::fs::write(&path, bytes).await {
            warn!(%err, path = %path.display(), "failed to write cache entry");
        }
    }
}

async fn is_fresh(path: &Path, ttl: Duration) -> std::io::Result<bool> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    let modified = metadata.modified()?;
    let age = SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::MAX);
    Ok(age <= ttl)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_cache_always_misses() {
        assert!(!NoCache.hit("AWS::S3::Bucket", "us-east-1").await);
    }

    #[tokio::test]
    async fn fs_cache_misses_when_file_absent() {
        let dir = tempdir("misses-when-absent");
        let cache = FsResponseCache::new(dir.clone(), Duration::from_secs(60), "json");
        assert!(!cache.hit("AWS::S3::Bucket", "us-east-1").await);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn fs_cache_hits_a_fresh_file() {
        let dir = tempdir("hits-a-fresh-file");
        let cache = FsResponseCache::new(dir.clone(), Duration::from_secs(60), "json");
        let path = cache.path_for("AWS::S3::Bucket", "us-east-1");
        tokio::fs::write(&path, b"{}").await.unwrap();
        assert!(cache.hit("AWS::S3::Bucket", "us-east-1").await);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn store_then_load_round_trips_a_single_page_response() {
        use crate::client_registry::ResourceDescription;

        let dir = tempdir("store-then-load");
        let cache = FsResponseCache::new(dir.clone(), Duration::from_secs(60), "json");
        let page = ListResourcesPage {
            resources: vec![ResourceDescription { identifier: "my-bucket".into(), properties: "{}".into() }],
            next_token: None,
        };

        cache.store("AWS::S3::Bucket", "us-east-1", &page).await;
        assert!(cache.hit("AWS::S3::Bucket", "us-east-1").await);
        let loaded = cache.load("AWS::S3::Bucket", "us-east-1").await.expect("cached page");
        assert_eq!(loaded.resources.len(), 1);
        assert_eq!(loaded.resources[0].identifier, "my-bucket");
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn store_skips_multi_page_responses() {
        let dir = tempdir("skips-multi-page");
        let cache = FsResponseCache::new(dir.clone(), Duration::from_secs(60), "json");
        let page = ListResourcesPage { resources: vec![], next_token: Some("next".to_string()) };

        cache.store("AWS::S3::Bucket", "us-east-1", &page).await;
        assert!(!cache.hit("AWS::S3::Bucket", "us-east-1").await);
        let _ = std::fs::remove_dir_all(dir);
    }

    /// Each caller gets its own directory -- tests run concurrently in one process, so sharing a
    /// directory (and thus a cache filename) between tests would race.
    fn tempdir(label: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "cc-scheduler-cache-test-{}-{label}",
            std::process::id()
        ));
        std::fs::create_dir_all(&path).unwrap();
        path
    }
}
