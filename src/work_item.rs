use std::time::Instant;

use crate::registry::service_name;

/// The unit of scheduling: one `(resourceType, region, attempt)` triple, created by the
/// Lifecycle Controller at attempt 0 or by a worker observing throttling (attempt+1).
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub resource_type: &'static str,
    pub region: String,
    pub attempt: u32,
    pub last_attempt_at: Option<Instant>,
}

impl WorkItem {
    pub fn seed(resource_type: &'static str, region: String) -> Self {
        Self {
            resource_type,
            region,
            attempt: 0,
            last_attempt_at: None,
        }
    }

    /// Builds the next retry attempt for this item, stamping the current time as its last
    /// attempt (used only for diagnostics; pacing itself is owned by the Rate Governor).
    pub fn retry(&self) -> Self {
        Self {
            resource_type: self.resource_type,
            region: self.region.clone(),
            attempt: self.attempt + 1,
            last_attempt_at: Some(Instant::now()),
        }
    }

    /// The accounting unit for the Completion Tracker: `"{resourceType}:{region}"`.
    pub fn key(&self) -> ResourceTypeRegion {
        ResourceTypeRegion::new(self.resource_type, &self.region)
    }

    pub fn client_key(&self) -> ClientKey {
        ClientKey::new(self.resource_type, &self.region)
    }
}

/// Stable, unique accounting key for one (resource type, region) pair -- the only thing the
/// Completion Tracker reasons about. Interned as a plain `String` rather than a numeric id
/// since the ledger's size (types × regions) never approaches a scale where that matters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceTypeRegion(String);

impl ResourceTypeRegion {
    pub fn new(resource_type: &str, region: &str) -> Self {
        Self(format!("{resource_type}:{region}"))
    }
}

impl std::fmt::Display for ResourceTypeRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// `"{serviceName}:{region}"`, the key the Client Registry pre-builds clients under. Many
/// resource types share one client since Cloud Control is a single physical API.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey(String);

impl ClientKey {
    pub fn new(resource_type: &str, region: &str) -> Self {
        Self(format!("{}:{region}", service_name(resource_type)))
    }
}

impl std::fmt::Display for ClientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_combines_type_and_region() {
        let item = WorkItem::seed("AWS::S3::Bucket", "us-east-1".to_string());
        assert_eq!(item.key().to_string(), "AWS::S3::Bucket:us-east-1");
    }

    #[test]
    fn client_key_uses_service_token_only() {
        let item = WorkItem::seed("AWS::S3::Bucket", "us-east-1".to_string());
        assert_eq!(item.client_key().to_string(), "S3:us-east-1");
    }

    #[test]
    fn retry_increments_attempt_and_preserves_identity() {
        let item = WorkItem::seed("AWS::S3::Bucket", "us-east-1".to_string());
        let retried = item.retry();
        assert_eq!(retried.attempt, 1);
        assert_eq!(retried.key(), item.key());
    }
}
