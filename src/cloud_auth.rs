//! Credential and region resolution. One `SdkConfig` is resolved per configured region up
//! front, during Init, so a bad profile or an unreachable STS endpoint surfaces before the
//! Seed phase starts handing out work.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};

use crate::error::SchedulerError;

/// Resolves AWS auth for a region. Abstracted so tests can substitute a fake that never
/// touches the network.
#[async_trait]
pub trait CloudAuth: Send + Sync {
    async fn get_config(&self, region: &str) -> Result<SdkConfig, SchedulerError>;
    async fn get_account_id(&self, config: &SdkConfig) -> Result<String, SchedulerError>;
}

/// Resolves credentials the normal way: the default provider chain (env vars, profile,
/// container/instance metadata, SSO), optionally pinned to a named profile.
#[derive(Debug, Clone, Default)]
pub struct DefaultCloudAuth {
    profile: Option<String>,
}

impl DefaultCloudAuth {
    pub fn new(profile: Option<String>) -> Self {
        Self { profile }
    }
}

#[async_trait]
impl CloudAuth for DefaultCloudAuth {
    async fn get_config(&self, region: &str) -> Result<SdkConfig, SchedulerError> {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));
        if let Some(profile) = &self.profile {
            loader = loader.profile_name(profile);
        }
        Ok(loader.load().await)
    }

    async fn get_account_id(&self, config: &SdkConfig) -> Result<String, SchedulerError> {
        let client = aws_sdk_sts::Client::new(config);
        let identity = client
            .get_caller_identity()
            .send()
            .await
            .map_err(|err| SchedulerError::CloudAuth {
                region: config.region().map(|r| r.to_string()).unwrap_or_default(),
                source: Box::new(err),
            })?;
        identity
            .account()
            .map(str::to_string)
            .ok_or_else(|| SchedulerError::CloudAuth {
                region: config.region().map(|r| r.to_string()).unwrap_or_default(),
                source: "GetCallerIdentity response had no account id".into(),
            })
    }
}

/// Resolves one `SdkConfig` per region up front. A failure for any single region is fatal --
/// Init must not proceed with a partially-authenticated region set.
pub async fn resolve_region_configs(
    auth: &dyn CloudAuth,
    regions: &[String],
) -> Result<HashMap<String, SdkConfig>, SchedulerError> {
    let mut configs = HashMap::with_capacity(regions.len());
    for region in regions {
        let config = auth.get_config(region).await?;
        configs.insert(region.clone(), config);
    }
    Ok(configs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeCloudAuth {
        regions_seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CloudAuth for FakeCloudAuth {
        async fn get_config(&self, region: &str) -> Result<SdkConfig, SchedulerError> {
            self.regions_seen.lock().unwrap().push(region.to_string());
            Ok(SdkConfig::builder()
                .region(Region::new(region.to_string()))
                .build())
        }

        async fn get_account_id(&self, _config: &SdkConfig) -> Result<String, SchedulerError> {
            Ok("123456789012".to_string())
        }
    }

    #[tokio::test]
    async fn resolves_one_config_per_region() {
        let auth = FakeCloudAuth::default();
        let regions = vec!["us-east-1".to_string(), "eu-west-1".to_string()];
        let configs = resolve_region_configs(&auth, &regions).await.unwrap();
        assert_eq!(configs.len(), 2);
        assert!(configs.contains_key("us-east-1"));
        assert!(configs.contains_key("eu-west-1"));
    }
}
