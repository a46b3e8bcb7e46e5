//! The Lifecycle Controller: owns Init/Seed/Drive/Shutdown and exposes only
//! `submit`/`run`/`await_done` to callers, collapsing the source's base-class inheritance into
//! plain composition -- a struct holding its collaborators.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::cache::{NoCache, ResponseCache};
use crate::client_registry::ClientRegistry;
use crate::cloud_auth::{resolve_region_configs, CloudAuth};
use crate::config::SchedulerConfig;
use crate::error::{Result, SchedulerError};
use crate::ledger::CompletionLedger;
use crate::metrics::{self, DebugMetrics};
use crate::queue;
use crate::registry::{filtered_resource_types, is_global_service, GLOBAL_SERVICE_REGION};
use crate::sink::Sink;
use crate::work_item::WorkItem;
use crate::worker::{self, WorkerContext};

/// Progress reported after a run finishes, for the caller to log or act on.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub total_expected: usize,
    pub total_completed: usize,
    pub hit_safety_deadline: bool,
    /// Set when the process received an interrupt (Ctrl-C) before all work finished. Not an
    /// error -- cancellation propagates cleanly, and the run still reports whatever progress
    /// the ledger had made when the signal arrived.
    pub interrupted: bool,
}

/// How often the Drive phase checks ledger progress against the safety deadline.
const TICK_PERIOD: Duration = Duration::from_secs(2);

/// Composes every collaborator and drives one enumeration run end to end.
///
/// Holds an already-built [`ClientRegistry`] and account id rather than a `CloudAuth` handle:
/// Init (credential/region resolution, client pre-building) is a separate, fallible async step
/// ([`Scheduler::bootstrap`]) so tests can hand in an in-memory `ClientRegistry` without ever
/// touching the network, driving the full scheduler against an in-memory fake
/// `CloudControlClient`.
pub struct Scheduler {
    config: SchedulerConfig,
    clients: ClientRegistry,
    account_id: String,
    cache: Arc<dyn ResponseCache>,
    sink: Arc<dyn Sink>,
}

impl Scheduler {
    /// Runs the Init phase: resolves credentials per region, pre-builds
    /// one client per (service, region), and resolves the account id once.
    pub async fn bootstrap(
        config: SchedulerConfig,
        auth: &dyn CloudAuth,
        cache: Option<Arc<dyn ResponseCache>>,
        sink: Arc<dyn Sink>,
    ) -> Result<Self> {
        config.validate()?;
        if config.regions.is_empty() {
            return Err(SchedulerError::NoRegions);
        }

        let resource_types = filtered_resource_types(&config.resource_types);
        let mut region_configs = resolve_region_configs(auth, &config.regions).await?;
        // Global-service types are always enumerated from GLOBAL_SERVICE_REGION regardless of
        // the requested region list, so a client for it must exist even when the caller never
        // asked for that region.
        if !region_configs.contains_key(GLOBAL_SERVICE_REGION) {
            let global_config = auth.get_config(GLOBAL_SERVICE_REGION).await?;
            region_configs.insert(GLOBAL_SERVICE_REGION.to_string(), global_config);
        }
        let clients = ClientRegistry::build(&resource_types, &config.regions, &region_configs, cache.as_ref())?;
        let account_id = auth
            .get_account_id(region_configs.values().next().expect("regions is non-empty"))
            .await?;

        Self::new(config, clients, account_id, cache, sink)
    }

    /// Direct constructor for callers (tests, embedders) that have already resolved a
    /// [`ClientRegistry`] and account id themselves.
    pub fn new(
        config: SchedulerConfig,
        clients: ClientRegistry,
        account_id: String,
        cache: Option<Arc<dyn ResponseCache>>,
        sink: Arc<dyn Sink>,
    ) -> Result<Self> {
        config.validate()?;
        if config.regions.is_empty() {
            return Err(SchedulerError::NoRegions);
        }
        Ok(Self {
            config,
            clients,
            account_id,
            cache: cache.unwrap_or_else(|| Arc::new(NoCache)),
            sink,
        })
    }

    /// Runs Seed, Drive, and Shutdown in sequence; Init has already happened by the time a
    /// `Scheduler` exists.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<RunSummary> {
        let shutdown = CancellationToken::new();
        let resource_types = filtered_resource_types(&self.config.resource_types);

        info!(
            regions = ?self.config.regions,
            resource_type_count = resource_types.len(),
            workers = self.config.max_concurrent_workers,
            "starting enumeration run"
        );

        let limiter = crate::rate_limiter::RateGovernor::new(&self.config.regions, self.config.per_region_rate_limit);
        let total_expected = expected_count(&resource_types, self.config.regions.len());
        let ledger = CompletionLedger::new(total_expected);

        let metrics = if self.config.enable_debug_metrics {
            Some(Arc::new(DebugMetrics::new(&self.config.regions)))
        } else {
            None
        };

        let ctx = Arc::new(WorkerContext {
            clients: self.clients.clone(),
            limiter,
            cache: self.cache.clone(),
            sink: self.sink.clone(),
            ledger: ledger.clone(),
            account_id: self.account_id.clone(),
            max_retry_attempts: self.config.max_retry_attempts,
            shutdown: shutdown.clone(),
            metrics: metrics.clone(),
        });

        let queue_capacity = self.config.max_concurrent_workers.saturating_mul(2).max(2);
        let (tx, rx) = queue::channel(queue_capacity, ledger.clone());

        // --- Seed ---
        seed(&tx, &ledger, &resource_types, &self.config.regions).await;

        // --- Drive ---
        let mut workers = JoinSet::new();
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        for worker_id in 0..self.config.max_concurrent_workers {
            let ctx = ctx.clone();
            let tx = tx.clone();
            let rx = rx.clone();
            workers.spawn(worker::run_worker(worker_id, rx, tx, ctx));
        }

        let metrics_handle = metrics.map(|metrics| {
            let shutdown = shutdown.clone();
            tokio::spawn(metrics::run_reporter(metrics, TICK_PERIOD, shutdown))
        });

        let deadline = self.config.safety_deadline();
        let started_at = Instant::now();
        let mut ticker = tokio::time::interval(TICK_PERIOD);
        let (hit_safety_deadline, interrupted) = loop {
            tokio::select! {
                biased;
                signal = tokio::signal::ctrl_c() => {
                    if let Err(err) = signal {
                        warn!(%err, "failed to listen for ctrl-c, continuing without it");
                        continue;
                    }
                    info!("interrupt received, forcing shutdown");
                    break (false, true);
                }
                _ = ticker.tick() => {
                    let progress = ledger.progress();
                    if ledger.is_all_complete() {
                        break (false, false);
                    }
                    if started_at.elapsed() >= deadline {
                        warn!(
                            completed = progress.total_completed,
                            total = progress.total_expected,
                            "safety deadline exceeded, forcing shutdown"
                        );
                        break (true, false);
                    }
                }
            }
        };

        // --- Shutdown ---
        shutdown.cancel();
        drop(tx);
        while workers.join_next().await.is_some() {}
        if let Some(handle) = metrics_handle {
            handle.abort();
        }

        let progress = ledger.progress();
        Ok(RunSummary {
            total_expected: progress.total_expected,
            total_completed: progress.total_completed,
            hit_safety_deadline,
            interrupted,
        })
    }
}

/// Shuffles the filtered resource types, registers `expected` for each (type, non-skipped
/// region) pair, and offers the corresponding WorkItem.
async fn seed(
    tx: &queue::WorkQueueSender,
    ledger: &CompletionLedger,
    resource_types: &[&'static str],
    regions: &[String],
) {
    let mut shuffled = resource_types.to_vec();
    shuffled.shuffle(&mut rand::rng());

    for resource_type in shuffled {
        if is_global_service(resource_type) {
            let item = WorkItem::seed(resource_type, GLOBAL_SERVICE_REGION.to_string());
            ledger.add_expected(item.key());
            tx.offer(item).await;
        } else {
            for region in regions {
                let item = WorkItem::seed(resource_type, region.clone());
                ledger.add_expected(item.key());
                tx.offer(item).await;
            }
        }
    }
}

/// `totalExpected == Σ (isGlobal(t) ? 1 : |regions|)`.
fn expected_count(resource_types: &[&'static str], region_count: usize) -> usize {
    resource_types
        .iter()
        .map(|t| if is_global_service(t) { 1 } else { region_count })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use aws_config::{Region, SdkConfig};

    #[test]
    fn expected_count_matches_global_and_regional_mix() {
        let types: Vec<&'static str> = vec!["AWS::IAM::User", "AWS::S3::Bucket"];
        assert_eq!(expected_count(&types, 3), 1 + 3);
    }

    struct FakeAuth;

    #[async_trait]
    impl CloudAuth for FakeAuth {
        async fn get_config(&self, region: &str) -> Result<SdkConfig> {
            Ok(SdkConfig::builder().region(Region::new(region.to_string())).build())
        }

        async fn get_account_id(&self, _config: &SdkConfig) -> Result<String> {
            Ok("123456789012".to_string())
        }
    }

    #[tokio::test]
    async fn bootstrap_resolves_global_region_even_when_excluded_from_requested_regions() {
        // Default resource_types ("all") includes global-service types like AWS::IAM::*, so this
        // exercises exactly the path that used to fail with MissingClient when "us-east-1" wasn't
        // among the requested regions.
        let config = SchedulerConfig {
            regions: vec!["eu-west-1".to_string()],
            ..Default::default()
        };
        let (sink, _rx) = crate::sink::ChannelSink::new();

        let scheduler = Scheduler::bootstrap(config, &FakeAuth, None, Arc::new(sink)).await;

        assert!(scheduler.is_ok(), "bootstrap should succeed: {:?}", scheduler.err());
    }
}
