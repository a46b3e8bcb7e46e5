//! The Worker Pool: a fixed set of tasks draining the Work Queue, each one cache-checking,
//! rate-limiting, calling Cloud Control, emitting records, and updating the Completion Tracker.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace, warn};

use crate::cache::ResponseCache;
use crate::client_registry::{ClientRegistry, CloudControlClient, ListResourcesError};
use crate::ledger::CompletionLedger;
use crate::metrics::DebugMetrics;
use crate::queue::{WorkQueueReceiver, WorkQueueSender};
use crate::rate_limiter::RateGovernor;
use crate::registry::is_global_service;
use crate::resource::EnrichedResource;
use crate::sink::Sink;
use crate::work_item::WorkItem;

/// Everything a worker needs, shared read-only across the whole pool: the client registry and
/// limiter maps are immutable after init and support free concurrent reads.
pub struct WorkerContext {
    pub clients: ClientRegistry,
    pub limiter: RateGovernor,
    pub cache: Arc<dyn ResponseCache>,
    pub sink: Arc<dyn Sink>,
    pub ledger: CompletionLedger,
    pub account_id: String,
    pub max_retry_attempts: u32,
    pub shutdown: CancellationToken,
    /// `None` when `enable-debug-metrics` is off; avoids atomic traffic on the hot path when
    /// nobody is reading the counters.
    pub metrics: Option<Arc<DebugMetrics>>,
}

/// Runs one worker's receive loop until the queue closes or shutdown fires.
///
/// `rx` is shared by the whole pool behind a mutex -- only one worker at a time is actually
/// waiting on the channel, but the lock is dropped before processing so receiving the next item
/// never waits on a sibling's API call.
pub async fn run_worker(
    worker_id: usize,
    rx: Arc<tokio::sync::Mutex<WorkQueueReceiver>>,
    tx: WorkQueueSender,
    ctx: Arc<WorkerContext>,
) {
    loop {
        let item = {
            let mut guard = rx.lock().await;
            guard.recv(&ctx.shutdown).await
        };
        let Some(item) = item else {
            debug!(worker_id, "worker exiting, queue closed or shutdown observed");
            return;
        };
        process_item(worker_id, item, &tx, &ctx).await;
    }
}

#[instrument(skip(tx, ctx), fields(worker_id, resource_type = item.resource_type, region = %item.region, attempt = item.attempt))]
async fn process_item(worker_id: usize, item: WorkItem, tx: &WorkQueueSender, ctx: &WorkerContext) {
    let key = item.key();
    let client_key = item.client_key();

    let client = match ctx.clients.get(&client_key) {
        Ok(client) => client,
        Err(err) => {
            warn!(%err, "no client registered, marking key completed");
            ctx.ledger.mark_completed(&key);
            return;
        }
    };

    let cache_hit = ctx.cache.hit(item.resource_type, &item.region).await;
    if !cache_hit {
        // A cache hit bypasses the rate limiter entirely; otherwise cached reads would be
        // needlessly capped at the same R tokens/sec as live calls.
        if ctx
            .limiter
            .wait_for_rate_limit(&item.region, &ctx.shutdown)
            .await
            .is_err()
        {
            trace!(worker_id, "shutdown observed while waiting for rate limit");
            return;
        }
    }

    let mut page_token = None;
    loop {
        if let Some(metrics) = &ctx.metrics {
            metrics.record_dispatch(&item.region);
        }
        let page = match client.list_resources(item.resource_type, page_token.clone()).await {
            Ok(page) => page,
            Err(ListResourcesError::Throttling { message }) => {
                handle_throttling(&item, &message, tx, ctx).await;
                return;
            }
            Err(ListResourcesError::NonRetryable { message }) => {
                warn!(error = %message, "non-retryable enumeration error, marking key completed");
                if item.attempt > 0 {
                    ctx.ledger.remove_pending_retry(&key);
                }
                ctx.ledger.mark_completed(&key);
                return;
            }
        };

        let region_for_record = if is_global_service(item.resource_type) {
            String::new()
        } else {
            item.region.clone()
        };
        for resource in page.resources {
            ctx.sink
                .emit(EnrichedResource::new(
                    resource.identifier,
                    item.resource_type,
                    region_for_record.clone(),
                    ctx.account_id.clone(),
                    resource.properties,
                ))
                .await;
        }

        match page.next_token {
            Some(next) => page_token = Some(next),
            None => break,
        }
    }

    if item.attempt > 0 {
        ctx.ledger.remove_pending_retry(&key);
    }
    ctx.ledger.mark_completed(&key);
}

/// Throttling branch of the error classifier. Bounded by `max_retry_attempts`;
/// exceeding the cap degrades to a non-retryable failure rather than retrying forever.
async fn handle_throttling(item: &WorkItem, message: &str, tx: &WorkQueueSender, ctx: &WorkerContext) {
    let key = item.key();
    trace!(error = %message, attempt = item.attempt, "throttled");

    if item.attempt >= ctx.max_retry_attempts {
        warn!(
            attempts = item.attempt,
            "retry cap exceeded, treating as non-retryable"
        );
        if item.attempt > 0 {
            ctx.ledger.remove_pending_retry(&key);
        }
        ctx.ledger.mark_completed(&key);
        return;
    }

    ctx.ledger.add_pending_retry(&key);

    // Observe shutdown before enqueueing: a retry that loses the race with shutdown must be
    // skipped, not counted, and not completed.
    if ctx.shutdown.is_cancelled() {
        ctx.ledger.remove_pending_retry(&key);
        return;
    }

    let retry_item = item.retry();
    tx.offer(retry_item).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::NoCache;
    use crate::client_registry::{CloudControlClient, ListResourcesPage, ResourceDescription};
    use crate::queue;
    use crate::sink::ChannelSink;
    use crate::work_item::ClientKey;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct SingleCallClient {
        calls: AtomicU32,
    }

    #[async_trait]
    impl CloudControlClient for SingleCallClient {
        async fn list_resources(
            &self,
            _type_name: &str,
            _page_token: Option<String>,
        ) -> Result<ListResourcesPage, ListResourcesError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ListResourcesPage {
                resources: vec![ResourceDescription {
                    identifier: "my-bucket".to_string(),
                    properties: "{}".to_string(),
                }],
                next_token: None,
            })
        }
    }

    struct AlwaysThrottleClient;

    #[async_trait]
    impl CloudControlClient for AlwaysThrottleClient {
        async fn list_resources(
            &self,
            _type_name: &str,
            _page_token: Option<String>,
        ) -> Result<ListResourcesPage, ListResourcesError> {
            Err(ListResourcesError::Throttling {
                message: "ThrottlingException".to_string(),
            })
        }
    }

    fn ctx_with(
        client: Arc<dyn CloudControlClient>,
        ledger: CompletionLedger,
        sink: Arc<dyn Sink>,
    ) -> Arc<WorkerContext> {
        let mut clients = HashMap::new();
        clients.insert(ClientKey::new("AWS::S3::Bucket", "us-east-1"), client);
        Arc::new(WorkerContext {
            clients: ClientRegistry::new(clients),
            limiter: RateGovernor::new(&["us-east-1".to_string()], 100),
            cache: Arc::new(NoCache),
            sink,
            ledger,
            account_id: "123456789012".to_string(),
            max_retry_attempts: 3,
            shutdown: CancellationToken::new(),
            metrics: None,
        })
    }

    #[tokio::test]
    async fn successful_item_emits_and_completes() {
        let key = WorkItem::seed("AWS::S3::Bucket", "us-east-1".to_string()).key();
        let ledger = CompletionLedger::new(1);
        ledger.add_expected(key.clone());

        let (sink, mut rx) = ChannelSink::new();
        let client = Arc::new(SingleCallClient { calls: AtomicU32::new(0) });
        let ctx = ctx_with(client, ledger.clone(), Arc::new(sink));
        let (tx, _qrx) = queue::channel(4, ledger.clone());

        let item = WorkItem::seed("AWS::S3::Bucket", "us-east-1".to_string());
        process_item(0, item, &tx, &ctx).await;

        assert_eq!(ledger.progress().total_completed, 1);
        let emitted = rx.recv().await.expect("a record should be emitted");
        assert_eq!(emitted.identifier, "my-bucket");
    }

    #[tokio::test]
    async fn throttled_item_is_requeued_with_incremented_attempt() {
        let key = WorkItem::seed("AWS::S3::Bucket", "us-east-1".to_string()).key();
        let ledger = CompletionLedger::new(1);
        ledger.add_expected(key.clone());

        let (sink, _rx) = ChannelSink::new();
        let ctx = ctx_with(Arc::new(AlwaysThrottleClient), ledger.clone(), Arc::new(sink));
        let (tx, mut qrx) = queue::channel(4, ledger.clone());

        let item = WorkItem::seed("AWS::S3::Bucket", "us-east-1".to_string());
        process_item(0, item, &tx, &ctx).await;

        assert_eq!(ledger.pending_retry_count(&key), 1);
        assert_eq!(ledger.progress().total_completed, 0);

        let shutdown = CancellationToken::new();
        let retried = qrx.recv(&shutdown).await.expect("a retry should be enqueued");
        assert_eq!(retried.attempt, 1);
    }

    #[tokio::test]
    async fn throttled_item_past_shutdown_is_skipped_not_completed() {
        let key = WorkItem::seed("AWS::S3::Bucket", "us-east-1".to_string()).key();
        let ledger = CompletionLedger::new(1);
        ledger.add_expected(key.clone());

        let (sink, _rx) = ChannelSink::new();
        let ctx = ctx_with(Arc::new(AlwaysThrottleClient), ledger.clone(), Arc::new(sink));
        ctx.shutdown.cancel();
        let (tx, _qrx) = queue::channel(4, ledger.clone());

        let item = WorkItem::seed("AWS::S3::Bucket", "us-east-1".to_string());
        process_item(0, item, &tx, &ctx).await;

        assert_eq!(ledger.pending_retry_count(&key), 0);
        assert_eq!(ledger.progress().total_completed, 0);
    }

    #[tokio::test]
    async fn retry_cap_exceeded_marks_completed_without_requeue() {
        let key = WorkItem::seed("AWS::S3::Bucket", "us-east-1".to_string()).key();
        let ledger = CompletionLedger::new(1);
        ledger.add_expected(key.clone());

        let (sink, _rx) = ChannelSink::new();
        let ctx = ctx_with(Arc::new(AlwaysThrottleClient), ledger.clone(), Arc::new(sink));
        let (tx, mut qrx) = queue::channel(4, ledger.clone());

        let mut item = WorkItem::seed("AWS::S3::Bucket", "us-east-1".to_string());
        item.attempt = ctx.max_retry_attempts;
        process_item(0, item, &tx, &ctx).await;

        assert_eq!(ledger.progress().total_completed, 1);
        let shutdown = CancellationToken::new();
        let result = tokio::time::timeout(std::time::Duration::from_millis(50), qrx.recv(&shutdown)).await;
        assert!(result.is_err(), "no retry should have been enqueued");
    }
}
