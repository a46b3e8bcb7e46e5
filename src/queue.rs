//! The Work Queue: a bounded channel of [`WorkItem`]s with non-blocking offer, one short retry
//! on full, and drop-and-log (with ledger bookkeeping) on a second failure.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::ledger::CompletionLedger;
use crate::work_item::WorkItem;

/// One short retry on a full queue before giving up.
const OFFER_RETRY_DELAY: Duration = Duration::from_millis(25);

#[derive(Clone)]
pub struct WorkQueueSender {
    tx: mpsc::Sender<WorkItem>,
    ledger: CompletionLedger,
}

pub struct WorkQueueReceiver {
    rx: mpsc::Receiver<WorkItem>,
}

/// Builds the bounded channel. Capacity should be at least 2x the worker pool size so a burst
/// of simultaneous retries doesn't immediately start dropping work.
pub fn channel(capacity: usize, ledger: CompletionLedger) -> (WorkQueueSender, WorkQueueReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (WorkQueueSender { tx, ledger }, WorkQueueReceiver { rx })
}

impl WorkQueueSender {
    /// Non-blocking offer with one ≈25ms retry on a full queue. A second failure is a drop: the
    /// item's pending-retry count is decremented so the ledger can still reach completion for
    /// that key -- dropping a retry must never leave a key permanently un-completable.
    pub async fn offer(&self, item: WorkItem) {
        if let Err(mpsc::error::TrySendError::Full(item)) = self.tx.try_send(item) {
            tokio::time::sleep(OFFER_RETRY_DELAY).await;
            if let Err(mpsc::error::TrySendError::Full(item) | mpsc::error::TrySendError::Closed(item)) =
                self.tx.try_send(item)
            {
                warn!(
                    resource_type = item.resource_type,
                    region = %item.region,
                    attempt = item.attempt,
                    "work queue full on retry, dropping item"
                );
                self.ledger.remove_pending_retry(&item.key());
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl WorkQueueReceiver {
    /// Blocks for the next item, selecting on `shutdown` so a worker parked here wakes up
    /// promptly instead of only noticing shutdown on its next successful receive.
    pub async fn recv(&mut self, shutdown: &CancellationToken) -> Option<WorkItem> {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => None,
            item = self.rx.recv() => item,
        }
    }
}
