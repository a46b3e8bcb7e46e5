use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tracing::error;

use crate::work_item::ResourceTypeRegion;

/// The authoritative record of expected, in-flight, and completed work.
///
/// All four fields move together under one mutex. The naive "queue empty => done" check is
/// wrong because a worker can be mid-way through enqueueing a retry; `pending_retries` is what
/// lets [`CompletionLedger::is_all_complete`] only fire when there is provably no outstanding
/// work left for any key. `Clone` shares the same underlying ledger (it is an `Arc`), so every
/// worker and the Lifecycle Controller observe one another's updates.
#[derive(Debug, Clone)]
pub struct CompletionLedger {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    expected: HashSet<ResourceTypeRegion>,
    completed: HashSet<ResourceTypeRegion>,
    pending_retries: HashMap<ResourceTypeRegion, u32>,
    total_expected: usize,
    total_completed: usize,
}

/// Snapshot of ledger progress, cheap to copy out for the Lifecycle Controller's periodic tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub total_expected: usize,
    pub total_completed: usize,
}

impl CompletionLedger {
    /// Creates a ledger pre-sized to `total_expected`, computed up front from the filtered type
    /// list.
    pub fn new(total_expected: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                total_expected,
                ..Inner::default()
            })),
        }
    }

    /// Idempotent: registering the same key twice has no further effect, but any seeding
    /// overrun past `total_expected` is logged as a bug (invariant 3).
    pub fn add_expected(&self, key: ResourceTypeRegion) {
        let mut inner = self.inner.lock().expect("ledger mutex poisoned");
        let inserted = inner.expected.insert(key);
        if inserted && inner.expected.len() > inner.total_expected {
            error!(
                expected_len = inner.expected.len(),
                total_expected = inner.total_expected,
                "expected set grew past the precomputed total -- seeding bug"
            );
        }
    }

    pub fn add_pending_retry(&self, key: &ResourceTypeRegion) {
        let mut inner = self.inner.lock().expect("ledger mutex poisoned");
        *inner.pending_retries.entry(key.clone()).or_insert(0) += 1;
    }

    /// Decrements with a floor of zero -- a dropped-offer path and a successful-retry path can
    /// race to remove the same pending retry, and neither should go negative.
    pub fn remove_pending_retry(&self, key: &ResourceTypeRegion) {
        let mut inner = self.inner.lock().expect("ledger mutex poisoned");
        if let Some(count) = inner.pending_retries.get_mut(key) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                inner.pending_retries.remove(key);
            }
        }
    }

    /// Marks `key` completed iff it is expected, not already completed, and has no outstanding
    /// pending retries (P1, P2). Never double-counts.
    pub fn mark_completed(&self, key: &ResourceTypeRegion) {
        let mut inner = self.inner.lock().expect("ledger mutex poisoned");
        let pending = inner.pending_retries.get(key).copied().unwrap_or(0);
        if pending > 0 {
            return;
        }
        if !inner.expected.contains(key) {
            return;
        }
        if inner.completed.insert(key.clone()) {
            inner.total_completed += 1;
        }
    }

    pub fn is_all_complete(&self) -> bool {
        let inner = self.inner.lock().expect("ledger mutex poisoned");
        inner.total_expected > 0 && inner.total_completed >= inner.total_expected
    }

    pub fn progress(&self) -> Progress {
        let inner = self.inner.lock().expect("ledger mutex poisoned");
        Progress {
            total_expected: inner.total_expected,
            total_completed: inner.total_completed,
        }
    }

    pub fn pending_retry_count(&self, key: &ResourceTypeRegion) -> u32 {
        let inner = self.inner.lock().expect("ledger mutex poisoned");
        inner.pending_retries.get(key).copied().unwrap_or(0)
    }
}
