use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{Quota, RateLimiter as GovernorRateLimiter};
use tokio_util::sync::CancellationToken;
use tracing::trace;

type DirectLimiter = GovernorRateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// One token bucket per region, rate == burst == R tokens/sec. Built once at init from the
/// region list and never mutated afterwards -- only ever read concurrently.
#[derive(Debug, Clone)]
pub struct RateGovernor {
    limiters: Arc<HashMap<String, DirectLimiter>>,
}

impl RateGovernor {
    pub fn new(regions: &[String], rate_per_second: u32) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(rate_per_second).expect("rate_per_second validated to be >= 1"),
        );
        let limiters = regions
            .iter()
            .map(|region| (region.clone(), GovernorRateLimiter::direct(quota)))
            .collect();
        Self {
            limiters: Arc::new(limiters),
        }
    }

    /// Blocks the caller until one token is available for `region`, or returns `Err(())` if the
    /// shutdown signal fires first. A region with no limiter (misconfiguration -- it was never
    /// part of the configured region list) returns immediately rather than blocking forever.
    pub async fn wait_for_rate_limit(
        &self,
        region: &str,
        shutdown: &CancellationToken,
    ) -> Result<(), Cancelled> {
        let Some(limiter) = self.limiters.get(region) else {
            trace!(region, "no rate limiter configured for region, passing through");
            return Ok(());
        };

        tokio::select! {
            biased;
            () = shutdown.cancelled() => Err(Cancelled),
            () = limiter.until_ready() => Ok(()),
        }
    }
}

/// The shutdown signal fired while a worker was waiting for a rate-limiter token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;
