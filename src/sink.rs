//! The output boundary: a chain/link framework downstream of this crate is explicitly out of
//! scope, so `Sink` is the entire contract a worker needs to hand off a resource -- emission
//! must never block core progress on a slow or backpressured consumer.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::warn;

use crate::resource::EnrichedResource;

/// Receives one [`EnrichedResource`] at a time. Implementations decide what "emit" means --
/// write to stdout, push onto a channel, forward into a larger pipeline -- the core only needs
/// the call to return.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn emit(&self, resource: EnrichedResource);
}

/// Forwards every resource onto an unbounded channel. Unbounded because a slow consumer must
/// never cause `emit` to apply backpressure onto a worker holding a rate-limiter token; a
/// channel send failing just means nothing is listening anymore, which is logged, not
/// propagated as a worker error.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<EnrichedResource>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<EnrichedResource>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Sink for ChannelSink {
    async fn emit(&self, resource: EnrichedResource) {
        if self.tx.send(resource).is_err() {
            warn!("sink receiver dropped; discarding resource");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EnrichedResource {
        EnrichedResource::new("my-bucket", "AWS::S3::Bucket", "us-east-1", "123456789012", "{}")
    }

    #[tokio::test]
    async fn channel_sink_forwards_resources() {
        let (sink, mut rx) = ChannelSink::new();
        sink.emit(sample()).await;
        let received = rx.recv().await.expect("resource should be forwarded");
        assert_eq!(received.identifier, "my-bucket");
    }

    #[tokio::test]
    async fn channel_sink_does_not_panic_when_receiver_dropped() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.emit(sample()).await;
    }
}
