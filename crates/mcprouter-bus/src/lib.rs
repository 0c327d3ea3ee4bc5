// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! A typed, topic-addressed publish/subscribe bus.
//!
//! The in-memory implementation here is sufficient for a single-process
//! router; [`MessageBus`] is the seam an external broker would
//! implement if the router ever grew one (Non-goal for this crate, per
//! ).
//!
//! Ordering: within a topic, messages from a single publisher are
//! delivered FIFO to every subscriber (backed by `tokio::sync::broadcast`,
//! which preserves send order per channel). Ordering across publishers
//! to the same topic is unspecified, matching 

mod envelope;
mod in_memory;

pub use envelope::Envelope;
pub use in_memory::InMemoryBus;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// A live subscription to a topic. Dropping it unsubscribes.
pub struct Subscription {
    receiver: tokio::sync::broadcast::Receiver<Envelope>,
}

impl Subscription {
    fn new(receiver: tokio::sync::broadcast::Receiver<Envelope>) -> Self {
        Self { receiver }
    }

    /// Wait for the next envelope published on this subscription's
    /// topic. Returns `None` if the publisher side has been torn down.
    ///
    /// A lagged subscriber (the channel's ring buffer overflowed before
    /// it could keep up) resynchronizes by skipping ahead rather than
    /// erroring, since this bus models best-effort fan-out, not a
    /// durable log.
    pub async fn recv(&mut self) -> Option<Envelope> {
        loop {
            match self.receiver.recv().await {
                Ok(envelope) => return Some(envelope),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "bus subscriber lagged, resynchronizing");
                    continue;
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Handle returned by [`MessageBus::subscribe_with_handler`]. Calling
/// `unsubscribe` (or dropping the handle) stops the handler task;
/// both are idempotent.
pub struct UnsubscribeHandle {
    abort: tokio::task::AbortHandle,
}

impl UnsubscribeHandle {
    /// Stop the handler task. Safe to call more than once.
    pub fn unsubscribe(&self) {
        self.abort.abort();
    }
}

impl Drop for UnsubscribeHandle {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

/// A typed publish/subscribe bus addressed by topic, with a one-shot
/// correlation-id subscription primitive used by the registration
/// pipeline.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publish an envelope on its topic.
    fn publish(&self, envelope: Envelope);

    /// Subscribe to every envelope published on `topic`.
    async fn subscribe(&self, topic: &str) -> Subscription;

    /// Subscribe to `topic`, invoking `handler` for every envelope
    /// until `unsubscribe` is called or the returned handle is dropped.
    fn subscribe_with_handler(
        &self,
        topic: &str,
        handler: std::sync::Arc<dyn Fn(Envelope) + Send + Sync>,
    ) -> UnsubscribeHandle;

    /// Subscribe to `topic` for a single envelope whose
    /// `correlation_id` equals `correlation_id`, waiting until either:
    /// - a matching envelope arrives (returns `Some`), or
    /// - `cancel` fires first (returns `None`).
    ///
    /// The subscription is released in both cases before returning.
    async fn subscribe_once(
        &self,
        topic: &str,
        correlation_id: &str,
        cancel: CancellationToken,
    ) -> Option<Envelope>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn subscribe_receives_published_envelope() {
        let bus = InMemoryBus::new();
        let mut sub = bus.subscribe("topic").await;
        bus.publish(Envelope::new("topic", serde_json::json!({"x": 1})));
        let got = sub.recv().await.unwrap();
        assert_eq!(got.topic, "topic");
        assert_eq!(got.payload["x"], 1);
    }

    #[tokio::test]
    async fn fifo_within_one_publisher() {
        let bus = InMemoryBus::new();
        let mut sub = bus.subscribe("topic").await;
        for i in 0..5 {
            bus.publish(Envelope::new("topic", serde_json::json!(i)));
        }
        for i in 0..5 {
            assert_eq!(sub.recv().await.unwrap().payload, serde_json::json!(i));
        }
    }

    #[tokio::test]
    async fn subscribe_once_fires_exactly_once_for_matching_correlation() {
        let bus = InMemoryBus::new();
        let cancel = CancellationToken::new();
        let bus2 = bus.clone();
        let waiter = tokio::spawn(async move {
            bus2.subscribe_once("results", "corr-1", cancel).await
        });

        // Give the waiter time to subscribe before we publish.
        tokio::time::sleep(Duration::from_millis(20)).await;
        bus.publish(Envelope::with_correlation(
            "results",
            "corr-other",
            serde_json::json!("ignored"),
        ));
        bus.publish(Envelope::with_correlation(
            "results",
            "corr-1",
            serde_json::json!("matched"),
        ));

        let result = waiter.await.unwrap();
        assert_eq!(result.unwrap().payload, serde_json::json!("matched"));
    }

    #[tokio::test]
    async fn subscribe_once_returns_none_on_cancellation() {
        let bus = InMemoryBus::new();
        let cancel = CancellationToken::new();
        let cancel2 = cancel.clone();
        let bus2 = bus.clone();
        let waiter = tokio::spawn(async move {
            bus2.subscribe_once("results", "corr-1", cancel2).await
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();

        let result = waiter.await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn subscribe_with_handler_invokes_for_each_message() {
        let bus = InMemoryBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        let _unsub = bus.subscribe_with_handler(
            "topic",
            Arc::new(move |_env| {
                count2.fetch_add(1, Ordering::SeqCst);
            }),
        );

        bus.publish(Envelope::new("topic", serde_json::json!(1)));
        bus.publish(Envelope::new("topic", serde_json::json!(2)));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unsubscribe_stops_handler_invocations() {
        let bus = InMemoryBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        let unsub = bus.subscribe_with_handler(
            "topic",
            Arc::new(move |_env| {
                count2.fetch_add(1, Ordering::SeqCst);
            }),
        );

        bus.publish(Envelope::new("topic", serde_json::json!(1)));
        tokio::time::sleep(Duration::from_millis(20)).await;
        unsub.unsubscribe();
        bus.publish(Envelope::new("topic", serde_json::json!(2)));
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
