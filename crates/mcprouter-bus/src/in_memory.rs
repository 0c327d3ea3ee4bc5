// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::{Envelope, MessageBus, Subscription, UnsubscribeHandle};

/// Ring buffer capacity per topic. Generous enough that a normally
/// paced subscriber never lags; a lagging subscriber resynchronizes
/// rather than erroring (see [`Subscription::recv`]).
const TOPIC_CAPACITY: usize = 1024;

/// The in-memory [`MessageBus`] implementation.
#[derive(Clone, Default)]
pub struct InMemoryBus {
    topics: Arc<DashMap<String, broadcast::Sender<Envelope>>>,
}

impl InMemoryBus {
    /// Construct an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    fn sender_for(&self, topic: &str) -> broadcast::Sender<Envelope> {
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .clone()
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    fn publish(&self, envelope: Envelope) {
        let sender = self.sender_for(&envelope.topic);
        // No live subscribers is not an error: a worker may not have
        // subscribed yet, or the message is fire-and-forget.
        let _ = sender.send(envelope);
    }

    async fn subscribe(&self, topic: &str) -> Subscription {
        let sender = self.sender_for(topic);
        Subscription::new(sender.subscribe())
    }

    fn subscribe_with_handler(
        &self,
        topic: &str,
        handler: Arc<dyn Fn(Envelope) + Send + Sync>,
    ) -> UnsubscribeHandle {
        let sender = self.sender_for(topic);
        let mut receiver = sender.subscribe();
        let join = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(envelope) => handler(envelope),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        UnsubscribeHandle {
            abort: join.abort_handle(),
        }
    }

    async fn subscribe_once(
        &self,
        topic: &str,
        correlation_id: &str,
        cancel: CancellationToken,
    ) -> Option<Envelope> {
        let mut subscription = self.subscribe(topic).await;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                envelope = subscription.recv() => {
                    match envelope {
                        None => return None,
                        Some(envelope) => {
                            if envelope.correlation_id.as_deref() == Some(correlation_id) {
                                return Some(envelope);
                            }
                            // Not our correlation id; keep waiting.
                        }
                    }
                }
            }
        }
    }
}
