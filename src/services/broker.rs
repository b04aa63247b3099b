//! Pub/sub broker contract.
//!
//! # Responsibilities
//! - Open subscriptions against a topic filter
//! - Publish payloads to a topic
//!
//! # Design Decisions
//! - Topic filters use MQTT-style `+` (one level) and `#` (remainder)
//!   wildcards
//! - `MemoryBroker` fans out over per-subscription mpsc channels; closed
//!   subscriptions are pruned on the next publish

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::error::TransportError;

/// Deliveries buffered per subscription before publishers suspend.
const SUBSCRIPTION_CAPACITY: usize = 16;

/// One message delivered to a subscription.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub topic: String,
    pub payload: Bytes,
}

/// Receive half of an open subscription. Dropping it tears the
/// subscription down.
pub struct Subscription {
    rx: mpsc::Receiver<Delivery>,
}

impl Subscription {
    /// Wait for the next delivery; `None` once the session is closed.
    pub async fn recv(&mut self) -> Option<Delivery> {
        self.rx.recv().await
    }
}

/// Narrow broker contract consumed by the arrival gate.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Open a subscription. Must succeed before the caller continues;
    /// failure is fatal for the request.
    async fn subscribe(&self, topic_filter: &str) -> Result<Subscription, TransportError>;

    /// Publish a payload to a topic.
    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), TransportError>;
}

/// Returns true if an MQTT-style filter matches a concrete topic.
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');
    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => continue,
            (Some(f), Some(t)) if f == t => continue,
            (None, None) => return true,
            _ => return false,
        }
    }
}

/// In-process broker for local runs and tests.
#[derive(Default)]
pub struct MemoryBroker {
    subscribers: Mutex<Vec<(String, mpsc::Sender<Delivery>)>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn subscribe(&self, topic_filter: &str) -> Result<Subscription, TransportError> {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_CAPACITY);
        let mut subscribers = self
            .subscribers
            .lock()
            .map_err(|_| TransportError::Connect("broker state poisoned".into()))?;
        subscribers.push((topic_filter.to_string(), tx));
        Ok(Subscription { rx })
    }

    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), TransportError> {
        let targets: Vec<mpsc::Sender<Delivery>> = {
            let mut subscribers = self
                .subscribers
                .lock()
                .map_err(|_| TransportError::Connect("broker state poisoned".into()))?;
            subscribers.retain(|(_, tx)| !tx.is_closed());
            subscribers
                .iter()
                .filter(|(filter, _)| topic_matches(filter, topic))
                .map(|(_, tx)| tx.clone())
                .collect()
        };

        for tx in targets {
            let delivery = Delivery {
                topic: topic.to_string(),
                payload: payload.clone(),
            };
            // A receiver dropped mid-send is not a publish failure.
            let _ = tx.send(delivery).await;
        }
        Ok(())
    }
}
