//! The arrival race: broker push against a direct existence poll.
//!
//! State machine: `Idle -> Subscribing -> Armed -> Resolved | Aborted`.
//! Subscribing must succeed before anything else runs. Once armed, a
//! one-shot existence poll and the subscription listener race; whichever
//! delivers a locator first resolves the gate and cancels the other. The
//! gate itself waits cooperatively, checking a completion flag at a fixed
//! interval so transport delivery keeps running underneath.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::GateError;
use crate::services::broker::Broker;
use crate::services::store::ObjectStore;

/// Fixed cadence of the completion-flag check. Not configurable.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Locator of the artifact that satisfied the gate, whichever path
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrivalResult {
    pub container_id: String,
    pub object_key: String,
}

/// Wire shape of an arrival notification payload.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ArrivalNotice {
    #[serde(rename = "bucketName")]
    pub bucket_name: String,
    #[serde(rename = "objectKey")]
    pub object_key: String,
}

/// One-shot gate deciding when a deferred stream may start.
#[derive(Clone)]
pub struct ArrivalGate {
    waiting: Arc<AtomicBool>,
    slot: Arc<Mutex<Option<ArrivalResult>>>,
}

impl Default for ArrivalGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ArrivalGate {
    pub fn new() -> Self {
        Self {
            waiting: Arc::new(AtomicBool::new(true)),
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Stop the wait loop. Safe to call from either completion path; a
    /// second call is a no-op.
    pub fn abort(&self) {
        self.waiting.store(false, Ordering::SeqCst);
    }

    /// Record a locator and end the wait. The first delivery wins.
    fn deliver(&self, result: ArrivalResult) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.get_or_insert(result);
        }
        self.abort();
    }

    /// Race the subscription path against a direct existence poll.
    ///
    /// Subscription failure propagates as a fatal `TransportError`.
    /// Existence-poll failures are swallowed; the gate then waits on the
    /// subscription alone, bounded by `deadline`.
    pub async fn wait_for_arrival(
        &self,
        broker: &dyn Broker,
        store: Arc<dyn ObjectStore>,
        topic_filter: &str,
        container: &str,
        key: &str,
        deadline: Duration,
    ) -> Result<ArrivalResult, GateError> {
        // Idle -> Subscribing.
        let mut subscription = broker.subscribe(topic_filter).await?;
        tracing::debug!(topic_filter, "subscription open");

        // Listener records the first delivery carrying a locator.
        let listener = {
            let gate = self.clone();
            tokio::spawn(async move {
                while let Some(delivery) = subscription.recv().await {
                    match serde_json::from_slice::<ArrivalNotice>(&delivery.payload) {
                        Ok(notice) => {
                            tracing::debug!(topic = %delivery.topic, key = %notice.object_key, "arrival notified");
                            gate.deliver(ArrivalResult {
                                container_id: notice.bucket_name,
                                object_key: notice.object_key,
                            });
                            break;
                        }
                        Err(error) => {
                            tracing::warn!(%error, topic = %delivery.topic, "ignoring malformed arrival payload");
                        }
                    }
                }
            })
        };

        // Subscribing -> Armed: one direct existence check. Success
        // synthesizes an arrival with the locator already known from the
        // request; failure of any kind leaves the subscription path as
        // the sole resolver.
        let poll = {
            let gate = self.clone();
            let container = container.to_string();
            let key = key.to_string();
            tokio::spawn(async move {
                match store.head_exists(&container, &key).await {
                    Ok(true) => {
                        tracing::debug!(%container, %key, "artifact already present; skipping the wait");
                        gate.deliver(ArrivalResult {
                            container_id: container,
                            object_key: key,
                        });
                    }
                    Ok(false) => {
                        tracing::debug!(%container, %key, "artifact not yet present");
                    }
                    Err(error) => {
                        tracing::debug!(%error, "existence poll failed; waiting on subscription");
                    }
                }
            })
        };

        // Armed: cooperative wait on the completion flag.
        let started = Instant::now();
        while self.waiting.load(Ordering::SeqCst) {
            if started.elapsed() >= deadline {
                self.abort();
                listener.abort();
                poll.abort();
                return Err(GateError::Timeout(deadline));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        // Resolved or Aborted: cancel the loser, drop the subscription.
        listener.abort();
        poll.abort();

        let result = self
            .slot
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())
            .ok_or(GateError::Aborted)?;
        Ok(result)
    }
}
