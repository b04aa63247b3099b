//! Arrival announcements.
//!
//! The producer side of the gate: once an artifact lands in the store,
//! its locator is published to the arrivals topic so waiting gates can
//! resolve without polling again.

use crate::error::TransportError;
use crate::gate::arrival::ArrivalNotice;
use crate::services::broker::Broker;

/// Publish an artifact locator to the given topic.
pub async fn announce_arrival(
    broker: &dyn Broker,
    topic: &str,
    container: &str,
    key: &str,
) -> Result<(), TransportError> {
    let notice = ArrivalNotice {
        bucket_name: container.to_string(),
        object_key: key.to_string(),
    };
    let payload = serde_json::to_vec(&notice)
        .map_err(|e| TransportError::Connect(format!("unencodable arrival notice: {e}")))?;
    broker.publish(topic, payload.into()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::broker::MemoryBroker;

    #[tokio::test]
    async fn announcement_carries_the_locator() {
        let broker = MemoryBroker::new();
        let mut sub = broker.subscribe("arrivals/+").await.unwrap();

        announce_arrival(&broker, "arrivals/7", "bucket", "item.json")
            .await
            .unwrap();

        let delivery = sub.recv().await.unwrap();
        let notice: serde_json::Value = serde_json::from_slice(&delivery.payload).unwrap();
        assert_eq!(notice["bucketName"], "bucket");
        assert_eq!(notice["objectKey"], "item.json");
    }
}
