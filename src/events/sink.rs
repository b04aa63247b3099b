//! Push-based frame output channel.

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::GatewayError;

/// Frames buffered before the sender suspends.
const DEFAULT_CAPACITY: usize = 32;

/// Write half of the response channel.
///
/// Dropping the sink closes the channel, which terminates the HTTP
/// response stream on the read side.
pub struct FrameSink {
    tx: mpsc::Sender<Bytes>,
}

impl FrameSink {
    /// Create a sink and the receiver that feeds the response body.
    pub fn channel() -> (Self, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(DEFAULT_CAPACITY);
        (Self { tx }, rx)
    }

    /// Push one encoded frame; suspends until the channel accepts it.
    pub async fn send(&self, frame: Bytes) -> Result<(), GatewayError> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| GatewayError::SinkClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_fails_after_receiver_dropped() {
        let (sink, rx) = FrameSink::channel();
        drop(rx);
        let err = sink.send(Bytes::from_static(b"frame")).await.unwrap_err();
        assert!(matches!(err, GatewayError::SinkClosed));
    }

    #[tokio::test]
    async fn dropping_sink_closes_channel() {
        let (sink, mut rx) = FrameSink::channel();
        sink.send(Bytes::from_static(b"one")).await.unwrap();
        drop(sink);
        assert_eq!(rx.recv().await.unwrap(), Bytes::from_static(b"one"));
        assert!(rx.recv().await.is_none());
    }
}
