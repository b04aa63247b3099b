//! Error types for the gateway.
//!
//! # Design Decisions
//! - One enum per failure domain (codec, gate, upstream, store), folded
//!   into `GatewayError` at the streaming loop boundary
//! - Codec errors are rejected before any partial frame reaches the wire
//! - Existence-poll errors are swallowed by the gate (see `gate::arrival`),
//!   so `StoreError` only surfaces from the post-arrival fetch

use std::time::Duration;
use thiserror::Error;

/// Errors produced by the event-stream frame codec.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A header name or value does not fit its single-byte length prefix.
    #[error("header field {name:?} is {len} bytes, limit is 255")]
    HeaderTooLong { name: String, len: usize },

    /// Fewer bytes than a minimal frame (prelude + trailing CRC).
    #[error("frame truncated: need {needed} bytes, have {have}")]
    Truncated { needed: usize, have: usize },

    /// The prelude length fields disagree with the buffer.
    #[error("frame length fields are inconsistent with the buffer")]
    LengthMismatch,

    /// A header entry is not followed by the `0x0700` separator.
    #[error("bad header separator {0:#06x}")]
    Separator(u16),

    #[error("prelude checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    PreludeChecksum { stored: u32, computed: u32 },

    #[error("message checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    MessageChecksum { stored: u32, computed: u32 },

    /// The payload is not the `{"bytes": "<base64>"}` envelope.
    #[error("payload is not the expected JSON envelope: {0}")]
    Envelope(#[from] serde_json::Error),

    #[error("payload envelope carries invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("frame text is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Broker session and subscription failures. Always fatal for the request.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("broker session could not be established: {0}")]
    Connect(String),

    #[error("subscription rejected for filter {filter:?}: {reason}")]
    Subscribe { filter: String, reason: String },

    #[error("broker session closed")]
    Closed,
}

/// Object store failures. The gate's existence poll swallows these;
/// the post-arrival `get` propagates them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object {container}/{key} not found")]
    NotFound { container: String, key: String },

    #[error("object store request failed: {0}")]
    Request(String),
}

/// Inference service failures.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The service answered without a body; the response stream is closed
    /// with zero frames.
    #[error("upstream returned no response body")]
    EmptyBody,

    #[error("upstream request failed: {0}")]
    Request(String),

    #[error("upstream chunk stream failed: {0}")]
    Stream(String),
}

/// Arrival gate failures.
#[derive(Debug, Error)]
pub enum GateError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Neither the subscription nor the existence poll resolved within
    /// the deadline. The losing path is still cancelled.
    #[error("no arrival within {0:?}")]
    Timeout(Duration),

    /// `abort()` was called before either path delivered a locator.
    #[error("gate aborted before an arrival")]
    Aborted,
}

/// Top-level error for one streaming request.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A deferred request body did not carry the object key.
    #[error("deferred request body is missing objectKey: {0}")]
    DeferredBody(serde_json::Error),

    /// The client went away; the push channel no longer accepts writes.
    #[error("response channel closed by the client")]
    SinkClosed,
}
