//! Chunk classification and frame emission.
//!
//! # Responsibilities
//! - Classify each inbound chunk by its `type` field
//! - Swap in the first matching canned replacement, or pass through
//! - Frame the chosen content and push it to the sink
//!
//! # Design Decisions
//! - `emit_synthetic` and `emit_chunk` are separate operations; a synthetic
//!   marker is never confused with real chunk bytes
//! - Chunks that fail to parse as JSON pass through unclassified rather
//!   than aborting the stream

use serde::Deserialize;

use crate::codec;
use crate::error::{CodecError, GatewayError};
use crate::events::replacements::Replacement;
use crate::events::sink::FrameSink;
use crate::observability::metrics;

/// Fixed header set carried by every emitted frame.
pub const EVENT_HEADERS: [(&str, &str); 3] = [
    (":event-type", "chunk"),
    (":content-type", "application/json"),
    (":message-type", "event"),
];

#[derive(Deserialize)]
struct ChunkEnvelope {
    #[serde(rename = "type")]
    event_type: String,
}

/// Emit a synthetic marker event.
///
/// The tag is both the replacement lookup key and the fallback content, so
/// a single-entry list tagged `message_start` turns the marker into the
/// canned first event of the stream.
pub async fn emit_synthetic(
    sink: &FrameSink,
    tag: &str,
    replacements: &[Replacement],
) -> Result<(), GatewayError> {
    let content = lookup(replacements, tag).unwrap_or(tag);
    write_event(sink, content).await
}

/// Emit one real upstream chunk, substituting a canned replacement when
/// its `type` matches an entry's tag.
pub async fn emit_chunk(
    sink: &FrameSink,
    raw: &[u8],
    replacements: &[Replacement],
) -> Result<(), GatewayError> {
    let text = std::str::from_utf8(raw).map_err(CodecError::from)?;
    let content = match serde_json::from_str::<ChunkEnvelope>(text) {
        Ok(envelope) => lookup(replacements, &envelope.event_type).unwrap_or(text),
        Err(error) => {
            tracing::debug!(%error, "chunk is not a typed JSON event; passing through");
            text
        }
    };
    write_event(sink, content).await
}

fn lookup<'a>(replacements: &'a [Replacement], tag: &str) -> Option<&'a str> {
    replacements
        .iter()
        .find(|replacement| replacement.tag == tag)
        .map(|replacement| replacement.content.as_str())
}

async fn write_event(sink: &FrameSink, content: &str) -> Result<(), GatewayError> {
    let frame = codec::encode_event(&EVENT_HEADERS, content)?;
    metrics::record_frame();
    sink.send(frame).await
}
