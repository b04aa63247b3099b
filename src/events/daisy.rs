//! Canned response for the `hal.daisy-bell` model.
//!
//! Serves a fixed phrase as a deterministic sequence of text-delta frames
//! without ever invoking the upstream service. Doubles as a liveness probe
//! for the whole framing pipeline.

use serde_json::json;

use crate::codec;
use crate::error::GatewayError;
use crate::events::rewriter::EVENT_HEADERS;
use crate::events::sink::FrameSink;

/// Model id that triggers the canned response.
pub const DAISY_BELL_MODEL_ID: &str = "hal.daisy-bell";

const DAISY_BELL: &str =
    "Daisy, Daisy, give me your answer do I'm half crazy all for the love of you";

/// Stream the phrase, one `content_block_delta` frame per word.
pub async fn sing_daisy_bell(sink: &FrameSink) -> Result<(), GatewayError> {
    for (index, word) in DAISY_BELL.split(' ').enumerate() {
        let event = json!({
            "type": "content_block_delta",
            "index": index,
            "delta": { "type": "text_delta", "text": format!("{word} ") },
        });
        let frame = codec::encode_event(&EVENT_HEADERS, &event.to_string())?;
        sink.send(frame).await?;
    }
    Ok(())
}
