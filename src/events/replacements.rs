//! Canned event replacements.
//!
//! A replacement substitutes a predetermined event payload for a real one
//! whose `type` field matches the tag. The constructors cover the message
//! lifecycle events of the upstream's streaming protocol; a deferred
//! request typically builds a single-entry `message_start` list so only
//! the first event of the stream is overridden.

use serde_json::json;

/// One canned substitution: searched by exact match on `tag`.
#[derive(Debug, Clone)]
pub struct Replacement {
    /// Event type this entry replaces.
    pub tag: String,
    /// Produced event content, already serialized.
    pub content: String,
}

impl Replacement {
    fn new(tag: &str, content: serde_json::Value) -> Self {
        Self {
            tag: tag.to_string(),
            content: content.to_string(),
        }
    }

    /// Fixed `message_start` event for the given model.
    pub fn message_start(model_id: &str) -> Self {
        Self::new(
            "message_start",
            json!({
                "type": "message_start",
                "message": {
                    "id": "message",
                    "type": "message",
                    "role": "assistant",
                    "model": model_id,
                    "content": [],
                    "stop_reason": null,
                    "stop_sequence": null,
                    "usage": { "input_tokens": 0, "output_tokens": 0 },
                },
            }),
        )
    }

    pub fn content_block_start() -> Self {
        Self::new(
            "content_block_start",
            json!({
                "type": "content_block_start",
                "index": 0,
                "content_block": { "type": "text", "text": "" },
            }),
        )
    }

    pub fn content_block_delta(text: &str) -> Self {
        Self::new(
            "content_block_delta",
            json!({
                "type": "content_block_delta",
                "index": 0,
                "delta": { "type": "text_delta", "text": text },
            }),
        )
    }

    pub fn content_block_stop() -> Self {
        Self::new(
            "content_block_stop",
            json!({ "type": "content_block_stop", "index": 0 }),
        )
    }

    pub fn message_delta() -> Self {
        Self::new(
            "message_delta",
            json!({
                "type": "message_delta",
                "delta": { "stop_reason": "end_turn", "stop_sequence": null },
                "usage": { "output_tokens": 0 },
            }),
        )
    }

    pub fn message_stop() -> Self {
        Self::new(
            "message_stop",
            json!({
                "type": "message_stop",
                "amazon-bedrock-invocationMetrics": {
                    "inputTokenCount": 0,
                    "outputTokenCount": 0,
                    "invocationLatency": 0,
                    "firstByteLatency": 0,
                },
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_start_carries_model_id() {
        let replacement = Replacement::message_start("anthropic.claude-3-haiku");
        assert_eq!(replacement.tag, "message_start");

        let event: serde_json::Value = serde_json::from_str(&replacement.content).unwrap();
        assert_eq!(event["type"], "message_start");
        assert_eq!(event["message"]["model"], "anthropic.claude-3-haiku");
        assert_eq!(event["message"]["role"], "assistant");
    }

    #[test]
    fn tags_match_event_types() {
        for (replacement, tag) in [
            (Replacement::content_block_start(), "content_block_start"),
            (Replacement::content_block_delta("x"), "content_block_delta"),
            (Replacement::content_block_stop(), "content_block_stop"),
            (Replacement::message_delta(), "message_delta"),
            (Replacement::message_stop(), "message_stop"),
        ] {
            assert_eq!(replacement.tag, tag);
            let event: serde_json::Value = serde_json::from_str(&replacement.content).unwrap();
            assert_eq!(event["type"], tag);
        }
    }
}
