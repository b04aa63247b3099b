//! Frame encoding and decoding for the event-stream wire format.
//!
//! A frame is a 12-byte prelude, a header block, a payload, and a trailing
//! CRC32:
//!
//! ```text
//! ┌─────────────┬──────────────┬─────────────┬──────────┬─────────┬──────────┐
//! │ total len   │ header len   │ prelude CRC │ headers  │ payload │ msg CRC  │
//! │ u32 BE      │ u32 BE       │ u32 BE      │ variable │ variable│ u32 BE   │
//! └─────────────┴──────────────┴─────────────┴──────────┴─────────┴──────────┘
//! ```
//!
//! Each header entry is `len(name): u8`, name, `0x0700`, `len(value): u8`,
//! value, concatenated in insertion order. The prelude CRC covers the two
//! length fields; the message CRC is the **same accumulator continued** over
//! everything from offset 8 to the end of the payload. Restarting the
//! accumulator for the trailing digest produces a wire-incompatible frame.

use bytes::{BufMut, Bytes, BytesMut};
use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Prelude size in bytes (total length + header length + prelude CRC).
pub const PRELUDE_LEN: usize = 12;

/// Offset where the prelude CRC is written; the CRC covers `[0, 8)`.
const PRELUDE_CRC_OFFSET: usize = 8;

/// Trailing message CRC size in bytes.
pub const MESSAGE_CRC_LEN: usize = 4;

/// Separator between a header name and its value: `\x07\x00`.
pub const HEADER_SEPARATOR: u16 = 0x0700;

/// Header names and values carry a single-byte length prefix.
pub const MAX_HEADER_FIELD_LEN: usize = 255;

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Header entries in wire order.
    pub headers: Vec<(String, String)>,
    /// Payload bytes, verbatim.
    pub payload: Bytes,
}

/// Encode one frame from ordered header pairs and an already-serialized
/// payload.
///
/// Fails with [`CodecError::HeaderTooLong`] before any bytes are produced
/// if a header name or value exceeds 255 bytes.
pub fn encode_frame(headers: &[(&str, &str)], payload: &[u8]) -> Result<Bytes, CodecError> {
    let mut header_block = BytesMut::new();
    for (name, value) in headers {
        if name.len() > MAX_HEADER_FIELD_LEN || value.len() > MAX_HEADER_FIELD_LEN {
            return Err(CodecError::HeaderTooLong {
                name: name.to_string(),
                len: name.len().max(value.len()),
            });
        }
        header_block.put_u8(name.len() as u8);
        header_block.put_slice(name.as_bytes());
        header_block.put_u16(HEADER_SEPARATOR);
        header_block.put_u8(value.len() as u8);
        header_block.put_slice(value.as_bytes());
    }

    let total_length = PRELUDE_LEN + header_block.len() + payload.len() + MESSAGE_CRC_LEN;
    let mut frame = BytesMut::with_capacity(total_length);
    frame.put_u32(total_length as u32);
    frame.put_u32(header_block.len() as u32);

    // Prelude CRC over the two length fields only.
    let mut crc = Hasher::new();
    crc.update(&frame[..PRELUDE_CRC_OFFSET]);
    frame.put_u32(crc.clone().finalize());

    frame.put_slice(&header_block);
    frame.put_slice(payload);

    // Continue the prelude accumulator over prelude-CRC bytes, headers and
    // payload. Not an independent whole-frame CRC.
    crc.update(&frame[PRELUDE_CRC_OFFSET..]);
    frame.put_u32(crc.finalize());

    Ok(frame.freeze())
}

/// Decode one frame, verifying the length invariant and both checksums.
pub fn decode_frame(buf: &[u8]) -> Result<Frame, CodecError> {
    if buf.len() < PRELUDE_LEN + MESSAGE_CRC_LEN {
        return Err(CodecError::Truncated {
            needed: PRELUDE_LEN + MESSAGE_CRC_LEN,
            have: buf.len(),
        });
    }

    let total_length = read_u32(buf, 0) as usize;
    let header_length = read_u32(buf, 4) as usize;
    let stored_prelude_crc = read_u32(buf, 8);

    if total_length != buf.len()
        || total_length != PRELUDE_LEN + header_length + payload_len(total_length, header_length) + MESSAGE_CRC_LEN
    {
        return Err(CodecError::LengthMismatch);
    }

    let mut crc = Hasher::new();
    crc.update(&buf[..PRELUDE_CRC_OFFSET]);
    let computed_prelude_crc = crc.clone().finalize();
    if computed_prelude_crc != stored_prelude_crc {
        return Err(CodecError::PreludeChecksum {
            stored: stored_prelude_crc,
            computed: computed_prelude_crc,
        });
    }

    let payload_end = total_length - MESSAGE_CRC_LEN;
    crc.update(&buf[PRELUDE_CRC_OFFSET..payload_end]);
    let computed_message_crc = crc.finalize();
    let stored_message_crc = read_u32(buf, payload_end);
    if computed_message_crc != stored_message_crc {
        return Err(CodecError::MessageChecksum {
            stored: stored_message_crc,
            computed: computed_message_crc,
        });
    }

    let headers = decode_headers(&buf[PRELUDE_LEN..PRELUDE_LEN + header_length])?;
    let payload = Bytes::copy_from_slice(&buf[PRELUDE_LEN + header_length..payload_end]);

    Ok(Frame { headers, payload })
}

/// Split a buffer of back-to-back frames and decode each one.
pub fn decode_frames(mut buf: &[u8]) -> Result<Vec<Frame>, CodecError> {
    let mut frames = Vec::new();
    while !buf.is_empty() {
        if buf.len() < PRELUDE_LEN + MESSAGE_CRC_LEN {
            return Err(CodecError::Truncated {
                needed: PRELUDE_LEN + MESSAGE_CRC_LEN,
                have: buf.len(),
            });
        }
        let total_length = read_u32(buf, 0) as usize;
        if total_length > buf.len() {
            return Err(CodecError::Truncated {
                needed: total_length,
                have: buf.len(),
            });
        }
        frames.push(decode_frame(&buf[..total_length])?);
        buf = &buf[total_length..];
    }
    Ok(frames)
}

/// The payload every frame carries: a JSON document with the inner event
/// text under `bytes`, base64-encoded.
#[derive(Debug, Serialize, Deserialize)]
struct PayloadEnvelope {
    bytes: String,
}

/// Encode an event text into a frame, wrapping it in the payload envelope.
pub fn encode_event(headers: &[(&str, &str)], event_text: &str) -> Result<Bytes, CodecError> {
    use base64::Engine;
    let envelope = serde_json::to_vec(&PayloadEnvelope {
        bytes: base64::engine::general_purpose::STANDARD.encode(event_text),
    })?;
    encode_frame(headers, &envelope)
}

/// Unwrap a decoded frame's payload envelope back into the event text.
pub fn decode_event(frame: &Frame) -> Result<String, CodecError> {
    use base64::Engine;
    let envelope: PayloadEnvelope = serde_json::from_slice(&frame.payload)?;
    let inner = base64::engine::general_purpose::STANDARD.decode(envelope.bytes)?;
    Ok(std::str::from_utf8(&inner)?.to_owned())
}

fn decode_headers(mut block: &[u8]) -> Result<Vec<(String, String)>, CodecError> {
    let mut headers = Vec::new();
    while !block.is_empty() {
        let (name, rest) = take_field(block)?;
        if rest.len() < 2 {
            return Err(CodecError::LengthMismatch);
        }
        let separator = u16::from_be_bytes([rest[0], rest[1]]);
        if separator != HEADER_SEPARATOR {
            return Err(CodecError::Separator(separator));
        }
        let (value, rest) = take_field(&rest[2..])?;
        headers.push((name, value));
        block = rest;
    }
    Ok(headers)
}

fn take_field(block: &[u8]) -> Result<(String, &[u8]), CodecError> {
    let Some((&len, rest)) = block.split_first() else {
        return Err(CodecError::LengthMismatch);
    };
    let len = len as usize;
    if rest.len() < len {
        return Err(CodecError::LengthMismatch);
    }
    let field = std::str::from_utf8(&rest[..len])?.to_owned();
    Ok((field, &rest[len..]))
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

fn payload_len(total_length: usize, header_length: usize) -> usize {
    total_length.saturating_sub(PRELUDE_LEN + header_length + MESSAGE_CRC_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENT_HEADERS: [(&str, &str); 3] = [
        (":event-type", "chunk"),
        (":content-type", "application/json"),
        (":message-type", "event"),
    ];

    #[test]
    fn round_trip() {
        let payload = br#"{"bytes":"aGVsbG8="}"#;
        let encoded = encode_frame(&EVENT_HEADERS, payload).unwrap();
        let frame = decode_frame(&encoded).unwrap();

        assert_eq!(frame.payload.as_ref(), payload);
        assert_eq!(
            frame.headers,
            EVENT_HEADERS
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn total_length_invariant() {
        for payload_len in [0usize, 1, 17, 1024] {
            let payload = vec![0xAB; payload_len];
            let encoded = encode_frame(&[("a", "b")], &payload).unwrap();
            let total = read_u32(&encoded, 0) as usize;
            let header_len = read_u32(&encoded, 4) as usize;
            assert_eq!(total, encoded.len());
            assert_eq!(total, PRELUDE_LEN + header_len + payload_len + MESSAGE_CRC_LEN);
        }
    }

    #[test]
    fn insertion_order_preserved() {
        let headers = [("zeta", "1"), ("alpha", "2"), ("mid", "3")];
        let encoded = encode_frame(&headers, b"x").unwrap();
        let frame = decode_frame(&encoded).unwrap();
        let names: Vec<&str> = frame.headers.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    /// Known vector: empty header block, empty payload.
    ///
    /// total = 16, header len = 0. CRC32(00 00 00 10 00 00 00 00) = the
    /// prelude digest; the message digest continues that accumulator over
    /// the four prelude-digest bytes.
    #[test]
    fn empty_frame_vector() {
        let encoded = encode_frame(&[], b"").unwrap();
        assert_eq!(encoded.len(), 16);
        assert_eq!(&encoded[..8], &[0, 0, 0, 16, 0, 0, 0, 0]);

        let prelude_crc = crc32fast::hash(&encoded[..8]);
        assert_eq!(read_u32(&encoded, 8), prelude_crc);

        let mut chained = Hasher::new();
        chained.update(&encoded[..8]);
        chained.update(&encoded[8..12]);
        assert_eq!(read_u32(&encoded, 12), chained.finalize());
    }

    /// The trailing checksum continues the prelude accumulator; it is not
    /// an independent CRC32 of the message bytes.
    #[test]
    fn message_crc_is_chained_not_independent() {
        let encoded = encode_event(&EVENT_HEADERS, "{\"type\":\"message_stop\"}").unwrap();
        let body_end = encoded.len() - MESSAGE_CRC_LEN;
        let stored = read_u32(&encoded, body_end);

        let mut chained = Hasher::new();
        chained.update(&encoded[..PRELUDE_CRC_OFFSET]);
        chained.update(&encoded[PRELUDE_CRC_OFFSET..body_end]);
        assert_eq!(stored, chained.finalize());

        let independent = crc32fast::hash(&encoded[PRELUDE_CRC_OFFSET..body_end]);
        assert_ne!(stored, independent);

        // Continuing the accumulator over [0, 8) then [8, body_end) is the
        // same as hashing [0, body_end) in one pass, so the chained digest
        // equals a CRC32 of the entire frame up to the trailer.
        let whole_frame = crc32fast::hash(&encoded[..body_end]);
        assert_eq!(stored, whole_frame);
    }

    #[test]
    fn oversized_header_name_rejected() {
        let name = "n".repeat(256);
        let err = encode_frame(&[(name.as_str(), "v")], b"payload").unwrap_err();
        assert!(matches!(err, CodecError::HeaderTooLong { len: 256, .. }));
    }

    #[test]
    fn oversized_header_value_rejected() {
        let value = "v".repeat(300);
        let err = encode_frame(&[("name", value.as_str())], b"").unwrap_err();
        assert!(matches!(err, CodecError::HeaderTooLong { len: 300, .. }));
    }

    #[test]
    fn boundary_header_field_accepted() {
        let name = "n".repeat(255);
        let value = "v".repeat(255);
        let encoded = encode_frame(&[(name.as_str(), value.as_str())], b"p").unwrap();
        let frame = decode_frame(&encoded).unwrap();
        assert_eq!(frame.headers[0], (name, value));
    }

    #[test]
    fn corrupted_payload_fails_message_crc() {
        let mut encoded = encode_frame(&EVENT_HEADERS, b"payload").unwrap().to_vec();
        let idx = encoded.len() - MESSAGE_CRC_LEN - 1;
        encoded[idx] ^= 0xFF;
        assert!(matches!(
            decode_frame(&encoded),
            Err(CodecError::MessageChecksum { .. })
        ));
    }

    #[test]
    fn corrupted_length_fails_prelude_crc() {
        let mut encoded = encode_frame(&EVENT_HEADERS, b"payload").unwrap().to_vec();
        encoded[4] ^= 0x01;
        let err = decode_frame(&encoded).unwrap_err();
        assert!(matches!(
            err,
            CodecError::PreludeChecksum { .. } | CodecError::LengthMismatch
        ));
    }

    #[test]
    fn event_envelope_round_trip() {
        let text = r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"hi "}}"#;
        let encoded = encode_event(&EVENT_HEADERS, text).unwrap();
        let frame = decode_frame(&encoded).unwrap();

        let envelope: serde_json::Value = serde_json::from_slice(&frame.payload).unwrap();
        assert!(envelope.get("bytes").is_some());
        assert_eq!(decode_event(&frame).unwrap(), text);
    }

    #[test]
    fn split_concatenated_frames() {
        let mut buf = Vec::new();
        for text in ["one", "two", "three"] {
            buf.extend_from_slice(&encode_event(&EVENT_HEADERS, text).unwrap());
        }
        let frames = decode_frames(&buf).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(decode_event(&frames[2]).unwrap(), "three");
    }

    #[test]
    fn truncated_buffer_rejected() {
        let encoded = encode_frame(&[], b"data").unwrap();
        assert!(matches!(
            decode_frames(&encoded[..encoded.len() - 2]),
            Err(CodecError::Truncated { .. })
        ));
    }
}
