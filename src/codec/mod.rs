//! Binary event-stream frame codec.
//!
//! # Responsibilities
//! - Encode an ordered header map plus a payload into one checksummed frame
//! - Decode frames back into headers and payload, verifying both checksums
//! - Wrap and unwrap the `{"bytes": "<base64>"}` payload envelope
//!
//! # Design Decisions
//! - Pure and synchronous; no state survives a call
//! - Big-endian throughout, matching the SDK event-stream envelope
//! - The trailing checksum continues the prelude's CRC32 accumulator
//!   rather than restarting; this is the wire-compatibility contract

pub mod frame;

pub use frame::{
    decode_event, decode_frame, decode_frames, encode_event, encode_frame, Frame,
    HEADER_SEPARATOR, MAX_HEADER_FIELD_LEN, MESSAGE_CRC_LEN, PRELUDE_LEN,
};
