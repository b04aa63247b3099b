//! Event substitution and emission.
//!
//! # Data Flow
//! ```text
//! upstream chunk bytes
//!     → rewriter.rs (classify by event type, apply canned replacement)
//!     → codec (frame with fixed headers)
//!     → sink.rs (push channel feeding the HTTP response body)
//! ```
//!
//! # Design Decisions
//! - Two explicit entry points instead of an overloaded string/bytes union:
//!   `emit_synthetic` injects a marker event, `emit_chunk` handles real
//!   upstream chunks
//! - Replacement lists are built per request and shared read-only across
//!   all chunks of that request
//! - Sink writes await channel acceptance; a slow client backpressures the
//!   upstream read loop instead of buffering without bound

pub mod daisy;
pub mod replacements;
pub mod rewriter;
pub mod sink;

pub use daisy::{sing_daisy_bell, DAISY_BELL_MODEL_ID};
pub use replacements::Replacement;
pub use rewriter::{emit_chunk, emit_synthetic, EVENT_HEADERS};
pub use sink::FrameSink;
