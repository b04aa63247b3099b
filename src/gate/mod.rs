//! Arrival gating for deferred responses.
//!
//! # Data Flow
//! ```text
//! deferred request (object key known from the body)
//!     → arrival.rs (subscribe, arm existence poll, race the two paths)
//!     → ArrivalResult { container_id, object_key }
//!     → caller fetches the artifact and invokes the upstream
//!
//! artifact producer side:
//!     object lands in the store
//!     → notify.rs publishes the locator to the arrivals topic
//! ```
//!
//! # Design Decisions
//! - The winner cancels the loser by flipping a shared flag, never by
//!   forcing in-flight I/O to stop
//! - Existence-poll errors are swallowed: a transient store error leaves
//!   the subscription path as the sole resolver

pub mod arrival;
pub mod notify;

pub use arrival::{ArrivalGate, ArrivalResult, POLL_INTERVAL};
pub use notify::announce_arrival;
