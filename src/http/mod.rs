//! HTTP streaming gateway subsystem.
//!
//! # Data Flow
//! ```text
//! POST /model/{model_id}/invoke-with-response-stream
//!     → server.rs (Axum setup, middleware)
//!     → handler.rs (model dispatch: canned / deferred / pass-through)
//!     → events (rewrite + frame)
//!     → chunked response body, closed when the pipeline finishes
//! ```

pub mod handler;
pub mod server;

pub use server::{AppState, GatewayServer};
