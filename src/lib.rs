//! Event-stream gateway library.
//!
//! Sits between an HTTP streaming response channel and an upstream
//! token-generation service, re-encoding the service's chunked output into
//! a self-describing, checksummed binary frame format.
//!
//! # Architecture Overview
//!
//! ```text
//!  POST /model/{id}/invoke-with-response-stream
//!      │
//!      ▼
//!  ┌────────┐   deferred?   ┌──────────┐  locator  ┌─────────┐
//!  │  http  │──────────────▶│   gate   │──────────▶│ services│
//!  │ server │               │ (race +  │           │  store  │
//!  └───┬────┘               │  cancel) │           └────┬────┘
//!      │                    └──────────┘                │ body
//!      ▼                                                ▼
//!  ┌────────┐   chunk bytes  ┌────────┐  frames   ┌──────────┐
//!  │services│───────────────▶│ events │──────────▶│  codec   │
//!  │inference│               │rewriter│           │ (framing)│
//!  └────────┘                └───┬────┘           └──────────┘
//!                                │ push sink
//!                                ▼
//!                     chunked HTTP response body
//! ```

// Core pipeline
pub mod codec;
pub mod events;
pub mod gate;
pub mod http;
pub mod services;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
