//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via `tracing`; level configurable via config and
//!   the `RUST_LOG` environment variable
//! - Metrics are cheap (atomic updates behind the `metrics` facade) and
//!   exposed through an optional Prometheus scrape endpoint

pub mod logging;
pub mod metrics;
