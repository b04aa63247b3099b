//! OS signal handling.
//!
//! # Responsibilities
//! - Register the Ctrl+C handler (async-safe via Tokio)
//! - Translate the signal into the internal shutdown broadcast

use std::sync::Arc;

use crate::lifecycle::shutdown::Shutdown;

/// Spawn the signal listener; on Ctrl+C it triggers graceful shutdown.
pub fn spawn_ctrl_c(shutdown: Arc<Shutdown>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => shutdown.trigger("ctrl-c"),
            Err(error) => {
                tracing::error!(%error, "failed to install Ctrl+C handler");
            }
        }
    });
}
