//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the invoke route
//! - Wire up middleware (tracing, timeout)
//! - Bind the server to a listener and serve until shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::post, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{GateConfig, GatewayConfig};
use crate::http::handler::invoke_handler;
use crate::services::{Broker, InferenceService, ObjectStore};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inference: Arc<dyn InferenceService>,
    pub store: Arc<dyn ObjectStore>,
    pub broker: Arc<dyn Broker>,
    pub gate: GateConfig,
}

/// HTTP server for the streaming gateway.
pub struct GatewayServer {
    router: Router,
}

impl GatewayServer {
    /// Create a new server wiring the collaborator services into the
    /// request pipeline.
    pub fn new(
        config: GatewayConfig,
        inference: Arc<dyn InferenceService>,
        store: Arc<dyn ObjectStore>,
        broker: Arc<dyn Broker>,
    ) -> Self {
        let state = AppState {
            inference,
            store,
            broker,
            gate: config.gate.clone(),
        };
        let router = Self::build_router(&config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route(
                "/model/{model_id}/invoke-with-response-stream",
                post(invoke_handler),
            )
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(ConcurrencyLimitLayer::new(config.listener.max_connections))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until the shutdown channel fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
