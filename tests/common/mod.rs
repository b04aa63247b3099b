//! Shared utilities for the streaming integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use tokio::net::TcpListener;

use stream_gateway::codec;
use stream_gateway::config::GatewayConfig;
use stream_gateway::error::UpstreamError;
use stream_gateway::http::GatewayServer;
use stream_gateway::lifecycle::Shutdown;
use stream_gateway::services::{
    Broker, ChunkStream, InferenceService, InvokeRequest, ObjectStore,
};

/// Inference double that replays fixed chunks and records what it saw.
#[derive(Default)]
pub struct ScriptedInference {
    chunks: Vec<String>,
    invocations: AtomicUsize,
    last_request: Mutex<Option<InvokeRequest>>,
}

impl ScriptedInference {
    pub fn new(chunks: Vec<String>) -> Self {
        Self {
            chunks,
            ..Self::default()
        }
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<InvokeRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceService for ScriptedInference {
    async fn invoke(&self, request: InvokeRequest) -> Result<ChunkStream, UpstreamError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);

        let chunks: Vec<Result<Bytes, UpstreamError>> = self
            .chunks
            .iter()
            .map(|chunk| Ok(Bytes::from(chunk.clone())))
            .collect();
        Ok(futures_util::stream::iter(chunks).boxed())
    }
}

/// Inference double that answers without a body.
#[derive(Default)]
pub struct EmptyInference {
    invocations: AtomicUsize,
}

impl EmptyInference {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceService for EmptyInference {
    async fn invoke(&self, _request: InvokeRequest) -> Result<ChunkStream, UpstreamError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Err(UpstreamError::EmptyBody)
    }
}

/// Start a gateway on an ephemeral port; runs until the test ends.
pub async fn start_gateway(
    config: GatewayConfig,
    inference: Arc<dyn InferenceService>,
    store: Arc<dyn ObjectStore>,
    broker: Arc<dyn Broker>,
) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let server = GatewayServer::new(config, inference, store, broker);
    tokio::spawn(async move {
        let _shutdown = shutdown;
        let _ = server.run(listener, rx).await;
    });
    addr
}

/// POST an invoke request and return the raw response body.
pub async fn invoke(addr: SocketAddr, model_id: &str, body: &str) -> (reqwest::StatusCode, Bytes) {
    let client = reqwest::Client::new();
    let response = client
        .post(format!(
            "http://{addr}/model/{model_id}/invoke-with-response-stream"
        ))
        .header("content-type", "application/json")
        .body(body.to_string())
        .send()
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.bytes().await.unwrap();
    (status, bytes)
}

/// Decode a framed body into the inner event JSON documents.
pub fn decode_events(body: &[u8]) -> Vec<serde_json::Value> {
    codec::decode_frames(body)
        .unwrap()
        .iter()
        .map(|frame| {
            let text = codec::decode_event(frame).unwrap();
            serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
        })
        .collect()
}
