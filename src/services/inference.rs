//! Inference service contract.
//!
//! # Responsibilities
//! - Invoke the upstream token-generation service
//! - Expose its chunked output as an async byte stream
//!
//! # Design Decisions
//! - `HttpInference` forwards over the shared hyper-util legacy client;
//!   connection pooling lives there, not here
//! - A non-success upstream status is an `UpstreamError::Request`; the
//!   caller closes the response with zero frames

use async_trait::async_trait;
use axum::body::Body;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use hyper::{header, Method, Request};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::error::UpstreamError;

/// Chunked output of one invocation.
pub type ChunkStream = BoxStream<'static, Result<Bytes, UpstreamError>>;

/// Header carrying the accept type for the inner invocation; forwarded
/// upstream under the same name.
pub const ACCEPT_HEADER: &str = "x-amzn-bedrock-accept";

/// Everything the upstream needs for one invocation.
#[derive(Debug, Clone)]
pub struct InvokeRequest {
    pub model_id: String,
    pub content_type: String,
    pub accept: String,
    pub body: Bytes,
}

/// Narrow inference contract consumed by the streaming handler.
#[async_trait]
pub trait InferenceService: Send + Sync {
    async fn invoke(&self, request: InvokeRequest) -> Result<ChunkStream, UpstreamError>;
}

/// Forwards invocations to an HTTP upstream.
pub struct HttpInference {
    client: Client<HttpConnector, Body>,
    base_url: String,
}

impl HttpInference {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl InferenceService for HttpInference {
    async fn invoke(&self, request: InvokeRequest) -> Result<ChunkStream, UpstreamError> {
        let uri = format!(
            "{}/model/{}/invoke-with-response-stream",
            self.base_url.trim_end_matches('/'),
            request.model_id
        );

        let req = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, &request.content_type)
            .header(ACCEPT_HEADER, &request.accept)
            .body(Body::from(request.body))
            .map_err(|e| UpstreamError::Request(e.to_string()))?;

        let response = self
            .client
            .request(req)
            .await
            .map_err(|e| UpstreamError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Request(format!(
                "upstream answered with status {status}"
            )));
        }

        let stream = Body::new(response.into_body())
            .into_data_stream()
            .map_err(|e| UpstreamError::Stream(e.to_string()));
        Ok(stream.boxed())
    }
}
