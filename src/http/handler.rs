//! The streaming invoke handler.
//!
//! # Responsibilities
//! - Derive the model id from the request path
//! - Dispatch: canned daisy-bell, deferred (gated), or pass-through
//! - Drive the upstream chunk loop through the rewriter into the
//!   response channel
//!
//! # Design Decisions
//! - The response starts immediately; the pipeline runs in a spawned task
//!   feeding the body channel, so gate waits never hold the HTTP layer
//! - Pipeline failures are logged and the body simply ends; no terminal
//!   error frame is emitted, consumers must tolerate an abrupt close

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures_util::StreamExt;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::GatewayError;
use crate::events::{emit_chunk, emit_synthetic, sing_daisy_bell, FrameSink, Replacement};
use crate::events::DAISY_BELL_MODEL_ID;
use crate::gate::ArrivalGate;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::services::{InvokeRequest, ACCEPT_HEADER};

/// Content type of the framed response stream.
const EVENT_STREAM_CONTENT_TYPE: &str = "application/vnd.amazon.eventstream";

/// Model id prefix selecting the deferred (gated) flow.
const DEFERRED_PREFIX: &str = "delay-upload::";

/// Deferred request bodies name the artifact that will carry the real
/// invocation payload.
#[derive(Deserialize)]
struct DeferredBody {
    #[serde(rename = "objectKey")]
    object_key: String,
}

/// Main streaming handler.
pub async fn invoke_handler(
    State(state): State<AppState>,
    Path(model_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = Uuid::new_v4();
    let start = Instant::now();
    metrics::record_request(&model_id);

    tracing::debug!(request_id = %request_id, model_id = %model_id, "invoke request");

    let content_type = header_or(&headers, header::CONTENT_TYPE.as_str(), "application/json");
    let accept = header_or(&headers, ACCEPT_HEADER, "*/*");

    let (sink, mut rx) = FrameSink::channel();
    tokio::spawn(async move {
        let request = InvokeRequest {
            model_id,
            content_type,
            accept,
            body,
        };
        let outcome = stream_response(state, request, &sink).await;
        metrics::record_request_duration(start.elapsed());
        match outcome {
            Ok(()) => {
                tracing::debug!(request_id = %request_id, elapsed = ?start.elapsed(), "stream complete");
            }
            Err(error) => {
                // The stream ends where it is; no terminal frame.
                tracing::error!(request_id = %request_id, %error, "streaming aborted");
            }
        }
    });

    let stream = futures_util::stream::poll_fn(move |cx| {
        rx.poll_recv(cx)
            .map(|frame| frame.map(Ok::<Bytes, std::convert::Infallible>))
    });

    (
        [(header::CONTENT_TYPE, EVENT_STREAM_CONTENT_TYPE)],
        Body::from_stream(stream),
    )
        .into_response()
}

/// Drive one request through the framing pipeline.
async fn stream_response(
    state: AppState,
    mut request: InvokeRequest,
    sink: &FrameSink,
) -> Result<(), GatewayError> {
    if request.model_id == DAISY_BELL_MODEL_ID {
        return sing_daisy_bell(sink).await;
    }

    let mut replacements: Vec<Replacement> = Vec::new();
    if let Some(real_model) = request.model_id.strip_prefix(DEFERRED_PREFIX) {
        request.model_id = real_model.to_string();
        let deferred: DeferredBody =
            serde_json::from_slice(&request.body).map_err(GatewayError::DeferredBody)?;

        // One-shot override of the first event only: real chunks with any
        // other type pass through untouched.
        replacements.push(Replacement::message_start(&request.model_id));
        emit_synthetic(sink, "message_start", &replacements).await?;

        request.body = fetch_deferred(&state, &deferred.object_key).await?;
    }

    let mut chunks = state.inference.invoke(request).await?;
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        emit_chunk(sink, &chunk, &replacements).await?;
    }
    Ok(())
}

/// Wait for the deferred artifact and fetch it as the upstream body.
async fn fetch_deferred(state: &AppState, object_key: &str) -> Result<Bytes, GatewayError> {
    let gate = ArrivalGate::new();
    let waited = Instant::now();
    let arrival = gate
        .wait_for_arrival(
            state.broker.as_ref(),
            Arc::clone(&state.store),
            &state.gate.topic_filter,
            &state.gate.container,
            object_key,
            std::time::Duration::from_secs(state.gate.deadline_secs),
        )
        .await?;
    metrics::record_gate_wait(waited.elapsed());

    tracing::debug!(
        container = %arrival.container_id,
        key = %arrival.object_key,
        "deferred artifact arrived"
    );
    let data = state
        .store
        .get(&arrival.container_id, &arrival.object_key)
        .await?;
    Ok(data)
}

fn header_or(headers: &HeaderMap, name: &str, fallback: &str) -> String {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(fallback)
        .to_string()
}
