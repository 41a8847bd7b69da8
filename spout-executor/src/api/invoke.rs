use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::Method,
    Json,
};
use spout_core::{Invocation, InvocationRequest, InvocationResult};
use tracing::{debug, info};

use crate::{error::ExecutorError, ApiContextRef};

/// Decode a buffered request body into an invocation request
fn decode_request(body: &[u8]) -> Result<InvocationRequest, ExecutorError> {
    let text = std::str::from_utf8(body)?;
    Ok(serde_json::from_str(text)?)
}

/// Load the requested handler, invoke it once and wrap its result in an envelope
pub(super) async fn invoke(
    State(context): State<ApiContextRef>,
    method: Method,
    body: Bytes,
) -> Result<Json<InvocationResult>, ExecutorError> {
    if method != Method::POST {
        return Err(ExecutorError::InvalidMethod);
    }

    let request = decode_request(&body)?;
    debug!(?request, "Decoded invocation request");

    let invocation = Invocation::from_request(request, context.config.context.clone());
    info!(
        handler = %invocation.handler,
        handler_dir = %invocation.handler_dir.display(),
        "Invoking handler"
    );

    // Handlers are synchronous and may run for arbitrarily long
    let loader = Arc::clone(&context.loader);
    let outcome =
        tokio::task::spawn_blocking(move || spout_core::invoke(loader.as_ref(), invocation))
            .await??;

    let duration = context
        .config
        .report_duration
        .then_some(outcome.duration);
    let envelope = InvocationResult::success(&outcome.value, duration)?;

    info!(duration_secs = outcome.duration.as_secs_f64(), "Invocation succeeded");
    Ok(Json(envelope))
}
