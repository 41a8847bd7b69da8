//! The per-request execution contract: load a handler, call it once, report
//! the result.

use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::{error::Error, loader::HandlerLoader, value::empty_object};

/// Invocation request as it arrives in an HTTP request body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvocationRequest {
    /// Handler file name, resolved relative to `handler_dir`
    pub handler: String,

    /// Directory containing the handler file
    pub handler_dir: PathBuf,

    /// Parameters passed to the handler, `{}` when absent or null
    #[serde(default)]
    pub params: Option<Value>,
}

/// A fully resolved call: which handler to load and what to pass it
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub handler: String,
    pub handler_dir: PathBuf,
    pub params: Value,
    pub context: Value,
}

impl Invocation {
    pub fn new(
        handler: impl Into<String>,
        handler_dir: impl Into<PathBuf>,
        params: Value,
        context: Value,
    ) -> Self {
        Self {
            handler: handler.into(),
            handler_dir: handler_dir.into(),
            params,
            context,
        }
    }

    /// Combine a wire request with the executor's configured context
    pub fn from_request(request: InvocationRequest, context: Value) -> Self {
        Self {
            handler: request.handler,
            handler_dir: request.handler_dir,
            params: request.params.unwrap_or_else(empty_object),
            context,
        }
    }
}

/// Return value of a successful invocation and the time it took
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub value: Value,
    /// Measured from just before loading to just after the handler returned
    pub duration: Duration,
}

/// Load the handler named by `invocation` and invoke it exactly once
#[instrument(skip_all, fields(handler = %invocation.handler, handler_dir = %invocation.handler_dir.display()))]
pub fn invoke(loader: &dyn HandlerLoader, invocation: Invocation) -> crate::Result<Outcome> {
    let started_at = Instant::now();

    let handler = loader.load(&invocation.handler_dir, &invocation.handler)?;
    let value = handler.invoke(invocation.params, invocation.context)?;

    let duration = started_at.elapsed();
    debug!(duration_secs = duration.as_secs_f64(), "Handler returned");

    Ok(Outcome { value, duration })
}

/// Response envelope reported to HTTP callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvocationResult {
    /// JSON encoding of the handler's return value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    pub success: bool,

    /// Seconds spent loading and invoking the handler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl InvocationResult {
    pub fn success(value: &Value, duration: Option<Duration>) -> Result<Self, Error> {
        Ok(Self {
            result: Some(serde_json::to_string(value)?),
            success: true,
            duration: duration.map(|d| d.as_secs_f64()),
        })
    }

    pub fn failure() -> Self {
        Self {
            result: None,
            success: false,
            duration: None,
        }
    }
}
