//! The single capability every handler exposes.

use serde_json::Value;

use crate::error::InvokeError;

/// A unit of externally supplied code invoked with `(params, context)`.
///
/// Implementations are shared across requests, so they must be safe to call
/// from several threads. The executor calls [`Handler::invoke`] exactly once
/// per accepted request and never retries.
pub trait Handler: Send + Sync {
    fn invoke(&self, params: Value, context: Value) -> Result<Value, InvokeError>;
}

impl<F> Handler for F
where
    F: Fn(Value, Value) -> Result<Value, InvokeError> + Send + Sync,
{
    fn invoke(&self, params: Value, context: Value) -> Result<Value, InvokeError> {
        self(params, context)
    }
}
