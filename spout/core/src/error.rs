//! Error types for handler loading and invocation

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while resolving a handler from a directory and file name
#[derive(Debug, Error)]
pub enum LoadError {
    /// No file exists at the resolved handler path
    #[error("Handler file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The handler file exists but could not be read
    #[error("Failed to read handler file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is a marker for a native handler that was never registered
    #[error("Handler file {} does not export a registered handler named '{symbol}'", path.display())]
    NotExported { path: PathBuf, symbol: String },

    /// The handler script failed to compile or evaluate
    #[error("Handler script {} failed to load: {message}", path.display())]
    Script { path: PathBuf, message: String },

    /// The handler script evaluated but produced no callable
    #[error("Handler script {} does not export a callable, found {found}", path.display())]
    NotCallable { path: PathBuf, found: String },
}

/// Errors raised by a handler while it runs
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The handler reported a failure
    #[error("Handler failed: {0}")]
    Failed(String),

    #[cfg(feature = "lua")]
    #[error("Lua handler error: {0}")]
    Lua(#[from] mlua::Error),

    /// A previous invocation panicked while holding the handler state
    #[error("Handler state is poisoned")]
    Poisoned,
}

impl InvokeError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Invoke(#[from] InvokeError),

    /// The handler's return value could not be encoded as JSON
    #[error("Failed to serialize handler result: {0}")]
    Serialization(#[from] serde_json::Error),
}
