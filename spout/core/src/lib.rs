//! Core of the Spout function executor.
//!
//! A handler is a unit of externally supplied code identified by a directory
//! and a file name. It exposes one callable surface,
//! `(params, context) -> JSON value`. This crate defines that surface
//! ([`Handler`]), the loaders that resolve handlers ([`HandlerLoader`]) and
//! the per-request contract ([`invoke`], [`InvocationResult`]) shared by the
//! executor's HTTP and file modes.
//!
//! # Features
//!
//! - **lua** (default): load `.lua` handler scripts through an embedded Lua 5.4 interpreter

pub mod builtins;
pub mod error;
pub mod handler;
pub mod invocation;
pub mod loader;
pub mod value;

pub use error::{Error, InvokeError, LoadError};
pub use handler::Handler;
pub use invocation::{invoke, Invocation, InvocationRequest, InvocationResult, Outcome};
pub use loader::{CachingLoader, HandlerLoader, HandlerRegistry, ModuleLoader};
pub use value::{empty_object, env_value};

pub type Result<T> = core::result::Result<T, Error>;

/// Prelude to import the types needed to load and invoke handlers
pub mod prelude {
    pub use super::handler::Handler;
    pub use super::invocation::{invoke, Invocation, InvocationRequest, InvocationResult};
    pub use super::loader::{CachingLoader, HandlerLoader, HandlerRegistry, ModuleLoader};
    pub use super::value::env_value;
}
