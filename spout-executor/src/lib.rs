pub mod api;
pub mod config;
pub mod error;
pub mod file_mode;

pub use config::{Config, ConfigError};
pub use error::ExecutorError;

use std::sync::Arc;

use spout_core::{CachingLoader, HandlerLoader, ModuleLoader};

pub type ApiContextRef = Arc<ApiContext>;

/// State shared by every HTTP-mode request
pub struct ApiContext {
    pub config: Config,
    pub loader: Arc<dyn HandlerLoader>,
}

impl ApiContext {
    /// Context using the default module loader, cached when configured
    pub fn new(config: Config) -> Self {
        let loader: Arc<dyn HandlerLoader> = if config.cache_handlers {
            Arc::new(CachingLoader::new(ModuleLoader::default()))
        } else {
            Arc::new(ModuleLoader::default())
        };

        Self::with_loader(config, loader)
    }

    pub fn with_loader(config: Config, loader: Arc<dyn HandlerLoader>) -> Self {
        Self { config, loader }
    }
}
