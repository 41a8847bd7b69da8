//! Resolution of `(directory, file name)` pairs into callable handlers.
//!
//! [`ModuleLoader`] is the default resolver:
//!
//! - `*.lua` files are evaluated as Lua scripts (feature `lua`)
//! - any other existing file is a marker whose stem names a native handler
//!   in the [`HandlerRegistry`]
//!
//! [`CachingLoader`] wraps any loader and keeps loaded handlers around for
//! subsequent requests.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use tracing::{debug, warn};

use crate::{error::LoadError, handler::Handler};

#[cfg(feature = "lua")]
pub mod lua;
mod registry;

pub use registry::HandlerRegistry;

/// Resolves a handler directory and file name to a callable
pub trait HandlerLoader: Send + Sync {
    fn load(&self, dir: &Path, name: &str) -> Result<Arc<dyn Handler>, LoadError>;
}

/// Default loader: Lua scripts by extension, registered native handlers by stem
#[derive(Debug, Clone)]
pub struct ModuleLoader {
    registry: HandlerRegistry,
}

impl ModuleLoader {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    fn load_native(&self, path: &Path) -> Result<Arc<dyn Handler>, LoadError> {
        let symbol = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();

        self.registry
            .get(symbol)
            .ok_or_else(|| LoadError::NotExported {
                path: path.to_path_buf(),
                symbol: symbol.to_string(),
            })
    }
}

impl Default for ModuleLoader {
    fn default() -> Self {
        Self::new(HandlerRegistry::with_builtins())
    }
}

impl HandlerLoader for ModuleLoader {
    fn load(&self, dir: &Path, name: &str) -> Result<Arc<dyn Handler>, LoadError> {
        let path = dir.join(name);

        if !path.is_file() {
            return Err(LoadError::NotFound(path));
        }

        match path.extension().and_then(|ext| ext.to_str()) {
            #[cfg(feature = "lua")]
            Some("lua") => {
                debug!(path = %path.display(), "Loading Lua handler");
                Ok(Arc::new(lua::LuaHandler::from_file(&path)?))
            }
            _ => {
                debug!(path = %path.display(), "Resolving native handler");
                self.load_native(&path)
            }
        }
    }
}

/// Loader that memoises successful loads by resolved path.
///
/// Failed loads are not cached, so a handler deployed after a failed request
/// is picked up by the next one. Two concurrent first loads of the same path
/// may both run; the later one wins the cache slot.
pub struct CachingLoader<L> {
    inner: L,
    cache: Mutex<HashMap<PathBuf, Arc<dyn Handler>>>,
}

impl<L: HandlerLoader> CachingLoader<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cached(&self, key: &Path) -> Option<Arc<dyn Handler>> {
        match self.cache.lock() {
            Ok(cache) => cache.get(key).cloned(),
            Err(_) => {
                warn!("Handler cache lock poisoned, bypassing cache");
                None
            }
        }
    }
}

impl<L: HandlerLoader> HandlerLoader for CachingLoader<L> {
    fn load(&self, dir: &Path, name: &str) -> Result<Arc<dyn Handler>, LoadError> {
        let key = dir.join(name);

        if let Some(handler) = self.cached(&key) {
            debug!(path = %key.display(), "Handler cache hit");
            return Ok(handler);
        }

        let handler = self.inner.load(dir, name)?;

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, Arc::clone(&handler));
        }

        Ok(handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InvokeError;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn handler_dir(files: &[(&str, &str)]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            std::fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    #[test]
    fn test_marker_file_resolves_registered_handler() {
        let dir = handler_dir(&[("wordCount.js", "")]);
        let loader = ModuleLoader::default();

        let handler = loader.load(dir.path(), "wordCount.js").unwrap();

        let result = handler.invoke(json!({"InputText": "a b c"}), json!({}));
        assert_eq!(result.unwrap(), json!(3));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = handler_dir(&[]);
        let loader = ModuleLoader::default();

        let result = loader.load(dir.path(), "wordCount.js");

        assert!(matches!(result, Err(LoadError::NotFound(path)) if path.ends_with("wordCount.js")));
    }

    #[test]
    fn test_directory_is_not_a_handler() {
        let dir = handler_dir(&[]);
        std::fs::create_dir(dir.path().join("sieve.js")).unwrap();

        let result = ModuleLoader::default().load(dir.path(), "sieve.js");

        assert!(matches!(result, Err(LoadError::NotFound(_))));
    }

    #[test]
    fn test_unregistered_marker_is_not_exported() {
        let dir = handler_dir(&[("grep.py", "")]);

        let result = ModuleLoader::default().load(dir.path(), "grep.py");

        match result {
            Err(LoadError::NotExported { symbol, .. }) => assert_eq!(symbol, "grep"),
            Err(e) => panic!("Expected NotExported, got {e}"),
            Ok(_) => panic!("Expected NotExported, got a handler"),
        }
    }

    #[cfg(feature = "lua")]
    #[test]
    fn test_lua_file_is_evaluated() {
        let dir = handler_dir(&[(
            "double.lua",
            "return function(params, context) return params.n * 2 end",
        )]);

        let handler = ModuleLoader::default().load(dir.path(), "double.lua").unwrap();

        assert_eq!(handler.invoke(json!({"n": 4}), json!({})).unwrap(), json!(8));
    }

    struct CountingLoader {
        loads: AtomicUsize,
    }

    impl HandlerLoader for CountingLoader {
        fn load(&self, _dir: &Path, name: &str) -> Result<Arc<dyn Handler>, LoadError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if name == "missing" {
                return Err(LoadError::NotFound(PathBuf::from(name)));
            }
            Ok(Arc::new(|_: Value, _: Value| -> Result<Value, InvokeError> {
                Ok(Value::Null)
            }))
        }
    }

    #[test]
    fn test_caching_loader_loads_once_per_path() {
        let loader = CachingLoader::new(CountingLoader {
            loads: AtomicUsize::new(0),
        });

        loader.load(Path::new("/handlers"), "a").unwrap();
        loader.load(Path::new("/handlers"), "a").unwrap();
        loader.load(Path::new("/handlers"), "b").unwrap();

        assert_eq!(loader.inner.loads.load(Ordering::SeqCst), 2);
        assert_eq!(loader.len(), 2);
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_caching_loader_logs_cache_hits() {
        let dir = handler_dir(&[("sieve.js", "")]);
        let loader = CachingLoader::new(ModuleLoader::default());

        loader.load(dir.path(), "sieve.js").unwrap();
        assert!(!logs_contain("Handler cache hit"));

        loader.load(dir.path(), "sieve.js").unwrap();
        assert!(logs_contain("Handler cache hit"));
    }

    #[test]
    fn test_caching_loader_does_not_cache_failures() {
        let loader = CachingLoader::new(CountingLoader {
            loads: AtomicUsize::new(0),
        });

        assert!(loader.load(Path::new("/handlers"), "missing").is_err());
        assert!(loader.load(Path::new("/handlers"), "missing").is_err());

        assert_eq!(loader.inner.loads.load(Ordering::SeqCst), 2);
        assert!(loader.is_empty());
    }
}
