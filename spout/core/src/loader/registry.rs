use std::{collections::HashMap, fmt, sync::Arc};

use crate::{builtins, handler::Handler};

/// Symbol table of native handlers, keyed by the file stem that deploys them
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the demo handlers `wordCount` and `sieve`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(builtins::WORD_COUNT, builtins::word_count);
        registry.register(builtins::SIEVE, builtins::sieve);
        registry
    }

    /// Register `handler` under `symbol`, replacing any previous entry
    pub fn register<H>(&mut self, symbol: impl Into<String>, handler: H) -> &mut Self
    where
        H: Handler + 'static,
    {
        self.handlers.insert(symbol.into(), Arc::new(handler));
        self
    }

    pub fn get(&self, symbol: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(symbol).cloned()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.handlers.contains_key(symbol)
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut symbols: Vec<_> = self.handlers.keys().collect();
        symbols.sort();
        f.debug_struct("HandlerRegistry")
            .field("symbols", &symbols)
            .finish()
    }
}
