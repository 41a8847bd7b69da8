//! Handlers written as Lua 5.4 scripts.
//!
//! A script is evaluated once at load time in its own interpreter state. It
//! exports its entry point either by returning a function from the chunk:
//!
//! ```lua
//! return function(params, context)
//!   return params.n * 2
//! end
//! ```
//!
//! or by defining a global function named `handler`. Params and context are
//! converted to Lua tables through serde, and the return value is converted
//! back to JSON.
//!
//! An empty Lua table converts to `{}`. Scripts that return lists mark them
//! with the `array_mt` global so an empty one still converts to `[]`:
//!
//! ```lua
//! local primes = setmetatable({}, array_mt)
//! ```

use std::{path::Path, sync::Mutex};

use mlua::{Function, Lua, LuaSerdeExt};
use serde_json::Value;
use tracing::debug;

use crate::{
    error::{InvokeError, LoadError},
    handler::Handler,
};

const GLOBAL_ENTRY_POINT: &str = "handler";
const GLOBAL_ARRAY_METATABLE: &str = "array_mt";

struct LuaModule {
    lua: Lua,
    entry: Function,
}

/// A handler backed by a Lua interpreter state.
///
/// A Lua state is single-threaded, so concurrent invocations of the same
/// handler are serialised through a mutex.
pub struct LuaHandler {
    module: Mutex<LuaModule>,
}

impl LuaHandler {
    /// Read and evaluate the script at `path`
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_source(path, &source)
    }

    /// Evaluate `source`, using `path` to name the chunk in error messages
    pub fn from_source(path: &Path, source: &str) -> Result<Self, LoadError> {
        let script_error = |e: mlua::Error| LoadError::Script {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let lua = Lua::new();
        lua.globals()
            .set(GLOBAL_ARRAY_METATABLE, lua.array_metatable())
            .map_err(script_error)?;

        let exported: mlua::Value = lua
            .load(source)
            .set_name(path.display().to_string())
            .eval()
            .map_err(script_error)?;

        let entry = match exported {
            mlua::Value::Function(entry) => entry,
            mlua::Value::Nil => lua
                .globals()
                .get::<Option<Function>>(GLOBAL_ENTRY_POINT)
                .map_err(script_error)?
                .ok_or_else(|| LoadError::NotCallable {
                    path: path.to_path_buf(),
                    found: "nil".to_string(),
                })?,
            other => {
                return Err(LoadError::NotCallable {
                    path: path.to_path_buf(),
                    found: other.type_name().to_string(),
                })
            }
        };

        debug!(path = %path.display(), "Loaded Lua handler");

        Ok(Self {
            module: Mutex::new(LuaModule { lua, entry }),
        })
    }
}

impl Handler for LuaHandler {
    fn invoke(&self, params: Value, context: Value) -> Result<Value, InvokeError> {
        let module = self.module.lock().map_err(|_| InvokeError::Poisoned)?;

        let params = module.lua.to_value(&params)?;
        let context = module.lua.to_value(&context)?;
        let returned: mlua::Value = module.entry.call((params, context))?;

        Ok(module.lua.from_value(returned)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn load(source: &str) -> Result<LuaHandler, LoadError> {
        LuaHandler::from_source(Path::new("test.lua"), source)
    }

    #[test]
    fn test_returned_function_is_entry_point() {
        let handler = load("return function(params, context) return params.n * 2 end").unwrap();

        let result = handler.invoke(json!({"n": 21}), json!({})).unwrap();

        assert_eq!(result, json!(42));
    }

    #[test]
    fn test_global_handler_is_entry_point() {
        let handler = load(
            r#"
            function handler(params, context)
              return { greeting = "hello " .. params.name, region = context.region }
            end
            "#,
        )
        .unwrap();

        let result = handler
            .invoke(json!({"name": "spout"}), json!({"region": "eu"}))
            .unwrap();

        assert_eq!(result, json!({"greeting": "hello spout", "region": "eu"}));
    }

    #[test]
    fn test_state_persists_between_invocations() {
        let handler = load(
            "local calls = 0\nreturn function() calls = calls + 1 return calls end",
        )
        .unwrap();

        assert_eq!(handler.invoke(json!({}), json!({})).unwrap(), json!(1));
        assert_eq!(handler.invoke(json!({}), json!({})).unwrap(), json!(2));
    }

    #[rstest]
    #[case::marked_empty("return function() return setmetatable({}, array_mt) end", json!([]))]
    #[case::marked_list("return function() return setmetatable({1, 2}, array_mt) end", json!([1, 2]))]
    #[case::unmarked_empty("return function() return {} end", json!({}))]
    fn test_array_metatable_marks_lists(#[case] source: &str, #[case] expected: Value) {
        let handler = load(source).unwrap();

        assert_eq!(handler.invoke(json!({}), json!({})).unwrap(), expected);
    }

    #[test]
    fn test_non_serializable_return_is_invoke_error() {
        let handler = load("return function() return function() end end").unwrap();

        let result = handler.invoke(json!({}), json!({}));

        assert!(matches!(result, Err(InvokeError::Lua(_))));
    }

    #[rstest]
    #[case::syntax_error("return function(")]
    #[case::runtime_error("error('boom')")]
    fn test_script_errors(#[case] source: &str) {
        assert!(matches!(load(source), Err(LoadError::Script { .. })));
    }

    #[rstest]
    #[case::no_export("local x = 1", "nil")]
    #[case::number("return 42", "integer")]
    #[case::table("return {}", "table")]
    fn test_not_callable(#[case] source: &str, #[case] expected: &str) {
        match load(source) {
            Err(LoadError::NotCallable { found, .. }) => assert_eq!(found, expected),
            Err(e) => panic!("Expected NotCallable, got {e}"),
            Ok(_) => panic!("Expected NotCallable, got a handler"),
        }
    }

    #[test]
    fn test_handler_runtime_error_is_invoke_error() {
        let handler = load("return function(params) error('bad input') end").unwrap();

        let result = handler.invoke(json!({}), json!({}));

        assert!(matches!(result, Err(InvokeError::Lua(_))));
    }
}
