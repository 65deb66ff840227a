//! Scripted defaults on top of the embedded rhai engine.
//!
//! The body of a `mode = "js"` default is wrapped into a function and called
//! with the form data bound as `this`:
//!
//! ```text
//! return this.first + " " + this.last;
//! ```
//!
//! The engine runs with operation, call depth and string size limits so a
//! runaway default stops with an error instead of hanging the form.

use rhai::{CallFnOptions, Dynamic, Engine, Scope};
use serde_json::Value;

use crate::errors::ScriptError;
use crate::evaluator::ScriptExecutor;

const ENTRY_POINT: &str = "default_value";

pub const DEFAULT_MAX_OPERATIONS: u64 = 100_000;

pub struct RhaiExecutor {
    engine: Engine,
}

impl RhaiExecutor {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        engine.set_max_operations(DEFAULT_MAX_OPERATIONS);
        engine.set_max_call_levels(32);
        engine.set_max_expr_depths(64, 32);
        engine.set_max_string_size(64 * 1024);
        Self { engine }
    }

    /// Use a preconfigured engine, e.g. with extra registered functions.
    pub fn with_engine(engine: Engine) -> Self {
        Self { engine }
    }
}

impl Default for RhaiExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptExecutor for RhaiExecutor {
    fn execute(&self, body: &str, context: &Value) -> Result<Value, ScriptError> {
        let source = format!("fn {ENTRY_POINT}() {{\n{body}\n}}");
        let ast = self
            .engine
            .compile(&source)
            .map_err(|err| ScriptError::Compile(err.to_string()))?;

        let mut this = rhai::serde::to_dynamic(context)
            .map_err(|err| ScriptError::Conversion(err.to_string()))?;
        let options = CallFnOptions::new()
            .eval_ast(false)
            .bind_this_ptr(&mut this);

        let result: Dynamic = self
            .engine
            .call_fn_with_options(options, &mut Scope::new(), &ast, ENTRY_POINT, ())
            .map_err(|err| ScriptError::Runtime(err.to_string()))?;

        rhai::serde::from_dynamic::<Value>(&result)
            .map_err(|err| ScriptError::Conversion(err.to_string()))
    }
}
