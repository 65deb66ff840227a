//! Default values for schema-driven forms.
//!
//! Fields in a form schema may declare a `defaultValue`: a template such as
//! `"{{ first }} {{ last }}"` or a scripted expression. The engine fills those
//! fields into the form data and keeps them up to date while the fields they
//! depend on change, until the user types into a field. From then on that field
//! belongs to the user.
//!
//! # Example
//!
//! ```ignore
//! use form_defaults::{DefaultsEngine, FormSchema};
//! use serde_json::json;
//!
//! let schema = FormSchema::from_value(json!([
//!     { "items": [
//!         { "component": "FormInput", "config": { "name": "first", "defaultValue": "Ada" } },
//!         { "component": "FormInput", "config": { "name": "greeting", "defaultValue": "Hi {{ first }}" } }
//!     ] }
//! ]))?;
//!
//! let mut engine = DefaultsEngine::new(schema);
//! let mut data = json!({});
//! engine.data_changed(&mut data)?;
//! assert_eq!(data, json!({ "first": "Ada", "greeting": "Hi Ada" }));
//! ```

pub mod config;
pub mod engine;
pub mod errors;
pub mod evaluator;
pub mod key_path;
pub mod registry;
pub mod schema;
#[cfg(feature = "script")]
pub mod script;
pub mod trace;
pub mod value;

// Re-export main types
pub use config::EngineConfig;
pub use engine::{DefaultsEngine, DefaultsEngineBuilder, SWEEPS_PER_UPDATE};
pub use errors::{DefaultsError, ScriptError, TemplateError};
pub use evaluator::{
    Evaluation, EvaluationError, MiniJinjaRenderer, ScriptExecutor, TemplateRenderer,
    ValueEvaluator,
};
pub use key_path::KeyPath;
pub use registry::{ActiveDefault, DefaultRegistry, DEFAULT_EXCLUDED_COMPONENTS};
pub use schema::{
    ContainerNode, DefaultMode, DefaultValueSpec, DetailedDefault, FieldConfig, FieldNode,
    FormSchema, SchemaNode,
};
#[cfg(feature = "script")]
pub use script::RhaiExecutor;
pub use trace::{ChangeMap, NoopSink, TraceEvent, TraceSink, TracingSink};
pub use value::{deep_equal, display_string, values_equal};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
