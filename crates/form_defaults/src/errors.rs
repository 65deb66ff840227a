use thiserror::Error;

#[derive(Error, Debug)]
pub enum DefaultsError {
    #[error("script default for `{path}` failed: {source}")]
    Script {
        path: String,
        #[source]
        source: ScriptError,
    },

    #[error("script default for `{0}` needs a script executor")]
    ScriptUnavailable(String),

    #[error("invalid schema: {0}")]
    Schema(#[from] serde_json::Error),
}

/// Failure reported by a [`ScriptExecutor`](crate::evaluator::ScriptExecutor).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("compile error: {0}")]
    Compile(String),

    #[error("runtime error: {0}")]
    Runtime(String),

    #[error("result is not representable as form data: {0}")]
    Conversion(String),
}

/// Failure reported by a [`TemplateRenderer`](crate::evaluator::TemplateRenderer).
///
/// Never leaves the evaluator: a failed render falls back to the raw template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("template error: {0}")]
pub struct TemplateError(pub String);
