//! Turns a field's default specification into a concrete value.
//!
//! Templates and scripts are pluggable: anything implementing
//! [`TemplateRenderer`] or [`ScriptExecutor`] (closures included) can replace the
//! built-in minijinja renderer and rhai executor.

use minijinja::value::ValueKind;
use minijinja::{escape_formatter, Environment, Error, ErrorKind, UndefinedBehavior};
use serde_json::Value;
use tracing::debug;

use crate::errors::{ScriptError, TemplateError};
use crate::schema::{DefaultMode, DefaultValueSpec};
use crate::value::display_string;

/// Renders `{{ name }}` style templates against the form data.
pub trait TemplateRenderer {
    fn render(&self, template: &str, context: &Value) -> Result<String, TemplateError>;
}

impl<F> TemplateRenderer for F
where
    F: Fn(&str, &Value) -> Result<String, TemplateError>,
{
    fn render(&self, template: &str, context: &Value) -> Result<String, TemplateError> {
        self(template, context)
    }
}

/// Executes a scripted default body with the form data bound as `this`.
pub trait ScriptExecutor {
    fn execute(&self, body: &str, context: &Value) -> Result<Value, ScriptError>;
}

impl<F> ScriptExecutor for F
where
    F: Fn(&str, &Value) -> Result<Value, ScriptError>,
{
    fn execute(&self, body: &str, context: &Value) -> Result<Value, ScriptError> {
        self(body, context)
    }
}

/// Template renderer backed by minijinja.
///
/// Undefined names and nulls render as empty strings. Numbers, lists and maps
/// print like [`display_string`] so a rendered default compares equal to the
/// data it came from. A trailing newline in the template is kept.
///
/// Output is never HTML-escaped, since defaults are form data and not markup.
/// Mustache sections (`{{#x}}...{{/x}}`) are not supported; such templates
/// fail to parse and the evaluator keeps their literal text.
pub struct MiniJinjaRenderer {
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Lenient);
        env.set_keep_trailing_newline(true);
        env.set_formatter(|out, state, value| match value.kind() {
            ValueKind::Undefined | ValueKind::None => Ok(()),
            ValueKind::Number | ValueKind::Seq | ValueKind::Map => {
                let json = serde_json::to_value(value)
                    .map_err(|err| Error::new(ErrorKind::BadSerialization, err.to_string()))?;
                out.write_str(&display_string(&json))?;
                Ok(())
            }
            _ => escape_formatter(out, state, value),
        });
        Self { env }
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    fn render(&self, template: &str, context: &Value) -> Result<String, TemplateError> {
        self.env
            .render_str(template, context)
            .map_err(|err| TemplateError(err.to_string()))
    }
}

/// Outcome of evaluating one default.
#[derive(Debug)]
pub enum Evaluation {
    /// Write this value.
    Value(Value),
    /// Leave the field untouched.
    Skip,
}

pub struct ValueEvaluator {
    renderer: Box<dyn TemplateRenderer>,
    script: Option<Box<dyn ScriptExecutor>>,
}

impl Default for ValueEvaluator {
    fn default() -> Self {
        Self {
            renderer: Box::new(MiniJinjaRenderer::new()),
            script: default_script_executor(),
        }
    }
}

#[cfg(feature = "script")]
fn default_script_executor() -> Option<Box<dyn ScriptExecutor>> {
    Some(Box::new(crate::script::RhaiExecutor::new()))
}

#[cfg(not(feature = "script"))]
fn default_script_executor() -> Option<Box<dyn ScriptExecutor>> {
    None
}

impl ValueEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_renderer(mut self, renderer: impl TemplateRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn with_script_executor(mut self, executor: impl ScriptExecutor + 'static) -> Self {
        self.script = Some(Box::new(executor));
        self
    }

    /// Drop the script executor; scripted defaults then fail with
    /// [`EvaluationError::ScriptUnavailable`].
    pub fn without_script_executor(mut self) -> Self {
        self.script = None;
        self
    }

    pub fn has_script_executor(&self) -> bool {
        self.script.is_some()
    }

    /// Compute the value of `spec` against the working data.
    ///
    /// Template failures never surface: the raw template text becomes the value.
    /// Script failures are returned to the caller.
    pub fn evaluate(
        &self,
        spec: &DefaultValueSpec,
        data: &Value,
    ) -> Result<Evaluation, EvaluationError> {
        let Some(source) = spec.source() else {
            return Ok(Evaluation::Skip);
        };

        match spec.mode() {
            DefaultMode::Js => {
                let executor = self
                    .script
                    .as_ref()
                    .ok_or(EvaluationError::ScriptUnavailable)?;
                let value = executor
                    .execute(source, data)
                    .map_err(EvaluationError::Script)?;
                Ok(Evaluation::Value(value))
            }
            DefaultMode::Basic => Ok(Evaluation::Value(self.render_template(source, data))),
        }
    }

    fn render_template(&self, template: &str, data: &Value) -> Value {
        match self.renderer.render(template, data) {
            Ok(rendered) => Value::String(rendered),
            Err(err) => {
                debug!(%err, template, "template default kept verbatim");
                Value::String(template.to_string())
            }
        }
    }
}

/// Why a default could not be evaluated. Only scripted defaults fail.
#[derive(Debug)]
pub enum EvaluationError {
    Script(ScriptError),
    ScriptUnavailable,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DetailedDefault;
    use serde_json::json;

    fn template(text: &str) -> DefaultValueSpec {
        DefaultValueSpec::Template(text.to_string())
    }

    fn detailed(value: &str, mode: DefaultMode) -> DefaultValueSpec {
        DefaultValueSpec::Detailed(DetailedDefault {
            value: Some(value.to_string()),
            mode,
        })
    }

    fn value_of(evaluation: Evaluation) -> Value {
        match evaluation {
            Evaluation::Value(value) => value,
            Evaluation::Skip => panic!("expected a value"),
        }
    }

    #[test]
    fn renders_templates_against_data() {
        let evaluator = ValueEvaluator::new();
        let data = json!({ "first": "Ada", "age": 36 });

        let out = evaluator
            .evaluate(&template("{{ first }} ({{age}})"), &data)
            .unwrap();
        assert_eq!(value_of(out), json!("Ada (36)"));

        let out = evaluator
            .evaluate(&detailed("Hi {{first}}", DefaultMode::Basic), &data)
            .unwrap();
        assert_eq!(value_of(out), json!("Hi Ada"));
    }

    #[test]
    fn undefined_names_render_empty() {
        let evaluator = ValueEvaluator::new();
        let out = evaluator.evaluate(&template("[{{ nope }}]"), &json!({})).unwrap();
        assert_eq!(value_of(out), json!("[]"));
    }

    #[test]
    fn null_fields_render_empty() {
        let evaluator = ValueEvaluator::new();
        let out = evaluator
            .evaluate(&template("{{f1}}-suffix"), &json!({ "f1": null }))
            .unwrap();
        assert_eq!(value_of(out), json!("-suffix"));
    }

    #[test]
    fn numbers_and_lists_print_like_form_values() {
        let evaluator = ValueEvaluator::new();
        let data = json!({ "whole": 2.0, "half": 2.5, "big": 12345678901i64, "tags": [1, "a", null] });
        let out = evaluator
            .evaluate(&template("{{ whole }}|{{ half }}|{{ big }}|{{ tags }}"), &data)
            .unwrap();
        assert_eq!(value_of(out), json!("2|2.5|12345678901|1,a,"));
    }

    #[test]
    fn markup_is_not_escaped() {
        let evaluator = ValueEvaluator::new();
        let out = evaluator
            .evaluate(&template("{{ name }}"), &json!({ "name": "<b>&'\"" }))
            .unwrap();
        assert_eq!(value_of(out), json!("<b>&'\""));
    }

    #[test]
    fn mustache_sections_are_kept_verbatim() {
        let evaluator = ValueEvaluator::new();
        let out = evaluator
            .evaluate(&template("{{#x}}yes{{/x}}"), &json!({ "x": true }))
            .unwrap();
        assert_eq!(value_of(out), json!("{{#x}}yes{{/x}}"));
    }

    #[test]
    fn broken_template_falls_back_to_source() {
        let evaluator = ValueEvaluator::new();
        let out = evaluator.evaluate(&template("{{ unclosed"), &json!({})).unwrap();
        assert_eq!(value_of(out), json!("{{ unclosed"));
    }

    #[test]
    fn custom_renderer_errors_are_contained() {
        let evaluator = ValueEvaluator::new()
            .with_renderer(|_: &str, _: &Value| -> Result<String, TemplateError> {
                Err(TemplateError("boom".into()))
            });
        let out = evaluator.evaluate(&template("raw"), &json!({})).unwrap();
        assert_eq!(value_of(out), json!("raw"));
    }

    #[test]
    fn empty_detailed_value_is_skipped() {
        let evaluator = ValueEvaluator::new();
        let out = evaluator
            .evaluate(&detailed("", DefaultMode::Js), &json!({}))
            .unwrap();
        assert!(matches!(out, Evaluation::Skip));
    }

    #[test]
    fn script_errors_propagate() {
        let evaluator = ValueEvaluator::new().with_script_executor(|_: &str, _: &Value| -> Result<Value, ScriptError> {
            Err(ScriptError::Runtime("nope".into()))
        });
        let err = evaluator
            .evaluate(&detailed("return 1", DefaultMode::Js), &json!({}))
            .unwrap_err();
        assert!(matches!(err, EvaluationError::Script(ScriptError::Runtime(_))));
    }

    #[test]
    fn missing_executor_is_reported() {
        let evaluator = ValueEvaluator::new().without_script_executor();
        let err = evaluator
            .evaluate(&detailed("return 1", DefaultMode::Js), &json!({}))
            .unwrap_err();
        assert!(matches!(err, EvaluationError::ScriptUnavailable));
    }

    #[test]
    fn custom_executor_receives_data() {
        let evaluator = ValueEvaluator::new().with_script_executor(|body: &str, data: &Value| -> Result<Value, ScriptError> {
            Ok(json!(format!("{body}:{}", data["a"])))
        });
        let out = evaluator
            .evaluate(&detailed("x", DefaultMode::Js), &json!({ "a": 1 }))
            .unwrap();
        assert_eq!(value_of(out), json!("x:1"));
    }
}
