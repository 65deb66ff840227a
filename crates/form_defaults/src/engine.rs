//! Reconciliation loop.
//!
//! The surrounding form calls one of the trigger methods whenever something
//! changes:
//!
//! - [`DefaultsEngine::data_changed`] after the form data was edited,
//! - [`DefaultsEngine::schema_changed`] when a new schema arrives,
//! - [`DefaultsEngine::mode_changed`] when the form switches mode (edit, view, ...).
//!
//! Each trigger deep-copies the data, applies all active defaults twice and
//! replaces the caller's data only if something changed. Values the user typed
//! are never overwritten: a field is released for good as soon as its value
//! differs from what the engine last wrote there.

use serde_json::Value;

use crate::config::EngineConfig;
use crate::errors::DefaultsError;
use crate::evaluator::{Evaluation, EvaluationError, ValueEvaluator};
use crate::key_path::KeyPath;
use crate::registry::{ActiveDefault, DefaultRegistry};
use crate::schema::FormSchema;
use crate::trace::{ChangeMap, TraceEvent, TraceSink, TracingSink, INACTIVE_MARKER};
use crate::value::{display_optional, display_string, values_equal};

/// Application sweeps per reconciliation pass. A chain of defaults that depends
/// on fields further ahead may need more passes (i.e. more triggers) to settle.
pub const SWEEPS_PER_UPDATE: usize = 2;

pub struct DefaultsEngineBuilder {
    schema: FormSchema,
    mode: String,
    config: EngineConfig,
    evaluator: Option<ValueEvaluator>,
    sink: Option<Box<dyn TraceSink>>,
}

impl DefaultsEngineBuilder {
    pub fn new(schema: FormSchema) -> Self {
        Self {
            schema,
            mode: String::new(),
            config: EngineConfig::default(),
            evaluator: None,
            sink: None,
        }
    }

    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn show_debug(mut self, show_debug: bool) -> Self {
        self.config.show_debug = show_debug;
        self
    }

    pub fn loop_tag(mut self, tag: impl Into<String>) -> Self {
        self.config.loop_tag = tag.into();
        self
    }

    pub fn evaluator(mut self, evaluator: ValueEvaluator) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Receiver of debug events. Without one, events go to `tracing`.
    pub fn trace_sink(mut self, sink: impl TraceSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn build(self) -> DefaultsEngine {
        DefaultsEngine {
            registry: DefaultRegistry::new(self.config.excluded_components.clone()),
            schema: self.schema,
            mode: self.mode,
            config: self.config,
            evaluator: self.evaluator.unwrap_or_default(),
            sink: self.sink,
            last_pushed: None,
        }
    }
}

pub struct DefaultsEngine {
    schema: FormSchema,
    mode: String,
    config: EngineConfig,
    registry: DefaultRegistry,
    evaluator: ValueEvaluator,
    sink: Option<Box<dyn TraceSink>>,
    last_pushed: Option<Value>,
}

enum Step {
    Apply,
    Deactivate,
}

impl DefaultsEngine {
    pub fn new(schema: FormSchema) -> Self {
        Self::builder(schema).build()
    }

    pub fn builder(schema: FormSchema) -> DefaultsEngineBuilder {
        DefaultsEngineBuilder::new(schema)
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &DefaultRegistry {
        &self.registry
    }

    pub fn records(&self) -> &[ActiveDefault] {
        self.registry.records()
    }

    pub fn is_initialized(&self) -> bool {
        self.registry.is_initialized()
    }

    /// Data most recently written back by the engine, `None` since the last
    /// (re)initialization.
    pub fn last_pushed(&self) -> Option<&Value> {
        self.last_pushed.as_ref()
    }

    pub fn set_show_debug(&mut self, show_debug: bool) {
        self.config.show_debug = show_debug;
    }

    pub fn set_trace_sink(&mut self, sink: impl TraceSink + 'static) {
        self.sink = Some(Box::new(sink));
    }

    /// Mount entry point: build the registry and reconcile `data` once.
    pub fn attach(&mut self, data: &mut Value) -> Result<bool, DefaultsError> {
        self.initialize();
        self.update(data)
    }

    /// The form data changed. Builds the registry first if needed.
    pub fn data_changed(&mut self, data: &mut Value) -> Result<bool, DefaultsError> {
        self.trace(|| TraceEvent::DataChanged {
            snapshot: data.clone(),
        });
        if !self.registry.is_initialized() {
            self.initialize();
        }
        self.update(data)
    }

    /// A schema arrived. An identical schema is ignored; a different one
    /// rebuilds the registry, discarding every record's state.
    pub fn schema_changed(
        &mut self,
        schema: FormSchema,
        data: &mut Value,
    ) -> Result<bool, DefaultsError> {
        if schema == self.schema && self.registry.is_initialized() {
            return Ok(false);
        }
        self.schema = schema;
        self.trace(|| TraceEvent::SchemaChanged {
            snapshot: data.clone(),
        });
        self.initialize();
        self.update(data)
    }

    /// The form switched mode. Same mode is ignored; a new one rebuilds the
    /// registry.
    pub fn mode_changed(
        &mut self,
        mode: impl Into<String>,
        data: &mut Value,
    ) -> Result<bool, DefaultsError> {
        let mode = mode.into();
        if mode == self.mode && self.registry.is_initialized() {
            return Ok(false);
        }
        self.mode = mode;
        self.trace(|| TraceEvent::ModeChanged {
            mode: self.mode.clone(),
            snapshot: data.clone(),
        });
        self.initialize();
        self.update(data)
    }

    /// Rebuild the registry from the current schema.
    pub fn initialize(&mut self) {
        self.last_pushed = None;
        self.registry.initialize(&self.schema);
        let records = self.registry.len();
        self.trace(|| TraceEvent::Initialized { records });
    }

    /// Reconcile `data` with the active defaults.
    ///
    /// Returns `true` when `data` was replaced. On error `data` is left as it was.
    pub fn update(&mut self, data: &mut Value) -> Result<bool, DefaultsError> {
        self.trace(|| TraceEvent::Update {
            snapshot: data.clone(),
        });

        let own_write = match &self.last_pushed {
            Some(pushed) => values_equal(data, pushed),
            None => values_equal(data, &Value::Null),
        };
        if own_write {
            self.trace(|| TraceEvent::SkippedOwnWrite);
            return Ok(false);
        }

        let mut working = data.clone();
        for _ in 0..SWEEPS_PER_UPDATE {
            self.apply_defaults(&mut working)?;
        }

        if values_equal(data, &working) {
            self.trace(|| TraceEvent::SkippedUnchanged);
            return Ok(false);
        }

        self.last_pushed = Some(working.clone());
        *data = working;
        self.trace(|| TraceEvent::Pushed {
            snapshot: data.clone(),
        });
        Ok(true)
    }

    /// One sweep over the active records, in registry order.
    fn apply_defaults(&mut self, working: &mut Value) -> Result<(), DefaultsError> {
        let mut changes = ChangeMap::new();
        let evaluator = &self.evaluator;

        for record in self.registry.records_mut() {
            if record.is_inactive() {
                continue;
            }

            match next_step(record.path().get_or_null(working), record.set_value()) {
                Step::Deactivate => {
                    record.deactivate();
                    changes.insert(record.path().to_string(), INACTIVE_MARKER.to_string());
                }
                Step::Apply => {
                    let Some(spec) = record.spec() else {
                        continue;
                    };
                    let evaluation = evaluator
                        .evaluate(spec, working)
                        .map_err(|err| evaluation_error(record.path(), err))?;
                    if let Evaluation::Value(value) = evaluation {
                        changes.insert(
                            record.path().to_string(),
                            format!(
                                "{} --> {}",
                                display_optional(record.set_value()),
                                display_string(&value)
                            ),
                        );
                        record.path().set(working, value.clone());
                        record.record_write(value);
                    }
                }
            }
        }

        self.trace(|| TraceEvent::Changes { changes });
        Ok(())
    }

    fn trace(&self, event: impl FnOnce() -> TraceEvent) {
        if !self.config.show_debug {
            return;
        }
        let event = event();
        match &self.sink {
            Some(sink) => sink.record(&self.config.loop_tag, &event),
            None => TracingSink.record(&self.config.loop_tag, &event),
        }
    }
}

/// Decide what to do with an active record given the value currently at its path.
fn next_step(current: &Value, set_value: Option<&Value>) -> Step {
    // A null write counts as never written.
    match set_value.filter(|written| !written.is_null()) {
        // The user filled the field before the engine ever touched it.
        None if !current.is_null() => Step::Deactivate,
        None => Step::Apply,
        Some(_) if current.is_null() => Step::Apply,
        Some(written) if values_equal(current, written) => Step::Apply,
        // Edited since the engine's last write.
        Some(_) => Step::Deactivate,
    }
}

fn evaluation_error(path: &KeyPath, err: EvaluationError) -> DefaultsError {
    match err {
        EvaluationError::Script(source) => DefaultsError::Script {
            path: path.to_string(),
            source,
        },
        EvaluationError::ScriptUnavailable => DefaultsError::ScriptUnavailable(path.to_string()),
    }
}
