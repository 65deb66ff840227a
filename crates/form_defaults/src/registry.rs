//! Default registry: the ordered list of fields whose defaults the engine manages.

use serde_json::Value;
use tracing::debug;

use crate::key_path::KeyPath;
use crate::schema::{DefaultValueSpec, FieldNode, FormSchema, SchemaNode};

/// Component kinds whose subtree keeps its own data scope.
pub const DEFAULT_EXCLUDED_COMPONENTS: &[&str] = &["FormLoop", "FormNestedScreen"];

/// Bookkeeping for one field with a default.
///
/// A record starts active and may be deactivated exactly once; there is no way
/// back to active short of rebuilding the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDefault {
    path: KeyPath,
    field: FieldNode,
    set_value: Option<Value>,
    inactive: bool,
}

impl ActiveDefault {
    fn new(path: KeyPath, field: FieldNode) -> Self {
        Self {
            path,
            field,
            set_value: None,
            inactive: false,
        }
    }

    pub fn path(&self) -> &KeyPath {
        &self.path
    }

    pub fn field(&self) -> &FieldNode {
        &self.field
    }

    /// The default specification of the owning field.
    pub fn spec(&self) -> Option<&DefaultValueSpec> {
        self.field.default_value()
    }

    /// Last value the engine wrote at [`path`](Self::path), `None` before the first write.
    pub fn set_value(&self) -> Option<&Value> {
        self.set_value.as_ref()
    }

    pub fn is_inactive(&self) -> bool {
        self.inactive
    }

    pub(crate) fn record_write(&mut self, value: Value) {
        debug_assert!(!self.inactive, "inactive records are never written");
        self.set_value = Some(value);
    }

    pub(crate) fn deactivate(&mut self) {
        self.inactive = true;
    }
}

/// Ordered collection of [`ActiveDefault`] records built from a schema.
#[derive(Debug, Clone)]
pub struct DefaultRegistry {
    records: Vec<ActiveDefault>,
    excluded_components: Vec<String>,
    initialized: bool,
}

impl Default for DefaultRegistry {
    fn default() -> Self {
        Self::new(
            DEFAULT_EXCLUDED_COMPONENTS
                .iter()
                .map(|kind| kind.to_string())
                .collect(),
        )
    }
}

impl DefaultRegistry {
    pub fn new(excluded_components: Vec<String>) -> Self {
        Self {
            records: Vec::new(),
            excluded_components,
            initialized: false,
        }
    }

    /// Discard all records and rescan `schema`.
    ///
    /// Records appear in document order, which is also the order defaults are
    /// applied in: a template may read any field registered before it.
    pub fn initialize(&mut self, schema: &FormSchema) {
        self.records.clear();
        self.collect(schema.nodes());
        self.initialized = true;
        debug!(records = self.records.len(), "default registry initialized");
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn records(&self) -> &[ActiveDefault] {
        &self.records
    }

    pub(crate) fn records_mut(&mut self) -> &mut [ActiveDefault] {
        &mut self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records still managed by the engine.
    pub fn active_count(&self) -> usize {
        self.records.iter().filter(|r| !r.inactive).count()
    }

    fn is_excluded(&self, node: &SchemaNode) -> bool {
        node.component()
            .is_some_and(|kind| self.excluded_components.iter().any(|ex| ex == kind))
    }

    fn collect(&mut self, nodes: &[SchemaNode]) {
        for node in nodes {
            if self.is_excluded(node) {
                continue;
            }

            match node {
                SchemaNode::Column(children) => self.collect(children),
                SchemaNode::Container(container) => self.collect(&container.items),
                SchemaNode::Field(field) => self.register(field),
            }
        }
    }

    fn register(&mut self, field: &FieldNode) {
        let Some(spec) = field.default_value() else {
            return;
        };
        if spec.is_empty() {
            return;
        }
        match field.name() {
            Some(name) if !name.is_empty() => {
                self.records
                    .push(ActiveDefault::new(KeyPath::parse(name), field.clone()));
            }
            _ => debug!("field with a default but without a name skipped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: Value) -> FormSchema {
        FormSchema::from_value(value).unwrap()
    }

    fn paths(registry: &DefaultRegistry) -> Vec<&str> {
        registry.records().iter().map(|r| r.path().as_str()).collect()
    }

    #[test]
    fn collects_fields_in_document_order() {
        let mut registry = DefaultRegistry::default();
        registry.initialize(&schema(json!([
            { "items": [
                { "component": "FormInput", "config": { "name": "a", "defaultValue": "1" } },
                { "component": "FormMultiColumn", "items": [
                    [ { "component": "FormInput", "config": { "name": "b", "defaultValue": "2" } } ],
                    [ { "component": "FormInput", "config": { "name": "c", "defaultValue": "3" } } ]
                ] },
                { "component": "FormInput", "config": { "name": "no_default" } }
            ] },
            { "items": [
                { "component": "FormInput", "config": { "name": "d", "defaultValue": { "value": "4" } } }
            ] }
        ])));

        assert!(registry.is_initialized());
        assert_eq!(paths(&registry), vec!["a", "b", "c", "d"]);
        assert!(registry
            .records()
            .iter()
            .all(|r| r.set_value().is_none() && !r.is_inactive()));
    }

    #[test]
    fn skips_loops_and_nested_screens() {
        let mut registry = DefaultRegistry::default();
        registry.initialize(&schema(json!([
            { "items": [
                { "component": "FormLoop", "config": { "name": "loop" }, "items": [
                    { "component": "FormInput", "config": { "name": "inner", "defaultValue": "x" } }
                ] },
                { "component": "FormNestedScreen", "config": { "name": "nested", "defaultValue": "y" } },
                { "component": "FormInput", "config": { "name": "outer", "defaultValue": "z" } }
            ] }
        ])));

        assert_eq!(paths(&registry), vec!["outer"]);
    }

    #[test]
    fn skips_empty_and_unnamed_defaults() {
        let mut registry = DefaultRegistry::default();
        registry.initialize(&schema(json!([
            { "items": [
                { "config": { "name": "empty", "defaultValue": "" } },
                { "config": { "name": "empty_js", "defaultValue": { "value": "", "mode": "js" } } },
                { "config": { "defaultValue": "orphan" } },
                { "config": { "name": "kept", "defaultValue": { "value": "return 1", "mode": "js" } } }
            ] }
        ])));

        assert_eq!(paths(&registry), vec!["kept"]);
    }

    #[test]
    fn reinitialize_discards_previous_state() {
        let mut registry = DefaultRegistry::default();
        let form = schema(json!([{ "items": [{ "config": { "name": "a", "defaultValue": "1" } }] }]));
        registry.initialize(&form);
        registry.records_mut()[0].deactivate();
        assert_eq!(registry.active_count(), 0);

        registry.initialize(&form);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.active_count(), 1);
    }

    #[test]
    fn custom_exclusions() {
        let mut registry = DefaultRegistry::new(vec!["Hidden".into()]);
        registry.initialize(&schema(json!([
            { "items": [
                { "component": "Hidden", "config": { "name": "a", "defaultValue": "1" } },
                { "component": "FormLoop", "items": [{ "config": { "name": "b", "defaultValue": "2" } }] }
            ] }
        ])));
        assert_eq!(paths(&registry), vec!["b"]);
    }
}
