//! Form schema model.
//!
//! A schema is the JSON description a form renderer draws from: an ordered list
//! of screens, each holding `items`. Items are fields, containers with their own
//! `items`, or bare arrays (multi-column layouts).
//!
//! ```ignore
//! let schema = FormSchema::from_json(r#"[
//!   { "name": "Page 1", "items": [
//!     { "component": "FormInput", "config": { "name": "first", "defaultValue": "Ada" } },
//!     { "component": "FormInput", "config": {
//!         "name": "greeting",
//!         "defaultValue": { "value": "Hello {{ first }}", "mode": "basic" } } }
//!   ] }
//! ]"#)?;
//! ```
//!
//! Only the parts the default engine reads are typed; everything else a node
//! carries is kept in `extra` so a schema survives a round trip untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::DefaultsError;

/// Ordered list of top-level nodes (screens / pages).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormSchema(pub Vec<SchemaNode>);

impl FormSchema {
    pub fn new(nodes: Vec<SchemaNode>) -> Self {
        FormSchema(nodes)
    }

    pub fn from_json(text: &str) -> Result<Self, DefaultsError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_value(value: Value) -> Result<Self, DefaultsError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn nodes(&self) -> &[SchemaNode] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One node of the schema tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaNode {
    /// Bare array of nodes, e.g. one column of a multi-column layout.
    Column(Vec<SchemaNode>),
    /// Node carrying child `items`.
    Container(ContainerNode),
    /// Leaf input.
    Field(FieldNode),
}

impl SchemaNode {
    /// Component kind tag, if the node is an object carrying one.
    pub fn component(&self) -> Option<&str> {
        match self {
            SchemaNode::Column(_) => None,
            SchemaNode::Container(container) => container.component.as_deref(),
            SchemaNode::Field(field) => field.component.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    pub items: Vec<SchemaNode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<FieldConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldNode {
    pub fn name(&self) -> Option<&str> {
        self.config.as_ref()?.name.as_deref()
    }

    pub fn default_value(&self) -> Option<&DefaultValueSpec> {
        self.config.as_ref()?.default_value.as_ref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        rename = "defaultValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub default_value: Option<DefaultValueSpec>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// How a field's default is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValueSpec {
    /// Plain string, rendered as a template.
    Template(String),
    /// `{ "value": ..., "mode": ... }`.
    Detailed(DetailedDefault),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailedDefault {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub mode: DefaultMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultMode {
    /// Script body evaluated with the form data bound as `this`.
    Js,
    /// Any other mode string: template rendering.
    #[default]
    #[serde(other)]
    Basic,
}

impl DefaultValueSpec {
    /// The raw template or script text, `None` when the default is empty.
    pub fn source(&self) -> Option<&str> {
        let text = match self {
            DefaultValueSpec::Template(text) => Some(text.as_str()),
            DefaultValueSpec::Detailed(detailed) => detailed.value.as_deref(),
        };
        text.filter(|text| !text.is_empty())
    }

    pub fn mode(&self) -> DefaultMode {
        match self {
            DefaultValueSpec::Template(_) => DefaultMode::Basic,
            DefaultValueSpec::Detailed(detailed) => detailed.mode,
        }
    }

    /// True when the specification produces no value at all.
    pub fn is_empty(&self) -> bool {
        self.source().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_nested_layout() {
        let schema = FormSchema::from_value(json!([
            { "name": "Page", "items": [
                { "component": "FormInput", "config": { "name": "a", "defaultValue": "x" } },
                { "component": "FormMultiColumn", "items": [
                    [ { "component": "FormInput", "config": { "name": "b" } } ],
                    [ { "component": "FormText", "config": { "content": "hi" } } ]
                ] }
            ] }
        ]))
        .unwrap();

        let SchemaNode::Container(page) = &schema.nodes()[0] else {
            panic!("page should be a container");
        };
        assert_eq!(page.extra.get("name"), Some(&json!("Page")));
        assert!(matches!(page.items[0], SchemaNode::Field(_)));
        let SchemaNode::Container(columns) = &page.items[1] else {
            panic!("multi column should be a container");
        };
        assert_eq!(columns.component.as_deref(), Some("FormMultiColumn"));
        assert!(matches!(columns.items[0], SchemaNode::Column(_)));
    }

    #[test]
    fn default_value_forms() {
        let field: FieldNode = serde_json::from_value(json!({
            "config": { "name": "n", "defaultValue": { "value": "return 1", "mode": "js" } }
        }))
        .unwrap();
        let spec = field.default_value().unwrap();
        assert_eq!(spec.mode(), DefaultMode::Js);
        assert_eq!(spec.source(), Some("return 1"));

        let spec: DefaultValueSpec =
            serde_json::from_value(json!({ "value": "{{a}}", "mode": "Mustache" })).unwrap();
        assert_eq!(spec.mode(), DefaultMode::Basic);

        let spec: DefaultValueSpec = serde_json::from_value(json!({ "value": "", "mode": "js" })).unwrap();
        assert!(spec.is_empty());
        assert!(DefaultValueSpec::Template(String::new()).is_empty());
    }

    #[test]
    fn round_trip_keeps_unknown_keys() {
        let raw = json!([{ "items": [{ "component": "FormInput", "config": { "name": "a", "label": "A" } }] }]);
        let schema = FormSchema::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&schema).unwrap(), raw);
    }
}
