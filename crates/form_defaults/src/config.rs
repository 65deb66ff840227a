use serde::{Deserialize, Serialize};

use crate::registry::DEFAULT_EXCLUDED_COMPONENTS;

/// Engine options, deserializable from any serde source.
///
/// ```ignore
/// let config: EngineConfig = serde_json::from_str(r#"{ "show_debug": true }"#)?;
/// assert_eq!(config.loop_tag, "form");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Emit debug events to the engine's trace sink.
    pub show_debug: bool,
    /// Identity tag attached to every debug event.
    pub loop_tag: String,
    /// Component kinds whose subtrees are not scanned for defaults.
    pub excluded_components: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            show_debug: false,
            loop_tag: "form".to_string(),
            excluded_components: DEFAULT_EXCLUDED_COMPONENTS
                .iter()
                .map(|kind| kind.to_string())
                .collect(),
        }
    }
}
