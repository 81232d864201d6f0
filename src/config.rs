use serde::{Deserialize, Serialize};

/// Engine-wide knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// When a path resolves to `""` but the binding's own fallback is a list
    /// or an object, return the fallback. Rehydrates list state that an
    /// earlier step stored as an empty string.
    pub prefer_structural_fallback: bool,
    /// Alias used for iteration frames that do not name one.
    pub default_alias: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prefer_structural_fallback: true,
            default_alias: "item".to_string(),
        }
    }
}
