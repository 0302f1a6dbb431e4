//! Minimal element model for event targets
//!
//! The tracker only ever reads attributes off the element an interaction
//! originated from, so that is all an element carries.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Attribute that opts an element into interaction reporting.
/// Its value becomes the report's `targetKey`.
pub const TARGET_KEY_ATTRIBUTE: &str = "target-key";

/// Element an event was dispatched at
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub tag_name: String,
    pub attributes: HashMap<String, String>,
}

impl Element {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Get attribute value
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Non-empty `target-key` value, if the element carries one
    pub fn target_key(&self) -> Option<&str> {
        self.get_attribute(TARGET_KEY_ATTRIBUTE)
            .filter(|value| !value.is_empty())
    }
}
