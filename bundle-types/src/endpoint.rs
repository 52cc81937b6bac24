//! Endpoint descriptors.

use serde::{Deserialize, Serialize};

/// One named upstream resource, fetched and processed as an independent unit.
///
/// Descriptors are immutable once the catalog is built. Their processing
/// order is `(priority_group, name)` ascending, so that endpoints referenced
/// by later groups are fetched before the endpoints that reference them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    /// Unique endpoint name, also used for every file derived from it.
    pub name: String,
    /// Resource path relative to the upstream base URL (e.g. `/mittel/`).
    pub path: String,
    /// Fetch ordering group; lower groups are fetched first.
    pub priority_group: u32,
    /// Human-readable description.
    pub description: String,
    /// Free-form category label (e.g. `lookup`).
    #[serde(default)]
    pub category: String,
}

impl EndpointDescriptor {
    /// Create a descriptor without a category label.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        priority_group: u32,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            priority_group,
            description: description.into(),
            category: String::new(),
        }
    }

    /// Set the category label.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// The key descriptors are ordered by.
    pub fn order_key(&self) -> (u32, &str) {
        (self.priority_group, self.name.as_str())
    }

    /// File name of this endpoint's compressed artifact.
    pub fn artifact_filename(&self) -> String {
        format!("{}{}", self.name, crate::ARTIFACT_EXTENSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_key_uses_group_then_name() {
        let a = EndpointDescriptor::new("wirkstoff", "/wirkstoff/", 2, "");
        let b = EndpointDescriptor::new("kode", "/kode/", 1, "");
        assert!(b.order_key() < a.order_key());
    }

    #[test]
    fn artifact_filename_appends_extension() {
        let d = EndpointDescriptor::new("awg", "/awg/", 5, "Anwendungsgebiete");
        assert_eq!(d.artifact_filename(), "awg.json.gz");
    }

    #[test]
    fn category_defaults_when_missing() {
        let json = r#"{"name":"kode","path":"/kode/","priority_group":1,"description":"x"}"#;
        let d: EndpointDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(d.category, "");
    }
}
