//! Schema transformer.
//!
//! Each endpoint has exactly one [`TransformRule`] that maps a raw upstream
//! record to the endpoint's normalized shape. Rules are held in a closed
//! [`RuleRegistry`] keyed by endpoint name.
//!
//! # Design
//!
//! - Rules are pure: applying a rule twice to the same record gives the same output
//! - Source fields are matched exactly (case-sensitive)
//! - A missing source field yields `null`, never an error
//! - Rules only see their own endpoint's records; no cross-endpoint joins
//!
//! # Example
//!
//! ```
//! use psm_bundle_core::transform::{FieldProjection, TransformRule};
//! use serde_json::json;
//!
//! let rule = FieldProjection::new("wirkstoff")
//!     .field("wirknr", "WIRKNR")
//!     .field("cas_nr", "CAS_NR");
//!
//! let raw = json!({"WIRKNR": "W-1"}).as_object().cloned().unwrap();
//! let out = rule.apply(&raw);
//! assert_eq!(out.get("wirknr"), Some(&json!("W-1")));
//! assert_eq!(out.get("cas_nr"), Some(&json!(null)));
//! ```

mod bvl;

use std::collections::BTreeMap;

use bundle_types::{NormalizedRecord, RawRecord, RawRecordSet};
use serde_json::Value;

use crate::catalog::Catalog;

/// Maps one endpoint's raw records to normalized records.
pub trait TransformRule: Send + Sync {
    /// Endpoint the rule is registered for.
    fn endpoint(&self) -> &str;

    /// Output fields, in order. Empty if the rule keeps the upstream shape.
    fn declared_fields(&self) -> Vec<&str>;

    /// Transform one record.
    fn apply(&self, raw: &RawRecord) -> NormalizedRecord;
}

/// Where an output field takes its value from.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSource {
    /// Copy the named source field, or `null` if absent.
    Source(String),
    /// Always write this value.
    Constant(Value),
}

#[derive(Debug, Clone, PartialEq)]
struct FieldSpec {
    output: String,
    source: FieldSource,
}

/// A rule that projects a fixed list of source fields onto output fields.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldProjection {
    endpoint: String,
    fields: Vec<FieldSpec>,
}

impl FieldProjection {
    /// Start an empty projection for `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            fields: Vec::new(),
        }
    }

    /// Declare `output`, copied from source field `source`.
    pub fn field(mut self, output: impl Into<String>, source: impl Into<String>) -> Self {
        self.fields.push(FieldSpec {
            output: output.into(),
            source: FieldSource::Source(source.into()),
        });
        self
    }

    /// Declare `output` with a constant value.
    pub fn constant(mut self, output: impl Into<String>, value: Value) -> Self {
        self.fields.push(FieldSpec {
            output: output.into(),
            source: FieldSource::Constant(value),
        });
        self
    }

    /// Source of a declared output field.
    pub fn source_of(&self, output: &str) -> Option<&FieldSource> {
        self.fields
            .iter()
            .find(|f| f.output == output)
            .map(|f| &f.source)
    }
}

impl TransformRule for FieldProjection {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn declared_fields(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.output.as_str()).collect()
    }

    fn apply(&self, raw: &RawRecord) -> NormalizedRecord {
        let mut record = NormalizedRecord::new();
        for spec in &self.fields {
            let value = match &spec.source {
                FieldSource::Source(name) => raw.get(name).cloned().unwrap_or(Value::Null),
                FieldSource::Constant(value) => value.clone(),
            };
            record.insert(spec.output.clone(), value);
        }
        record
    }
}

/// A rule that keeps every upstream field as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassThrough {
    endpoint: String,
}

impl PassThrough {
    /// Create a pass-through rule for `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl TransformRule for PassThrough {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn declared_fields(&self) -> Vec<&str> {
        Vec::new()
    }

    fn apply(&self, raw: &RawRecord) -> NormalizedRecord {
        NormalizedRecord::from(raw.clone())
    }
}

/// Closed mapping from endpoint name to its rule.
#[derive(Default)]
pub struct RuleRegistry {
    rules: BTreeMap<String, Box<dyn TransformRule>>,
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("endpoints", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl RuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a rule for every BVL endpoint.
    pub fn bvl() -> Self {
        let mut registry = Self::new();
        for rule in bvl::rules() {
            registry.register(rule);
        }
        registry
    }

    /// Register a rule, replacing any earlier rule for the same endpoint.
    pub fn register(&mut self, rule: impl TransformRule + 'static) -> &mut Self {
        self.rules.insert(rule.endpoint().to_string(), Box::new(rule));
        self
    }

    /// Rule for `endpoint`, if any.
    pub fn get(&self, endpoint: &str) -> Option<&dyn TransformRule> {
        self.rules.get(endpoint).map(|rule| rule.as_ref())
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Registered endpoint names, sorted.
    pub fn endpoints(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Catalog endpoints that have no rule, in catalog order.
    ///
    /// Call at startup and report each as a configuration gap.
    pub fn missing_for<'a>(&self, catalog: &'a Catalog) -> Vec<&'a str> {
        catalog
            .names()
            .filter(|name| !self.rules.contains_key(*name))
            .collect()
    }

    /// Transform one endpoint's records.
    ///
    /// An endpoint without a rule yields no records and a warning.
    pub fn transform(&self, endpoint: &str, raw: &RawRecordSet) -> Vec<NormalizedRecord> {
        match self.get(endpoint) {
            Some(rule) => raw.records.iter().map(|r| rule.apply(r)).collect(),
            None => {
                tracing::warn!(
                    "No transform rule for endpoint {}, dropping {} records",
                    endpoint,
                    raw.len()
                );
                Vec::new()
            }
        }
    }

    /// Transform every raw set, and emit an empty set for every registered
    /// endpoint that has no raw data.
    pub fn transform_all(
        &self,
        raw: &BTreeMap<String, RawRecordSet>,
    ) -> BTreeMap<String, Vec<NormalizedRecord>> {
        let mut out = BTreeMap::new();
        for (name, set) in raw {
            let records = self.transform(name, set);
            tracing::info!("Transformed {}: {} records", name, records.len());
            out.insert(name.clone(), records);
        }
        for name in self.endpoints() {
            if !out.contains_key(name) {
                tracing::warn!("No raw data for endpoint {}", name);
                out.insert(name.to_string(), Vec::new());
            }
        }
        out
    }
}
