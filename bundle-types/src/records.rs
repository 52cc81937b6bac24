//! Raw and normalized record types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One opaque upstream record: a JSON object as returned in `items`.
pub type RawRecord = Map<String, Value>;

/// Every record fetched for one endpoint in one run.
///
/// A set is either complete or empty; it is never partially overwritten.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecordSet {
    /// Name of the endpoint the records came from.
    pub endpoint_name: String,
    /// The records, in upstream order.
    pub records: Vec<RawRecord>,
}

impl RawRecordSet {
    /// Create a record set.
    pub fn new(endpoint_name: impl Into<String>, records: Vec<RawRecord>) -> Self {
        Self {
            endpoint_name: endpoint_name.into(),
            records,
        }
    }

    /// Create the empty set recorded for a failed endpoint.
    pub fn empty(endpoint_name: impl Into<String>) -> Self {
        Self::new(endpoint_name, Vec::new())
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the set holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A record reshaped into its endpoint's declared output schema.
///
/// Fields keep their declaration order, so serializing the same record
/// always produces the same bytes. Every field is independently nullable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedRecord(Map<String, Value>);

impl NormalizedRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Declaring the same field twice keeps the last value.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    /// Read a field; `None` if the field is not declared.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Declared field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record declares no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for NormalizedRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
