//! Assembled query results.

use rpcmodel_core::Value;
use std::collections::BTreeMap;

/// One field of an assembled result: a scalar wire value, a nested record
/// (singular relation), or a list of nested records (plural relation).
#[derive(Debug, Clone, PartialEq)]
pub enum ResultValue {
    /// A plain wire value
    Scalar(Value),
    /// A single related record
    Record(Record),
    /// Zero or more related records
    Records(Vec<Record>),
}

impl ResultValue {
    /// Try to view this value as a scalar.
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            ResultValue::Scalar(v) => Some(v),
            _ => None,
        }
    }

    /// Try to view this value as a single related record.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            ResultValue::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Try to view this value as a list of related records.
    pub fn as_records(&self) -> Option<&[Record]> {
        match self {
            ResultValue::Records(r) => Some(r),
            _ => None,
        }
    }
}

/// An assembled result record: field name to scalar, nested record, or
/// nested record list.
///
/// Built fresh per query execution; repeated related records across
/// branches are independently materialized, so records carry no identity
/// beyond their content.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: BTreeMap<String, ResultValue>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one field.
    pub fn insert(&mut self, name: impl Into<String>, value: ResultValue) {
        self.fields.insert(name.into(), value);
    }

    /// Look up a field.
    pub fn get(&self, name: &str) -> Option<&ResultValue> {
        self.fields.get(name)
    }

    /// The internal id of this record, when present.
    pub fn id(&self) -> Option<i64> {
        self.scalar("id").and_then(Value::as_i64)
    }

    /// Shorthand for a scalar field.
    pub fn scalar(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(ResultValue::as_scalar)
    }

    /// Shorthand for a singular related record.
    pub fn record(&self, name: &str) -> Option<&Record> {
        self.get(name).and_then(ResultValue::as_record)
    }

    /// Shorthand for a plural related record list.
    pub fn records(&self, name: &str) -> Option<&[Record]> {
        self.get(name).and_then(ResultValue::as_records)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields (a degraded placeholder).
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResultValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn fields_mut(&mut self) -> &mut BTreeMap<String, ResultValue> {
        &mut self.fields
    }
}
