//! Field descriptors and per-model schemas discovered from the remote
//! service.

use crate::error::{Error, RemoteFault, Result};
use crate::suggest::closest_matches;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The internal primary-key pseudo-field.
pub const INTERNAL_ID: &str = "id";

/// The durable external-identifier pseudo-field.
pub const EXTERNAL_ID: &str = "external_id";

/// Attributes requested from the remote field introspection call.
pub const INTROSPECTION_ATTRIBUTES: [&str; 4] = ["string", "help", "type", "relation"];

/// Check whether a name is one of the two always-valid pseudo-fields.
///
/// `id` and `external_id` are navigable even when absent from the discovered
/// schema; they map to different internal representations in export mode.
pub fn is_pseudo_field(name: &str) -> bool {
    name == INTERNAL_ID || name == EXTERNAL_ID
}

/// How a field relates to other models, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FieldKind {
    /// Plain value field
    #[default]
    Scalar,
    /// Reference to a single record of another model
    ManyToOne,
    /// Inverse side of a many-to-one: a list of referencing records
    OneToMany,
    /// Symmetric list relation
    ManyToMany,
}

impl FieldKind {
    /// Parse the remote type string. Anything that is not one of the three
    /// relation markers is a scalar.
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "many2one" => FieldKind::ManyToOne,
            "one2many" => FieldKind::OneToMany,
            "many2many" => FieldKind::ManyToMany,
            _ => FieldKind::Scalar,
        }
    }

    /// Does this field reference record(s) of another model?
    pub const fn is_relational(self) -> bool {
        !matches!(self, FieldKind::Scalar)
    }

    /// Does this field hold more than one related record?
    pub const fn is_plural(self) -> bool {
        matches!(self, FieldKind::OneToMany | FieldKind::ManyToMany)
    }
}

/// Metadata about one field of a remote model.
///
/// Immutable once cached for a model within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name
    pub name: String,
    /// Scalar or relation kind
    pub kind: FieldKind,
    /// Target model for relational fields; a relational descriptor without
    /// a target signals a malformed remote schema
    pub related_model: Option<String>,
    /// Human-readable label
    pub label: Option<String>,
    /// Help text
    pub help: Option<String>,
}

/// The discovered field schema of one remote model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSchema {
    model: String,
    fields: BTreeMap<String, FieldDescriptor>,
}

impl ModelSchema {
    /// Build a schema from already-parsed descriptors.
    pub fn new(model: impl Into<String>, fields: BTreeMap<String, FieldDescriptor>) -> Self {
        Self {
            model: model.into(),
            fields,
        }
    }

    /// Parse the introspection payload: a map from field name to an
    /// attribute map carrying `string`, `help`, `type` and `relation`.
    pub fn from_value(model: &str, payload: &Value) -> Result<Self> {
        let entries = payload.as_map().ok_or_else(|| {
            Error::Remote(RemoteFault::execution(
                model,
                "fields_get",
                format!(
                    "malformed introspection payload: expected map, got {}",
                    payload.type_name()
                ),
            ))
        })?;

        let mut fields = BTreeMap::new();
        for (name, attributes) in entries {
            let attributes = attributes.as_map().ok_or_else(|| {
                Error::Remote(RemoteFault::execution(
                    model,
                    "fields_get",
                    format!("malformed descriptor for field '{name}'"),
                ))
            })?;

            let kind = attributes
                .get("type")
                .and_then(Value::as_str)
                .map_or(FieldKind::Scalar, FieldKind::from_type_name);
            let descriptor = FieldDescriptor {
                name: name.clone(),
                kind,
                related_model: attributes
                    .get("relation")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                label: attributes
                    .get("string")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                help: attributes
                    .get("help")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            };
            fields.insert(name.clone(), descriptor);
        }

        Ok(Self::new(model, fields))
    }

    /// The model this schema belongs to.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Look up a field descriptor by name.
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    /// Check whether the schema declares a field with this name.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterate over all declared field names.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema declares no fields at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Closest declared field names to `name`, best first.
    pub fn suggestions_for(&self, name: &str) -> Vec<String> {
        closest_matches(name, self.field_names())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> Value {
        Value::from(serde_json::json!({
            "name": {"string": "Name", "type": "char"},
            "customer": {"string": "Customer", "type": "many2one", "relation": "partner"},
            "lines": {"type": "one2many", "relation": "order.line"},
            "tags": {"type": "many2many", "relation": "tag"},
        }))
    }

    #[test]
    fn parses_kinds_and_relations() {
        let schema = ModelSchema::from_value("order", &payload()).expect("schema");
        assert_eq!(schema.model(), "order");
        assert_eq!(schema.len(), 4);

        let name = schema.get("name").expect("name");
        assert_eq!(name.kind, FieldKind::Scalar);
        assert_eq!(name.related_model, None);
        assert_eq!(name.label.as_deref(), Some("Name"));

        let customer = schema.get("customer").expect("customer");
        assert_eq!(customer.kind, FieldKind::ManyToOne);
        assert_eq!(customer.related_model.as_deref(), Some("partner"));
        assert!(customer.kind.is_relational());
        assert!(!customer.kind.is_plural());

        assert!(schema.get("lines").expect("lines").kind.is_plural());
        assert!(schema.get("tags").expect("tags").kind.is_plural());
    }

    #[test]
    fn rejects_non_map_payload() {
        let err = ModelSchema::from_value("order", &Value::Int(1)).unwrap_err();
        assert!(err.to_string().contains("malformed introspection payload"));
    }

    #[test]
    fn unknown_type_string_is_scalar() {
        assert_eq!(FieldKind::from_type_name("monetary"), FieldKind::Scalar);
        assert_eq!(FieldKind::from_type_name("many2one"), FieldKind::ManyToOne);
    }

    #[test]
    fn pseudo_fields() {
        assert!(is_pseudo_field("id"));
        assert!(is_pseudo_field("external_id"));
        assert!(!is_pseudo_field("name"));
    }

    #[test]
    fn suggestions_come_from_schema() {
        let schema = ModelSchema::from_value("order", &payload()).expect("schema");
        assert_eq!(schema.suggestions_for("custmer"), vec!["customer"]);
        assert!(schema.suggestions_for("zzz").is_empty());
    }
}
