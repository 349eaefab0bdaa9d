//! Recursive nested fetch.
//!
//! The remote `read` only returns flat, one-level records; relational
//! fields arrive as raw ids. This module walks the projection field tree
//! model by model, batching every level by the distinct set of related ids
//! so the number of round trips depends on the tree shape, not the row
//! count, and splices the fetched sub-records back into their parents.

use crate::record::{Record, ResultValue};
use rpcmodel_core::{
    Error, FieldKind, Kwargs, RemoteFault, Result, SchemaIntegrityError, Session, Transport, Value,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Nested field names to fetch, built from the projections' internal
/// paths. Shared prefixes merge into one branch.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct FieldTree {
    children: BTreeMap<String, FieldTree>,
}

impl FieldTree {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Merge one dot-path, segment by segment.
    pub(crate) fn insert(&mut self, segments: &[String]) {
        let mut node = self;
        for segment in segments {
            node = node.children.entry(segment.clone()).or_default();
        }
    }

    pub(crate) fn children(&self) -> &BTreeMap<String, FieldTree> {
        &self.children
    }
}

/// Build the fetch tree from projection segment paths.
pub(crate) fn build_field_tree<'a, I>(paths: I) -> FieldTree
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut tree = FieldTree::new();
    for path in paths {
        tree.insert(path);
    }
    tree
}

/// The id(s) referenced by a singular relation value.
///
/// The remote may deliver a many-to-one either as a bare id or as an
/// `[id, label]` pair; both are accepted and neither is authoritative.
fn singular_related_id(value: &Value) -> Option<i64> {
    match value {
        Value::Int(id) => Some(*id),
        Value::List(items) => items.first().and_then(Value::as_i64),
        _ => None,
    }
}

/// The ids referenced by a plural relation value, in record order.
fn plural_related_ids(value: &Value) -> Vec<i64> {
    value
        .as_list()
        .map(|items| items.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default()
}

fn malformed(model: &str, method: &str, message: impl Into<String>) -> Error {
    Error::Remote(RemoteFault::execution(model, method, message))
}

/// Fetch `ids` of `model`, recursing into every relational branch of
/// `tree`, and return the assembled records keyed by id.
///
/// Issues one `read` per (model, tree branch) with the distinct related id
/// set collected across all parent records. A related id the remote did
/// not return (hidden by access rules, for example) degrades to an empty
/// record instead of failing the whole fetch.
pub(crate) fn fetch_tree<T: Transport>(
    session: &Session<T>,
    model: &str,
    ids: &[i64],
    tree: &FieldTree,
    context: &BTreeMap<String, Value>,
) -> Result<HashMap<i64, Record>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let schema = session.schema(model)?;

    let mut field_names: Vec<String> = tree.children().keys().cloned().collect();
    if !field_names.iter().any(|f| f == "id") {
        field_names.push("id".to_string());
    }
    tracing::trace!(model, ids = ids.len(), fields = ?field_names, "reading level");

    let mut kwargs = Kwargs::new();
    kwargs.insert(
        "fields".to_string(),
        Value::List(field_names.iter().map(|f| Value::from(f.as_str())).collect()),
    );
    kwargs.insert("context".to_string(), Value::Map(context.clone()));

    let response = session.execute(
        model,
        "read",
        vec![Value::from(ids.to_vec())],
        kwargs,
    )?;
    let rows = response
        .into_list()
        .ok_or_else(|| malformed(model, "read", "expected a list of records"))?;

    let mut wire_rows: Vec<(i64, BTreeMap<String, Value>)> = Vec::with_capacity(rows.len());
    for row in rows {
        let map = row
            .into_map()
            .ok_or_else(|| malformed(model, "read", "expected each record to be a map"))?;
        let id = map
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| malformed(model, "read", "record without an integer id"))?;
        wire_rows.push((id, map));
    }

    // One recursion per relational branch: collect the distinct related ids
    // across all rows first, then fetch that set in a single call chain.
    let mut spliced: BTreeMap<String, (FieldKind, HashMap<i64, Record>)> = BTreeMap::new();
    for (name, subtree) in tree.children() {
        let Some(descriptor) = schema.get(name) else {
            // Pseudo-fields and names the schema does not declare are
            // treated as scalars.
            continue;
        };
        if !descriptor.kind.is_relational() {
            continue;
        }
        let related_model =
            descriptor
                .related_model
                .as_deref()
                .ok_or_else(|| SchemaIntegrityError {
                    model: model.to_string(),
                    field: name.clone(),
                    message: "relational field declares no related model; the remote schema is \
                              malformed"
                        .to_string(),
                })?;

        let mut related_ids: BTreeSet<i64> = BTreeSet::new();
        for (_, row) in &wire_rows {
            let Some(value) = row.get(name) else { continue };
            if descriptor.kind.is_plural() {
                related_ids.extend(plural_related_ids(value));
            } else if let Some(id) = singular_related_id(value) {
                related_ids.insert(id);
            }
        }

        let related_ids: Vec<i64> = related_ids.into_iter().collect();
        let related = fetch_tree(session, related_model, &related_ids, subtree, context)?;
        spliced.insert(name.clone(), (descriptor.kind, related));
    }

    let mut records_by_id = HashMap::with_capacity(wire_rows.len());
    for (id, row) in wire_rows {
        let mut record = Record::new();
        for (field, value) in row {
            match spliced.get(&field) {
                Some((kind, related)) => {
                    record.insert(field, splice(*kind, &value, related));
                }
                None => record.insert(field, ResultValue::Scalar(value)),
            }
        }
        records_by_id.insert(id, record);
    }

    Ok(records_by_id)
}

/// Replace a raw relation value with the recursively-fetched record(s).
fn splice(kind: FieldKind, raw: &Value, related: &HashMap<i64, Record>) -> ResultValue {
    if kind.is_plural() {
        ResultValue::Records(
            plural_related_ids(raw)
                .into_iter()
                .map(|id| related.get(&id).cloned().unwrap_or_default())
                .collect(),
        )
    } else {
        match singular_related_id(raw) {
            Some(id) => ResultValue::Record(related.get(&id).cloned().unwrap_or_default()),
            // An absent singular relation stays as the raw value the remote
            // delivered (typically `false`).
            None => ResultValue::Scalar(raw.clone()),
        }
    }
}
