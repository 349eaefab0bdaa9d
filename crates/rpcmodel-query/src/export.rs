//! Flattened export support.
//!
//! Export paths use a different identity-field convention than the rest of
//! the API: the internal primary key is spelled `.id` on the wire, and the
//! literal segment `id` means the durable external identifier. The mapping
//! is applied per path segment on the way out and reversed on the way back
//! in, so callers only ever see `id` / `external_id`.

use crate::record::{Record, ResultValue};
use rpcmodel_core::Value;

/// Map one caller-facing export segment to its wire spelling.
fn map_segment(segment: &str) -> &str {
    match segment {
        "id" => ".id",
        "external_id" => "id",
        other => other,
    }
}

/// Reverse [`map_segment`].
fn unmap_segment(segment: &str) -> &str {
    match segment {
        ".id" => "id",
        "id" => "external_id",
        other => other,
    }
}

/// Map a slash-joined export path to its wire spelling, segment by segment.
pub(crate) fn map_export_path(path: &str) -> String {
    path.split('/').map(map_segment).collect::<Vec<_>>().join("/")
}

/// Reverse [`map_export_path`].
pub(crate) fn unmap_export_path(path: &str) -> String {
    path.split('/')
        .map(unmap_segment)
        .collect::<Vec<_>>()
        .join("/")
}

/// Write `value` into `record` at a slash-joined path, creating
/// intermediate record levels as needed.
pub(crate) fn set_nested(record: &mut Record, path: &str, value: Value) {
    let mut segments = path.split('/');
    if let Some(first) = segments.next() {
        set_nested_segments(record, first, segments, value);
    }
}

fn set_nested_segments<'a>(
    record: &mut Record,
    head: &str,
    mut rest: impl Iterator<Item = &'a str>,
    value: Value,
) {
    match rest.next() {
        None => record.insert(head, ResultValue::Scalar(value)),
        Some(next) => {
            let slot = record
                .fields_mut()
                .entry(head.to_string())
                .or_insert_with(|| ResultValue::Record(Record::new()));
            if let ResultValue::Record(child) = slot {
                set_nested_segments(child, next, rest, value);
            } else {
                // A scalar landed here earlier; the nested assignment wins.
                let mut child = Record::new();
                set_nested_segments(&mut child, next, rest, value);
                *slot = ResultValue::Record(child);
            }
        }
    }
}
