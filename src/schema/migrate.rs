//! Forward-only, idempotent migration of raw records.
//!
//! - v0: a bare stroke list.
//! - v1: `{meta, strokes}` with whatever meta keys the producer wrote.
//! - v2: v1 with every meta key filled and `meta.schema = 2`.
//!
//! Filling never overwrites a key that is already present.

use serde_json::{Map, Value, json};

use crate::{
    extract::dominant_color,
    foundation::core::Rgb8,
    foundation::error::{VoidError, VoidResult},
    schema::{CURRENT_SCHEMA, DEFAULT_RESOLUTION, DEFAULT_YEAR},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaVersion {
    BareList,
    Unversioned,
    Current,
}

pub fn detect_version(value: &Value) -> VoidResult<SchemaVersion> {
    match value {
        Value::Array(_) => Ok(SchemaVersion::BareList),
        Value::Object(obj) => match obj.get("meta").and_then(|m| m.get("schema")) {
            None => Ok(SchemaVersion::Unversioned),
            Some(v) if v.as_u64() == Some(u64::from(CURRENT_SCHEMA)) => Ok(SchemaVersion::Current),
            Some(v) => Err(VoidError::schema(format!("unsupported record schema {v}"))),
        },
        other => Err(VoidError::schema(format!(
            "record must be an array or object, got {}",
            kind_of(other)
        ))),
    }
}

/// Bring an artifact record to the current schema.
///
/// `id` is the record's identifier (its file stem) and seeds metadata that
/// legacy records never stored.
pub fn migrate_record(value: Value, id: &str) -> VoidResult<Value> {
    match detect_version(&value)? {
        SchemaVersion::Current => Ok(value),
        SchemaVersion::BareList => fill_meta(json!({ "meta": {}, "strokes": value }), id),
        SchemaVersion::Unversioned => fill_meta(value, id),
    }
}

fn fill_meta(mut value: Value, id: &str) -> VoidResult<Value> {
    let Value::Object(obj) = &mut value else {
        return Err(VoidError::schema("record is not an object"));
    };
    let strokes = obj.entry("strokes").or_insert_with(|| Value::Array(Vec::new()));
    let Value::Array(strokes) = strokes else {
        return Err(VoidError::schema(format!("record '{id}': strokes is not a list")));
    };
    let stroke_count = strokes.len();
    let dominant = dominant_color(strokes.iter().filter_map(stroke_color)).unwrap_or([0, 0, 0]);

    let meta = obj.entry("meta").or_insert_with(|| Value::Object(Map::new()));
    let Value::Object(meta) = meta else {
        return Err(VoidError::schema(format!("record '{id}': meta is not an object")));
    };

    let (year, title) = year_and_title(id);
    let file = meta
        .get("original_file")
        .or_else(|| meta.get("file"))
        .cloned()
        .unwrap_or_else(|| Value::String(id.to_owned()));

    fill(meta, "id", json!(id));
    fill(meta, "file", file.clone());
    fill(meta, "original_file", file);
    fill(meta, "title", json!(title));
    fill(meta, "year", json!(year));
    fill(meta, "resolution", json!(DEFAULT_RESOLUTION));
    fill(meta, "stroke_count", json!(stroke_count));
    fill(meta, "dominant_color", json!(dominant));
    meta.insert("schema".to_owned(), json!(CURRENT_SCHEMA));
    Ok(value)
}

fn fill(obj: &mut Map<String, Value>, key: &str, v: Value) {
    obj.entry(key).or_insert(v);
}

/// Parse `PXL_<year>_<title words>` style identifiers into `(year, title)`.
///
/// The first `_`-separated token is the year when it is all digits; the
/// remaining tokens form the title. Falls back to [`DEFAULT_YEAR`] and the
/// identifier itself.
pub fn year_and_title(id: &str) -> (String, String) {
    let stem = id.strip_prefix("PXL_").unwrap_or(id);
    let stem = stem.rsplit_once('.').map_or(stem, |(s, _)| s);
    let parts: Vec<&str> = stem.split('_').collect();
    let year = match parts.first() {
        Some(p) if !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()) => (*p).to_owned(),
        _ => DEFAULT_YEAR.to_owned(),
    };
    let title = if parts.len() > 1 {
        parts[1..].join(" ")
    } else {
        id.to_owned()
    };
    (year, title)
}

fn stroke_color(s: &Value) -> Option<Rgb8> {
    let c = s.as_object()?.get("color")?.as_array()?;
    if c.len() < 3 {
        return None;
    }
    let mut out = [0u8; 3];
    for (o, v) in out.iter_mut().zip(c) {
        *o = v.as_f64()?.clamp(0.0, 255.0) as u8;
    }
    Some(out)
}

/// Bring a manifest to the current shape.
pub fn migrate_manifest(value: Value) -> VoidResult<Value> {
    let mut value = match value {
        Value::Array(nodes) => json!({
            "generated_at": "unknown",
            "total_nodes": nodes.len(),
            "nodes": nodes,
        }),
        Value::Object(_) => value,
        other => {
            return Err(VoidError::schema(format!(
                "manifest must be an array or object, got {}",
                kind_of(&other)
            )));
        }
    };

    let Value::Object(obj) = &mut value else {
        return Err(VoidError::schema("manifest is not an object"));
    };
    let Some(Value::Array(nodes)) = obj.get_mut("nodes") else {
        return Err(VoidError::schema("manifest has no node list"));
    };
    for node in nodes.iter_mut() {
        let Value::Object(node) = node else {
            return Err(VoidError::schema("manifest node is not an object"));
        };
        alias(node, "resolution", "res");
        alias(node, "stroke_count", "strokes");
        alias(node, "dominant_color", "color");
        alias(node, "src", "file");
        fill(node, "neighbors", json!([]));
    }
    let n = nodes.len();
    fill(obj, "total_nodes", json!(n));
    fill(obj, "generated_at", json!("unknown"));
    Ok(value)
}

/// Move `from` to `to` when only the alias is present.
fn alias(obj: &mut Map<String, Value>, from: &str, to: &str) {
    if obj.contains_key(to) {
        return;
    }
    if let Some(v) = obj.remove(from) {
        obj.insert(to.to_owned(), v);
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schema/migrate.rs"]
mod tests;
