//! Flattened JSON encoding
//!
//! Produces a single JSON object with no nested values: every leaf of the
//! record becomes one key formed by joining the lower-cased path of field
//! names with a delimiter. Columnar stores and warehouse loaders ingest
//! this shape without any schema mapping.
//!
//! ```json
//! {"event_involved_object_kind":"Pod","event_reason":"Started", ...}
//! ```
//!
//! Key order is deterministic for a given input (sorted), so repeated
//! encodings of the same record are byte-identical.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::ProtocolError;
use crate::record::EventRecord;

/// Default path delimiter for flattened keys
pub const FLATTEN_DELIMITER: &str = "_";

/// Encode a record as a flattened single-level JSON object
///
/// A record with N scalar leaves produces exactly N keys, each unique:
/// distinct paths cannot collide because the path components themselves
/// are distinct at every level.
pub fn encode_flattened(
    record: &EventRecord,
    delimiter: &str,
) -> Result<Vec<u8>, ProtocolError> {
    let value = serde_json::to_value(record)?;

    let mut flat = BTreeMap::new();
    flatten_value("", &value, delimiter, &mut flat);

    Ok(serde_json::to_vec(&flat)?)
}

/// Walk a JSON value, collecting leaves under their joined paths
fn flatten_value(
    prefix: &str,
    value: &Value,
    delimiter: &str,
    out: &mut BTreeMap<String, Value>,
) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                let path = join(prefix, &key.to_lowercase(), delimiter);
                flatten_value(&path, child, delimiter, out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, child) in items.iter().enumerate() {
                let path = join(prefix, &index.to_string(), delimiter);
                flatten_value(&path, child, delimiter, out);
            }
        }
        // Scalars, and empty containers, are leaves
        leaf => {
            out.insert(prefix.to_string(), leaf.clone());
        }
    }
}

fn join(prefix: &str, segment: &str, delimiter: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}{delimiter}{segment}")
    }
}
