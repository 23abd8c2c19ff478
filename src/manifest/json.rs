//! `package.json` / `composer.json` editing.

use super::ManifestInfo;
use crate::error::{ManifestError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;

/// Key holding the build timestamp in JSON manifests
const TIMESTAMP_KEY: &str = "buildTimestamp";

pub(super) fn read(path: &Path, content: &str) -> Result<ManifestInfo> {
    let object = parse(path, content)?;
    let version = object
        .get("version")
        .and_then(Value::as_str)
        .ok_or_else(|| ManifestError::MissingVersion {
            path: path.to_path_buf(),
        })?;

    Ok(ManifestInfo {
        name: string_field(&object, "name"),
        version: version.to_string(),
        status: string_field(&object, "status"),
    })
}

/// Set `version` (and `buildTimestamp`) keeping key order, indentation and
/// the presence of a trailing newline
pub(super) fn update(
    path: &Path,
    content: &str,
    version: &str,
    timestamp: Option<i64>,
    indent: usize,
) -> Result<String> {
    let mut object = parse(path, content)?;
    object.insert("version".to_string(), Value::String(version.to_string()));
    if let Some(timestamp) = timestamp {
        object.insert(TIMESTAMP_KEY.to_string(), Value::from(timestamp));
    }

    let indent = " ".repeat(indent);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    object
        .serialize(&mut serializer)
        .map_err(|e| ManifestError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let mut updated = String::from_utf8_lossy(&out).into_owned();
    if content.ends_with('\n') {
        updated.push('\n');
    }
    Ok(updated)
}

fn parse(path: &Path, content: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(ManifestError::ParseFailed {
            path: path.to_path_buf(),
            reason: "top level value is not an object".to_string(),
        }
        .into()),
        Err(e) => Err(ManifestError::ParseFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
        .into()),
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}
