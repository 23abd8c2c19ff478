//! `Cargo.toml` editing.
//!
//! Reads go through `toml`; writes go through `toml_edit` so comments and
//! formatting survive the version change.

use super::ManifestInfo;
use crate::error::{ManifestError, Result};
use std::path::Path;

pub(super) fn read(path: &Path, content: &str) -> Result<ManifestInfo> {
    let value: toml::Table = toml::from_str(content).map_err(|e| ManifestError::ParseFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let package = value.get("package");
    let field = |key: &str| {
        package
            .and_then(|p| p.get(key))
            .and_then(toml::Value::as_str)
            .map(str::to_string)
    };

    let version = field("version").ok_or_else(|| ManifestError::MissingVersion {
        path: path.to_path_buf(),
    })?;

    let status = package
        .and_then(|p| p.get("metadata"))
        .and_then(|m| m.get("status"))
        .and_then(toml::Value::as_str)
        .map(str::to_string);

    Ok(ManifestInfo {
        name: field("name"),
        version,
        status,
    })
}

/// Set `[package] version` and optionally `[package.metadata] build-timestamp`
pub(super) fn update(
    path: &Path,
    content: &str,
    version: &str,
    timestamp: Option<i64>,
) -> Result<String> {
    let mut doc = content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| ManifestError::ParseFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let package = doc
        .get_mut("package")
        .and_then(toml_edit::Item::as_table_mut)
        .ok_or_else(|| ManifestError::MissingVersion {
            path: path.to_path_buf(),
        })?;
    package["version"] = toml_edit::value(version);

    if let Some(timestamp) = timestamp {
        let metadata = package
            .entry("metadata")
            .or_insert_with(toml_edit::table)
            .as_table_mut()
            .ok_or_else(|| ManifestError::WriteFailed {
                path: path.to_path_buf(),
                reason: "[package.metadata] is not a table".to_string(),
            })?;
        metadata["build-timestamp"] = toml_edit::value(timestamp);
    }

    Ok(doc.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARGO: &str = "[package]\nname = \"demo\" # crate name\nversion = \"0.3.1\"\nedition = \"2021\"\n\n[dependencies]\nserde = \"1\"\n";

    #[test]
    fn test_read_package_fields() {
        let info = read(Path::new("Cargo.toml"), CARGO).unwrap();
        assert_eq!(info.name.as_deref(), Some("demo"));
        assert_eq!(info.version, "0.3.1");
        assert_eq!(info.status, None);
    }

    #[test]
    fn test_update_keeps_comments() {
        let updated = update(Path::new("Cargo.toml"), CARGO, "0.4.0", None).unwrap();
        assert!(updated.contains("name = \"demo\" # crate name"));
        assert!(updated.contains("version = \"0.4.0\""));
        assert!(updated.contains("[dependencies]\nserde = \"1\""));
    }

    #[test]
    fn test_update_adds_build_timestamp() {
        let updated = update(Path::new("Cargo.toml"), CARGO, "0.4.0", Some(1700)).unwrap();
        let parsed: toml::Table = toml::from_str(&updated).unwrap();
        assert_eq!(
            parsed["package"]["metadata"]["build-timestamp"].as_integer(),
            Some(1700)
        );
    }

    #[test]
    fn test_workspace_version_is_missing() {
        let content = "[package]\nname = \"demo\"\nversion.workspace = true\n";
        assert!(read(Path::new("Cargo.toml"), content).is_err());
    }
}
