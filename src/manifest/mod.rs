//! Package manifest detection, reading and version updates.
//!
//! Supported manifests, in detection order: `package.json`, `composer.json`
//! and `Cargo.toml`. Each has an optional lock file that is refreshed after
//! the version changes.

mod cargo;
mod json;

use crate::error::{ManifestError, Result};
use std::path::{Path, PathBuf};

/// Kind of package manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    /// npm `package.json`
    PackageJson,
    /// Composer `composer.json`
    ComposerJson,
    /// Cargo `Cargo.toml`
    CargoToml,
}

impl ManifestKind {
    /// Detection order
    pub const ALL: [ManifestKind; 3] = [
        ManifestKind::PackageJson,
        ManifestKind::ComposerJson,
        ManifestKind::CargoToml,
    ];

    /// Manifest file name
    pub fn file_name(self) -> &'static str {
        match self {
            ManifestKind::PackageJson => "package.json",
            ManifestKind::ComposerJson => "composer.json",
            ManifestKind::CargoToml => "Cargo.toml",
        }
    }

    /// Lock file belonging to this manifest kind, if any
    pub fn lock_file(self) -> Option<LockFile> {
        match self {
            ManifestKind::PackageJson => Some(LockFile::PackageLock),
            ManifestKind::ComposerJson => None,
            ManifestKind::CargoToml => Some(LockFile::CargoLock),
        }
    }
}

/// A detected manifest file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Absolute or work-dir relative path to the file
    pub path: PathBuf,
    /// Manifest kind
    pub kind: ManifestKind,
}

/// Fields read from a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestInfo {
    /// Package name
    pub name: Option<String>,
    /// Version string as written in the file
    pub version: String,
    /// Package status, shown in the changelog headline
    pub status: Option<String>,
}

/// Lock file kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockFile {
    /// `package-lock.json`
    PackageLock,
    /// `Cargo.lock`
    CargoLock,
}

impl LockFile {
    /// Lock file name
    pub fn file_name(self) -> &'static str {
        match self {
            LockFile::PackageLock => "package-lock.json",
            LockFile::CargoLock => "Cargo.lock",
        }
    }

    /// Shell command that rewrites the lock file for the new version
    pub fn refresh_command(self) -> &'static str {
        match self {
            LockFile::PackageLock => "npm i --package-lock-only --ignore-scripts",
            LockFile::CargoLock => "cargo update --workspace --offline",
        }
    }
}

impl Manifest {
    /// Find the first supported manifest in `work_dir`
    pub fn detect(work_dir: &Path) -> Option<Self> {
        ManifestKind::ALL.into_iter().find_map(|kind| {
            let path = work_dir.join(kind.file_name());
            path.is_file().then_some(Manifest { path, kind })
        })
    }

    /// Lock file next to this manifest, if one exists on disk
    pub fn detect_lock_file(&self) -> Option<(LockFile, PathBuf)> {
        let lock = self.kind.lock_file()?;
        let path = self
            .path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(lock.file_name());
        path.is_file().then_some((lock, path))
    }

    /// Read name, version and status
    pub fn read(&self) -> Result<ManifestInfo> {
        let content = self.read_content()?;
        match self.kind {
            ManifestKind::PackageJson | ManifestKind::ComposerJson => json::read(&self.path, &content),
            ManifestKind::CargoToml => cargo::read(&self.path, &content),
        }
    }

    /// Write `version` and optionally the build timestamp.
    ///
    /// `indent` applies to JSON manifests only.
    pub fn write_version(&self, version: &str, timestamp: Option<i64>, indent: usize) -> Result<()> {
        let content = self.read_content()?;
        let updated = match self.kind {
            ManifestKind::PackageJson | ManifestKind::ComposerJson => {
                json::update(&self.path, &content, version, timestamp, indent)?
            }
            ManifestKind::CargoToml => cargo::update(&self.path, &content, version, timestamp)?,
        };
        std::fs::write(&self.path, updated).map_err(|e| ManifestError::WriteFailed {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        log::debug!("Updated {} to {}", self.path.display(), version);
        Ok(())
    }

    fn read_content(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|e| {
            ManifestError::ReadFailed {
                path: self.path.clone(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}
