//! Project detection.
//!
//! The current version comes from the package manifest when there is one and
//! from the newest version tag otherwise.

use crate::error::{Result, VersionError};
use crate::git::GitOperations;
use crate::manifest::{LockFile, Manifest};
use crate::version::parse_clean;
use semver::Version;
use std::path::{Path, PathBuf};

/// What the release knows about the project it runs in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    /// Working directory, the repository root
    pub work_dir: PathBuf,
    /// Detected package manifest
    pub manifest: Option<Manifest>,
    /// Lock file next to the manifest
    pub lock_file: Option<(LockFile, PathBuf)>,
    /// Package name, used as the neverending changelog heading
    pub package_name: String,
    /// Package status shown in the changelog headline
    pub package_status: Option<String>,
    /// Version before the release
    pub current_version: Version,
}

impl ProjectInfo {
    /// Detect the project in `work_dir`.
    ///
    /// Fails with [`VersionError::NoValidTag`] when there is neither a manifest
    /// nor a tag that parses as a version once the git-flow prefix is removed.
    pub async fn detect<G: GitOperations>(work_dir: &Path, git: &G) -> Result<Self> {
        let fallback_name = work_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string());

        if let Some(manifest) = Manifest::detect(work_dir) {
            let info = manifest.read()?;
            let current_version = parse_clean(&info.version)?;
            log::debug!(
                "Version {} taken from {}",
                current_version,
                manifest.path.display()
            );
            return Ok(Self {
                work_dir: work_dir.to_path_buf(),
                lock_file: manifest.detect_lock_file(),
                manifest: Some(manifest),
                package_name: info.name.unwrap_or(fallback_name),
                package_status: info.status,
                current_version,
            });
        }

        log::debug!("No package manifest, looking for version tags");
        let tag = git.last_tag().await?.ok_or(VersionError::NoValidTag)?;
        let prefix = git.version_tag_prefix().await?;
        let current_version = version_from_tag(&tag, &prefix).ok_or(VersionError::NoValidTag)?;

        Ok(Self {
            work_dir: work_dir.to_path_buf(),
            manifest: None,
            lock_file: None,
            package_name: fallback_name,
            package_status: None,
            current_version,
        })
    }

    /// Build project info for a known version without touching the disk
    pub fn from_version(work_dir: &Path, package_name: &str, current_version: Version) -> Self {
        Self {
            work_dir: work_dir.to_path_buf(),
            manifest: None,
            lock_file: None,
            package_name: package_name.to_string(),
            package_status: None,
            current_version,
        }
    }
}

/// Parse a version tag, removing the git-flow prefix first
pub fn version_from_tag(tag: &str, prefix: &str) -> Option<Version> {
    let tag = tag.trim();
    let stripped = tag.strip_prefix(prefix).unwrap_or(tag);
    parse_clean(stripped).ok()
}
