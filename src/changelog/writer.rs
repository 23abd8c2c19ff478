//! Changelog file placement.

use crate::config::ReleaseConfig;
use crate::error::Result;
use std::path::{Path, PathBuf};

/// Where a rendered changelog entry goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangelogTarget {
    /// One file per release: `<dir>/<file_name>.md`
    PerRelease {
        /// Changelog folder
        dir: PathBuf,
        /// File stem, the release branch name
        file_name: String,
    },
    /// A single file, newest entry first, under one package heading
    Neverending {
        /// Changelog file
        path: PathBuf,
        /// Package name used for the top level heading
        package_name: String,
    },
}

impl ChangelogTarget {
    /// Resolve the target from the configuration
    pub fn from_config(
        config: &ReleaseConfig,
        work_dir: &Path,
        branch_name: &str,
        package_name: &str,
    ) -> Self {
        if config.neverending_changelog {
            ChangelogTarget::Neverending {
                path: config.neverending_changelog_path(work_dir),
                package_name: package_name.to_string(),
            }
        } else {
            ChangelogTarget::PerRelease {
                dir: config.changelog_dir(work_dir),
                file_name: branch_name.to_string(),
            }
        }
    }

    /// File the entry is written to
    pub fn path(&self) -> PathBuf {
        match self {
            ChangelogTarget::PerRelease { dir, file_name } => dir.join(format!("{}.md", file_name)),
            ChangelogTarget::Neverending { path, .. } => path.clone(),
        }
    }
}

/// Write `entry` to the target and return the file written.
///
/// A per-release file is replaced. The neverending file gets the entry
/// prepended below a single `# <package>` heading.
pub async fn write_changelog(target: &ChangelogTarget, entry: &str) -> Result<PathBuf> {
    let path = target.path();
    match target {
        ChangelogTarget::PerRelease { dir, .. } => {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, entry).await?;
        }
        ChangelogTarget::Neverending { package_name, .. } => {
            let existing = read_existing(&path).await?;
            let content = prepend_entry(package_name, entry, &existing);
            tokio::fs::write(&path, content).await?;
        }
    }
    log::debug!("Changelog written to {}", path.display());
    Ok(path)
}

/// Whether `content` already has an entry headline for `version`
pub fn has_entry_for(content: &str, version: &str) -> bool {
    let plain = format!(", v{}", version);
    let linked = format!(", [v{}]", version);
    content
        .lines()
        .filter(|line| line.starts_with("## "))
        .any(|line| {
            line.contains(&linked)
                || line.ends_with(&plain)
                || line.contains(&format!("{} ", plain))
        })
}

/// Current content of the neverending changelog, empty when absent
pub async fn read_existing(path: &Path) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}

fn prepend_entry(package_name: &str, entry: &str, existing: &str) -> String {
    let previous = existing
        .lines()
        .filter(|line| !line.starts_with("# "))
        .collect::<Vec<_>>()
        .join("\n");
    let previous = previous.trim_start_matches('\n');

    let mut content = format!("# {}\n\n{}", package_name, entry);
    if !previous.is_empty() {
        if !content.ends_with('\n') {
            content.push('\n');
        }
        content.push('\n');
        content.push_str(previous);
        if !content.ends_with('\n') {
            content.push('\n');
        }
    }
    content
}
