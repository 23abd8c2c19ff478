//! Release configuration.
//!
//! The configuration is assembled once per invocation from built-in defaults,
//! the optional `gitflow-release.json` file in the working directory and the
//! command line flags. Once a release run starts it is only read.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// File name of the per-repository configuration file
pub const CONFIG_FILE_NAME: &str = "gitflow-release.json";

/// Immutable configuration snapshot for one release invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReleaseConfig {
    /// Push mainline, integration branch and tag when finishing
    pub push: bool,
    /// Keep the release branch after finishing
    pub keep: bool,
    /// Verbose output
    pub debug: bool,
    /// Release the version found in the manifest instead of a requested one
    pub update: bool,
    /// Write a changelog file for each release
    pub create_changelog: bool,
    /// Finish the release in the same run
    pub finish_release: bool,
    /// Never run compensating steps after a failure
    pub disable_rollback: bool,
    /// Append the build timestamp to the release branch name
    pub build_timestamp_in_name: bool,
    /// Prepend every release to a single changelog file
    pub neverending_changelog: bool,
    /// File used when `neverending_changelog` is set
    pub neverending_changelog_filename: String,
    /// Folder for per-release changelog files
    pub changelog_folder: String,
    /// Author shown in the changelog, `auto` uses `git config user.name`
    pub changelog_username: String,
    /// Prefix of the release commit message
    pub release_message_prefix: String,
    /// Base URL for commit links in the changelog
    #[serde(rename = "commitURL", deserialize_with = "url_or_false")]
    pub commit_url: Option<String>,
    /// Base URL for the release link in the changelog headline
    #[serde(rename = "releaseURL", deserialize_with = "url_or_false")]
    pub release_url: Option<String>,
    /// Keep commits of the same conventional-commit type together in the changelog
    pub group_commits: bool,
    /// Show commit authors in the changelog
    pub commit_authors: bool,
    /// Indentation used when rewriting JSON manifests
    pub package_spaces: usize,
    /// Commands that must succeed before anything is touched
    pub pre_condition_commands: Vec<String>,
    /// Commands run on the release branch before committing
    pub custom_release_commands: Vec<String>,
    /// Commands run after a successful release
    pub post_release_commands: Vec<String>,
    /// Commands run on the release branch before committing a finish
    pub custom_release_finish_commands: Vec<String>,
    /// Commands run after a successful finish
    pub post_release_finished_commands: Vec<String>,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            push: false,
            keep: false,
            debug: false,
            update: false,
            create_changelog: true,
            finish_release: true,
            disable_rollback: false,
            build_timestamp_in_name: false,
            neverending_changelog: false,
            neverending_changelog_filename: "CHANGELOG.md".to_string(),
            changelog_folder: "./changelogs".to_string(),
            changelog_username: "auto".to_string(),
            release_message_prefix: "new Release".to_string(),
            commit_url: None,
            release_url: None,
            group_commits: true,
            commit_authors: true,
            package_spaces: 2,
            pre_condition_commands: Vec::new(),
            custom_release_commands: Vec::new(),
            post_release_commands: Vec::new(),
            custom_release_finish_commands: Vec::new(),
            post_release_finished_commands: Vec::new(),
        }
    }
}

/// Flags from the command line that override file configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigOverrides {
    /// `--push`
    pub push: bool,
    /// `--keep`
    pub keep: bool,
    /// `--debug`
    pub debug: bool,
    /// `--update` or `--cleanup`
    pub update: bool,
    /// `--disable-rollback`
    pub disable_rollback: bool,
}

/// URL options accept `false` for "no link"
fn url_or_false<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum UrlSetting {
        Url(String),
        Flag(bool),
    }

    Ok(match Option::<UrlSetting>::deserialize(deserializer)? {
        Some(UrlSetting::Url(url)) => Some(url),
        Some(UrlSetting::Flag(_)) | None => None,
    })
}

impl ReleaseConfig {
    /// Path of the config file inside `work_dir`
    pub fn file_path(work_dir: &Path) -> PathBuf {
        work_dir.join(CONFIG_FILE_NAME)
    }

    /// Load the config file from `work_dir`, falling back to defaults when absent
    pub fn load(work_dir: &Path) -> Result<Self> {
        let path = Self::file_path(work_dir);
        if !path.is_file() {
            log::debug!("No {} found, using defaults", CONFIG_FILE_NAME);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Self::from_json(&content).map_err(|e| {
            ConfigError::Invalid {
                path: path.clone(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Parse a JSON config document; missing keys take their defaults
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// Apply command line overrides. Flags only ever switch options on.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.push |= overrides.push;
        self.keep |= overrides.keep;
        self.debug |= overrides.debug;
        self.update |= overrides.update;
        self.disable_rollback |= overrides.disable_rollback;
        self
    }

    /// Changelog folder resolved against the working directory
    pub fn changelog_dir(&self, work_dir: &Path) -> PathBuf {
        work_dir.join(&self.changelog_folder)
    }

    /// Neverending changelog file resolved against the working directory
    pub fn neverending_changelog_path(&self, work_dir: &Path) -> PathBuf {
        work_dir.join(&self.neverending_changelog_filename)
    }

    /// Changelog username, `None` when it should be taken from git
    pub fn explicit_changelog_username(&self) -> Option<&str> {
        match self.changelog_username.as_str() {
            "auto" | "" => None,
            name => Some(name),
        }
    }
}
