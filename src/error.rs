//! Error types for gitflow_release operations.
//!
//! Every pipeline step fails with a [`ReleaseError`]. Domain specific failures
//! live in nested enums so callers can match on the kind that matters to them,
//! while the top level carries the failures that cut across domains
//! (external command exits, pre-conditions, partial rollbacks).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for gitflow_release operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all gitflow_release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// A pre-condition command exited unsuccessfully
    #[error("Pre-condition failed: `{command}`\n{output}")]
    PreConditionFailed {
        /// Command that failed
        command: String,
        /// Captured stdout and stderr of the command
        output: String,
    },

    /// An external command exited with a non-zero status
    #[error("Command `{command}` failed: {}", summarize_output(.stdout, .stderr))]
    CommandFailed {
        /// Command line that was executed
        command: String,
        /// Captured standard output
        stdout: String,
        /// Captured standard error
        stderr: String,
    },

    /// A compensating step failed and halted the remaining rollback steps
    #[error(
        "Partial rollback: step '{failed_step}' failed after completing [{}]: {source}",
        .completed.join(", ")
    )]
    PartialRollback {
        /// Compensating step that failed
        failed_step: String,
        /// Compensating steps that completed before the failure
        completed: Vec<String>,
        /// Error of the failing compensating step
        #[source]
        source: Box<ReleaseError>,
    },

    /// Version management errors
    #[error("Version error: {0}")]
    Version(#[from] VersionError),

    /// Git state errors
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    /// Package manifest errors
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

fn summarize_output(stdout: &str, stderr: &str) -> String {
    let stderr = stderr.trim();
    let stdout = stdout.trim();
    match (stdout.is_empty(), stderr.is_empty()) {
        (true, true) => "no output".to_string(),
        (false, true) => stdout.to_string(),
        (true, false) => stderr.to_string(),
        (false, false) => format!("{stderr}\n{stdout}"),
    }
}

/// Version management errors
#[derive(Error, Debug)]
pub enum VersionError {
    /// Requested or resolved version is not a valid semantic version
    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion {
        /// Version string
        version: String,
        /// Reason for the error
        reason: String,
    },

    /// No manifest and no parseable version tag
    #[error("No package manifest and no valid version tag found")]
    NoValidTag,
}

/// Git state errors raised by the release checks
#[derive(Error, Debug)]
pub enum GitError {
    /// Not a git repository
    #[error("Not a git repository. Please initialize git first.")]
    NotRepository,

    /// Tracked files have uncommitted changes
    #[error("Changes not staged for commit, don't forget to commit and push: {files:?}")]
    DirtyWorkingTree {
        /// Paths with uncommitted changes
        files: Vec<String>,
    },

    /// Integration branch has commits not on its remote
    #[error("Branch '{branch}' differs from origin by {count} commit(s), push your changes first")]
    UnpushedChanges {
        /// Branch name
        branch: String,
        /// Number of diverging commits
        count: usize,
    },

    /// Mainline branch is behind its remote
    #[error(
        "Branch '{branch}' differs from origin by {count} commit(s), update it first \
         (git checkout {branch} && git pull)"
    )]
    StaleMainline {
        /// Branch name
        branch: String,
        /// Number of diverging commits
        count: usize,
    },

    /// A required executable is not installed
    #[error("Required executable '{name}' not found in PATH")]
    MissingExecutable {
        /// Executable name
        name: String,
    },
}

/// Package manifest errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest could not be read
    #[error("Failed to read {path}: {reason}")]
    ReadFailed {
        /// Manifest path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// Manifest could not be parsed
    #[error("Failed to parse {path}: {reason}")]
    ParseFailed {
        /// Manifest path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// Manifest has no usable version field
    #[error("{path} has no version field")]
    MissingVersion {
        /// Manifest path
        path: PathBuf,
    },

    /// Manifest could not be written
    #[error("Failed to write {path}: {reason}")]
    WriteFailed {
        /// Manifest path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file exists but is not valid
    #[error("Invalid config file {path}: {reason}")]
    Invalid {
        /// Config file path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// No version or bump keyword was given
    #[error("Missing version argument: pass major, minor, patch or an explicit version")]
    MissingVersionArgument,
}

impl ReleaseError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::Git(GitError::DirtyWorkingTree { .. }) => vec![
                "Commit pending changes: git add . && git commit -m 'message'".to_string(),
                "Stash changes temporarily: git stash".to_string(),
            ],
            ReleaseError::Git(GitError::UnpushedChanges { branch, .. }) => vec![
                format!("Push your local commits: git push origin {}", branch),
            ],
            ReleaseError::Git(GitError::StaleMainline { branch, .. }) => vec![
                format!("Update the branch: git checkout {} && git pull", branch),
            ],
            ReleaseError::Git(GitError::MissingExecutable { name }) if name == "git-flow" => vec![
                "Install git-flow (AVH edition) and run: git flow init".to_string(),
            ],
            ReleaseError::Version(VersionError::NoValidTag) => vec![
                "Add a package.json, composer.json or Cargo.toml with a version field".to_string(),
                "Or create an initial version tag: git tag 0.1.0".to_string(),
            ],
            ReleaseError::PartialRollback { .. } => vec![
                "Inspect the repository with: git status && git branch -a".to_string(),
                "Run the cleanup again once the failing step is resolved: gitflow_release --cleanup"
                    .to_string(),
            ],
            ReleaseError::PreConditionFailed { command, .. } => vec![
                format!("Run `{}` manually and fix the reported problem", command),
            ],
            _ => vec![],
        }
    }
}
