//! # gitflow_release
//!
//! git-flow release automation with rollback.
//!
//! A release bumps the version, creates (or resumes) the `release/<version>`
//! branch, writes the changelog, runs the configured hook commands, commits
//! the manifest and changelog, publishes the branch and finishes it. When a
//! step fails after the release branch was created by the same run, the
//! compensating steps put the repository back the way it was.
//!
//! ## Features
//!
//! - **Version Resolution**: `major`, `minor`, `patch` or an explicit version
//! - **Manifests**: `package.json`, `composer.json` and `Cargo.toml`, with lock file refresh
//! - **Changelogs**: one file per release or a single neverending changelog
//! - **Hooks**: pre-condition, release, finish and post-release commands
//! - **Continuation**: an existing release branch is resumed, never destroyed
//! - **Rollback**: ordered compensating steps after a failed release
//!
//! ## Usage
//!
//! ```bash
//! gitflow_release patch          # Release the next patch version
//! gitflow_release -p minor       # Release and push the next minor version
//! gitflow_release -f 1.4.0       # Finish an existing release branch
//! gitflow_release --cleanup      # Remove an unfinished release
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod changelog;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod manifest;
pub mod pipeline;
pub mod process;
pub mod project;
pub mod release;
pub mod state;
pub mod version;

// Re-export main types for public API
pub use cli::Args;
pub use config::{ConfigOverrides, ReleaseConfig};
pub use error::{CliError, ReleaseError, Result};
pub use git::{GitOperations, SystemGit};
pub use process::{CommandOutput, CommandRunner, ShellRunner};
pub use project::ProjectInfo;
pub use release::{ReleaseFailure, ReleaseOrchestrator, RollbackOutcome};
pub use state::{BranchOrigin, ReleaseState};
pub use version::VersionBump;
