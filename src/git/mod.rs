//! Git operations for git-flow release workflows.
//!
//! The release pipeline talks to the repository only through the
//! [`GitOperations`] trait. [`SystemGit`] implements it by running the system
//! `git` binary and its git-flow extension.

mod operations;
mod system_git;

pub use operations::{
    CommitEntry, DEFAULT_REMOTE, FinishOptions, GitOperations, INTEGRATION_BRANCH,
    MAINLINE_BRANCH, RELEASE_BRANCH_PREFIX, TreeStatus, release_branch,
};
pub use system_git::SystemGit;
