//! Git operations trait and types for git-flow release management.
//!
//! [`GitOperations`] is the seam between the release pipeline and the
//! repository. The production implementation is [`super::SystemGit`]; tests
//! substitute an in-memory recorder.

use crate::error::Result;
use regex::Regex;
use std::future::Future;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Long-lived branch where ongoing work accumulates
pub const INTEGRATION_BRANCH: &str = "develop";

/// Long-lived branch holding the latest released state
pub const MAINLINE_BRANCH: &str = "master";

/// Remote all checks and pushes go against
pub const DEFAULT_REMOTE: &str = "origin";

/// Prefix git-flow puts in front of release branch names
pub const RELEASE_BRANCH_PREFIX: &str = "release/";

/// Full release branch name for a release name such as `1.2.0`
pub fn release_branch(name: &str) -> String {
    format!("{}{}", RELEASE_BRANCH_PREFIX, name)
}

/// Trait defining all Git operations the release pipeline needs
pub trait GitOperations {
    /// Refresh remote tracking state (`git remote update`)
    fn update_remotes(&self) -> impl Future<Output = Result<()>>;

    /// Checkout a branch. Fails when local changes would be overwritten.
    fn checkout_branch(&self, branch_name: &str) -> impl Future<Output = Result<()>>;

    /// Checkout the integration branch
    fn checkout_integration_branch(&self) -> impl Future<Output = Result<()>> {
        self.checkout_branch(INTEGRATION_BRANCH)
    }

    /// Checkout the mainline branch
    fn checkout_mainline_branch(&self) -> impl Future<Output = Result<()>> {
        self.checkout_branch(MAINLINE_BRANCH)
    }

    /// Inspect the working tree for uncommitted and untracked files
    fn working_tree_status(&self) -> impl Future<Output = Result<TreeStatus>>;

    /// Number of commits by which `HEAD` and `origin/<branch>` diverge, on either side
    fn diverging_commits(&self, branch: &str) -> impl Future<Output = Result<usize>>;

    /// Check if a local branch exists
    fn branch_exists(&self, branch_name: &str) -> impl Future<Output = Result<bool>>;

    /// Check if a remote tracking branch exists
    fn remote_branch_exists(
        &self,
        remote: &str,
        branch_name: &str,
    ) -> impl Future<Output = Result<bool>>;

    /// Start a git-flow release branch `release/<name>` and check it out
    fn create_release_branch(&self, name: &str) -> impl Future<Output = Result<()>>;

    /// Stage and commit the given paths. Returns `false` when nothing changed.
    fn commit_files(&self, message: &str, paths: &[PathBuf]) -> impl Future<Output = Result<bool>>;

    /// Publish the release branch `release/<name>` to the remote
    fn push_release_branch(&self, name: &str) -> impl Future<Output = Result<()>>;

    /// Finish the release: merge into mainline and integration, tag it
    fn finish_release_branch(&self, options: &FinishOptions) -> impl Future<Output = Result<()>>;

    /// Delete a tag locally and, unless `local_only`, on the remote
    fn delete_tag(&self, tag_name: &str, local_only: bool) -> impl Future<Output = Result<()>>;

    /// Delete a branch on the remote. A branch that does not exist is not an error.
    fn delete_remote_branch(&self, branch_name: &str) -> impl Future<Output = Result<()>>;

    /// Delete a local branch
    fn delete_local_branch(&self, branch_name: &str) -> impl Future<Output = Result<()>>;

    /// Hash of the current `HEAD` commit
    fn head_commit(&self) -> impl Future<Output = Result<String>>;

    /// Hard reset the current branch to `commit`
    fn hard_reset_to(&self, commit: &str) -> impl Future<Output = Result<()>>;

    /// Checkout `branch` and hard reset it to `origin/<branch>`
    fn reset_branch_to_origin(&self, branch: &str) -> impl Future<Output = Result<()>>;

    /// Fetch all tags from the remote
    fn fetch_tags(&self) -> impl Future<Output = Result<()>>;

    /// Configured git user name
    fn current_user(&self) -> impl Future<Output = Result<String>>;

    /// git-flow version tag prefix (`gitflow.prefix.versiontag`), empty when unset
    fn version_tag_prefix(&self) -> impl Future<Output = Result<String>>;

    /// Most recent tag reachable from `HEAD`, if any
    fn last_tag(&self) -> impl Future<Output = Result<Option<String>>>;

    /// Name (without prefix) of a local `release/*` branch, if one exists
    fn find_release_branch(&self) -> impl Future<Output = Result<Option<String>>>;

    /// Commits since the last tag, newest first
    fn commits_since_last_tag(&self) -> impl Future<Output = Result<Vec<CommitEntry>>>;
}

/// Options for finishing a release branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishOptions {
    /// Release name without the `release/` prefix
    pub name: String,
    /// Tag message
    pub message: String,
    /// Push mainline, integration branch and tag
    pub push: bool,
    /// Keep the release branch after finishing
    pub keep: bool,
}

/// Working tree inspection result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeStatus {
    /// Tracked paths with staged or unstaged changes
    pub modified: Vec<String>,
    /// Paths not under version control
    pub untracked: Vec<String>,
}

impl TreeStatus {
    /// True when no tracked file has uncommitted changes
    pub fn is_clean(&self) -> bool {
        self.modified.is_empty()
    }

    /// Parse `git status --porcelain` output
    pub fn from_porcelain(output: &str) -> Self {
        let mut status = TreeStatus::default();
        for line in output.lines() {
            if line.len() < 4 {
                continue;
            }
            let path = line[3..].to_string();
            if line.starts_with("??") {
                status.untracked.push(path);
            } else if !line.starts_with("!!") {
                status.modified.push(path);
            }
        }
        status
    }
}

/// A commit as used by the changelog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEntry {
    /// Full commit hash
    pub hash: String,
    /// Conventional-commit type (`feat`, `fix`, ...), lowercased
    pub kind: Option<String>,
    /// Conventional-commit scope, if the subject had one
    pub scope: Option<String>,
    /// Subject line without the type/scope prefix
    pub subject: String,
    /// Author name
    pub author: String,
}

impl CommitEntry {
    /// Build an entry from a raw subject line.
    ///
    /// Conventional-commit prefixes (`feat(api): ...`, `fix!: ...`) are split
    /// into type, scope and subject; other subjects are kept whole.
    pub fn from_subject(
        hash: impl Into<String>,
        raw_subject: &str,
        author: impl Into<String>,
    ) -> Self {
        static CONVENTIONAL_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^(?P<kind>[A-Za-z]+)(?:\((?P<scope>[^)]+)\))?!?:\s*(?P<subject>.+)$")
                .expect("conventional commit regex is valid")
        });

        let raw_subject = raw_subject.trim();
        let (kind, scope, subject) = match CONVENTIONAL_RE.captures(raw_subject) {
            Some(caps) => (
                Some(caps["kind"].to_lowercase()),
                caps.name("scope").map(|m| m.as_str().trim().to_string()),
                caps["subject"].trim().to_string(),
            ),
            None => (None, None, raw_subject.to_string()),
        };

        Self {
            hash: hash.into(),
            kind,
            scope,
            subject,
            author: author.into(),
        }
    }

    /// Abbreviated hash
    pub fn short_hash(&self) -> &str {
        let end = self.hash.len().min(7);
        &self.hash[..end]
    }
}
