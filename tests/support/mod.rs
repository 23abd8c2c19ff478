//! In-memory fakes of the git and shell seams.

#![allow(dead_code)]

use gitflow_release::error::{ReleaseError, Result};
use gitflow_release::git::{CommitEntry, FinishOptions, GitOperations, TreeStatus};
use gitflow_release::process::{CommandOutput, CommandRunner};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Calls that only read repository state
const QUERIES: &[&str] = &[
    "working_tree_status",
    "diverging_commits",
    "branch_exists",
    "remote_branch_exists",
    "head_commit",
    "current_user",
    "version_tag_prefix",
    "last_tag",
    "find_release_branch",
    "commits_since_last_tag",
];

pub const HEAD: &str = "abc1234";

#[derive(Debug, Default)]
struct GitState {
    calls: Vec<String>,
    local_branches: BTreeSet<String>,
    remote_branches: BTreeSet<String>,
    failures: HashMap<String, String>,
    tree: TreeStatus,
    diverging: HashMap<String, usize>,
    commits: Vec<CommitEntry>,
    last_tag: Option<String>,
    tag_prefix: String,
    user: String,
}

/// Recording fake of [`GitOperations`]
#[derive(Debug, Clone, Default)]
pub struct FakeGit {
    state: Arc<Mutex<GitState>>,
}

impl FakeGit {
    pub fn new() -> Self {
        let git = Self::default();
        git.state.lock().unwrap().user = "Release Bot".to_string();
        git
    }

    pub fn with_local_branch(self, branch: &str) -> Self {
        self.state.lock().unwrap().local_branches.insert(branch.to_string());
        self
    }

    pub fn with_remote_branch(self, branch: &str) -> Self {
        self.state.lock().unwrap().remote_branches.insert(branch.to_string());
        self
    }

    pub fn with_commits(self, commits: Vec<CommitEntry>) -> Self {
        self.state.lock().unwrap().commits = commits;
        self
    }

    pub fn with_diverging(self, branch: &str, count: usize) -> Self {
        self.state
            .lock()
            .unwrap()
            .diverging
            .insert(branch.to_string(), count);
        self
    }

    pub fn with_tree(self, tree: TreeStatus) -> Self {
        self.state.lock().unwrap().tree = tree;
        self
    }

    pub fn with_last_tag(self, tag: &str) -> Self {
        self.state.lock().unwrap().last_tag = Some(tag.to_string());
        self
    }

    pub fn with_tag_prefix(self, prefix: &str) -> Self {
        self.state.lock().unwrap().tag_prefix = prefix.to_string();
        self
    }

    /// Make every call of `method` fail with `stderr`
    pub fn failing(self, method: &str, stderr: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(method.to_string(), stderr.to_string());
        self
    }

    /// Every call in order, as `method args`
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls that change the repository, in order
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| {
                let method = call.split(' ').next().unwrap_or_default();
                !QUERIES.contains(&method)
            })
            .collect()
    }

    /// Mutations recorded after the first call equal to `marker`
    pub fn mutations_after(&self, marker: &str) -> Vec<String> {
        self.mutations()
            .into_iter()
            .skip_while(|call| call != marker)
            .skip(1)
            .collect()
    }

    pub fn has_local_branch(&self, branch: &str) -> bool {
        self.state.lock().unwrap().local_branches.contains(branch)
    }

    fn record(&self, method: &str, args: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let call = if args.is_empty() {
            method.to_string()
        } else {
            format!("{} {}", method, args)
        };
        state.calls.push(call.clone());
        match state.failures.get(method) {
            Some(stderr) => Err(ReleaseError::CommandFailed {
                command: call,
                stdout: String::new(),
                stderr: stderr.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl GitOperations for FakeGit {
    async fn update_remotes(&self) -> Result<()> {
        self.record("update_remotes", "")
    }

    async fn checkout_branch(&self, branch_name: &str) -> Result<()> {
        self.record("checkout_branch", branch_name)
    }

    async fn working_tree_status(&self) -> Result<TreeStatus> {
        self.record("working_tree_status", "")?;
        Ok(self.state.lock().unwrap().tree.clone())
    }

    async fn diverging_commits(&self, branch: &str) -> Result<usize> {
        self.record("diverging_commits", branch)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .diverging
            .get(branch)
            .copied()
            .unwrap_or(0))
    }

    async fn branch_exists(&self, branch_name: &str) -> Result<bool> {
        self.record("branch_exists", branch_name)?;
        Ok(self.has_local_branch(branch_name))
    }

    async fn remote_branch_exists(&self, remote: &str, branch_name: &str) -> Result<bool> {
        self.record("remote_branch_exists", &format!("{}/{}", remote, branch_name))?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .remote_branches
            .contains(branch_name))
    }

    async fn create_release_branch(&self, name: &str) -> Result<()> {
        self.record("create_release_branch", name)?;
        self.state
            .lock()
            .unwrap()
            .local_branches
            .insert(format!("release/{}", name));
        Ok(())
    }

    async fn commit_files(&self, message: &str, paths: &[PathBuf]) -> Result<bool> {
        let paths: Vec<String> = paths
            .iter()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect();
        self.record("commit_files", &format!("{} [{}]", message, paths.join(", ")))?;
        Ok(true)
    }

    async fn push_release_branch(&self, name: &str) -> Result<()> {
        self.record("push_release_branch", name)
    }

    async fn finish_release_branch(&self, options: &FinishOptions) -> Result<()> {
        self.record("finish_release_branch", &options.name)
    }

    async fn delete_tag(&self, tag_name: &str, local_only: bool) -> Result<()> {
        let scope = if local_only { "local" } else { "remote" };
        self.record("delete_tag", &format!("{} {}", tag_name, scope))
    }

    async fn delete_remote_branch(&self, branch_name: &str) -> Result<()> {
        self.record("delete_remote_branch", branch_name)
    }

    async fn delete_local_branch(&self, branch_name: &str) -> Result<()> {
        self.record("delete_local_branch", branch_name)?;
        self.state.lock().unwrap().local_branches.remove(branch_name);
        Ok(())
    }

    async fn head_commit(&self) -> Result<String> {
        self.record("head_commit", "")?;
        Ok(HEAD.to_string())
    }

    async fn hard_reset_to(&self, commit: &str) -> Result<()> {
        self.record("hard_reset_to", commit)
    }

    async fn reset_branch_to_origin(&self, branch: &str) -> Result<()> {
        self.record("reset_branch_to_origin", branch)
    }

    async fn fetch_tags(&self) -> Result<()> {
        self.record("fetch_tags", "")
    }

    async fn current_user(&self) -> Result<String> {
        self.record("current_user", "")?;
        Ok(self.state.lock().unwrap().user.clone())
    }

    async fn version_tag_prefix(&self) -> Result<String> {
        self.record("version_tag_prefix", "")?;
        Ok(self.state.lock().unwrap().tag_prefix.clone())
    }

    async fn last_tag(&self) -> Result<Option<String>> {
        self.record("last_tag", "")?;
        Ok(self.state.lock().unwrap().last_tag.clone())
    }

    async fn find_release_branch(&self) -> Result<Option<String>> {
        self.record("find_release_branch", "")?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .local_branches
            .iter()
            .find_map(|branch| branch.strip_prefix("release/").map(str::to_string)))
    }

    async fn commits_since_last_tag(&self) -> Result<Vec<CommitEntry>> {
        self.record("commits_since_last_tag", "")?;
        Ok(self.state.lock().unwrap().commits.clone())
    }
}

/// Recording fake of [`CommandRunner`]
#[derive(Debug, Clone, Default)]
pub struct FakeRunner {
    commands: Arc<Mutex<Vec<String>>>,
    failures: Arc<Mutex<HashMap<String, CommandOutput>>>,
}

impl FakeRunner {
    /// Make `command` exit with status 1 and the given output
    pub fn failing(self, command: &str, stdout: &str, stderr: &str) -> Self {
        self.failures.lock().unwrap().insert(
            command.to_string(),
            CommandOutput {
                success: false,
                code: Some(1),
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            },
        );
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

impl CommandRunner for FakeRunner {
    async fn run_shell(&self, command: &str, _cwd: &Path) -> Result<CommandOutput> {
        self.commands.lock().unwrap().push(command.to_string());
        let failure = self.failures.lock().unwrap().get(command).cloned();
        Ok(failure.unwrap_or(CommandOutput {
            success: true,
            code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        }))
    }
}
