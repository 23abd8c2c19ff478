//! [`GitOperations`] backed by the system `git` binary and the git-flow extension.
//!
//! Every operation spawns one or more `git` processes in the working directory
//! and awaits them. Non-zero exits become [`ReleaseError::CommandFailed`].

use super::operations::{
    CommitEntry, DEFAULT_REMOTE, FinishOptions, GitOperations, RELEASE_BRANCH_PREFIX, TreeStatus,
};
use crate::error::{GitError, ReleaseError, Result};
use crate::process::CommandOutput;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// File inside the git directory holding the tag message during a finish
const TAG_MESSAGE_FILE: &str = "RELEASE_TAGMSG";

/// Field and record separators for `git log` output
const FIELD_SEP: char = '\u{1f}';
const RECORD_SEP: char = '\u{1e}';

/// Git backend using the system `git` executable
#[derive(Debug, Clone)]
pub struct SystemGit {
    work_dir: PathBuf,
}

impl SystemGit {
    /// Open the repository containing `work_dir`.
    ///
    /// Fails with [`GitError::MissingExecutable`] when `git` or `git-flow` is
    /// not installed and [`GitError::NotRepository`] outside a repository.
    pub async fn open(work_dir: &Path) -> Result<Self> {
        for name in ["git", "git-flow"] {
            if which::which(name).is_err() {
                return Err(GitError::MissingExecutable {
                    name: name.to_string(),
                }
                .into());
            }
        }

        let git = Self {
            work_dir: work_dir.to_path_buf(),
        };
        let output = git.output(&["rev-parse", "--show-toplevel"]).await?;
        if !output.success {
            return Err(GitError::NotRepository.into());
        }
        Ok(git)
    }

    fn git_cmd(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.work_dir);
        // Merges done by `git flow release finish` must not open an editor
        cmd.env("GIT_MERGE_AUTOEDIT", "no");
        cmd
    }

    /// Run git and capture its output without judging the exit status
    async fn output(&self, args: &[&str]) -> Result<CommandOutput> {
        log::debug!("$ git {}", args.join(" "));
        let output = self.git_cmd().args(args).output().await?;
        Ok(output.into())
    }

    /// Run git, failing on a non-zero exit
    async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        self.output(args)
            .await?
            .into_result(&format!("git {}", args.join(" ")))
    }

    /// Run git and return trimmed stdout
    async fn read(&self, args: &[&str]) -> Result<String> {
        Ok(self.run(args).await?.stdout.trim().to_string())
    }

    async fn ref_exists(&self, reference: &str) -> Result<bool> {
        let output = self
            .output(&["rev-parse", "--verify", "--quiet", reference])
            .await?;
        Ok(output.success)
    }

    async fn git_dir(&self) -> Result<PathBuf> {
        let dir = PathBuf::from(self.read(&["rev-parse", "--git-dir"]).await?);
        if dir.is_absolute() {
            Ok(dir)
        } else {
            Ok(self.work_dir.join(dir))
        }
    }

    /// Run a push that deletes a remote ref, tolerating a ref that is already gone
    async fn push_delete(&self, args: &[&str]) -> Result<()> {
        let output = self.output(args).await?;
        if output.success || is_missing_ref(&output.stderr) {
            return Ok(());
        }
        Err(ReleaseError::CommandFailed {
            command: format!("git {}", args.join(" ")),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

fn is_missing_ref(stderr: &str) -> bool {
    let stderr = stderr.to_lowercase();
    stderr.contains("remote ref does not exist") || stderr.contains("unable to delete")
}

impl GitOperations for SystemGit {
    async fn update_remotes(&self) -> Result<()> {
        self.run(&["remote", "update"]).await?;
        Ok(())
    }

    async fn checkout_branch(&self, branch_name: &str) -> Result<()> {
        // git refuses a switch that would overwrite local changes
        self.run(&["checkout", branch_name]).await?;
        Ok(())
    }

    async fn working_tree_status(&self) -> Result<TreeStatus> {
        let output = self.run(&["status", "--porcelain"]).await?;
        Ok(TreeStatus::from_porcelain(&output.stdout))
    }

    async fn diverging_commits(&self, branch: &str) -> Result<usize> {
        let range = format!("HEAD...{}/{}", DEFAULT_REMOTE, branch);
        let count = self.read(&["rev-list", &range, "--count"]).await?;
        count.parse::<usize>().map_err(|e| {
            ReleaseError::CommandFailed {
                command: format!("git rev-list {} --count", range),
                stdout: count.clone(),
                stderr: e.to_string(),
            }
        })
    }

    async fn branch_exists(&self, branch_name: &str) -> Result<bool> {
        self.ref_exists(&format!("refs/heads/{}", branch_name)).await
    }

    async fn remote_branch_exists(&self, remote: &str, branch_name: &str) -> Result<bool> {
        self.ref_exists(&format!("refs/remotes/{}/{}", remote, branch_name))
            .await
    }

    async fn create_release_branch(&self, name: &str) -> Result<()> {
        self.run(&["flow", "release", "start", name]).await?;
        Ok(())
    }

    async fn commit_files(&self, message: &str, paths: &[PathBuf]) -> Result<bool> {
        if paths.is_empty() {
            return Ok(false);
        }

        let mut add_args = vec!["add".to_string(), "--".to_string()];
        add_args.extend(paths.iter().map(|p| p.to_string_lossy().into_owned()));
        let add_args: Vec<&str> = add_args.iter().map(String::as_str).collect();
        self.run(&add_args).await?;

        let staged = self.output(&["diff", "--cached", "--quiet"]).await?;
        if staged.success {
            log::debug!("Nothing staged, skipping commit");
            return Ok(false);
        }

        self.run(&["commit", "-m", message]).await?;
        Ok(true)
    }

    async fn push_release_branch(&self, name: &str) -> Result<()> {
        self.run(&["flow", "release", "publish", name]).await?;
        Ok(())
    }

    async fn finish_release_branch(&self, options: &FinishOptions) -> Result<()> {
        let message_file = self.git_dir().await?.join(TAG_MESSAGE_FILE);
        tokio::fs::write(&message_file, &options.message).await?;
        let message_path = message_file.to_string_lossy().into_owned();

        let mut args = vec!["flow", "release", "finish", "-f", message_path.as_str()];
        if options.push {
            args.push("-p");
        }
        if options.keep {
            args.push("-k");
        }
        args.push(&options.name);

        let result = self.run(&args).await;
        if let Err(e) = tokio::fs::remove_file(&message_file).await {
            log::debug!("Could not remove {}: {}", message_file.display(), e);
        }
        result.map(|_| ())
    }

    async fn delete_tag(&self, tag_name: &str, local_only: bool) -> Result<()> {
        if self.ref_exists(&format!("refs/tags/{}", tag_name)).await? {
            self.run(&["tag", "-d", tag_name]).await?;
        } else {
            log::debug!("Tag {} does not exist locally", tag_name);
        }

        if !local_only {
            let refspec = format!(":refs/tags/{}", tag_name);
            self.push_delete(&["push", DEFAULT_REMOTE, &refspec]).await?;
        }
        Ok(())
    }

    async fn delete_remote_branch(&self, branch_name: &str) -> Result<()> {
        self.push_delete(&["push", DEFAULT_REMOTE, "--delete", branch_name])
            .await
    }

    async fn delete_local_branch(&self, branch_name: &str) -> Result<()> {
        self.run(&["branch", "-D", branch_name]).await?;
        Ok(())
    }

    async fn head_commit(&self) -> Result<String> {
        self.read(&["rev-parse", "HEAD"]).await
    }

    async fn hard_reset_to(&self, commit: &str) -> Result<()> {
        self.run(&["reset", "--hard", commit]).await?;
        Ok(())
    }

    async fn reset_branch_to_origin(&self, branch: &str) -> Result<()> {
        // Local changes are discarded by the reset anyway
        self.run(&["checkout", "-f", branch]).await?;
        let upstream = format!("{}/{}", DEFAULT_REMOTE, branch);
        self.run(&["reset", "--hard", &upstream]).await?;
        Ok(())
    }

    async fn fetch_tags(&self) -> Result<()> {
        self.run(&["fetch", "--tags"]).await?;
        Ok(())
    }

    async fn current_user(&self) -> Result<String> {
        self.read(&["config", "user.name"]).await
    }

    async fn version_tag_prefix(&self) -> Result<String> {
        // `git config --get` exits 1 for an unset key
        let output = self
            .output(&["config", "--get", "gitflow.prefix.versiontag"])
            .await?;
        Ok(output.stdout.trim().to_string())
    }

    async fn last_tag(&self) -> Result<Option<String>> {
        let output = self.output(&["describe", "--tags", "--abbrev=0"]).await?;
        let tag = output.stdout.trim();
        if !output.success || tag.is_empty() {
            return Ok(None);
        }
        Ok(Some(tag.to_string()))
    }

    async fn find_release_branch(&self) -> Result<Option<String>> {
        let pattern = format!("{}*", RELEASE_BRANCH_PREFIX);
        let output = self
            .read(&["branch", "--list", &pattern, "--format=%(refname:short)"])
            .await?;
        Ok(output
            .lines()
            .map(str::trim)
            .find_map(|line| line.strip_prefix(RELEASE_BRANCH_PREFIX))
            .map(str::to_string))
    }

    async fn commits_since_last_tag(&self) -> Result<Vec<CommitEntry>> {
        let range = match self.last_tag().await? {
            Some(tag) => format!("{}..HEAD", tag),
            None => "HEAD".to_string(),
        };
        let format = format!("--format=%H{FIELD_SEP}%s{FIELD_SEP}%an{RECORD_SEP}");
        let output = self.output(&["log", "--no-merges", &format, &range]).await?;
        if !output.success {
            // No commits yet
            log::debug!("git log failed: {}", output.stderr.trim());
            return Ok(Vec::new());
        }
        Ok(parse_log(&output.stdout))
    }
}

fn parse_log(stdout: &str) -> Vec<CommitEntry> {
    stdout
        .split(RECORD_SEP)
        .filter_map(|record| {
            let mut fields = record.trim().splitn(3, FIELD_SEP);
            let hash = fields.next()?.trim();
            let subject = fields.next()?;
            let author = fields.next().unwrap_or_default().trim();
            if hash.is_empty() {
                return None;
            }
            Some(CommitEntry::from_subject(hash, subject, author))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::operations::INTEGRATION_BRANCH;
    use tempfile::TempDir;

    fn git(dir: &Path, args: &[&str]) -> String {
        let output = std::process::Command::new("git")
            .arg("-C")
            .arg(dir)
            .args(args)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// Repository on `master` with one commit of `a.txt`
    fn repo() -> (TempDir, SystemGit) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path();
        git(path, &["init", "-q"]);
        git(path, &["symbolic-ref", "HEAD", "refs/heads/master"]);
        git(path, &["config", "user.name", "Release Bot"]);
        git(path, &["config", "user.email", "bot@example.com"]);
        git(path, &["config", "commit.gpgsign", "false"]);
        std::fs::write(path.join("a.txt"), "one\n").unwrap();
        git(path, &["add", "a.txt"]);
        git(path, &["commit", "-q", "-m", "init"]);

        let system_git = SystemGit {
            work_dir: path.to_path_buf(),
        };
        (dir, system_git)
    }

    fn read(dir: &TempDir, file: &str) -> String {
        std::fs::read_to_string(dir.path().join(file)).unwrap()
    }

    #[test]
    fn test_parse_log_records() {
        let stdout = format!(
            "aaa{f}feat(cli): add flag{f}Ana{r}\nbbb{f}Tidy up{f}Bo{r}\n",
            f = FIELD_SEP,
            r = RECORD_SEP
        );
        let commits = parse_log(&stdout);
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].hash, "aaa");
        assert_eq!(commits[0].scope.as_deref(), Some("cli"));
        assert_eq!(commits[0].author, "Ana");
        assert_eq!(commits[1].subject, "Tidy up");
    }

    #[test]
    fn test_parse_empty_log() {
        assert!(parse_log("").is_empty());
        assert!(parse_log("\n").is_empty());
    }

    #[tokio::test]
    async fn test_checkout_keeps_uncommitted_changes() {
        let (dir, system_git) = repo();
        git(dir.path(), &["branch", INTEGRATION_BRANCH]);
        std::fs::write(dir.path().join("a.txt"), "two\n").unwrap();

        system_git.checkout_integration_branch().await.unwrap();

        assert_eq!(git(dir.path(), &["rev-parse", "--abbrev-ref", "HEAD"]), "develop");
        assert_eq!(read(&dir, "a.txt"), "two\n");
        let status = system_git.working_tree_status().await.unwrap();
        assert!(!status.is_clean());
        assert_eq!(status.modified, vec!["a.txt"]);
    }

    #[tokio::test]
    async fn test_checkout_refuses_to_overwrite_changes() {
        let (dir, system_git) = repo();
        git(dir.path(), &["checkout", "-q", "-b", INTEGRATION_BRANCH]);
        std::fs::write(dir.path().join("a.txt"), "develop\n").unwrap();
        git(dir.path(), &["commit", "-q", "-am", "develop change"]);
        git(dir.path(), &["checkout", "-q", "master"]);
        std::fs::write(dir.path().join("a.txt"), "local\n").unwrap();

        let err = system_git.checkout_integration_branch().await.unwrap_err();

        assert!(matches!(err, ReleaseError::CommandFailed { .. }));
        assert_eq!(git(dir.path(), &["rev-parse", "--abbrev-ref", "HEAD"]), "master");
        assert_eq!(read(&dir, "a.txt"), "local\n");
    }

    #[tokio::test]
    async fn test_untracked_files_keep_tree_clean() {
        let (dir, system_git) = repo();
        std::fs::write(dir.path().join("notes.txt"), "scratch").unwrap();

        let status = system_git.working_tree_status().await.unwrap();
        assert!(status.is_clean());
        assert_eq!(status.untracked, vec!["notes.txt"]);
    }

    #[tokio::test]
    async fn test_commit_without_changes_is_a_noop() {
        let (dir, system_git) = repo();
        let head = system_git.head_commit().await.unwrap();
        let files = vec![PathBuf::from("a.txt")];

        assert!(!system_git.commit_files("new Release 1.0.1", &files).await.unwrap());
        assert_eq!(system_git.head_commit().await.unwrap(), head);

        std::fs::write(dir.path().join("a.txt"), "two\n").unwrap();
        assert!(system_git.commit_files("new Release 1.0.1", &files).await.unwrap());
        assert_ne!(system_git.head_commit().await.unwrap(), head);
        assert_eq!(git(dir.path(), &["log", "-1", "--format=%s"]), "new Release 1.0.1");
        assert!(system_git.working_tree_status().await.unwrap().is_clean());
    }

    #[tokio::test]
    async fn test_local_and_remote_branch_detection() {
        let (dir, system_git) = repo();
        git(dir.path(), &["branch", "release/1.2.0"]);
        git(
            dir.path(),
            &["update-ref", "refs/remotes/origin/release/1.3.0", "HEAD"],
        );

        assert!(system_git.branch_exists("release/1.2.0").await.unwrap());
        assert!(!system_git.branch_exists("release/1.3.0").await.unwrap());
        assert!(
            system_git
                .remote_branch_exists(DEFAULT_REMOTE, "release/1.3.0")
                .await
                .unwrap()
        );
        assert!(
            !system_git
                .remote_branch_exists(DEFAULT_REMOTE, "release/1.2.0")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_find_release_branch() {
        let (dir, system_git) = repo();
        assert_eq!(system_git.find_release_branch().await.unwrap(), None);

        git(dir.path(), &["branch", "feature/login"]);
        git(dir.path(), &["branch", "release/2.0.0"]);
        assert_eq!(
            system_git.find_release_branch().await.unwrap().as_deref(),
            Some("2.0.0")
        );
    }

    #[tokio::test]
    async fn test_diverging_commits_counts_both_sides() {
        let (dir, system_git) = repo();
        git(dir.path(), &["update-ref", "refs/remotes/origin/master", "HEAD"]);
        assert_eq!(system_git.diverging_commits("master").await.unwrap(), 0);

        git(dir.path(), &["commit", "-q", "--allow-empty", "-m", "local only"]);
        assert_eq!(system_git.diverging_commits("master").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_deleting_missing_remote_branch_succeeds() {
        let (dir, system_git) = repo();
        let remote = tempfile::tempdir().unwrap();
        git(remote.path(), &["init", "-q", "--bare"]);
        let remote_path = remote.path().to_string_lossy().into_owned();
        git(dir.path(), &["remote", "add", DEFAULT_REMOTE, &remote_path]);
        git(dir.path(), &["push", "-q", DEFAULT_REMOTE, "master:release/1.0.0"]);

        system_git
            .delete_remote_branch("release/1.0.0")
            .await
            .unwrap();
        assert_eq!(git(remote.path(), &["branch", "--list", "release/*"]), "");

        system_git
            .delete_remote_branch("release/1.0.0")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_commits_since_last_tag() {
        let (dir, system_git) = repo();
        git(dir.path(), &["tag", "v1.0.0"]);
        git(
            dir.path(),
            &["commit", "-q", "--allow-empty", "-m", "feat(api): add export"],
        );

        assert_eq!(
            system_git.last_tag().await.unwrap().as_deref(),
            Some("v1.0.0")
        );
        let commits = system_git.commits_since_last_tag().await.unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].kind.as_deref(), Some("feat"));
        assert_eq!(commits[0].scope.as_deref(), Some("api"));
        assert_eq!(commits[0].author, "Release Bot");
    }

    #[test]
    fn test_missing_remote_ref_is_tolerated() {
        assert!(is_missing_ref(
            "error: unable to delete 'release/1.0.0': remote ref does not exist"
        ));
        assert!(!is_missing_ref("fatal: could not read from remote repository"));
    }
}
