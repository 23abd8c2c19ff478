//! Forward step execution for release and finish runs.

use super::continuation::detect_branch_origin;
use crate::changelog::{
    ChangelogParams, ChangelogTarget, has_entry_for, read_existing, render_changelog,
    render_release_message, write_changelog,
};
use crate::cli::OutputManager;
use crate::config::ReleaseConfig;
use crate::error::{GitError, ReleaseError, Result};
use crate::git::{
    FinishOptions, GitOperations, INTEGRATION_BRANCH, MAINLINE_BRANCH, release_branch,
};
use crate::pipeline::{HookStage, ReleaseStep, StepHandler};
use crate::process::CommandRunner;
use crate::project::ProjectInfo;
use crate::state::{BranchOrigin, ReleaseState};
use std::path::{Path, PathBuf};

/// Runs [`ReleaseStep`]s against the repository for one invocation
pub(super) struct ReleaseSteps<'a, G, R> {
    pub(super) git: &'a G,
    pub(super) runner: &'a R,
    pub(super) config: &'a ReleaseConfig,
    pub(super) project: &'a ProjectInfo,
    pub(super) output: &'a OutputManager,
    pub(super) state: &'a mut ReleaseState,
}

impl<G: GitOperations, R: CommandRunner> StepHandler<ReleaseStep> for ReleaseSteps<'_, G, R> {
    async fn run_step(&mut self, step: &ReleaseStep) -> Result<()> {
        self.output.verbose(&step.to_string());
        match *step {
            ReleaseStep::RunHooks(stage) => self.run_hooks(stage).await,
            ReleaseStep::UpdateRemotes => self.git.update_remotes().await,
            ReleaseStep::CheckoutIntegration => self.git.checkout_integration_branch().await,
            ReleaseStep::VerifyCleanTree => self.verify_clean_tree().await,
            ReleaseStep::VerifyIntegrationPushed => self.verify_integration_pushed().await,
            ReleaseStep::VerifyMainlineCurrent => self.verify_mainline_current().await,
            ReleaseStep::CreateOrResumeBranch => self.create_or_resume_branch().await,
            ReleaseStep::CheckoutReleaseBranch => {
                let branch = release_branch(self.branch_name()?);
                self.git.checkout_branch(&branch).await
            }
            ReleaseStep::GenerateChangelog => self.generate_changelog().await,
            ReleaseStep::ComposeReleaseMessage => self.compose_release_message().await,
            ReleaseStep::UpdateManifest { with_timestamp } => self.update_manifest(with_timestamp),
            ReleaseStep::UpdateLockfile => self.update_lock_file().await,
            ReleaseStep::CommitChanges => self.commit_changes().await,
            ReleaseStep::PushBranch => {
                let name = self.branch_name()?.to_string();
                self.output.progress(&format!("Publishing release/{}", name));
                self.git.push_release_branch(&name).await
            }
            ReleaseStep::FinishBranch => self.finish_branch().await,
        }
    }
}

impl<G: GitOperations, R: CommandRunner> ReleaseSteps<'_, G, R> {
    fn branch_name(&self) -> Result<&str> {
        self.state
            .branch_name
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("release branch name is not set").into())
    }

    fn new_version(&self) -> Result<String> {
        self.state
            .new_version
            .as_ref()
            .map(ToString::to_string)
            .ok_or_else(|| anyhow::anyhow!("release version is not set").into())
    }

    async fn run_hooks(&mut self, stage: HookStage) -> Result<()> {
        for command in stage.commands(self.config) {
            self.output.progress(&format!("$ {}", command));
            let output = self
                .runner
                .run_shell(command, &self.project.work_dir)
                .await?;

            if !output.success {
                log::debug!("{} command failed: {}", stage, command);
                if stage == HookStage::PreCondition {
                    return Err(ReleaseError::PreConditionFailed {
                        command: command.clone(),
                        output: output.combined(),
                    });
                }
                return Err(ReleaseError::CommandFailed {
                    command: command.clone(),
                    stdout: output.stdout,
                    stderr: output.stderr,
                });
            }
            if self.config.debug && !output.stdout.trim().is_empty() {
                self.output.indent(output.stdout.trim_end());
            }
        }
        Ok(())
    }

    async fn verify_clean_tree(&mut self) -> Result<()> {
        let status = self.git.working_tree_status().await?;
        if !status.is_clean() {
            return Err(GitError::DirtyWorkingTree {
                files: status.modified,
            }
            .into());
        }
        if !status.untracked.is_empty() {
            self.output.warn("Some files are not under version control");
        }
        Ok(())
    }

    async fn verify_integration_pushed(&mut self) -> Result<()> {
        let count = self.git.diverging_commits(INTEGRATION_BRANCH).await?;
        if count > 0 {
            return Err(GitError::UnpushedChanges {
                branch: INTEGRATION_BRANCH.to_string(),
                count,
            }
            .into());
        }
        Ok(())
    }

    async fn verify_mainline_current(&mut self) -> Result<()> {
        self.git.checkout_mainline_branch().await?;
        let count = self.git.diverging_commits(MAINLINE_BRANCH).await?;
        if count > 0 {
            return Err(GitError::StaleMainline {
                branch: MAINLINE_BRANCH.to_string(),
                count,
            }
            .into());
        }
        Ok(())
    }

    /// The checkpoint. Rollback is armed before anything happens and disarmed
    /// as soon as the branch turns out to predate this run.
    async fn create_or_resume_branch(&mut self) -> Result<()> {
        let name = self.branch_name()?.to_string();
        let branch = release_branch(&name);
        self.state.arm_rollback(None);

        self.state.origin = detect_branch_origin(self.git, &branch).await?;
        match self.state.origin {
            BranchOrigin::Continuation => {
                self.state.disarm_rollback();
                self.output
                    .info(&format!("Continuing existing release branch {}", branch));
                self.git.checkout_branch(&branch).await
            }
            BranchOrigin::New => {
                self.output.progress(&format!("Creating {}", branch));
                self.git.create_release_branch(&name).await?;
                self.state.starting_head = Some(self.git.head_commit().await?);
                Ok(())
            }
        }
    }

    fn changelog_target(&self) -> Result<ChangelogTarget> {
        Ok(ChangelogTarget::from_config(
            self.config,
            &self.project.work_dir,
            self.branch_name()?,
            &self.project.package_name,
        ))
    }

    async fn generate_changelog(&mut self) -> Result<()> {
        let version = self.new_version()?;
        let target = self.changelog_target()?;

        // A first neverending changelog is untracked and survives a rollback
        if self.config.neverending_changelog {
            let existing = read_existing(&target.path()).await?;
            if has_entry_for(&existing, &version) {
                self.output.verbose(&format!(
                    "{} already has an entry for v{}",
                    target.path().display(),
                    version
                ));
                return Ok(());
            }
        }

        let username = match self.config.explicit_changelog_username() {
            Some(name) => name.to_string(),
            None => self.git.current_user().await?,
        };
        let params = ChangelogParams {
            version,
            file_name: self.branch_name()?.to_string(),
            build_timestamp: self.state.build_timestamp,
            commit_url: self.config.commit_url.clone(),
            release_url: self.config.release_url.clone(),
            package_status: self.project.package_status.clone(),
            username: Some(username),
            group: self.config.group_commits,
            author: self.config.commit_authors,
        };
        let commits = self.git.commits_since_last_tag().await?;
        let entry = render_changelog(&params, &commits);
        let path = write_changelog(&target, &entry).await?;
        self.output
            .verbose(&format!("Changelog written to {}", path.display()));
        Ok(())
    }

    async fn compose_release_message(&mut self) -> Result<()> {
        let commits = self.git.commits_since_last_tag().await?;
        let mut message = render_release_message(&commits);
        if message.is_empty() {
            message = self.commit_message()?;
        }
        self.state.release_message = message;
        Ok(())
    }

    fn update_manifest(&mut self, with_timestamp: bool) -> Result<()> {
        let Some(manifest) = &self.project.manifest else {
            return Ok(());
        };
        let version = self.new_version()?;
        let timestamp = with_timestamp.then_some(self.state.build_timestamp);
        manifest.write_version(&version, timestamp, self.config.package_spaces)?;
        self.output.verbose(&format!(
            "{} set to {}",
            manifest.kind.file_name(),
            version
        ));
        Ok(())
    }

    async fn update_lock_file(&mut self) -> Result<()> {
        let Some((lock, _)) = &self.project.lock_file else {
            return Ok(());
        };
        let command = lock.refresh_command();
        self.output.progress(&format!("$ {}", command));
        self.runner
            .run_shell(command, &self.project.work_dir)
            .await?
            .into_result(command)?;
        Ok(())
    }

    fn commit_message(&self) -> Result<String> {
        Ok(format!(
            "{} {}",
            self.config.release_message_prefix,
            self.new_version()?
        ))
    }

    /// Files the release commit includes
    fn files_to_commit(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        if let Some(manifest) = &self.project.manifest {
            files.push(manifest.path.clone());
            if let Some((_, lock_path)) = &self.project.lock_file {
                files.push(lock_path.clone());
            }
        }
        if self.config.create_changelog && (self.config.finish_release || self.state.do_finish) {
            files.push(self.changelog_target()?.path());
        }
        Ok(files
            .into_iter()
            .map(|path| relative_to(&path, &self.project.work_dir))
            .collect())
    }

    async fn commit_changes(&mut self) -> Result<()> {
        let files = self.files_to_commit()?;
        if files.is_empty() {
            log::debug!("No release files to commit");
            return Ok(());
        }
        let message = self.commit_message()?;
        if self.git.commit_files(&message, &files).await? {
            self.output.success(&format!("Committed \"{}\"", message));
        }
        Ok(())
    }

    async fn finish_branch(&mut self) -> Result<()> {
        let options = FinishOptions {
            name: self.branch_name()?.to_string(),
            message: self.state.release_message.clone(),
            push: self.config.push,
            keep: self.config.keep,
        };
        self.output
            .progress(&format!("Finishing release/{}", options.name));
        self.git.finish_release_branch(&options).await
    }
}

fn relative_to(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}
