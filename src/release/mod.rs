//! Release orchestration.
//!
//! [`ReleaseOrchestrator`] owns the configuration snapshot and the
//! [`ReleaseState`] of one invocation. It builds the step plans, runs them
//! through the pipeline executor and decides whether a failed release is
//! compensated.

mod continuation;
mod rollback;
mod steps;

pub use continuation::detect_branch_origin;
pub use rollback::RollbackOutcome;

use crate::changelog::render_release_message;
use crate::cli::OutputManager;
use crate::config::ReleaseConfig;
use crate::error::{ReleaseError, Result};
use crate::git::{GitOperations, INTEGRATION_BRANCH, MAINLINE_BRANCH};
use crate::pipeline::{
    PlanContext, ReleaseStep, finish_plan, release_plan, rollback_plan, run_pipeline,
};
use crate::process::CommandRunner;
use crate::project::ProjectInfo;
use crate::state::ReleaseState;
use crate::version::{self, VersionBump};
use semver::Version;
use std::fmt;

use rollback::Compensator;
use steps::ReleaseSteps;

/// A failed release together with what the rollback did about it
#[derive(Debug)]
pub struct ReleaseFailure {
    /// Forward step that failed, `None` when the run never started
    pub step: Option<ReleaseStep>,
    /// Error of the failing step
    pub error: ReleaseError,
    /// Rollback decision and result
    pub rollback: RollbackOutcome,
}

impl fmt::Display for ReleaseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.step {
            Some(step) => write!(f, "{} failed: {}", step, self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

impl From<ReleaseError> for ReleaseFailure {
    fn from(error: ReleaseError) -> Self {
        Self {
            step: None,
            error,
            rollback: RollbackOutcome::NotArmed,
        }
    }
}

/// Result of the `changes` preview
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangesPreview {
    /// Name the changelog would credit
    pub username: String,
    /// Release message built from the commits since the last tag
    pub release_message: String,
}

/// Drives release, finish, rollback and the auxiliary operations
#[derive(Debug)]
pub struct ReleaseOrchestrator<G, R> {
    config: ReleaseConfig,
    project: ProjectInfo,
    state: ReleaseState,
    git: G,
    runner: R,
    output: OutputManager,
}

impl<G: GitOperations, R: CommandRunner> ReleaseOrchestrator<G, R> {
    /// Create an orchestrator for one invocation
    pub fn new(
        config: ReleaseConfig,
        project: ProjectInfo,
        git: G,
        runner: R,
        output: OutputManager,
    ) -> Self {
        let state = ReleaseState::new(project.current_version.clone());
        Self {
            config,
            project,
            state,
            git,
            runner,
            output,
        }
    }

    /// Replace the build timestamp captured at construction
    pub fn with_build_timestamp(mut self, build_timestamp: i64) -> Self {
        self.state.build_timestamp = build_timestamp;
        self
    }

    /// Configuration snapshot
    pub fn config(&self) -> &ReleaseConfig {
        &self.config
    }

    /// Detected project
    pub fn project(&self) -> &ProjectInfo {
        &self.project
    }

    /// Current release state
    pub fn state(&self) -> &ReleaseState {
        &self.state
    }

    /// VCS adapter
    pub fn git(&self) -> &G {
        &self.git
    }

    /// Hook command runner
    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn plan_context(&self) -> PlanContext {
        PlanContext {
            has_manifest: self.project.manifest.is_some(),
            has_lock_file: self.project.lock_file.is_some(),
        }
    }

    /// Resolve the new version from a keyword or explicit version
    pub fn bump(&mut self, requested: &str) -> Result<&Version> {
        let request: VersionBump = requested.parse()?;
        let new_version = version::resolve(&self.state.current_version, &request)?;
        self.output.info(&format!("New version: {}", new_version));
        Ok(self.state.new_version.insert(new_version))
    }

    /// Derive the release branch name from the new version
    pub fn set_branch_name(&mut self) -> Result<&str> {
        let with_timestamp = self.config.build_timestamp_in_name;
        self.state
            .derive_branch_name(with_timestamp)
            .ok_or_else(|| anyhow::anyhow!("bump the version before naming the branch").into())
    }

    fn require_branch_name(&self) -> Result<String> {
        self.state
            .branch_name
            .clone()
            .ok_or_else(|| anyhow::anyhow!("release branch name is not set").into())
    }

    fn steps(&mut self) -> ReleaseSteps<'_, G, R> {
        ReleaseSteps {
            git: &self.git,
            runner: &self.runner,
            config: &self.config,
            project: &self.project,
            output: &self.output,
            state: &mut self.state,
        }
    }

    /// Run the release pipeline.
    ///
    /// A failure after the checkpoint of a new branch runs the compensating
    /// steps unless rollback is disabled. The failure is returned either way.
    pub async fn release(&mut self) -> std::result::Result<(), ReleaseFailure> {
        let branch_name = self.require_branch_name()?;
        let plan = release_plan(&self.config, self.plan_context());
        log::debug!("Release plan: {:?}", plan);

        let result = run_pipeline(&plan, &mut self.steps()).await;
        match result {
            Ok(_) => {
                self.output
                    .success(&format!("{} has been successfully released!", branch_name));
                Ok(())
            }
            Err(failure) => {
                let rollback = if self.state.rollback_armed {
                    self.rollback().await
                } else {
                    log::debug!("Rollback not armed, leaving the repository as is");
                    RollbackOutcome::NotArmed
                };
                Err(ReleaseFailure {
                    step: Some(failure.step),
                    error: failure.error,
                    rollback,
                })
            }
        }
    }

    /// Finish an existing release branch. Never rolls back.
    pub async fn finish(&mut self) -> Result<()> {
        let branch_name = self.require_branch_name()?;
        self.state.do_finish = true;
        let plan = finish_plan(&self.config, self.plan_context());
        log::debug!("Finish plan: {:?}", plan);

        run_pipeline(&plan, &mut self.steps())
            .await
            .map_err(|failure| failure.error)?;
        self.output
            .success(&format!("{} has been successfully released!", branch_name));
        Ok(())
    }

    /// Run the compensating steps.
    ///
    /// Without a branch name from this run the local `release/*` branch is
    /// used. Does nothing when rollback is disabled.
    pub async fn rollback(&mut self) -> RollbackOutcome {
        if self.config.disable_rollback {
            log::debug!("Rollback disabled");
            return RollbackOutcome::Disabled;
        }
        self.output.warn("Rolling back...");

        let branch_name = match &self.state.branch_name {
            Some(name) => Some(name.clone()),
            None => match self.git.find_release_branch().await {
                Ok(found) => found,
                Err(e) => return RollbackOutcome::Failed(e),
            },
        };
        let tag_name = match &branch_name {
            Some(name) => match self.git.version_tag_prefix().await {
                Ok(prefix) => Some(format!("{}{}", prefix, name)),
                Err(e) => return RollbackOutcome::Failed(e),
            },
            None => None,
        };

        let plan = rollback_plan(&self.config);
        log::debug!("Rollback plan: {:?}", plan);
        let mut compensator = Compensator {
            git: &self.git,
            config: &self.config,
            work_dir: &self.project.work_dir,
            branch_name,
            tag_name,
            starting_head: self.state.starting_head.clone(),
        };

        match run_pipeline(&plan, &mut compensator).await {
            Ok(completed) => {
                self.state.disarm_rollback();
                self.output.warn("Rollback successful");
                RollbackOutcome::Completed(completed)
            }
            Err(failure) => RollbackOutcome::Failed(ReleaseError::PartialRollback {
                failed_step: failure.step.to_string(),
                completed: failure.completed.iter().map(ToString::to_string).collect(),
                source: Box::new(failure.error),
            }),
        }
    }

    /// Write the new version to the manifest without any VCS step
    pub async fn bump_only(&mut self) -> Result<()> {
        let version = self
            .state
            .new_version
            .as_ref()
            .map(ToString::to_string)
            .ok_or_else(|| anyhow::anyhow!("bump the version first"))?;

        let Some(manifest) = &self.project.manifest else {
            self.output
                .warn("No package manifest found, nothing to write");
            return Ok(());
        };
        manifest.write_version(&version, None, self.config.package_spaces)?;
        self.output.success(&format!(
            "{} set to {}",
            manifest.kind.file_name(),
            version
        ));

        if let Some((lock, _)) = &self.project.lock_file {
            let command = lock.refresh_command();
            self.runner
                .run_shell(command, &self.project.work_dir)
                .await?
                .into_result(command)?;
            self.output
                .success(&format!("{} refreshed", lock.file_name()));
        }
        Ok(())
    }

    /// Changelog author and release message for the current changes
    pub async fn preview_changes(&self) -> Result<ChangesPreview> {
        let username = match self.config.explicit_changelog_username() {
            Some(name) => name.to_string(),
            None => self.git.current_user().await?,
        };
        let commits = self.git.commits_since_last_tag().await?;
        Ok(ChangesPreview {
            username,
            release_message: render_release_message(&commits),
        })
    }

    /// Reset the long-lived branches to their remotes and drop the local
    /// tag of the current version
    pub async fn reset_repository(&self) -> Result<()> {
        let prefix = self.git.version_tag_prefix().await?;
        let tag = format!("{}{}", prefix, self.project.current_version);
        self.git.delete_tag(&tag, true).await?;
        self.git.reset_branch_to_origin(INTEGRATION_BRANCH).await?;
        self.git.reset_branch_to_origin(MAINLINE_BRANCH).await?;
        self.git.checkout_integration_branch().await?;
        self.git.fetch_tags().await?;
        self.output.success("Reset finished");
        Ok(())
    }
}
