//! Compensating steps that undo a failed release.

use crate::config::ReleaseConfig;
use crate::error::Result;
use crate::git::{GitOperations, release_branch};
use crate::pipeline::{RollbackStep, StepHandler};
use std::path::Path;

/// Outcome of the rollback decision after a run
#[derive(Debug)]
pub enum RollbackOutcome {
    /// The run failed before the checkpoint or resumed an existing branch
    NotArmed,
    /// Rollback is switched off in the configuration
    Disabled,
    /// All compensating steps ran
    Completed(Vec<RollbackStep>),
    /// A compensating step failed; holds a `PartialRollback` error
    Failed(crate::error::ReleaseError),
}

impl RollbackOutcome {
    /// True when compensating steps ran and all of them succeeded
    pub fn is_completed(&self) -> bool {
        matches!(self, RollbackOutcome::Completed(_))
    }
}

/// Runs [`RollbackStep`]s for one release
pub(super) struct Compensator<'a, G> {
    pub(super) git: &'a G,
    pub(super) config: &'a ReleaseConfig,
    pub(super) work_dir: &'a Path,
    /// Release name, `None` when no release branch could be found
    pub(super) branch_name: Option<String>,
    /// Tag the finish would have created
    pub(super) tag_name: Option<String>,
    /// Reset target, `HEAD` when unknown
    pub(super) starting_head: Option<String>,
}

impl<G: GitOperations> StepHandler<RollbackStep> for Compensator<'_, G> {
    async fn run_step(&mut self, step: &RollbackStep) -> Result<()> {
        match step {
            RollbackStep::DeleteChangelog => self.delete_changelog().await,
            RollbackStep::HardReset => {
                let target = self.starting_head.as_deref().unwrap_or("HEAD");
                self.git.hard_reset_to(target).await
            }
            RollbackStep::CheckoutIntegration => self.git.checkout_integration_branch().await,
            RollbackStep::DeleteTag => match &self.tag_name {
                Some(tag) => self.git.delete_tag(tag, false).await,
                None => Ok(()),
            },
            RollbackStep::DeleteRemoteBranch => match &self.branch_name {
                Some(name) => self.git.delete_remote_branch(&release_branch(name)).await,
                None => Ok(()),
            },
            RollbackStep::DeleteLocalBranch => match &self.branch_name {
                Some(name) => {
                    let branch = release_branch(name);
                    if self.git.branch_exists(&branch).await? {
                        self.git.delete_local_branch(&branch).await
                    } else {
                        log::debug!("{} does not exist locally", branch);
                        Ok(())
                    }
                }
                None => Ok(()),
            },
        }
    }
}

impl<G: GitOperations> Compensator<'_, G> {
    async fn delete_changelog(&mut self) -> Result<()> {
        let Some(name) = &self.branch_name else {
            return Ok(());
        };
        let path = self
            .config
            .changelog_dir(self.work_dir)
            .join(format!("{}.md", name));
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                log::debug!("Removed {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
