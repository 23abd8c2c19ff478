//! Step descriptors and the plan builders that order them.
//!
//! Plans are plain vectors computed from the configuration before anything
//! runs, so the shape of a run can be inspected and tested on its own.

use crate::config::ReleaseConfig;
use std::fmt;

/// User hook command lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    /// `preConditionCommands`, must all succeed before anything is touched
    PreCondition,
    /// `customReleaseCommands`, on the release branch before the commit
    CustomRelease,
    /// `postReleaseCommands`, after a successful release
    PostRelease,
    /// `customReleaseFinishCommands`, on the release branch before a finish commit
    CustomReleaseFinish,
    /// `postReleaseFinishedCommands`, after a successful finish
    PostReleaseFinished,
}

impl HookStage {
    /// Commands configured for this stage
    pub fn commands(self, config: &ReleaseConfig) -> &[String] {
        match self {
            HookStage::PreCondition => &config.pre_condition_commands,
            HookStage::CustomRelease => &config.custom_release_commands,
            HookStage::PostRelease => &config.post_release_commands,
            HookStage::CustomReleaseFinish => &config.custom_release_finish_commands,
            HookStage::PostReleaseFinished => &config.post_release_finished_commands,
        }
    }
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookStage::PreCondition => "pre-condition",
            HookStage::CustomRelease => "custom-release",
            HookStage::PostRelease => "post-release",
            HookStage::CustomReleaseFinish => "custom-release-finish",
            HookStage::PostReleaseFinished => "post-release-finished",
        };
        f.write_str(name)
    }
}

/// Forward step of a release or finish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStep {
    /// Run the commands of a hook stage in order
    RunHooks(HookStage),
    /// Refresh remote tracking refs
    UpdateRemotes,
    /// Checkout the integration branch
    CheckoutIntegration,
    /// Fail on uncommitted tracked changes, warn on untracked files
    VerifyCleanTree,
    /// Fail when the integration branch diverges from its remote
    VerifyIntegrationPushed,
    /// Checkout mainline and fail when it diverges from its remote
    VerifyMainlineCurrent,
    /// Arm the rollback, then create the release branch or resume an existing one
    CreateOrResumeBranch,
    /// Checkout the existing release branch
    CheckoutReleaseBranch,
    /// Render and write the changelog
    GenerateChangelog,
    /// Render the tag message
    ComposeReleaseMessage,
    /// Write the new version into the manifest
    UpdateManifest {
        /// Also record the build timestamp
        with_timestamp: bool,
    },
    /// Refresh the manifest's lock file
    UpdateLockfile,
    /// Commit manifest, lock file and changelog
    CommitChanges,
    /// Publish the release branch
    PushBranch,
    /// Merge, tag and optionally push
    FinishBranch,
}

impl fmt::Display for ReleaseStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseStep::RunHooks(stage) => write!(f, "run {} commands", stage),
            ReleaseStep::UpdateRemotes => f.write_str("update remotes"),
            ReleaseStep::CheckoutIntegration => f.write_str("checkout integration branch"),
            ReleaseStep::VerifyCleanTree => f.write_str("verify clean working tree"),
            ReleaseStep::VerifyIntegrationPushed => f.write_str("verify integration branch pushed"),
            ReleaseStep::VerifyMainlineCurrent => f.write_str("verify mainline up to date"),
            ReleaseStep::CreateOrResumeBranch => f.write_str("create or resume release branch"),
            ReleaseStep::CheckoutReleaseBranch => f.write_str("checkout release branch"),
            ReleaseStep::GenerateChangelog => f.write_str("generate changelog"),
            ReleaseStep::ComposeReleaseMessage => f.write_str("compose release message"),
            ReleaseStep::UpdateManifest { with_timestamp: true } => {
                f.write_str("update manifest with timestamp")
            }
            ReleaseStep::UpdateManifest { with_timestamp: false } => f.write_str("update manifest"),
            ReleaseStep::UpdateLockfile => f.write_str("update lock file"),
            ReleaseStep::CommitChanges => f.write_str("commit changes"),
            ReleaseStep::PushBranch => f.write_str("push release branch"),
            ReleaseStep::FinishBranch => f.write_str("finish release branch"),
        }
    }
}

/// Compensating step run after a failed release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackStep {
    /// Remove the per-release changelog file
    DeleteChangelog,
    /// Hard reset to the head recorded at the checkpoint
    HardReset,
    /// Checkout the integration branch
    CheckoutIntegration,
    /// Delete the release tag locally and on the remote
    DeleteTag,
    /// Delete the release branch on the remote
    DeleteRemoteBranch,
    /// Delete the local release branch
    DeleteLocalBranch,
}

impl fmt::Display for RollbackStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RollbackStep::DeleteChangelog => "delete changelog",
            RollbackStep::HardReset => "hard reset",
            RollbackStep::CheckoutIntegration => "checkout integration branch",
            RollbackStep::DeleteTag => "delete tag",
            RollbackStep::DeleteRemoteBranch => "delete remote release branch",
            RollbackStep::DeleteLocalBranch => "delete local release branch",
        };
        f.write_str(name)
    }
}

/// Facts about the project that shape a plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanContext {
    /// A package manifest was detected
    pub has_manifest: bool,
    /// The manifest has a lock file on disk
    pub has_lock_file: bool,
}

fn push_hooks(plan: &mut Vec<ReleaseStep>, config: &ReleaseConfig, stage: HookStage) {
    if !stage.commands(config).is_empty() {
        plan.push(ReleaseStep::RunHooks(stage));
    }
}

fn push_repository_checks(plan: &mut Vec<ReleaseStep>) {
    plan.extend([
        ReleaseStep::UpdateRemotes,
        ReleaseStep::CheckoutIntegration,
        ReleaseStep::VerifyCleanTree,
        ReleaseStep::VerifyIntegrationPushed,
        ReleaseStep::VerifyMainlineCurrent,
    ]);
}

fn push_manifest_steps(plan: &mut Vec<ReleaseStep>, context: PlanContext, with_timestamp: bool) {
    if context.has_manifest {
        plan.push(ReleaseStep::UpdateManifest { with_timestamp });
        if context.has_lock_file {
            plan.push(ReleaseStep::UpdateLockfile);
        }
    }
}

/// Steps of a release run
pub fn release_plan(config: &ReleaseConfig, context: PlanContext) -> Vec<ReleaseStep> {
    let mut plan = Vec::new();
    push_hooks(&mut plan, config, HookStage::PreCondition);
    push_repository_checks(&mut plan);
    plan.push(ReleaseStep::CreateOrResumeBranch);

    if config.finish_release {
        if config.create_changelog {
            plan.push(ReleaseStep::GenerateChangelog);
        }
        plan.push(ReleaseStep::ComposeReleaseMessage);
    }
    // The timestamp is only recorded by the run that finishes
    push_manifest_steps(&mut plan, context, config.finish_release);
    push_hooks(&mut plan, config, HookStage::CustomRelease);

    plan.push(ReleaseStep::CommitChanges);
    plan.push(ReleaseStep::PushBranch);
    if config.finish_release {
        plan.push(ReleaseStep::FinishBranch);
    }
    push_hooks(&mut plan, config, HookStage::PostRelease);
    plan
}

/// Steps of a finish run for an existing release branch
pub fn finish_plan(config: &ReleaseConfig, context: PlanContext) -> Vec<ReleaseStep> {
    let mut plan = Vec::new();
    push_repository_checks(&mut plan);
    plan.push(ReleaseStep::CheckoutReleaseBranch);
    if config.create_changelog {
        plan.push(ReleaseStep::GenerateChangelog);
    }
    plan.push(ReleaseStep::ComposeReleaseMessage);
    push_manifest_steps(&mut plan, context, true);
    push_hooks(&mut plan, config, HookStage::CustomReleaseFinish);
    plan.extend([
        ReleaseStep::CommitChanges,
        ReleaseStep::PushBranch,
        ReleaseStep::FinishBranch,
    ]);
    push_hooks(&mut plan, config, HookStage::PostReleaseFinished);
    plan
}

/// Compensating steps undoing a failed release, in execution order
pub fn rollback_plan(config: &ReleaseConfig) -> Vec<RollbackStep> {
    let mut plan = Vec::new();
    // The reset restores a tracked neverending changelog. An untracked one is
    // kept and never gets a second entry for the same version.
    if config.create_changelog && !config.neverending_changelog {
        plan.push(RollbackStep::DeleteChangelog);
    }
    plan.push(RollbackStep::HardReset);
    plan.push(RollbackStep::CheckoutIntegration);
    if config.finish_release {
        plan.push(RollbackStep::DeleteTag);
        plan.push(RollbackStep::DeleteRemoteBranch);
    }
    plan.push(RollbackStep::DeleteLocalBranch);
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use ReleaseStep::*;

    #[test]
    fn test_default_release_plan() {
        let plan = release_plan(&ReleaseConfig::default(), PlanContext::default());
        assert_eq!(
            plan,
            vec![
                UpdateRemotes,
                CheckoutIntegration,
                VerifyCleanTree,
                VerifyIntegrationPushed,
                VerifyMainlineCurrent,
                CreateOrResumeBranch,
                GenerateChangelog,
                ComposeReleaseMessage,
                CommitChanges,
                PushBranch,
                FinishBranch,
            ]
        );
    }

    #[test]
    fn test_release_plan_without_finish_skips_changelog_and_timestamp() {
        let config = ReleaseConfig {
            finish_release: false,
            post_release_commands: vec!["echo done".to_string()],
            ..Default::default()
        };
        let context = PlanContext {
            has_manifest: true,
            has_lock_file: true,
        };
        let plan = release_plan(&config, context);
        assert!(!plan.contains(&GenerateChangelog));
        assert!(!plan.contains(&ComposeReleaseMessage));
        assert!(!plan.contains(&FinishBranch));
        assert!(plan.contains(&UpdateManifest {
            with_timestamp: false
        }));
        assert_eq!(plan.last(), Some(&RunHooks(HookStage::PostRelease)));
    }

    #[test]
    fn test_hooks_are_placed_around_the_pipeline() {
        let config = ReleaseConfig {
            pre_condition_commands: vec!["npm test".to_string()],
            custom_release_commands: vec!["npm run build".to_string()],
            create_changelog: false,
            ..Default::default()
        };
        let context = PlanContext {
            has_manifest: true,
            has_lock_file: false,
        };
        let plan = release_plan(&config, context);
        assert_eq!(plan.first(), Some(&RunHooks(HookStage::PreCondition)));

        let manifest = plan
            .iter()
            .position(|s| *s == UpdateManifest { with_timestamp: true })
            .unwrap();
        let custom = plan
            .iter()
            .position(|s| *s == RunHooks(HookStage::CustomRelease))
            .unwrap();
        let commit = plan.iter().position(|s| *s == CommitChanges).unwrap();
        assert!(manifest < custom && custom < commit);
        assert!(!plan.contains(&UpdateLockfile));
    }

    #[test]
    fn test_finish_plan() {
        let context = PlanContext {
            has_manifest: true,
            has_lock_file: true,
        };
        let plan = finish_plan(&ReleaseConfig::default(), context);
        assert_eq!(
            plan,
            vec![
                UpdateRemotes,
                CheckoutIntegration,
                VerifyCleanTree,
                VerifyIntegrationPushed,
                VerifyMainlineCurrent,
                CheckoutReleaseBranch,
                GenerateChangelog,
                ComposeReleaseMessage,
                UpdateManifest {
                    with_timestamp: true
                },
                UpdateLockfile,
                CommitChanges,
                PushBranch,
                FinishBranch,
            ]
        );
        assert!(!plan.contains(&CreateOrResumeBranch));
    }

    #[test]
    fn test_full_rollback_plan() {
        assert_eq!(
            rollback_plan(&ReleaseConfig::default()),
            vec![
                RollbackStep::DeleteChangelog,
                RollbackStep::HardReset,
                RollbackStep::CheckoutIntegration,
                RollbackStep::DeleteTag,
                RollbackStep::DeleteRemoteBranch,
                RollbackStep::DeleteLocalBranch,
            ]
        );
    }

    #[test]
    fn test_rollback_plan_follows_enabled_features() {
        let config = ReleaseConfig {
            finish_release: false,
            neverending_changelog: true,
            ..Default::default()
        };
        assert_eq!(
            rollback_plan(&config),
            vec![
                RollbackStep::HardReset,
                RollbackStep::CheckoutIntegration,
                RollbackStep::DeleteLocalBranch,
            ]
        );
    }
}
