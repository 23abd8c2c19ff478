//! Release command implementation.
//!
//! Bumps the version, names the release branch and runs the release
//! pipeline. A failure is reported together with the rollback outcome.

use super::{Orchestrator, requested_version};
use crate::cli::{RuntimeConfig, VersionSource};
use crate::error::Result;
use crate::release::{ReleaseFailure, RollbackOutcome};

/// Execute release command
pub(super) async fn execute_release(
    mut orchestrator: Orchestrator,
    source: &VersionSource,
    config: &RuntimeConfig,
) -> Result<i32> {
    let requested = requested_version(source, &orchestrator);
    orchestrator.bump(&requested)?;
    let branch_name = orchestrator.set_branch_name()?.to_string();
    config.verbose_println(&format!("Release branch: release/{}", branch_name));

    match orchestrator.release().await {
        Ok(()) => Ok(0),
        Err(failure) => {
            report_failure(&failure, config);
            Ok(1)
        }
    }
}

fn report_failure(failure: &ReleaseFailure, config: &RuntimeConfig) {
    config.error_println(&format!("Release failed: {}", failure));
    config.suggestions(&failure.error);

    match &failure.rollback {
        RollbackOutcome::NotArmed => {
            config.verbose_println("Nothing to roll back");
        }
        RollbackOutcome::Disabled => {
            config.warning_println("Rollback is disabled, the repository was left as is");
        }
        RollbackOutcome::Completed(steps) => {
            let steps: Vec<String> = steps.iter().map(ToString::to_string).collect();
            config.verbose_println(&format!("Rolled back: {}", steps.join(", ")));
        }
        RollbackOutcome::Failed(e) => {
            config.error_println(&format!("Rollback failed: {}", e));
            config.suggestions(e);
        }
    }
}
