//! Cleanup command implementation.
//!
//! Runs the compensating steps for an unfinished release left behind by an
//! earlier run.

use super::Orchestrator;
use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::release::RollbackOutcome;

/// Execute cleanup command
pub(super) async fn execute_cleanup(
    mut orchestrator: Orchestrator,
    config: &RuntimeConfig,
) -> Result<i32> {
    config.verbose_println("Cleaning up unfinished release...");

    match orchestrator.rollback().await {
        RollbackOutcome::Completed(_) | RollbackOutcome::NotArmed => Ok(0),
        RollbackOutcome::Disabled => {
            config.warning_println("Rollback is disabled, nothing was cleaned up");
            Ok(0)
        }
        RollbackOutcome::Failed(e) => Err(e),
    }
}
