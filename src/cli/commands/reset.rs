//! Reset command implementation.

use super::Orchestrator;
use crate::cli::RuntimeConfig;
use crate::error::Result;

/// Execute reset command: bring develop and master back to origin
pub(super) async fn execute_reset(orchestrator: &Orchestrator, config: &RuntimeConfig) -> Result<i32> {
    config.verbose_println("Resetting develop and master to origin...");
    orchestrator.reset_repository().await?;
    Ok(0)
}
