//! Bump command implementation.
//!
//! Writes the new version to the manifest and refreshes the lock file
//! without touching git.

use super::{Orchestrator, requested_version};
use crate::cli::{RuntimeConfig, VersionSource};
use crate::error::Result;

/// Execute bump command
pub(super) async fn execute_bump(
    mut orchestrator: Orchestrator,
    source: &VersionSource,
    config: &RuntimeConfig,
) -> Result<i32> {
    let requested = requested_version(source, &orchestrator);
    config.verbose_println(&format!(
        "Bumping {} with {}",
        orchestrator.project().current_version,
        requested
    ));
    orchestrator.bump(&requested)?;
    orchestrator.bump_only().await?;
    Ok(0)
}
