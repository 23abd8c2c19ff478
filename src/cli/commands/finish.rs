//! Finish command implementation.
//!
//! Finishes a release branch created by an earlier run that did not finish.

use super::{Orchestrator, requested_version};
use crate::cli::{RuntimeConfig, VersionSource};
use crate::error::Result;

/// Execute finish command
pub(super) async fn execute_finish(
    mut orchestrator: Orchestrator,
    source: &VersionSource,
    config: &RuntimeConfig,
) -> Result<i32> {
    let requested = requested_version(source, &orchestrator);
    orchestrator.bump(&requested)?;
    let branch_name = orchestrator.set_branch_name()?.to_string();
    config.verbose_println(&format!("Finishing release/{}", branch_name));

    orchestrator.finish().await?;
    Ok(0)
}
