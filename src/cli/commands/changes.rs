//! Changes command implementation.
//!
//! Shows who the changelog would credit and the release message the next
//! release would carry. Nothing is written.

use super::Orchestrator;
use crate::cli::RuntimeConfig;
use crate::error::Result;

/// Execute changes command
pub(super) async fn execute_changes(orchestrator: &Orchestrator, config: &RuntimeConfig) -> Result<i32> {
    let preview = orchestrator.preview_changes().await?;

    config.output().section("Changes");
    config.println(&format!("Changelog author: {}", preview.username));
    if preview.release_message.is_empty() {
        config.println("No commits since the last version");
    } else {
        config.println("Release message:");
        config.indent(&preview.release_message);
    }
    Ok(0)
}
