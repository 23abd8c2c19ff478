//! Command execution for every operation the CLI offers.
//!
//! Each invocation validates its arguments, loads the configuration, opens
//! the repository, detects the project and hands one
//! [`ReleaseOrchestrator`] to the selected command.

mod bump;
mod changes;
mod cleanup;
mod finish;
mod release;
mod reset;

use crate::cli::{Args, Operation, RuntimeConfig, VersionSource};
use crate::config::ReleaseConfig;
use crate::error::Result;
use crate::git::SystemGit;
use crate::process::ShellRunner;
use crate::project::ProjectInfo;
use crate::release::ReleaseOrchestrator;

use bump::execute_bump;
use changes::execute_changes;
use cleanup::execute_cleanup;
use finish::execute_finish;
use release::execute_release;
use reset::execute_reset;

/// Orchestrator wired to the system git and shell
type Orchestrator = ReleaseOrchestrator<SystemGit, ShellRunner>;

/// Execute the operation selected by the parsed arguments
pub async fn execute_command(args: Args) -> Result<i32> {
    let operation = match args.operation() {
        Ok(operation) => operation,
        Err(e) => {
            let output = super::OutputManager::new(false, false);
            output.error(&e.to_string());
            output.println("Run with --help for usage");
            return Ok(1);
        }
    };

    let work_dir = std::env::current_dir()?;
    let config = ReleaseConfig::load(&work_dir)?.with_overrides(args.overrides());
    let runtime = RuntimeConfig::new(config.debug);
    log::debug!("Running {} in {}", operation.name(), work_dir.display());

    let result = match open_orchestrator(config, &work_dir, &runtime).await {
        Ok(orchestrator) => dispatch(orchestrator, &operation, &runtime).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(exit_code) => Ok(exit_code),
        Err(e) => {
            runtime.error_println(&format!("Command '{}' failed: {}", operation.name(), e));
            runtime.suggestions(&e);
            Ok(1)
        }
    }
}

async fn dispatch(
    orchestrator: Orchestrator,
    operation: &Operation,
    runtime: &RuntimeConfig,
) -> Result<i32> {
    match operation {
        Operation::Changes => execute_changes(&orchestrator, runtime).await,
        Operation::Bump(source) => execute_bump(orchestrator, source, runtime).await,
        Operation::Finish(source) => execute_finish(orchestrator, source, runtime).await,
        Operation::Reset => execute_reset(&orchestrator, runtime).await,
        Operation::Cleanup => execute_cleanup(orchestrator, runtime).await,
        Operation::Release(source) => execute_release(orchestrator, source, runtime).await,
    }
}

async fn open_orchestrator(
    config: ReleaseConfig,
    work_dir: &std::path::Path,
    runtime: &RuntimeConfig,
) -> Result<Orchestrator> {
    let git = SystemGit::open(work_dir).await?;
    let project = ProjectInfo::detect(work_dir, &git).await?;

    match &project.manifest {
        Some(manifest) => runtime.verbose_println(&format!(
            "Taking version {} from {}",
            project.current_version,
            manifest.kind.file_name()
        )),
        None => runtime.verbose_println(&format!(
            "No package manifest found, taking version {} from the latest tag",
            project.current_version
        )),
    }

    Ok(ReleaseOrchestrator::new(
        config,
        project,
        git,
        ShellRunner,
        runtime.output().clone(),
    ))
}

/// Version or keyword to bump with. `update` in the config file also selects
/// the current version.
fn requested_version(source: &VersionSource, orchestrator: &Orchestrator) -> String {
    match source {
        VersionSource::Argument(requested) if !orchestrator.config().update => requested.clone(),
        _ => orchestrator.project().current_version.to_string(),
    }
}
