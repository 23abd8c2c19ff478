//! Command line argument parsing and validation.
//!
//! A bare version or bump keyword starts a release. The flags select the
//! other operations; only one operation runs per invocation.

use crate::config::ConfigOverrides;
use crate::error::CliError;
use clap::Parser;

/// git-flow release automation
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "gitflow_release",
    version,
    about = "Create a git-flow release: bump, branch, changelog, commit, push and finish",
    long_about = "Create a git-flow release: bump the version, create or resume the release \
branch, write the changelog, run the configured commands, commit, push and finish. \
A failed release is rolled back.

Usage:
  gitflow_release patch
  gitflow_release -p minor
  gitflow_release --debug 2.0.0
  gitflow_release -f 1.4.0
  gitflow_release --cleanup

Options can also be set in gitflow-release.json in the repository root."
)]
pub struct Args {
    /// New version or bump keyword: major, minor, patch or x.y.z
    #[arg(value_name = "VERSION")]
    pub target: Option<String>,

    /// Push mainline, integration branch and tag when finishing
    #[arg(short, long)]
    pub push: bool,

    /// Keep the release branch after finishing
    #[arg(short, long)]
    pub keep: bool,

    /// Verbose output
    #[arg(short, long, env = "GITFLOW_RELEASE_DEBUG")]
    pub debug: bool,

    /// Release the version found in the manifest or latest tag
    #[arg(short, long)]
    pub update: bool,

    /// Only bump the version in the manifest, no git operations
    #[arg(short, long)]
    pub bump: bool,

    /// Finish a previously created release branch
    #[arg(short, long)]
    pub finish: bool,

    /// Do not roll back a failed release
    #[arg(short = 'r', long)]
    pub disable_rollback: bool,

    /// Remove an unfinished release
    #[arg(long)]
    pub cleanup: bool,

    /// Reset develop and master to origin
    #[arg(long)]
    pub reset: bool,

    /// Show the changes since the last version
    #[arg(long)]
    pub changes: bool,
}

/// Where the requested version comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSource {
    /// Given on the command line
    Argument(String),
    /// The project's current version (`--update`)
    Current,
}

/// Operation selected by the arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Print the changelog author and release message preview
    Changes,
    /// Write the new version to the manifest only
    Bump(VersionSource),
    /// Finish an existing release branch
    Finish(VersionSource),
    /// Reset the long-lived branches to the remote
    Reset,
    /// Roll back an unfinished release
    Cleanup,
    /// Run a release
    Release(VersionSource),
}

impl Operation {
    /// Operation name for messages
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Changes => "changes",
            Operation::Bump(_) => "bump",
            Operation::Finish(_) => "finish",
            Operation::Reset => "reset",
            Operation::Cleanup => "cleanup",
            Operation::Release(_) => "release",
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Select the operation, failing when a required version is missing
    pub fn operation(&self) -> Result<Operation, CliError> {
        if self.changes {
            return Ok(Operation::Changes);
        }
        let version = || self.version_source();
        if self.bump {
            return Ok(Operation::Bump(version()?));
        }
        if self.finish {
            return Ok(Operation::Finish(version()?));
        }
        if self.reset {
            return Ok(Operation::Reset);
        }
        if self.cleanup {
            return Ok(Operation::Cleanup);
        }
        Ok(Operation::Release(version()?))
    }

    fn version_source(&self) -> Result<VersionSource, CliError> {
        if self.update {
            return Ok(VersionSource::Current);
        }
        match self.target.as_deref().map(str::trim) {
            Some(version) if !version.is_empty() => Ok(VersionSource::Argument(version.to_string())),
            _ => Err(CliError::MissingVersionArgument),
        }
    }

    /// Flags that override the config file
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            push: self.push,
            keep: self.keep,
            debug: self.debug,
            update: self.update || self.cleanup,
            disable_rollback: self.disable_rollback,
        }
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl RuntimeConfig {
    /// Create runtime configuration
    pub fn new(verbose: bool) -> Self {
        Self {
            output: super::OutputManager::new(verbose, false),
        }
    }

    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print message
    pub fn println(&self, message: &str) {
        self.output.println(message);
    }

    /// Print verbose message
    pub fn verbose_println(&self, message: &str) {
        self.output.verbose(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        self.output.warn(message);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        self.output.indent(message);
    }

    /// Print recovery suggestions for an error
    pub fn suggestions(&self, error: &crate::error::ReleaseError) {
        let suggestions = error.recovery_suggestions();
        if !suggestions.is_empty() {
            self.println("\n💡 Recovery suggestions:");
            for suggestion in suggestions {
                self.indent(&format!("• {}", suggestion));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["gitflow_release"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_bare_version_is_release() {
        let args = parse(&["-p", "minor"]);
        assert!(args.push);
        assert_eq!(
            args.operation().unwrap(),
            Operation::Release(VersionSource::Argument("minor".to_string()))
        );
    }

    #[test]
    fn test_missing_version() {
        let err = parse(&["--push"]).operation().unwrap_err();
        assert!(matches!(err, CliError::MissingVersionArgument));
        assert!(parse(&["-b"]).operation().is_err());
    }

    #[test]
    fn test_operations_without_version() {
        assert_eq!(parse(&["--changes"]).operation().unwrap(), Operation::Changes);
        assert_eq!(parse(&["--reset"]).operation().unwrap(), Operation::Reset);
        assert_eq!(parse(&["--cleanup"]).operation().unwrap(), Operation::Cleanup);
        assert_eq!(
            parse(&["-u"]).operation().unwrap(),
            Operation::Release(VersionSource::Current)
        );
    }

    #[test]
    fn test_finish_and_bump_take_version() {
        assert_eq!(
            parse(&["-f", "1.4.0"]).operation().unwrap(),
            Operation::Finish(VersionSource::Argument("1.4.0".to_string()))
        );
        assert_eq!(
            parse(&["--bump", "patch"]).operation().unwrap(),
            Operation::Bump(VersionSource::Argument("patch".to_string()))
        );
    }

    #[test]
    fn test_cleanup_implies_update_override() {
        let overrides = parse(&["--cleanup", "-r"]).overrides();
        assert!(overrides.update);
        assert!(overrides.disable_rollback);
    }
}
