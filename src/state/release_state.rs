//! Per-invocation release state.

use semver::Version;

/// Whether the release branch was created by this run or already existed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BranchOrigin {
    /// Created by this run
    #[default]
    New,
    /// Existed locally or on the remote before this run
    Continuation,
}

/// Mutable state of one release invocation.
///
/// Owned by the orchestrator and lent to step handlers. Nothing here is
/// persisted; a second run rediscovers what it needs from the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseState {
    /// Version before the release
    pub current_version: Version,
    /// Version being released, set by the bump
    pub new_version: Option<Version>,
    /// Release name, `release/<branch_name>` is the branch
    pub branch_name: Option<String>,
    /// Set by the continuation detector
    pub origin: BranchOrigin,
    /// Set when the finish operation runs
    pub do_finish: bool,
    /// Tag message for the finish
    pub release_message: String,
    /// Milliseconds since the epoch, captured once at construction
    pub build_timestamp: i64,
    /// Whether a failure from now on triggers the compensator
    pub rollback_armed: bool,
    /// Integration branch head at the checkpoint, the hard reset target
    pub starting_head: Option<String>,
}

impl ReleaseState {
    /// Create the state for a release starting at `current_version`
    pub fn new(current_version: Version) -> Self {
        Self::with_timestamp(current_version, chrono::Utc::now().timestamp_millis())
    }

    /// Create the state with a fixed build timestamp
    pub fn with_timestamp(current_version: Version, build_timestamp: i64) -> Self {
        Self {
            current_version,
            new_version: None,
            branch_name: None,
            origin: BranchOrigin::New,
            do_finish: false,
            release_message: String::new(),
            build_timestamp,
            rollback_armed: false,
            starting_head: None,
        }
    }

    /// Derive the branch name from the new version.
    ///
    /// With `with_timestamp` the build timestamp is appended: `1.2.0-1700000000000`.
    pub fn derive_branch_name(&mut self, with_timestamp: bool) -> Option<&str> {
        let version = self.new_version.as_ref()?;
        let name = if with_timestamp {
            format!("{}-{}", version, self.build_timestamp)
        } else {
            version.to_string()
        };
        self.branch_name = Some(name);
        self.branch_name.as_deref()
    }

    /// Arm the rollback at the checkpoint
    pub fn arm_rollback(&mut self, starting_head: Option<String>) {
        self.rollback_armed = true;
        self.starting_head = starting_head;
    }

    /// Disarm the rollback
    pub fn disarm_rollback(&mut self) {
        self.rollback_armed = false;
    }
}
