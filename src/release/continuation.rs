//! Detection of release branches left behind by an earlier run.

use crate::error::Result;
use crate::git::{DEFAULT_REMOTE, GitOperations};
use crate::state::BranchOrigin;

/// Decide whether `branch` is new or continues an existing release.
///
/// A branch that exists locally or as `origin/<branch>` is a continuation.
pub async fn detect_branch_origin<G: GitOperations>(git: &G, branch: &str) -> Result<BranchOrigin> {
    if git.branch_exists(branch).await? || git.remote_branch_exists(DEFAULT_REMOTE, branch).await? {
        log::debug!("Branch {} already exists, continuing it", branch);
        Ok(BranchOrigin::Continuation)
    } else {
        Ok(BranchOrigin::New)
    }
}
