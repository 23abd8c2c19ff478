//! State of a release invocation.
//!
//! [`ReleaseState`] carries the versions, the branch name and the rollback
//! checkpoint flag between pipeline steps.

mod release_state;

pub use release_state::{BranchOrigin, ReleaseState};
