//! Version resolution for releases.
//!
//! Maps a current version and a requested bump keyword or explicit version
//! to the new release version.

mod bumper;

pub use bumper::{VersionBump, VersionBumper, parse_clean};

use crate::error::Result;
use semver::Version;

/// Resolve the new version for `requested` starting from `current`
pub fn resolve(current: &Version, requested: &VersionBump) -> Result<Version> {
    VersionBumper::from_version(current.clone()).bump(requested)
}
