//! Semantic version bumping.

use crate::error::{Result, VersionError};
use semver::{BuildMetadata, Prerelease, Version};
use std::fmt;
use std::str::FromStr;

/// Requested version change: a bump keyword or an explicit version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionBump {
    /// Increment major, zero minor and patch
    Major,
    /// Increment minor, zero patch
    Minor,
    /// Increment patch
    Patch,
    /// Use the given version as is
    Exact(Version),
}

impl FromStr for VersionBump {
    type Err = VersionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "major" => Ok(VersionBump::Major),
            "minor" => Ok(VersionBump::Minor),
            "patch" => Ok(VersionBump::Patch),
            other => parse_clean(other).map(VersionBump::Exact),
        }
    }
}

impl fmt::Display for VersionBump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionBump::Major => write!(f, "major"),
            VersionBump::Minor => write!(f, "minor"),
            VersionBump::Patch => write!(f, "patch"),
            VersionBump::Exact(version) => write!(f, "{}", version),
        }
    }
}

/// Parse a version string, tolerating a leading `v` or `=` and surrounding whitespace
pub fn parse_clean(raw: &str) -> std::result::Result<Version, VersionError> {
    let cleaned = raw.trim().trim_start_matches(['=', 'v', 'V']).trim();
    Version::parse(cleaned).map_err(|e| VersionError::InvalidVersion {
        version: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Applies [`VersionBump`] requests to a current version
#[derive(Debug, Clone)]
pub struct VersionBumper {
    current: Version,
}

impl VersionBumper {
    /// Create a bumper for the given current version
    pub fn from_version(current: Version) -> Self {
        Self { current }
    }

    /// Parse the current version from a string
    pub fn from_str_version(current: &str) -> Result<Self> {
        Ok(Self::from_version(parse_clean(current)?))
    }

    /// Resolve the new version for a bump request.
    ///
    /// Keyword bumps drop pre-release and build metadata.
    pub fn bump(&self, bump: &VersionBump) -> Result<Version> {
        let mut next = self.current.clone();
        match bump {
            VersionBump::Major => {
                next.major += 1;
                next.minor = 0;
                next.patch = 0;
            }
            VersionBump::Minor => {
                next.minor += 1;
                next.patch = 0;
            }
            VersionBump::Patch => {
                next.patch += 1;
            }
            VersionBump::Exact(version) => return Ok(version.clone()),
        }
        next.pre = Prerelease::EMPTY;
        next.build = BuildMetadata::EMPTY;
        Ok(next)
    }
}
