//! Which distribution versions each cluster kind supports.

use furyctl_core::ClusterKind;
use semver::{Version, VersionReq};

/// Minimum distribution version per cluster kind.
const SUPPORTED: [(ClusterKind, &str); 3] = [
    (ClusterKind::EksCluster, ">=1.24.0"),
    (ClusterKind::KfdDistribution, ">=1.25.0"),
    (ClusterKind::OnPremises, ">=1.26.0"),
];

/// Outcome of a compatibility lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compatibility {
    Supported,
    /// The version is outside the supported range for the kind.
    UnsupportedVersion { requirement: &'static str },
    /// The kind has no entry in the table.
    UnknownKind,
    /// The version string is not a semantic version.
    InvalidVersion,
}

impl Compatibility {
    #[must_use]
    pub fn is_supported(&self) -> bool {
        *self == Self::Supported
    }
}

/// Check `version` (optionally `v`-prefixed) against the table for `kind`.
#[must_use]
pub fn check(kind: &str, version: &str) -> Compatibility {
    let Some(kind) = ClusterKind::parse(kind) else {
        return Compatibility::UnknownKind;
    };
    let Ok(version) = Version::parse(version.trim().trim_start_matches('v')) else {
        return Compatibility::InvalidVersion;
    };
    let Some((_, requirement)) = SUPPORTED.iter().find(|(k, _)| *k == kind) else {
        return Compatibility::UnknownKind;
    };

    match VersionReq::parse(requirement) {
        Ok(req) if req.matches(&version) => Compatibility::Supported,
        _ => Compatibility::UnsupportedVersion { requirement },
    }
}
