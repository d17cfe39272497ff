//! Compatibility patches overlaid onto downloaded distributions.
//!
//! Built-in patch sets are compiled into the binary. A patch set is a list
//! of files written over the bundle; nothing is ever deleted.

use furyctl_core::{Error, Result};
use std::path::Path;
use tracing::debug;

/// Files to overlay onto one distribution version.
#[derive(Debug, Clone, Copy)]
pub struct PatchSet {
    /// Distribution version, lowercase.
    pub version: &'static str,
    /// `(relative path, content)` pairs.
    pub files: &'static [(&'static str, &'static str)],
}

/// Overrides for releases whose published files need fixing.
static EMBEDDED: &[PatchSet] = &[PatchSet {
    version: "v1.24.1",
    files: &[("kfd.yaml", include_str!("../patches/v1.24.1/kfd.yaml"))],
}];

/// Built-in patch set for `version`, matched case-insensitively.
#[must_use]
pub fn embedded_patches(version: &str) -> Option<&'static PatchSet> {
    let version = version.trim().to_lowercase();
    EMBEDDED.iter().find(|set| set.version == version)
}

impl PatchSet {
    /// Write every file of the set below `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be written.
    pub fn apply(&self, dir: &Path) -> Result<()> {
        for (rel, content) in self.files {
            let target = dir.join(rel);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| Error::io(e, parent, "create"))?;
            }
            std::fs::write(&target, content).map_err(|e| Error::io(e, &target, "write"))?;
            debug!(version = self.version, file = rel, "Applied patch");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use furyctl_core::DistributionManifest;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert!(embedded_patches("v1.24.1").is_some());
        assert!(embedded_patches("V1.24.1").is_some());
        assert!(embedded_patches("v1.25.8").is_none());
    }

    #[test]
    fn test_embedded_manifests_are_valid() {
        for set in EMBEDDED {
            for (rel, content) in set.files {
                if *rel == "kfd.yaml" {
                    let manifest = DistributionManifest::from_yaml(content, Path::new(rel)).unwrap();
                    assert_eq!(manifest.version.to_lowercase(), set.version);
                }
            }
        }
    }

    #[test]
    fn test_apply_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("kfd.yaml"), "version: v1.24.1\n").unwrap();
        std::fs::write(dir.path().join("README.md"), "keep").unwrap();

        embedded_patches("v1.24.1").unwrap().apply(dir.path()).unwrap();

        let content = std::fs::read_to_string(dir.path().join("kfd.yaml")).unwrap();
        assert!(content.contains("kustomize:"));
        assert_eq!(std::fs::read_to_string(dir.path().join("README.md")).unwrap(), "keep");
    }
}
