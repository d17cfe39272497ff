//! Tool descriptor factory.

use furyctl_core::{Platform, ToolName};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::ToolDescriptor;

/// Creates [`ToolDescriptor`]s for one bin root and platform.
#[derive(Debug, Clone)]
pub struct ToolFactory {
    bin_root: PathBuf,
    platform: Platform,
}

impl ToolFactory {
    /// Factory for the current host.
    pub fn new(bin_root: impl Into<PathBuf>) -> Self {
        Self::for_platform(bin_root, Platform::current())
    }

    pub fn for_platform(bin_root: impl Into<PathBuf>, platform: Platform) -> Self {
        Self {
            bin_root: bin_root.into(),
            platform,
        }
    }

    #[must_use]
    pub fn bin_root(&self) -> &Path {
        &self.bin_root
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Descriptor for `name` pinned at `version`.
    ///
    /// Returns `None` for a tool furyctl does not know; callers treat that
    /// as "not validated".
    #[must_use]
    pub fn create(&self, name: &str, version: &str) -> Option<ToolDescriptor> {
        let Some(tool) = ToolName::parse(name) else {
            warn!(tool = name, "Unknown tool, skipping");
            return None;
        };
        Some(self.descriptor(tool, version))
    }

    /// Descriptor for a known tool.
    #[must_use]
    pub fn descriptor(&self, tool: ToolName, version: &str) -> ToolDescriptor {
        ToolDescriptor::new(tool, version, self.platform, &self.bin_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use furyctl_core::{Arch, Os};

    #[test]
    fn test_create_known_and_unknown() {
        let factory = ToolFactory::for_platform("/bin-root", Platform::new(Os::Linux, Arch::Amd64));

        let kubectl = factory.create("kubectl", "v1.25.8").unwrap();
        assert_eq!(kubectl.name(), ToolName::Kubectl);
        assert_eq!(kubectl.version(), "1.25.8");

        assert_eq!(factory.create("KUBECTL", "1.25.8").unwrap().name(), ToolName::Kubectl);
        assert!(factory.create("kubeadm", "1.25.8").is_none());
    }

    #[test]
    fn test_every_tool_name_creates_a_descriptor() {
        let factory = ToolFactory::new("/bin-root");
        for tool in ToolName::ALL {
            assert!(factory.create(tool.as_str(), "1.0.0").is_some(), "{tool}");
        }
    }
}
