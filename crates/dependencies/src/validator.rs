//! Dependency validation.

use furyctl_core::{ClusterKind, DistributionManifest, Error, ExecContext, Result, Tool, ToolName};
use furyctl_tools::ToolFactory;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Tools every distribution needs, so an empty pin is an error rather than
/// "not required".
pub const MANDATORY_TOOLS: &[ToolName] = &[ToolName::Kubectl];

/// Tools needed before a distribution can even be fetched, checked for
/// presence only.
pub const BASE_REQUIREMENTS: &[ToolName] = &[ToolName::Git, ToolName::Shell];

/// Checks installed tools against a distribution manifest.
///
/// Every tool is checked even after a failure, so one run reports all
/// missing and outdated tools.
#[derive(Debug, Clone)]
pub struct DependencyValidator {
    factory: ToolFactory,
    exec: ExecContext,
}

impl DependencyValidator {
    pub fn new(bin_root: impl Into<PathBuf>, exec: ExecContext) -> Self {
        Self::with_factory(ToolFactory::new(bin_root), exec)
    }

    #[must_use]
    pub fn with_factory(factory: ToolFactory, exec: ExecContext) -> Self {
        Self { factory, exec }
    }

    /// Validate every tool the manifest pins for `kind`.
    ///
    /// Returns one error per failing tool; an empty list means success.
    pub async fn validate(
        &self,
        manifest: &DistributionManifest,
        kind: Option<ClusterKind>,
    ) -> Vec<Error> {
        info!(version = %manifest.version, "Validating dependencies");
        self.validate_tools(&manifest.tools(kind)).await
    }

    /// Validate an explicit list of `(tool, pin)` pairs.
    pub async fn validate_tools(&self, tools: &[(ToolName, &Tool)]) -> Vec<Error> {
        let mut errors = Vec::new();

        for (name, pin) in tools {
            if pin.version.trim().is_empty() {
                if MANDATORY_TOOLS.contains(name) {
                    errors.push(Error::empty_tool_version(name.as_str()));
                } else {
                    debug!(tool = %name, "Not pinned, skipping");
                }
                continue;
            }

            let Some(descriptor) = self.factory.create(name.as_str(), &pin.version) else {
                continue;
            };
            match descriptor.check_bin_version(&self.exec).await {
                Ok(()) => debug!(tool = %name, version = %pin.version, "Tool version ok"),
                Err(e) => {
                    warn!(tool = %name, error = %e, "Tool validation failed");
                    errors.push(e);
                }
            }
        }

        errors
    }

    /// Check that the base requirements are runnable.
    pub async fn validate_base_reqs(&self) -> Vec<Error> {
        let mut errors = Vec::new();
        for tool in BASE_REQUIREMENTS {
            let descriptor = self.factory.descriptor(*tool, "*");
            if let Err(e) = descriptor.check_bin_version(&self.exec).await {
                warn!(tool = %tool, error = %e, "Base requirement missing");
                errors.push(e);
            }
        }
        errors
    }
}

/// Fold per-tool errors into one result.
///
/// # Errors
///
/// Returns [`Error::DependencyCheck`] carrying every error when the list is
/// not empty.
pub fn into_result(errors: Vec<Error>) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::DependencyCheck { errors })
    }
}
