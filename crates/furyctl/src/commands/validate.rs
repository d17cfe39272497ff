//! `furyctl validate dependencies`

use furyctl_core::Result;
use furyctl_dependencies::{DependencyValidator, into_result};
use std::path::Path;
use tracing::{info, instrument};

use super::{Services, discard};

/// Check the base requirements, resolve the distribution, then check every
/// tool it pins. All tool failures are reported together.
#[instrument(skip(services))]
pub async fn execute(services: &Services, config: &Path) -> Result<()> {
    let validator = DependencyValidator::new(services.settings.bin_path(), services.exec.clone());

    into_result(validator.validate_base_reqs().await)?;

    let result = services.resolve(config).await?;
    let errors = validator
        .validate(&result.distro_manifest, result.minimal_conf.cluster_kind())
        .await;
    discard(&result);
    into_result(errors)?;

    info!(version = %result.distro_manifest.version, "Dependencies are valid");
    Ok(())
}
