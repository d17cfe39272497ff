//! `furyctl download dependencies`

use furyctl_core::Result;
use furyctl_dependencies::{DependenciesDownloader, DependencyValidator, into_result};
use furyctl_tools::ToolFactory;
use std::path::Path;
use tracing::{info, instrument, warn};

use super::{Services, discard};

/// Resolve the distribution and install every tool it pins under the bin
/// path, then validate the result unless `skip_validation` is set.
#[instrument(skip(services))]
pub async fn execute(services: &Services, config: &Path, skip_validation: bool) -> Result<()> {
    let result = services.resolve(config).await?;
    let kind = result.minimal_conf.cluster_kind();

    let factory = ToolFactory::new(services.settings.bin_path());
    let downloader = DependenciesDownloader::new(factory, services.exec.clone(), services.cached.clone());
    let errors = downloader.download_all(&result.distro_manifest, kind).await;
    if !errors.is_empty() {
        discard(&result);
        return into_result(errors);
    }

    if skip_validation {
        warn!("Skipping dependency validation");
    } else {
        let validator = DependencyValidator::new(services.settings.bin_path(), services.exec.clone());
        let errors = validator.validate(&result.distro_manifest, kind).await;
        if !errors.is_empty() {
            discard(&result);
            return into_result(errors);
        }
    }

    discard(&result);
    info!(
        version = %result.distro_manifest.version,
        bin = %services.settings.bin_path().display(),
        "Dependencies downloaded"
    );
    Ok(())
}
