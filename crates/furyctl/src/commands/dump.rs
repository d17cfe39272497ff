//! `furyctl dump distribution`

use furyctl_core::Result;
use furyctl_distribution::DownloadResult;
use std::path::Path;
use tracing::instrument;

use super::Services;

/// Resolve the distribution and print where the patched copy lives. The copy
/// is left in place for the caller.
#[instrument(skip(services))]
#[allow(clippy::print_stdout)]
pub async fn execute(services: &Services, config: &Path) -> Result<()> {
    let result = services.resolve(config).await?;
    println!("{}", render(&result));
    Ok(())
}

fn render(result: &DownloadResult) -> String {
    format!(
        "cluster: {} ({})\ndistribution: {}\npath: {}",
        result.minimal_conf.metadata.name,
        result.minimal_conf.kind,
        result.distro_manifest.version,
        result.repo_path.display()
    )
}
