pub mod download;
pub mod dump;
pub mod validate;
pub mod version;

use furyctl_core::{ExecContext, Result, Settings};
use furyctl_distribution::{DistributionResolver, DownloadResult};
use furyctl_netx::{CachingDownloader, Downloader, MultiProtocolFetcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Version,
    ValidateDependencies { config: PathBuf },
    DownloadDependencies { config: PathBuf, skip_validation: bool },
    DumpDistribution { config: PathBuf },
}

/// Fetchers and resolver wired from [`Settings`].
#[derive(Debug, Clone)]
pub struct Services {
    pub settings: Settings,
    pub exec: ExecContext,
    pub cached: CachingDownloader,
    pub resolver: DistributionResolver,
}

impl Services {
    pub fn new(settings: Settings) -> Result<Self> {
        let exec = settings.exec_context();
        Self::with_exec(settings, exec)
    }

    /// Wire everything around an explicit execution context.
    pub fn with_exec(settings: Settings, exec: ExecContext) -> Result<Self> {
        let fetcher: Arc<dyn Downloader> = Arc::new(MultiProtocolFetcher::new(exec.clone())?);
        let cached = CachingDownloader::new(Arc::clone(&fetcher), settings.cache_dir());

        let mut resolver = DistributionResolver::new(cached.clone(), fetcher, settings.git_protocol);
        if let Some(location) = &settings.distro_patches_location {
            resolver = resolver.with_patches_location(location.clone());
        }

        debug!(
            cache = %settings.cache_dir().display(),
            bin = %settings.bin_path().display(),
            "Services ready"
        );
        Ok(Self {
            settings,
            exec,
            cached,
            resolver,
        })
    }

    /// Resolve the distribution pinned by `config`.
    pub async fn resolve(&self, config: &Path) -> Result<DownloadResult> {
        let location = self.settings.distro_location.as_deref().unwrap_or_default();
        self.resolver.download(location, config).await
    }
}

pub async fn execute(command: Command, services: &Services) -> Result<()> {
    match command {
        Command::Version => {
            version::execute();
            Ok(())
        }
        Command::ValidateDependencies { config } => validate::execute(services, &config).await,
        Command::DownloadDependencies {
            config,
            skip_validation,
        } => download::execute(services, &config, skip_validation).await,
        Command::DumpDistribution { config } => dump::execute(services, &config).await,
    }
}

/// Remove a resolved bundle that is no longer needed.
fn discard(result: &DownloadResult) {
    if let Err(e) = std::fs::remove_dir_all(&result.repo_path) {
        debug!(path = %result.repo_path.display(), error = %e, "Could not remove distribution copy");
    }
}
