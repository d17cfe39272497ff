//! Distribution bundle resolution.

use furyctl_core::{
    DistributionManifest, Error, GitProtocol, KFD_FILE_NAME, MinimalClusterConfig, Result,
};
use furyctl_netx::{CachingDownloader, Downloader, Protocol, detect, split_forced};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::compatibility::{self, Compatibility};
use crate::patches::embedded_patches;

/// A resolved and patched distribution.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    /// Directory holding the bundle.
    pub repo_path: PathBuf,
    pub minimal_conf: MinimalClusterConfig,
    pub distro_manifest: DistributionManifest,
}

/// Fetches the distribution a cluster configuration asks for.
#[derive(Clone)]
pub struct DistributionResolver {
    cached: CachingDownloader,
    plain: Arc<dyn Downloader>,
    git_protocol: GitProtocol,
    patches_location: Option<String>,
}

impl DistributionResolver {
    /// `cached` fetches remote bundles; `plain` fetches local bundles and
    /// custom patches, uncached.
    pub fn new(cached: CachingDownloader, plain: Arc<dyn Downloader>, git_protocol: GitProtocol) -> Self {
        Self {
            cached,
            plain,
            git_protocol,
            patches_location: None,
        }
    }

    #[must_use]
    pub fn with_patches_location(mut self, location: impl Into<String>) -> Self {
        self.patches_location = Some(location.into());
        self
    }

    /// Locator of the official bundle for `version`.
    #[must_use]
    pub fn default_source(&self, version: &str) -> String {
        format!(
            "git::{}/fury-distribution?ref={version}&depth=1",
            self.git_protocol.repository_prefix()
        )
    }

    /// Resolve the distribution for the cluster described by `config_path`.
    ///
    /// An empty `location` selects the official repository at the pinned
    /// version.
    ///
    /// # Errors
    ///
    /// Fails on an unreadable configuration, a bundle that cannot be fetched
    /// or lacks `kfd.yaml`, an invalid manifest, or a custom patches
    /// location whose version entry is not a directory. Cache entries written
    /// for a failed resolution are removed.
    pub async fn download(&self, location: &str, config_path: &Path) -> Result<DownloadResult> {
        let minimal_conf = MinimalClusterConfig::from_file(config_path)?;
        let version = minimal_conf.distribution_version().to_string();

        match compatibility::check(&minimal_conf.kind, &version) {
            Compatibility::Supported => {}
            other => warn!(
                kind = %minimal_conf.kind,
                %version,
                compatibility = ?other,
                "Distribution version is not supported for this kind, proceeding anyway"
            ),
        }

        let explicit = !location.trim().is_empty();
        let src = if explicit {
            resolve_local(location)?
        } else {
            self.default_source(&version)
        };

        let repo_path = tempfile::Builder::new()
            .prefix("furyctl-dist-")
            .tempdir()
            .map_err(|e| Error::io_no_path(e, "create temp dir"))?
            .keep();

        info!(%src, dst = %repo_path.display(), "Downloading distribution");
        match self.fetch_and_patch(&src, &repo_path, explicit.then_some(location), &version).await {
            Ok(distro_manifest) => Ok(DownloadResult {
                repo_path,
                minimal_conf,
                distro_manifest,
            }),
            Err(e) => {
                if let Err(cleanup) = std::fs::remove_dir_all(&repo_path) {
                    warn!(path = %repo_path.display(), error = %cleanup, "Could not remove distribution copy");
                }
                if let Err(cleanup) = self.cached.clear_item(&src) {
                    warn!(%src, error = %cleanup, "Could not clear cache entry");
                }
                Err(e)
            }
        }
    }

    /// Fetch the bundle, then validate and patch it. `location` is set when
    /// the user chose the source, and is what error messages name.
    async fn fetch_and_patch(
        &self,
        src: &str,
        repo_path: &Path,
        location: Option<&str>,
        version: &str,
    ) -> Result<DistributionManifest> {
        let fetcher: &dyn Downloader = if is_local(src) {
            debug!(src, "Local distribution, bypassing the download cache");
            self.plain.as_ref()
        } else {
            &self.cached
        };

        if let Err(e) = fetcher.download(src, repo_path).await {
            let message = match location {
                Some(location) => format!("error downloading distribution from location '{location}'"),
                None => format!("error downloading distribution version {version}"),
            };
            return Err(Error::DistributionFetch {
                message,
                source: Box::new(e),
            });
        }

        let kfd_path = repo_path.join(KFD_FILE_NAME);
        if !kfd_path.is_file() {
            return Err(match location {
                Some(location) => Error::UnsupportedDistributionVersion {
                    message: format!("location '{location}' does not contain a {KFD_FILE_NAME} file"),
                    help: Some("Point --distro-location at a fury-distribution checkout".to_string()),
                },
                None => Error::UnsupportedDistributionVersion {
                    message: format!("distribution version {version} has no {KFD_FILE_NAME} file"),
                    help: Some("Check spec.distributionVersion in the configuration".to_string()),
                },
            });
        }

        let manifest = DistributionManifest::from_file(&kfd_path)?;

        if let Some(patches) = embedded_patches(&manifest.version) {
            info!(version = %manifest.version, "Applying built-in distribution patches");
            patches.apply(repo_path)?;
        }

        if let Some(patches_location) = &self.patches_location {
            self.apply_custom_patches(patches_location, &manifest.version, repo_path)
                .await?;
        }

        let manifest = DistributionManifest::from_file(&kfd_path)?;
        debug!(version = %manifest.version, path = %repo_path.display(), "Distribution ready");
        Ok(manifest)
    }

    async fn apply_custom_patches(&self, location: &str, version: &str, repo_path: &Path) -> Result<()> {
        let src = resolve_local(location)?;
        let workdir = tempfile::tempdir().map_err(|e| Error::io_no_path(e, "create temp dir"))?;

        debug!(%src, "Downloading distribution patches");
        self.plain.download(&src, workdir.path()).await?;

        let candidates = [version.to_string(), version.to_lowercase()];
        let Some(dir) = candidates
            .iter()
            .map(|v| workdir.path().join(v))
            .find(|p| p.exists())
        else {
            warn!(location, version, "No custom patches for this distribution version");
            return Ok(());
        };

        if !dir.is_dir() {
            return Err(Error::configuration_with_help(
                format!("custom patches entry {} is not a directory", dir.display()),
                "Put the patches for each version in a directory named after it",
            ));
        }

        info!(location, version, "Applying custom distribution patches");
        furyctl_netx::fs::copy_dir_contents(&dir, repo_path, &[])
    }
}

impl std::fmt::Debug for DistributionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributionResolver")
            .field("cached", &self.cached)
            .field("git_protocol", &self.git_protocol)
            .field("patches_location", &self.patches_location)
            .finish_non_exhaustive()
    }
}

/// Whether `src` is read from the local filesystem. Local bundles are
/// fetched fresh every time so edits to them are picked up.
fn is_local(src: &str) -> bool {
    match split_forced(src) {
        Some((protocol, _)) => protocol == Protocol::File,
        None => detect(src) == Some(Protocol::File),
    }
}

/// Make `.`-relative locations absolute; anything else is passed through.
fn resolve_local(location: &str) -> Result<String> {
    let location = location.trim();
    if location.starts_with('.') {
        let absolute = std::path::absolute(location)
            .map_err(|e| Error::io(e, Path::new(location), "resolve"))?;
        Ok(absolute.display().to_string())
    } else {
        Ok(location.to_string())
    }
}
