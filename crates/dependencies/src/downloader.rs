//! Installation of pinned tools into the bin root.

use furyctl_core::{ClusterKind, DistributionManifest, Error, ExecContext, Result, Tool, ToolName};
use furyctl_netx::fs::make_executable;
use furyctl_netx::{CachingDownloader, Downloader};
use furyctl_tools::{ToolDescriptor, ToolFactory, validate_checksum};
use tracing::{debug, info, warn};

/// What happened to one tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Fetched and installed.
    Installed,
    /// Already installed at the pinned version.
    AlreadyPresent,
    /// Not pinned, or must be installed by the operator.
    Skipped,
}

/// Downloads every pinned tool through the cached fetcher.
#[derive(Debug, Clone)]
pub struct DependenciesDownloader {
    factory: ToolFactory,
    exec: ExecContext,
    fetcher: CachingDownloader,
}

impl DependenciesDownloader {
    #[must_use]
    pub fn new(factory: ToolFactory, exec: ExecContext, fetcher: CachingDownloader) -> Self {
        Self {
            factory,
            exec,
            fetcher,
        }
    }

    /// Install every tool the manifest pins for `kind`.
    ///
    /// Failures are collected per tool; an empty list means success.
    pub async fn download_all(
        &self,
        manifest: &DistributionManifest,
        kind: Option<ClusterKind>,
    ) -> Vec<Error> {
        let mut errors = Vec::new();
        for (name, pin) in manifest.tools(kind) {
            match self.download_tool(name, pin).await {
                Ok(outcome) => debug!(tool = %name, ?outcome, "Tool processed"),
                Err(e) => {
                    warn!(tool = %name, error = %e, "Tool download failed");
                    errors.push(e);
                }
            }
        }
        errors
    }

    /// Install one tool.
    ///
    /// # Errors
    ///
    /// Returns an error when the artifact cannot be fetched, normalized or
    /// verified. On a rename or checksum failure the install directory and
    /// the cache entry are removed so the next run starts clean.
    pub async fn download_tool(&self, name: ToolName, pin: &Tool) -> Result<InstallOutcome> {
        if pin.version.trim().is_empty() {
            return Ok(InstallOutcome::Skipped);
        }
        let descriptor = self.factory.descriptor(name, &pin.version);
        if !descriptor.supports_download() {
            debug!(tool = %name, "Operator-installed tool, not downloading");
            return Ok(InstallOutcome::Skipped);
        }

        if descriptor.binary_path().is_file()
            && descriptor.check_bin_version(&self.exec).await.is_ok()
        {
            debug!(tool = %name, version = descriptor.version(), "Already installed");
            return Ok(InstallOutcome::AlreadyPresent);
        }

        let src = descriptor.src_path();
        let dir = descriptor.install_dir();
        info!(tool = %name, version = descriptor.version(), %src, "Downloading tool");

        self.fetcher.download(&src, &dir).await?;

        if let Err(e) = self.finish_install(&descriptor, pin) {
            if let Err(cleanup) = std::fs::remove_dir_all(&dir) {
                warn!(tool = %name, dir = %dir.display(), error = %cleanup, "Could not remove failed install");
            }
            if let Err(cleanup) = self.fetcher.clear_item(&src) {
                warn!(tool = %name, %src, error = %cleanup, "Could not clear cache entry");
            }
            return Err(e);
        }
        Ok(InstallOutcome::Installed)
    }

    fn finish_install(&self, descriptor: &ToolDescriptor, pin: &Tool) -> Result<()> {
        let dir = descriptor.install_dir();
        descriptor.rename(&dir)?;
        make_executable(&descriptor.binary_path())?;
        if pin.checksums.is_empty() {
            debug!(tool = %descriptor.name(), "No checksums published, skipping verification");
            Ok(())
        } else {
            validate_checksum(descriptor, &pin.checksums)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use furyctl_core::{Arch, Os, Platform};
    use furyctl_core::test_utils::ScriptedRunner;
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves a fake release artifact named after the URL's last segment.
    #[derive(Default)]
    struct FakeReleases {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Downloader for FakeReleases {
        async fn download(&self, src: &str, dst: &Path) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let name = src.rsplit('/').next().unwrap();
            std::fs::create_dir_all(dst).unwrap();
            std::fs::write(dst.join(name), "hello").unwrap();
            Ok(())
        }
    }

    const HELLO_SHA: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    fn downloader(root: &Path, releases: Arc<FakeReleases>) -> DependenciesDownloader {
        let factory = ToolFactory::for_platform(root.join("bin"), Platform::new(Os::Linux, Arch::Amd64));
        let exec = ExecContext::with_runner(Arc::new(ScriptedRunner::new()));
        DependenciesDownloader::new(factory, exec, CachingDownloader::new(releases, root.join("cache")))
    }

    #[tokio::test]
    async fn test_installs_and_renames() {
        let dir = tempfile::tempdir().unwrap();
        let releases = Arc::new(FakeReleases::default());
        let d = downloader(dir.path(), releases.clone());

        let outcome = d
            .download_tool(ToolName::Yq, &Tool::pinned("v4.34.1"))
            .await
            .unwrap();

        assert_eq!(outcome, InstallOutcome::Installed);
        assert!(dir.path().join("bin/yq/4.34.1/yq").is_file());
        assert!(!dir.path().join("bin/yq/4.34.1/yq_linux_amd64").exists());
        assert_eq!(releases.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_checksum_mismatch_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let releases = Arc::new(FakeReleases::default());
        let d = downloader(dir.path(), releases.clone());

        let mut pin = Tool::pinned("1.25.8");
        pin.checksums.insert("linux/amd64".to_string(), "0".repeat(64));

        let err = d.download_tool(ToolName::Kubectl, &pin).await.unwrap_err();
        assert!(matches!(err, Error::ChecksumMismatch { .. }));
        assert!(!dir.path().join("bin/kubectl/1.25.8").exists());
        let src = d.factory.descriptor(ToolName::Kubectl, "1.25.8").src_path();
        assert!(!d.fetcher.is_cached(&src));

        pin.checksums.insert("linux/amd64".to_string(), HELLO_SHA.to_string());
        assert_eq!(
            d.download_tool(ToolName::Kubectl, &pin).await.unwrap(),
            InstallOutcome::Installed
        );
        assert_eq!(releases.calls.load(Ordering::SeqCst), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_checksum_error_survives_failed_cache_cleanup() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let d = downloader(dir.path(), Arc::new(FakeReleases::default()));
        let src = d.factory.descriptor(ToolName::Kubectl, "1.25.8").src_path();
        let warm = tempfile::tempdir().unwrap();
        d.fetcher.download(&src, warm.path()).await.unwrap();

        let cache = dir.path().join("cache");
        std::fs::set_permissions(&cache, std::fs::Permissions::from_mode(0o555)).unwrap();
        if std::fs::write(cache.join(".write-check"), "").is_ok() {
            // Permissions are not enforced for this user.
            std::fs::set_permissions(&cache, std::fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let mut pin = Tool::pinned("1.25.8");
        pin.checksums.insert("linux/amd64".to_string(), "0".repeat(64));
        let result = d.download_tool(ToolName::Kubectl, &pin).await;
        std::fs::set_permissions(&cache, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert!(matches!(result, Err(Error::ChecksumMismatch { .. })), "{result:?}");
        assert!(d.fetcher.is_cached(&src));
        assert!(!dir.path().join("bin/kubectl/1.25.8").exists());
    }

    #[tokio::test]
    async fn test_skips_unpinned_and_operator_tools() {
        let dir = tempfile::tempdir().unwrap();
        let d = downloader(dir.path(), Arc::new(FakeReleases::default()));

        assert_eq!(
            d.download_tool(ToolName::Helm, &Tool::default()).await.unwrap(),
            InstallOutcome::Skipped
        );
        assert_eq!(
            d.download_tool(ToolName::Ansible, &Tool::pinned("2.9.27")).await.unwrap(),
            InstallOutcome::Skipped
        );
    }

    #[tokio::test]
    async fn test_download_all_aggregates() {
        let dir = tempfile::tempdir().unwrap();
        let d = downloader(dir.path(), Arc::new(FakeReleases::default()));

        let mut manifest = DistributionManifest::default();
        manifest.tools.common.yq = Tool::pinned("4.34.1");
        manifest.tools.common.kapp = Tool::pinned("0.58.0");
        // Helm's archive layout is missing from the fake artifact.
        manifest.tools.common.helm = Tool::pinned("3.12.3");

        let errors = d.download_all(&manifest, Some(ClusterKind::KfdDistribution)).await;

        assert_eq!(errors.len(), 1);
        assert!(dir.path().join("bin/yq/4.34.1/yq").is_file());
        assert!(dir.path().join("bin/kapp/0.58.0/kapp").is_file());
    }
}
