//! Behavioural tests for distribution resolution.

use async_trait::async_trait;
use furyctl_core::{Error, ExecContext, GitProtocol, Result};
use furyctl_distribution::DistributionResolver;
use furyctl_netx::{CachingDownloader, Downloader, MultiProtocolFetcher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const KFD_V1_25_8: &str = r"
version: v1.25.8
modules:
  auth: v0.0.4
tools:
  common:
    kubectl:
      version: 1.25.8
    terraform:
      version: 1.4.6
";

/// Records every requested locator and always fails.
#[derive(Default)]
struct Unreachable {
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl Downloader for Unreachable {
    async fn download(&self, src: &str, _dst: &Path) -> Result<()> {
        self.seen.lock().unwrap().push(src.to_string());
        Err(Error::DownloadOptionsExhausted {
            src: src.to_string(),
            attempts: vec![format!("{src}: repository not found")],
        })
    }
}

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    fn config(&self, version: &str) -> PathBuf {
        self.write(
            "furyctl.yaml",
            &format!(
                "apiVersion: kfd.sighup.io/v1alpha2\nkind: KFDDistribution\nmetadata:\n  name: test\nspec:\n  distributionVersion: {version}\n"
            ),
        )
    }

    fn local_resolver(&self) -> DistributionResolver {
        let fetcher: Arc<dyn Downloader> =
            Arc::new(MultiProtocolFetcher::new(ExecContext::new()).unwrap());
        let cached = CachingDownloader::new(Arc::clone(&fetcher), self.path("cache"));
        DistributionResolver::new(cached, fetcher, GitProtocol::Https)
    }
}

#[tokio::test]
async fn resolves_local_bundle() {
    let fx = Fixture::new();
    fx.write("bundle/kfd.yaml", KFD_V1_25_8);
    fx.write("bundle/templates/distribution/kustomization.yaml.tpl", "resources: []\n");
    let config = fx.config("v1.25.8");

    let result = fx
        .local_resolver()
        .download(&fx.path("bundle").display().to_string(), &config)
        .await
        .unwrap();

    assert_eq!(result.distro_manifest.version, "v1.25.8");
    assert_eq!(result.distro_manifest.tools.common.kubectl.version, "1.25.8");
    assert_eq!(result.minimal_conf.metadata.name, "test");
    assert!(result.repo_path.join("kfd.yaml").is_file());
    assert!(result
        .repo_path
        .join("templates/distribution/kustomization.yaml.tpl")
        .is_file());
    std::fs::remove_dir_all(&result.repo_path).unwrap();
}

#[tokio::test]
async fn local_directory_without_manifest_names_the_directory() {
    let fx = Fixture::new();
    fx.write("not-a-bundle/README.md", "nothing here");
    let config = fx.config("v1.25.8");
    let location = fx.path("not-a-bundle").display().to_string();
    let resolver = fx.local_resolver();

    let err = resolver.download(&location, &config).await.unwrap_err();

    assert!(matches!(err, Error::UnsupportedDistributionVersion { .. }), "{err}");
    assert!(err.to_string().contains(&location), "{err}");
    assert!(!err.to_string().contains("v1.25.8"));

    let cache = CachingDownloader::new(Arc::new(Unreachable::default()), fx.path("cache"));
    assert!(!cache.is_cached(&location));
}

#[tokio::test]
async fn default_location_failure_names_the_version() {
    let fx = Fixture::new();
    let config = fx.config("v9.9.9");
    let unreachable = Arc::new(Unreachable::default());
    let cached = CachingDownloader::new(unreachable.clone(), fx.path("cache"));
    let resolver = DistributionResolver::new(cached, unreachable.clone(), GitProtocol::Https);

    let err = resolver.download("", &config).await.unwrap_err();

    assert!(err.to_string().contains("v9.9.9"), "{err}");
    assert!(err.is_download_exhausted());
    assert_eq!(
        *unreachable.seen.lock().unwrap(),
        ["git::https://github.com/sighupio/fury-distribution?ref=v9.9.9&depth=1"]
    );
}

#[tokio::test]
async fn explicit_location_failure_names_the_location() {
    let fx = Fixture::new();
    let config = fx.config("v1.25.8");
    let unreachable = Arc::new(Unreachable::default());
    let cached = CachingDownloader::new(unreachable.clone(), fx.path("cache"));
    let resolver = DistributionResolver::new(cached, unreachable, GitProtocol::Https);

    let err = resolver
        .download("git::https://example.com/forks/fury-distribution?ref=main", &config)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("example.com/forks/fury-distribution"), "{err}");
    assert!(matches!(err, Error::DistributionFetch { .. }));
}

#[test]
fn ssh_protocol_changes_default_source() {
    let fx = Fixture::new();
    let unreachable: Arc<dyn Downloader> = Arc::new(Unreachable::default());
    let resolver = DistributionResolver::new(
        CachingDownloader::new(Arc::clone(&unreachable), fx.path("cache")),
        unreachable,
        GitProtocol::Ssh,
    );
    assert_eq!(
        resolver.default_source("v1.25.8"),
        "git::git@github.com:sighupio/fury-distribution?ref=v1.25.8&depth=1"
    );
}

#[tokio::test]
async fn malformed_config_is_a_parse_error() {
    let fx = Fixture::new();
    let config = fx.write("furyctl.yaml", "apiVersion: [unterminated\n");

    let err = fx.local_resolver().download("", &config).await.unwrap_err();
    assert!(matches!(err, Error::ConfigParse { .. }), "{err}");
}

#[tokio::test]
async fn builtin_patches_are_applied_and_manifest_reparsed() {
    let fx = Fixture::new();
    fx.write(
        "bundle/kfd.yaml",
        "version: v1.24.1\ntools:\n  common:\n    kubectl:\n      version: 1.24.9\n",
    );
    let config = fx.config("v1.24.1");

    let result = fx
        .local_resolver()
        .download(&fx.path("bundle").display().to_string(), &config)
        .await
        .unwrap();

    assert_eq!(result.distro_manifest.tools.common.kustomize.version, "3.10.0");
    std::fs::remove_dir_all(&result.repo_path).unwrap();
}

#[tokio::test]
async fn custom_patches_overlay_matching_version() {
    let fx = Fixture::new();
    fx.write("bundle/kfd.yaml", KFD_V1_25_8);
    fx.write("bundle/templates/a.tpl", "original");
    fx.write("patches/v1.25.8/templates/a.tpl", "patched");
    fx.write("patches/v1.25.8/templates/b.tpl", "added");
    fx.write("patches/v1.26.0/templates/a.tpl", "other version");
    let config = fx.config("v1.25.8");

    let result = fx
        .local_resolver()
        .with_patches_location(fx.path("patches").display().to_string())
        .download(&fx.path("bundle").display().to_string(), &config)
        .await
        .unwrap();

    let read = |rel: &str| std::fs::read_to_string(result.repo_path.join(rel)).unwrap();
    assert_eq!(read("templates/a.tpl"), "patched");
    assert_eq!(read("templates/b.tpl"), "added");
    std::fs::remove_dir_all(&result.repo_path).unwrap();
}

#[tokio::test]
async fn custom_patches_without_version_dir_only_warn() {
    let fx = Fixture::new();
    fx.write("bundle/kfd.yaml", KFD_V1_25_8);
    fx.write("patches/v1.26.0/templates/a.tpl", "other version");
    let config = fx.config("v1.25.8");

    let result = fx
        .local_resolver()
        .with_patches_location(fx.path("patches").display().to_string())
        .download(&fx.path("bundle").display().to_string(), &config)
        .await
        .unwrap();

    assert!(!result.repo_path.join("templates").exists());
    std::fs::remove_dir_all(&result.repo_path).unwrap();
}

#[tokio::test]
async fn custom_patches_version_entry_must_be_a_directory() {
    let fx = Fixture::new();
    fx.write("bundle/kfd.yaml", KFD_V1_25_8);
    fx.write("patches/v1.25.8", "not a directory");
    let config = fx.config("v1.25.8");

    let err = fx
        .local_resolver()
        .with_patches_location(fx.path("patches").display().to_string())
        .download(&fx.path("bundle").display().to_string(), &config)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("not a directory"), "{err}");
}

#[tokio::test]
async fn invalid_manifest_is_fatal() {
    let fx = Fixture::new();
    fx.write("bundle/kfd.yaml", "version: \"\"\ntools:\n  common: {}\n");
    let config = fx.config("v1.25.8");

    let err = fx
        .local_resolver()
        .download(&fx.path("bundle").display().to_string(), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SchemaValidation { .. }), "{err}");
}

#[tokio::test]
async fn local_bundle_edits_are_picked_up() {
    let fx = Fixture::new();
    fx.write("bundle/kfd.yaml", KFD_V1_25_8);
    let config = fx.config("v1.25.8");
    let location = fx.path("bundle").display().to_string();
    let resolver = fx.local_resolver();

    let first = resolver.download(&location, &config).await.unwrap();
    assert_eq!(first.distro_manifest.tools.common.kubectl.version, "1.25.8");
    std::fs::remove_dir_all(&first.repo_path).unwrap();

    fx.write("bundle/kfd.yaml", &KFD_V1_25_8.replace("version: 1.25.8", "version: 1.25.9"));
    let second = resolver.download(&location, &config).await.unwrap();

    assert_eq!(second.distro_manifest.tools.common.kubectl.version, "1.25.9");
    assert!(!fx.path("cache").exists());
    std::fs::remove_dir_all(&second.repo_path).unwrap();
}

#[tokio::test]
async fn failed_cache_cleanup_keeps_the_fetch_error() {
    let fx = Fixture::new();
    let config = fx.config("v1.25.8");
    let location = "git::https://example.com/forks/fury-distribution?ref=main";
    let unreachable = Arc::new(Unreachable::default());
    let cached = CachingDownloader::new(unreachable.clone(), fx.path("cache"));
    // A plain file where the entry directory belongs cannot be removed as one.
    let entry = cached.entry_path(location);
    std::fs::create_dir_all(entry.parent().unwrap()).unwrap();
    std::fs::write(&entry, "not a cache entry").unwrap();
    let resolver = DistributionResolver::new(cached, unreachable, GitProtocol::Https);

    let err = resolver.download(location, &config).await.unwrap_err();

    assert!(matches!(err, Error::DistributionFetch { .. }), "{err}");
    assert!(err.to_string().contains("example.com/forks/fury-distribution"), "{err}");
}
