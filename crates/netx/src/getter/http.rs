use async_trait::async_trait;
use furyctl_core::{Error, Result};
use reqwest::Client;
use std::path::Path;
use tracing::debug;

use super::{Getter, Locator};
use crate::archive::{ArchiveKind, extract_archive};
use crate::fs::copy_dir_contents;
use crate::protocol::host_of;
use crate::Protocol;

const USER_AGENT: &str = concat!("furyctl/", env!("CARGO_PKG_VERSION"));

/// Downloads over HTTP(S).
///
/// Archives (`.zip`, `.tar.gz`, `.tgz`, `.tar`, or an explicit `archive=`
/// parameter) are unpacked into the destination; `archive=false` keeps the
/// payload as a single file named after the last URL segment.
#[derive(Debug, Clone)]
pub struct HttpGetter {
    client: Client,
}

impl HttpGetter {
    /// Create a getter with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error when the TLS backend cannot be initialised.
    pub fn new() -> Result<Self> {
        // Already installed by the binary or an earlier getter is fine.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::configuration(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        debug!(%url, "Downloading");
        let mut request = self.client.get(url);

        if host_of(url).is_some_and(|h| h == "github.com" || h.ends_with(".github.com")) {
            if let Ok(token) = std::env::var("GITHUB_TOKEN") {
                request = request.header("Authorization", format!("Bearer {token}"));
            } else if let Ok(token) = std::env::var("GH_TOKEN") {
                request = request.header("Authorization", format!("Bearer {token}"));
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::fetch(url, format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::fetch(url, format!("HTTP {}", response.status())));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| Error::fetch(url, format!("failed to read body: {e}")))
    }

    async fn get_url(&self, src: &str, dst: &Path) -> Result<()> {
        let loc = Locator::parse(src);
        if !loc.base.starts_with("http://") && !loc.base.starts_with("https://") {
            return Err(Error::fetch(src, "not an http(s) URL"));
        }

        let url = loc.url_without(&["archive"]);
        let path_part = loc.base.rsplit('/').next().unwrap_or_default();
        let kind = match loc.param("archive") {
            Some("false") => None,
            Some(value) => ArchiveKind::from_param(value).or_else(|| ArchiveKind::from_name(path_part)),
            None => ArchiveKind::from_name(path_part),
        };

        let data = self.fetch_bytes(&url).await?;

        let Some(kind) = kind else {
            std::fs::create_dir_all(dst).map_err(|e| Error::io(e, dst, "create"))?;
            let name = if path_part.is_empty() { "download" } else { path_part };
            let target = dst.join(name);
            return std::fs::write(&target, &data).map_err(|e| Error::io(e, &target, "write"));
        };

        match &loc.subdir {
            None => extract_archive(&data, kind, dst),
            Some(sub) => {
                let staging =
                    tempfile::tempdir().map_err(|e| Error::io_no_path(e, "create temp dir"))?;
                extract_archive(&data, kind, staging.path())?;
                let source = staging.path().join(sub);
                if !source.is_dir() {
                    return Err(Error::fetch(src, format!("{sub} not found in archive")));
                }
                copy_dir_contents(&source, dst, &[])
            }
        }
    }
}

#[async_trait]
impl Getter for HttpGetter {
    fn protocol(&self) -> Protocol {
        Protocol::Http
    }

    async fn get(&self, src: &str, dst: &Path) -> Result<()> {
        self.get_url(src, dst).await
    }
}

/// Downloads objects from S3 over HTTPS.
#[derive(Debug, Clone)]
pub struct S3Getter {
    http: HttpGetter,
}

impl S3Getter {
    #[must_use]
    pub fn new(http: HttpGetter) -> Self {
        Self { http }
    }

    /// Rewrite `s3://bucket/key` and scheme-less S3 hosts into HTTPS URLs.
    fn to_https(src: &str) -> Option<String> {
        if let Some(rest) = src.strip_prefix("s3://") {
            let (bucket, key) = rest.split_once('/')?;
            return Some(format!("https://{bucket}.s3.amazonaws.com/{key}"));
        }
        if src.starts_with("https://") || src.starts_with("http://") {
            return host_of(src)
                .is_some_and(crate::protocol::is_s3_host)
                .then(|| src.to_string());
        }
        host_of(src)
            .is_some_and(crate::protocol::is_s3_host)
            .then(|| format!("https://{src}"))
    }
}

#[async_trait]
impl Getter for S3Getter {
    fn protocol(&self) -> Protocol {
        Protocol::S3
    }

    async fn get(&self, src: &str, dst: &Path) -> Result<()> {
        let url = Self::to_https(src).ok_or_else(|| Error::fetch(src, "not an S3 locator"))?;
        self.http.get_url(&url, dst).await
    }
}

/// Downloads objects from Google Cloud Storage over HTTPS.
#[derive(Debug, Clone)]
pub struct GcsGetter {
    http: HttpGetter,
}

impl GcsGetter {
    #[must_use]
    pub fn new(http: HttpGetter) -> Self {
        Self { http }
    }

    fn to_https(src: &str) -> Option<String> {
        if let Some(rest) = src.strip_prefix("gs://").or_else(|| src.strip_prefix("gcs://")) {
            return Some(format!("https://storage.googleapis.com/{rest}"));
        }
        if host_of(src) != Some("storage.googleapis.com") {
            return None;
        }
        if src.contains("://") {
            Some(src.to_string())
        } else {
            Some(format!("https://{src}"))
        }
    }
}

#[async_trait]
impl Getter for GcsGetter {
    fn protocol(&self) -> Protocol {
        Protocol::Gcs
    }

    async fn get(&self, src: &str, dst: &Path) -> Result<()> {
        let url = Self::to_https(src).ok_or_else(|| Error::fetch(src, "not a GCS locator"))?;
        self.http.get_url(&url, dst).await
    }
}
