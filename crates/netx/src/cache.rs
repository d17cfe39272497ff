//! Content-addressed download cache.
//!
//! Entries live at `<root>/<key>`, where `key` is the SHA-256 of the
//! locator's canonical form (see [`canonical_locator`]). An entry directory
//! only ever appears through an atomic rename, so a failed or interrupted
//! fetch never leaves a partial entry behind.

use async_trait::async_trait;
use furyctl_core::{Error, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::fs::copy_dir_contents;
use crate::protocol::{Protocol, detect, split_forced};
use crate::Downloader;

/// Query parameters that only affect how content is transferred.
const TRANSPORT_PARAMS: &[&str] = &["depth"];

/// Ports that do not distinguish one git server from another.
const GIT_DEFAULT_PORTS: &[&str] = &["22", "80", "443"];

/// Reduce a locator to the form that identifies its content.
///
/// Git locators are reduced to `host/path`: the scheme, user-info and a
/// default port (22, 80, 443) are dropped, scp-style `host:path` becomes
/// `host/path`, and a trailing `/` or `.git` is removed. As a result
/// `git::https://github.com/org/repo?ref=v1` and
/// `git@github.com:org/repo.git?depth=1&ref=v1` share one entry.
///
/// Every other locator keeps its protocol and scheme, so `s3://b/k`,
/// `gs://b/k` and `https://b/k` stay distinct; only the user-info and the
/// scheme's default port are dropped. In both cases the host is lowercased,
/// `depth` is dropped and the remaining query parameters are sorted.
#[must_use]
pub fn canonical_locator(src: &str) -> String {
    let src = src.trim();
    let (protocol, rest) = match split_forced(src) {
        Some((protocol, rest)) => (Some(protocol), rest),
        None => (detect(src), src),
    };
    let (address, query) = rest.split_once('?').unwrap_or((rest, ""));

    let mut canonical = match protocol {
        Some(Protocol::Git) => git_address(address),
        Some(protocol) => format!("{protocol}::{}", url_address(address)),
        None => url_address(address),
    };

    let mut params: Vec<&str> = query
        .split('&')
        .filter(|p| !p.is_empty())
        .filter(|p| {
            let key = p.split_once('=').map_or(*p, |(k, _)| k);
            !TRANSPORT_PARAMS.contains(&key)
        })
        .collect();
    params.sort_unstable();

    if !params.is_empty() {
        canonical.push('?');
        canonical.push_str(&params.join("&"));
    }
    canonical
}

/// `host[:port]/path` of a git remote in any of its transport spellings.
fn git_address(address: &str) -> String {
    let address = address.split_once("://").map_or(address, |(_, rest)| rest);
    let (authority, path) = address.split_once('/').unwrap_or((address, ""));
    let authority = authority.rsplit_once('@').map_or(authority, |(_, host)| host);

    let mut canonical = match authority.split_once(':') {
        Some((host, port)) if is_port(port) => {
            let host = host.to_lowercase();
            if GIT_DEFAULT_PORTS.contains(&port) {
                format!("{host}/{path}")
            } else {
                format!("{host}:{port}/{path}")
            }
        }
        Some((host, scp_path)) if path.is_empty() => {
            format!("{}/{scp_path}", host.to_lowercase())
        }
        Some((host, scp_path)) => format!("{}/{scp_path}/{path}", host.to_lowercase()),
        None => format!("{}/{path}", authority.to_lowercase()),
    };

    loop {
        let trimmed = canonical.trim_end_matches('/');
        let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
        if trimmed.len() == canonical.len() {
            break;
        }
        canonical = trimmed.to_string();
    }
    canonical
}

/// Address with its scheme kept; local paths are returned unchanged.
fn url_address(address: &str) -> String {
    let Some((scheme, rest)) = address.split_once("://") else {
        return address.trim_end_matches('/').to_string();
    };
    let scheme = scheme.to_lowercase();
    if scheme == "file" {
        return rest.trim_end_matches('/').to_string();
    }

    let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
    let authority = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    let authority = match authority.split_once(':') {
        Some((host, port)) if default_port(&scheme) == Some(port) => host.to_lowercase(),
        Some((host, port)) => format!("{}:{port}", host.to_lowercase()),
        None => authority.to_lowercase(),
    };

    let path = path.trim_end_matches('/');
    if path.is_empty() {
        format!("{scheme}://{authority}")
    } else {
        format!("{scheme}://{authority}/{path}")
    }
}

fn is_port(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn default_port(scheme: &str) -> Option<&'static str> {
    match scheme {
        "http" => Some("80"),
        "https" => Some("443"),
        "ssh" => Some("22"),
        _ => None,
    }
}

/// Cache key for a locator: hex SHA-256 of its canonical form.
#[must_use]
pub fn cache_key(src: &str) -> String {
    hex::encode(Sha256::digest(canonical_locator(src).as_bytes()))
}

/// [`Downloader`] decorator serving repeated locators from disk.
#[derive(Clone)]
pub struct CachingDownloader {
    inner: Arc<dyn Downloader>,
    root: PathBuf,
}

impl CachingDownloader {
    pub fn new(inner: Arc<dyn Downloader>, root: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            root: root.into(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the entry for `src`, whether or not it exists yet.
    #[must_use]
    pub fn entry_path(&self, src: &str) -> PathBuf {
        self.root.join(cache_key(src))
    }

    #[must_use]
    pub fn is_cached(&self, src: &str) -> bool {
        self.entry_path(src).is_dir()
    }

    /// Remove every cache entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be removed.
    pub fn clear(&self) -> Result<()> {
        if self.root.exists() {
            std::fs::remove_dir_all(&self.root).map_err(|e| Error::io(e, &self.root, "remove"))?;
            info!(root = %self.root.display(), "Cleared download cache");
        }
        Ok(())
    }

    /// Remove the entry for `src`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry exists but cannot be removed.
    pub fn clear_item(&self, src: &str) -> Result<()> {
        let entry = self.entry_path(src);
        if entry.exists() {
            std::fs::remove_dir_all(&entry).map_err(|e| Error::io(e, &entry, "remove"))?;
            debug!(src, entry = %entry.display(), "Removed cache entry");
        }
        Ok(())
    }

    /// Fetch `src` through the inner downloader and rename it into place.
    async fn populate(&self, src: &str, key: &str, entry: &Path) -> Result<()> {
        std::fs::create_dir_all(&self.root).map_err(|e| Error::io(e, &self.root, "create"))?;
        let staging = tempfile::Builder::new()
            .prefix(&format!(".tmp-{key}-"))
            .tempdir_in(&self.root)
            .map_err(|e| Error::io(e, &self.root, "create temp dir"))?;

        // On failure the staging directory is dropped and removed.
        self.inner.download(src, staging.path()).await?;

        let staged = staging.keep();
        if let Err(e) = std::fs::rename(&staged, entry) {
            let _ = std::fs::remove_dir_all(&staged);
            if !entry.is_dir() {
                return Err(Error::io(e, entry, "rename"));
            }
            debug!(cache_key = key, "Cache entry populated concurrently, keeping existing");
        }
        Ok(())
    }
}

#[async_trait]
impl Downloader for CachingDownloader {
    async fn download(&self, src: &str, dst: &Path) -> Result<()> {
        let key = cache_key(src);
        let entry = self.root.join(&key);

        if entry.is_dir() {
            debug!(src, cache_key = %key, "Cache hit");
        } else {
            debug!(src, cache_key = %key, "Cache miss");
            self.populate(src, &key, &entry).await?;
        }

        copy_dir_contents(&entry, dst, &[])
    }
}

impl std::fmt::Debug for CachingDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingDownloader")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}
