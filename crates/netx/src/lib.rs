//! Source fetching for furyctl.
//!
//! Two [`Downloader`]s share one contract, `download(src, dst)`:
//!
//! - [`MultiProtocolFetcher`] resolves a possibly-ambiguous locator by trying an
//!   ordered list of protocol prefixes (`git::`, `file::`, `http::`, `s3::`,
//!   `gcs::`, `mercurial::`) until one of its [`Getter`]s succeeds.
//! - [`CachingDownloader`] wraps any other downloader and serves repeated
//!   locators from a content-addressed directory cache.
//!
//! # Example
//!
//! ```ignore
//! use furyctl_netx::{CachingDownloader, Downloader, MultiProtocolFetcher};
//!
//! let fetcher = Arc::new(MultiProtocolFetcher::new(ExecContext::new())?);
//! let cached = CachingDownloader::new(fetcher, settings.cache_dir());
//! cached.download("git::https://github.com/sighupio/fury-distribution?ref=v1.25.8", &dst).await?;
//! ```

mod archive;
mod cache;
mod fetcher;
pub mod fs;
pub mod getter;
mod protocol;

use async_trait::async_trait;
use furyctl_core::Result;
use std::path::Path;

pub use archive::{ArchiveKind, extract_archive};
pub use cache::{CachingDownloader, cache_key, canonical_locator};
pub use fetcher::MultiProtocolFetcher;
pub use getter::Getter;
pub use protocol::{CANDIDATE_PREFIXES, Protocol, detect, split_forced};

/// Fetches a source locator into a destination directory.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Fetch `src` into the directory `dst`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error when the source cannot be fetched.
    async fn download(&self, src: &str, dst: &Path) -> Result<()>;
}
