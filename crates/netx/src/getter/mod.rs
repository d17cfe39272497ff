//! Protocol-specific getters.
//!
//! Each getter receives the locator with any `proto::` prefix already removed
//! and writes the fetched content into the destination directory.

mod file;
mod git;
mod hg;
mod http;

use async_trait::async_trait;
use furyctl_core::Result;
use std::path::Path;

use crate::Protocol;

pub use file::FileGetter;
pub use git::GitGetter;
pub use hg::MercurialGetter;
pub use http::{GcsGetter, HttpGetter, S3Getter};

/// Fetches one kind of locator.
#[async_trait]
pub trait Getter: Send + Sync {
    /// Protocol this getter serves.
    fn protocol(&self) -> Protocol;

    /// Fetch `src` into the directory `dst`.
    ///
    /// # Errors
    ///
    /// Returns an error when the locator is not valid for this protocol or the
    /// transfer fails.
    async fn get(&self, src: &str, dst: &Path) -> Result<()>;
}

/// A locator split into its address, optional `//subdir` and query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Locator {
    pub base: String,
    pub subdir: Option<String>,
    pub params: Vec<(String, String)>,
}

impl Locator {
    pub fn parse(src: &str) -> Self {
        let (address, query) = src.split_once('?').map_or((src, ""), |(a, q)| (a, q));

        let scheme_end = address.find("://").map_or(0, |i| i + 3);
        let (base, subdir) = match address[scheme_end..].find("//") {
            Some(i) => {
                let split = scheme_end + i;
                let sub = address[split + 2..].trim_matches('/');
                (
                    address[..split].to_string(),
                    (!sub.is_empty()).then(|| sub.to_string()),
                )
            }
            None => (address.to_string(), None),
        };

        let params = query
            .split('&')
            .filter(|p| !p.is_empty())
            .map(|p| {
                let (k, v) = p.split_once('=').unwrap_or((p, ""));
                (k.to_string(), v.to_string())
            })
            .collect();

        Self {
            base,
            subdir,
            params,
        }
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Base plus every parameter except `exclude`, for handing to a transport.
    pub fn url_without(&self, exclude: &[&str]) -> String {
        let kept: Vec<String> = self
            .params
            .iter()
            .filter(|(k, _)| !exclude.contains(&k.as_str()))
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        if kept.is_empty() {
            self.base.clone()
        } else {
            format!("{}?{}", self.base, kept.join("&"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_parse_git_query() {
        let loc = Locator::parse("https://github.com/sighupio/fury-distribution?ref=v1.25.8&depth=1");
        assert_eq!(loc.base, "https://github.com/sighupio/fury-distribution");
        assert_eq!(loc.subdir, None);
        assert_eq!(loc.param("ref"), Some("v1.25.8"));
        assert_eq!(loc.param("depth"), Some("1"));
        assert_eq!(loc.param("sshkey"), None);
    }

    #[test]
    fn test_locator_parse_subdir() {
        let loc = Locator::parse("git@github.com:sighupio/furyctl//configs/patches?ref=main");
        assert_eq!(loc.base, "git@github.com:sighupio/furyctl");
        assert_eq!(loc.subdir.as_deref(), Some("configs/patches"));

        let loc = Locator::parse("https://example.com/repo");
        assert_eq!(loc.subdir, None);
        assert!(loc.params.is_empty());
    }

    #[test]
    fn test_url_without() {
        let loc = Locator::parse("https://example.com/a.tar.gz?archive=false&token=x");
        assert_eq!(loc.url_without(&["archive"]), "https://example.com/a.tar.gz?token=x");
        assert_eq!(loc.url_without(&["archive", "token"]), "https://example.com/a.tar.gz");
    }
}
