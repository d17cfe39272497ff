//! Protocol prefixes and locator detection.

use std::path::Path;

/// A fetch mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    File,
    Git,
    Http,
    S3,
    Gcs,
    Mercurial,
}

impl Protocol {
    /// Name used in `proto::` prefixes.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Git => "git",
            Self::Http => "http",
            Self::S3 => "s3",
            Self::Gcs => "gcs",
            Self::Mercurial => "mercurial",
        }
    }

    /// Parse a prefix name; `https` and `hg` are accepted as aliases.
    #[must_use]
    pub fn from_prefix(name: &str) -> Option<Self> {
        match name {
            "file" => Some(Self::File),
            "git" => Some(Self::Git),
            "http" | "https" => Some(Self::Http),
            "s3" => Some(Self::S3),
            "gcs" => Some(Self::Gcs),
            "mercurial" | "hg" => Some(Self::Mercurial),
            _ => None,
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prefixes tried, in order, for a locator without a forced protocol.
///
/// The empty prefix means "detect from the locator itself".
pub const CANDIDATE_PREFIXES: [&str; 7] =
    ["", "git::", "file::", "http::", "s3::", "gcs::", "mercurial::"];

/// Split a `proto::rest` locator into its forced protocol and the rest.
///
/// Returns `None` when the locator carries no recognised prefix.
#[must_use]
pub fn split_forced(src: &str) -> Option<(Protocol, &str)> {
    let (prefix, rest) = src.split_once("::")?;
    // A "::" after the first path separator belongs to the locator itself.
    if prefix.contains('/') || prefix.contains(':') {
        return None;
    }
    Protocol::from_prefix(prefix).map(|p| (p, rest))
}

/// Guess the protocol of a locator that carries no forced prefix.
#[must_use]
pub fn detect(src: &str) -> Option<Protocol> {
    let base = src.split_once('?').map_or(src, |(b, _)| b);

    if base.starts_with("file://")
        || base.starts_with('/')
        || base.starts_with("./")
        || base.starts_with("../")
        || Path::new(base).exists()
    {
        return Some(Protocol::File);
    }

    if base.starts_with("git@")
        || base.starts_with("ssh://")
        || base.starts_with("git://")
        || base.trim_end_matches('/').ends_with(".git")
        || ["github.com/", "gitlab.com/", "bitbucket.org/"]
            .iter()
            .any(|host| base.starts_with(host))
    {
        return Some(Protocol::Git);
    }

    if base.starts_with("s3://") || host_of(base).is_some_and(is_s3_host) {
        return Some(Protocol::S3);
    }

    if base.starts_with("gs://")
        || base.starts_with("gcs://")
        || host_of(base).is_some_and(|h| h == "storage.googleapis.com")
    {
        return Some(Protocol::Gcs);
    }

    if base.starts_with("http://") || base.starts_with("https://") {
        return Some(Protocol::Http);
    }

    None
}

/// Host part of a URL-ish locator, scheme optional.
pub(crate) fn host_of(locator: &str) -> Option<&str> {
    let without_scheme = locator
        .split_once("://")
        .map_or(locator, |(_, rest)| rest);
    let host = without_scheme.split('/').next()?;
    let host = host.rsplit_once('@').map_or(host, |(_, h)| h);
    let host = host.split_once(':').map_or(host, |(h, _)| h);
    (!host.is_empty()).then_some(host)
}

pub(crate) fn is_s3_host(host: &str) -> bool {
    host.ends_with(".amazonaws.com") && (host.starts_with("s3") || host.contains(".s3"))
}
