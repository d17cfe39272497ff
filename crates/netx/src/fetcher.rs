//! Multi-protocol fetcher.

use async_trait::async_trait;
use furyctl_core::{Error, ExecContext, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::getter::{
    FileGetter, GcsGetter, Getter, GitGetter, HttpGetter, MercurialGetter, S3Getter,
};
use crate::protocol::{CANDIDATE_PREFIXES, Protocol, detect, split_forced};
use crate::Downloader;

/// Resolves a locator by trying protocol prefixes until a getter succeeds.
///
/// A locator that already carries a prefix (`git::…`) is tried in that form
/// only. Otherwise every entry of [`CANDIDATE_PREFIXES`] is tried in order;
/// the empty prefix lets the locator's own shape pick the protocol.
#[derive(Default)]
pub struct MultiProtocolFetcher {
    getters: HashMap<Protocol, Arc<dyn Getter>>,
}

impl MultiProtocolFetcher {
    /// Create a fetcher with every built-in getter registered.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be created.
    pub fn new(exec: ExecContext) -> Result<Self> {
        let http = HttpGetter::new()?;
        let mut fetcher = Self::empty();
        fetcher.register(FileGetter);
        fetcher.register(GitGetter::new(exec.clone()));
        fetcher.register(S3Getter::new(http.clone()));
        fetcher.register(GcsGetter::new(http.clone()));
        fetcher.register(http);
        fetcher.register(MercurialGetter::new(exec));
        Ok(fetcher)
    }

    /// Create a fetcher with no getters.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register a getter, replacing any previous one for the same protocol.
    pub fn register<G: Getter + 'static>(&mut self, getter: G) {
        self.getters.insert(getter.protocol(), Arc::new(getter));
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with_getter<G: Getter + 'static>(mut self, getter: G) -> Self {
        self.register(getter);
        self
    }

    /// The locator forms that will be attempted, in order.
    #[must_use]
    pub fn candidates(src: &str) -> Vec<String> {
        if split_forced(src).is_some() {
            return vec![src.to_string()];
        }
        CANDIDATE_PREFIXES
            .iter()
            .map(|prefix| format!("{prefix}{src}"))
            .collect()
    }

    async fn attempt(&self, candidate: &str, dst: &Path) -> Result<()> {
        let (protocol, rest) = match split_forced(candidate) {
            Some((protocol, rest)) => (protocol, rest),
            None => {
                let protocol = detect(candidate)
                    .ok_or_else(|| Error::fetch(candidate, "unable to detect protocol"))?;
                (protocol, candidate)
            }
        };

        let getter = self
            .getters
            .get(&protocol)
            .ok_or_else(|| Error::fetch(candidate, format!("no getter for {protocol}")))?;
        getter.get(rest, dst).await
    }
}

#[async_trait]
impl Downloader for MultiProtocolFetcher {
    async fn download(&self, src: &str, dst: &Path) -> Result<()> {
        let candidates = Self::candidates(src);
        let mut attempts = Vec::with_capacity(candidates.len());

        for candidate in &candidates {
            match self.attempt(candidate, dst).await {
                Ok(()) => {
                    debug!(src, candidate = %candidate, dst = %dst.display(), "Downloaded");
                    return Ok(());
                }
                Err(e) => {
                    trace!(candidate = %candidate, error = %e, "Download option failed");
                    attempts.push(format!("{candidate}: {e}"));
                }
            }
        }

        Err(Error::DownloadOptionsExhausted {
            src: src.to_string(),
            attempts,
        })
    }
}

impl std::fmt::Debug for MultiProtocolFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut protocols: Vec<&str> = self.getters.keys().map(|p| p.as_str()).collect();
        protocols.sort_unstable();
        f.debug_struct("MultiProtocolFetcher")
            .field("getters", &protocols)
            .finish()
    }
}
