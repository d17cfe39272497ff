use async_trait::async_trait;
use furyctl_core::{Error, ExecContext, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{Getter, Locator};
use crate::fs::copy_dir_contents;
use crate::Protocol;

/// Clones git repositories with the system `git` binary.
///
/// Recognised query parameters: `ref` (branch, tag or commit) and `depth`.
/// A `//subdir` suffix selects a directory inside the repository. The `.git`
/// directory is never copied into the destination.
#[derive(Debug, Clone)]
pub struct GitGetter {
    exec: ExecContext,
}

impl GitGetter {
    #[must_use]
    pub fn new(exec: ExecContext) -> Self {
        Self { exec }
    }

    fn remote_url(base: &str) -> String {
        let base = base.strip_prefix("git::").unwrap_or(base);
        if base.contains("://") || base.starts_with("git@") {
            base.to_string()
        } else {
            format!("https://{base}")
        }
    }

    fn is_commit(reference: &str) -> bool {
        reference.len() == 40 && reference.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Arguments for the initial `git clone`.
    fn clone_args(loc: &Locator, target: &Path) -> Vec<String> {
        let mut args = vec!["clone".to_string()];
        let reference = loc.param("ref").filter(|r| !r.is_empty());

        // A commit cannot be fetched with --branch; it needs full history.
        if !reference.is_some_and(Self::is_commit) {
            if let Some(depth) = loc.param("depth").filter(|d| d.parse::<u32>().is_ok()) {
                args.push("--depth".to_string());
                args.push(depth.to_string());
            }
            if let Some(r) = reference {
                args.push("--branch".to_string());
                args.push(r.to_string());
            }
        }

        args.push(Self::remote_url(&loc.base));
        args.push(target.display().to_string());
        args
    }
}

#[async_trait]
impl Getter for GitGetter {
    fn protocol(&self) -> Protocol {
        Protocol::Git
    }

    async fn get(&self, src: &str, dst: &Path) -> Result<()> {
        let loc = Locator::parse(src);
        if loc.param("sshkey").is_some() {
            warn!(src, "Ignoring sshkey parameter, relying on the SSH agent");
        }

        let workdir = tempfile::tempdir().map_err(|e| Error::io_no_path(e, "create temp dir"))?;
        let checkout = workdir.path().join("repo");
        let args = Self::clone_args(&loc, &checkout);

        debug!(src, "Cloning git repository");
        let output = self.exec.run(PathBuf::from("git"), &args, None).await?;
        if !output.success {
            return Err(Error::fetch(
                src,
                format!("git clone failed: {}", output.combined().trim()),
            ));
        }

        if let Some(reference) = loc.param("ref").filter(|r| Self::is_commit(r)) {
            let args = vec!["checkout".to_string(), reference.to_string()];
            let output = self.exec.run(PathBuf::from("git"), &args, Some(&checkout)).await?;
            if !output.success {
                return Err(Error::fetch(
                    src,
                    format!("git checkout {reference} failed: {}", output.combined().trim()),
                ));
            }
        }

        let source = match &loc.subdir {
            Some(sub) => checkout.join(sub),
            None => checkout,
        };
        if !source.is_dir() {
            return Err(Error::fetch(
                src,
                format!("{} not found in repository", source.display()),
            ));
        }

        copy_dir_contents(&source, dst, &[".git"])
    }
}
