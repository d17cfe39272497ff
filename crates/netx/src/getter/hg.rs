use async_trait::async_trait;
use furyctl_core::{Error, ExecContext, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{Getter, Locator};
use crate::fs::copy_dir_contents;
use crate::Protocol;

/// Clones Mercurial repositories with the system `hg` binary.
#[derive(Debug, Clone)]
pub struct MercurialGetter {
    exec: ExecContext,
}

impl MercurialGetter {
    #[must_use]
    pub fn new(exec: ExecContext) -> Self {
        Self { exec }
    }

    fn clone_args(loc: &Locator, target: &Path) -> Vec<String> {
        let mut args = vec!["clone".to_string()];
        if let Some(rev) = loc.param("rev").filter(|r| !r.is_empty()) {
            args.push("-r".to_string());
            args.push(rev.to_string());
        }
        args.push(loc.base.clone());
        args.push(target.display().to_string());
        args
    }
}

#[async_trait]
impl Getter for MercurialGetter {
    fn protocol(&self) -> Protocol {
        Protocol::Mercurial
    }

    async fn get(&self, src: &str, dst: &Path) -> Result<()> {
        let loc = Locator::parse(src);
        let workdir = tempfile::tempdir().map_err(|e| Error::io_no_path(e, "create temp dir"))?;
        let checkout = workdir.path().join("repo");

        debug!(src, "Cloning mercurial repository");
        let output = self
            .exec
            .run(PathBuf::from("hg"), &Self::clone_args(&loc, &checkout), None)
            .await?;
        if !output.success {
            return Err(Error::fetch(
                src,
                format!("hg clone failed: {}", output.combined().trim()),
            ));
        }

        let source = loc.subdir.as_ref().map_or(checkout.clone(), |s| checkout.join(s));
        if !source.is_dir() {
            return Err(Error::fetch(
                src,
                format!("{} not found in repository", source.display()),
            ));
        }
        copy_dir_contents(&source, dst, &[".hg"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_args_with_revision() {
        let loc = Locator::parse("https://hg.example.com/repo?rev=1.2");
        assert_eq!(
            MercurialGetter::clone_args(&loc, Path::new("/tmp/r")),
            ["clone", "-r", "1.2", "https://hg.example.com/repo", "/tmp/r"]
        );
    }
}
