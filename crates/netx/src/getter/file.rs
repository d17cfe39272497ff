use async_trait::async_trait;
use furyctl_core::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{Getter, Locator};
use crate::archive::{ArchiveKind, extract_archive};
use crate::fs::copy_dir_contents;
use crate::Protocol;

/// Copies local directories and files.
///
/// Symlinked sources and destinations are refused: following them would let
/// a bundle escape the directory it was supposed to populate.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileGetter;

impl FileGetter {
    fn source_path(src: &str) -> PathBuf {
        let loc = Locator::parse(src);
        let raw = loc.base.strip_prefix("file://").unwrap_or(&loc.base);
        let mut path = PathBuf::from(raw);
        if let Some(sub) = loc.subdir {
            path.push(sub);
        }
        path
    }
}

#[async_trait]
impl Getter for FileGetter {
    fn protocol(&self) -> Protocol {
        Protocol::File
    }

    async fn get(&self, src: &str, dst: &Path) -> Result<()> {
        let path = Self::source_path(src);

        let meta = std::fs::symlink_metadata(&path)
            .map_err(|e| Error::fetch(src, format!("cannot stat source: {e}")))?;
        if meta.file_type().is_symlink() {
            return Err(Error::fetch(src, "source is a symlink"));
        }
        if std::fs::symlink_metadata(dst).is_ok_and(|m| m.file_type().is_symlink()) {
            return Err(Error::fetch(
                src,
                format!("destination {} is a symlink", dst.display()),
            ));
        }

        debug!(src = %path.display(), dst = %dst.display(), "Copying local source");

        if meta.is_dir() {
            return copy_dir_contents(&path, dst, &[]);
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| Error::fetch(src, "source has no file name"))?;

        if let Some(kind) = ArchiveKind::from_name(&name) {
            let data = std::fs::read(&path).map_err(|e| Error::io(e, &path, "read"))?;
            return extract_archive(&data, kind, dst);
        }

        std::fs::create_dir_all(dst).map_err(|e| Error::io(e, dst, "create"))?;
        let target = dst.join(&name);
        std::fs::copy(&path, &target).map_err(|e| Error::io(e, &target, "copy"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_copies_directory() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("kfd.yaml"), "version: v1.25.8").unwrap();

        FileGetter
            .get(&src.path().display().to_string(), dst.path())
            .await
            .unwrap();

        assert!(dst.path().join("kfd.yaml").is_file());
    }

    #[tokio::test]
    async fn test_file_scheme_and_single_file() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let file = src.path().join("notes.txt");
        std::fs::write(&file, "hi").unwrap();

        FileGetter
            .get(&format!("file://{}", file.display()), dst.path())
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(dst.path().join("notes.txt")).unwrap(), "hi");
    }

    #[tokio::test]
    async fn test_missing_source_fails() {
        let dst = tempfile::tempdir().unwrap();
        let err = FileGetter
            .get("/definitely/not/here", dst.path())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_rejects_symlink_source() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real");
        std::fs::create_dir_all(&real).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();
        let dst = dir.path().join("dst");

        let err = FileGetter
            .get(&link.display().to_string(), &dst)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("symlink"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_rejects_symlink_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        let elsewhere = dir.path().join("elsewhere");
        std::fs::create_dir_all(&elsewhere).unwrap();
        let dst = dir.path().join("dst");
        std::os::unix::fs::symlink(&elsewhere, &dst).unwrap();

        let err = FileGetter
            .get(&src.display().to_string(), &dst)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("destination"));
    }
}
