//! Directory copy helpers shared by getters, the cache and patch overlays.

use furyctl_core::{Error, Result};
use std::path::Path;
use tracing::trace;
use walkdir::WalkDir;

/// Copy every entry below `src` into `dst`, overwriting existing files.
///
/// Top-level entries whose name is in `skip` are ignored (e.g. `.git`).
/// Nothing is deleted from `dst`; this is a pure add/overwrite overlay.
///
/// # Errors
///
/// Returns [`Error::Io`] on the first entry that cannot be copied.
pub fn copy_dir_contents(src: &Path, dst: &Path, skip: &[&str]) -> Result<()> {
    std::fs::create_dir_all(dst).map_err(|e| Error::io(e, dst, "create"))?;

    let walker = WalkDir::new(src).min_depth(1).into_iter().filter_entry(|e| {
        e.depth() != 1
            || !skip
                .iter()
                .any(|s| e.file_name().to_string_lossy() == *s)
    });

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| src.to_path_buf());
            Error::io(std::io::Error::other(e.to_string()), path, "walk")
        })?;

        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::io(std::io::Error::other(e.to_string()), entry.path(), "walk"))?;
        let target = dst.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            if target.is_file() || target.is_symlink() {
                std::fs::remove_file(&target).map_err(|e| Error::io(e, &target, "remove"))?;
            }
            std::fs::create_dir_all(&target).map_err(|e| Error::io(e, &target, "create"))?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            if target.is_dir() && !target.is_symlink() {
                std::fs::remove_dir_all(&target).map_err(|e| Error::io(e, &target, "remove"))?;
            } else if target.is_symlink() {
                std::fs::remove_file(&target).map_err(|e| Error::io(e, &target, "remove"))?;
            }
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| Error::io(e, parent, "create"))?;
            }
            std::fs::copy(entry.path(), &target).map_err(|e| Error::io(e, &target, "copy"))?;
            trace!(from = %entry.path().display(), to = %target.display(), "Copied file");
        }
    }

    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, target: &Path) -> Result<()> {
    let link = std::fs::read_link(src).map_err(|e| Error::io(e, src, "readlink"))?;
    if target.symlink_metadata().is_ok() {
        if target.is_dir() && !target.is_symlink() {
            std::fs::remove_dir_all(target).map_err(|e| Error::io(e, target, "remove"))?;
        } else {
            std::fs::remove_file(target).map_err(|e| Error::io(e, target, "remove"))?;
        }
    }
    std::os::unix::fs::symlink(&link, target).map_err(|e| Error::io(e, target, "symlink"))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, _target: &Path) -> Result<()> {
    tracing::warn!(path = %src.display(), "Skipping symlink on this platform");
    Ok(())
}

/// Mark a file executable (0755).
///
/// # Errors
///
/// Returns [`Error::Io`] if the permissions cannot be changed.
#[cfg(unix)]
pub fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)
        .map_err(|e| Error::io(e, path, "stat"))?
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).map_err(|e| Error::io(e, path, "chmod"))
}

#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_overwrites_and_keeps_unrelated() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();

        std::fs::create_dir_all(src.path().join("nested")).unwrap();
        std::fs::write(src.path().join("kfd.yaml"), "version: v1.25.8").unwrap();
        std::fs::write(src.path().join("nested/file.txt"), "new").unwrap();

        std::fs::create_dir_all(dst.path().join("nested")).unwrap();
        std::fs::write(dst.path().join("nested/file.txt"), "stale").unwrap();
        std::fs::write(dst.path().join("other.txt"), "keep").unwrap();

        copy_dir_contents(src.path(), dst.path(), &[]).unwrap();

        assert_eq!(
            std::fs::read_to_string(dst.path().join("nested/file.txt")).unwrap(),
            "new"
        );
        assert_eq!(
            std::fs::read_to_string(dst.path().join("kfd.yaml")).unwrap(),
            "version: v1.25.8"
        );
        assert_eq!(
            std::fs::read_to_string(dst.path().join("other.txt")).unwrap(),
            "keep"
        );
    }

    #[test]
    fn test_copy_skips_top_level_entries() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(src.path().join(".git/objects")).unwrap();
        std::fs::write(src.path().join(".git/HEAD"), "ref").unwrap();
        std::fs::write(src.path().join("kfd.yaml"), "x").unwrap();

        copy_dir_contents(src.path(), dst.path(), &[".git"]).unwrap();

        assert!(!dst.path().join(".git").exists());
        assert!(dst.path().join("kfd.yaml").exists());
    }

    #[test]
    fn test_copy_replaces_file_with_directory() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(src.path().join("modules")).unwrap();
        std::fs::write(src.path().join("modules/a"), "a").unwrap();
        std::fs::write(dst.path().join("modules"), "was a file").unwrap();

        copy_dir_contents(src.path(), dst.path(), &[]).unwrap();
        assert!(dst.path().join("modules/a").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_make_executable() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("kubectl");
        std::fs::write(&bin, "#!/bin/sh\n").unwrap();
        make_executable(&bin).unwrap();
        let mode = std::fs::metadata(&bin).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
