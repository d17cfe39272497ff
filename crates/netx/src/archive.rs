//! Archive extraction for downloaded payloads.
//!
//! Extraction goes to a temporary directory next to the destination first, so
//! a malformed archive leaves the destination untouched. A missing or empty
//! destination is then replaced by a single rename; an existing tree is
//! overlaid file by file, which is not atomic.

use flate2::read::GzDecoder;
use furyctl_core::{Error, Result};
use std::io::{Cursor, Read};
use std::path::Path;
use tar::Archive;
use tracing::debug;

use crate::fs::copy_dir_contents;

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
    Tar,
}

impl ArchiveKind {
    /// Detect the archive format from a file name or URL path.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        if name.ends_with(".zip") {
            Some(Self::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if name.ends_with(".tar") {
            Some(Self::Tar)
        } else {
            None
        }
    }

    /// Parse the value of an `archive=` query parameter.
    #[must_use]
    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "zip" => Some(Self::Zip),
            "tar.gz" | "tgz" => Some(Self::TarGz),
            "tar" => Some(Self::Tar),
            _ => None,
        }
    }
}

/// Extract `data` into `dest`, overlaying whatever is already there.
///
/// # Errors
///
/// Returns an error if the archive is malformed or files cannot be written.
pub fn extract_archive(data: &[u8], kind: ArchiveKind, dest: &Path) -> Result<()> {
    let parent = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| Error::io(e, parent, "create"))?;
    let staging = tempfile::Builder::new()
        .prefix(".extract-")
        .tempdir_in(parent)
        .map_err(|e| Error::io(e, parent, "create temp dir"))?;

    match kind {
        ArchiveKind::Zip => extract_zip(data, staging.path())?,
        ArchiveKind::TarGz => {
            let mut archive = Archive::new(GzDecoder::new(Cursor::new(data)));
            unpack_tar(&mut archive, staging.path())?;
        }
        ArchiveKind::Tar => {
            let mut archive = Archive::new(Cursor::new(data));
            unpack_tar(&mut archive, staging.path())?;
        }
    }
    debug!(?kind, dest = %dest.display(), "Extracted archive");

    if is_missing_or_empty(dest) {
        if dest.exists() {
            std::fs::remove_dir(dest).map_err(|e| Error::io(e, dest, "remove"))?;
        }
        let staged = staging.keep();
        if let Err(e) = std::fs::rename(&staged, dest) {
            if let Err(cleanup) = std::fs::remove_dir_all(&staged) {
                debug!(path = %staged.display(), error = %cleanup, "Could not remove staging directory");
            }
            return Err(Error::io(e, dest, "rename"));
        }
        // Temporary directories are created owner-only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(dest, std::fs::Permissions::from_mode(0o755))
                .map_err(|e| Error::io(e, dest, "chmod"))?;
        }
        return Ok(());
    }

    copy_dir_contents(staging.path(), dest, &[])
}

fn is_missing_or_empty(dir: &Path) -> bool {
    match std::fs::read_dir(dir) {
        Ok(mut entries) => dir.is_dir() && entries.next().is_none(),
        Err(e) => e.kind() == std::io::ErrorKind::NotFound,
    }
}

fn unpack_tar<R: Read>(archive: &mut Archive<R>, dir: &Path) -> Result<()> {
    archive.set_preserve_permissions(true);
    archive
        .unpack(dir)
        .map_err(|e| Error::fetch(dir.display().to_string(), format!("failed to extract tar: {e}")))
}

fn extract_zip(data: &[u8], dir: &Path) -> Result<()> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| Error::fetch(dir.display().to_string(), format!("failed to open zip: {e}")))?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(|e| {
            Error::fetch(dir.display().to_string(), format!("failed to read zip entry: {e}"))
        })?;

        // Entries escaping the destination are dropped.
        let Some(rel) = file.enclosed_name() else {
            continue;
        };
        let outpath = dir.join(rel);

        if file.is_dir() {
            std::fs::create_dir_all(&outpath).map_err(|e| Error::io(e, &outpath, "create"))?;
            continue;
        }

        if let Some(p) = outpath.parent() {
            std::fs::create_dir_all(p).map_err(|e| Error::io(e, p, "create"))?;
        }
        let mut content = Vec::new();
        file.read_to_end(&mut content)
            .map_err(|e| Error::io(e, &outpath, "read zip entry"))?;
        std::fs::write(&outpath, &content).map_err(|e| Error::io(e, &outpath, "write"))?;

        #[cfg(unix)]
        if let Some(mode) = file.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode))
                .map_err(|e| Error::io(e, &outpath, "chmod"))?;
        }
    }

    Ok(())
}
