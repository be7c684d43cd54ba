//! Byte sources a bundle can be read from.

use std::io::{Cursor, ErrorKind, Read};
use std::path::{Path, PathBuf};

use zip::ZipArchive;
use zip::result::ZipError;

use crate::bundle::{MANIFEST_FILE, MAX_ENTRY_BYTES};
use crate::error::{BundleError, Result};

/// Largest buffer reserved up front for an archive entry.  Bigger entries
/// grow while they are read.
const PREALLOC_BYTES: u64 = 64 * 1024;

/// A flat namespace of bundle files addressed by relative path.
pub(crate) trait BundleSource {
    /// Read `name`, returning `None` if the source has no such file.
    fn read(&mut self, name: &str) -> Result<Option<Vec<u8>>>;
}

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

pub(crate) struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub(crate) fn open(root: &Path) -> Result<Self> {
        let meta = std::fs::metadata(root).map_err(|e| with_path(e, root))?;
        if !meta.is_dir() {
            return Err(BundleError::Io(std::io::Error::new(
                ErrorKind::NotADirectory,
                format!("{} is not a directory", root.display()),
            )));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }
}

impl BundleSource for DirectorySource {
    fn read(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let path = self.root.join(name);
        match std::fs::read(&path) {
            Ok(bytes) => {
                tracing::trace!(path = %path.display(), size_bytes = bytes.len(), "read bundle file");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(with_path(e, &path)),
        }
    }
}

fn with_path(e: std::io::Error, path: &Path) -> BundleError {
    BundleError::Io(std::io::Error::new(
        e.kind(),
        format!("{}: {e}", path.display()),
    ))
}

// ---------------------------------------------------------------------------
// Zip archive
// ---------------------------------------------------------------------------

/// A zip archive whose bundle root is the folder holding the manifest.
///
/// Archives are commonly produced by zipping the bundle folder itself, so the
/// manifest may sit under a single top-level directory rather than at the
/// archive root.
pub(crate) struct ArchiveSource<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
    prefix: String,
}

impl<'a> ArchiveSource<'a> {
    pub(crate) fn open(bytes: &'a [u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(BundleError::decode("archive buffer is empty"));
        }

        let archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| BundleError::decode(format!("not a readable zip archive: {e}")))?;

        let prefix = archive
            .file_names()
            .filter_map(|name| {
                if name == MANIFEST_FILE {
                    Some(String::new())
                } else {
                    name.strip_suffix(MANIFEST_FILE)
                        .filter(|p| p.ends_with('/'))
                        .map(str::to_owned)
                }
            })
            .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
            .ok_or_else(|| BundleError::invalid(format!("archive contains no {MANIFEST_FILE}")))?;

        tracing::debug!(
            entries = archive.len(),
            root = %prefix,
            "opened bundle archive"
        );

        Ok(Self { archive, prefix })
    }
}

impl BundleSource for ArchiveSource<'_> {
    fn read(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let full = format!("{}{name}", self.prefix);
        let file = match self.archive.by_name(&full) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(BundleError::decode(format!("{full}: {e}"))),
        };

        if file.size() > MAX_ENTRY_BYTES {
            return Err(BundleError::decode(format!(
                "{full}: entry of {} bytes exceeds the {MAX_ENTRY_BYTES} byte limit",
                file.size()
            )));
        }

        // The declared size is not trusted: cap the read as well.
        let mut bytes = Vec::with_capacity(initial_capacity(file.size()));
        file.take(MAX_ENTRY_BYTES + 1)
            .read_to_end(&mut bytes)
            .map_err(|e| BundleError::decode(format!("{full}: {e}")))?;
        if bytes.len() as u64 > MAX_ENTRY_BYTES {
            return Err(BundleError::decode(format!(
                "{full}: entry exceeds the {MAX_ENTRY_BYTES} byte limit"
            )));
        }

        tracing::trace!(entry = %full, size_bytes = bytes.len(), "read archive entry");
        Ok(Some(bytes))
    }
}

/// Buffer size to reserve for an entry whose header declares `declared`
/// bytes.
fn initial_capacity(declared: u64) -> usize {
    declared.min(PREALLOC_BYTES) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_size_does_not_drive_allocation() {
        assert_eq!(initial_capacity(0), 0);
        assert_eq!(initial_capacity(512), 512);
        assert_eq!(initial_capacity(MAX_ENTRY_BYTES), PREALLOC_BYTES as usize);
        assert_eq!(initial_capacity(u64::MAX), PREALLOC_BYTES as usize);
    }
}
