//! Reading and writing note files.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Where notes are read from and written back to.
pub trait Storage: Send + Sync {
    /// Returns the full content of the file at `path`.
    fn read(&self, path: &Path) -> io::Result<String>;

    /// Replaces the file at `path` with `contents`.
    ///
    /// Implementations must not leave a partially written file behind.
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;
}

/// Storage on the local filesystem.
///
/// Writes go to a temporary file in the target's directory which is then
/// renamed over the target, so a failed write leaves the original intact.
/// The target keeps its permissions, and symlinks are followed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl Storage for FsStorage {
    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        // A symlinked note is written through to its target.
        let (target, permissions) = match fs::canonicalize(path) {
            Ok(target) => {
                let permissions = fs::metadata(&target)?.permissions();
                (target, Some(permissions))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => (path.to_path_buf(), None),
            Err(e) => return Err(e),
        };

        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(contents.as_bytes())?;
        if let Some(permissions) = permissions {
            file.as_file().set_permissions(permissions)?;
        }
        file.as_file().sync_all()?;
        file.persist(&target).map_err(|e| e.error)?;
        Ok(())
    }
}
