//! Persistence backends for the autosaved document.

use std::path::{Path, PathBuf};

use crate::error::DocumentResult;

/// Where document bytes are read from and written to.
///
/// The controller calls these from the autosave task, so implementations must
/// be shareable across threads.
pub trait DocumentStorage: Send + Sync {
    /// Read the previously saved document.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing was saved or the backend fails.
    fn read(&self) -> DocumentResult<Vec<u8>>;

    /// Replace the saved document.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn write(&self, data: &[u8]) -> DocumentResult<()>;
}

/// Saves the document to a single file, overwriting it each time.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Create a storage backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this storage writes to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStorage for FileStorage {
    fn read(&self) -> DocumentResult<Vec<u8>> {
        Ok(std::fs::read(&self.path)?)
    }

    fn write(&self, data: &[u8]) -> DocumentResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, data)?;
        Ok(())
    }
}
