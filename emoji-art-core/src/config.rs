//! Document controller configuration.

use std::path::PathBuf;
use std::time::Duration;

/// File name of the autosaved document.
pub const AUTOSAVE_FILENAME: &str = "Autosaved.emojiart";

/// Quiet period after the last change before the document is written.
pub const DEFAULT_COALESCING_INTERVAL: Duration = Duration::from_secs(5);

/// Configuration for a [`DocumentController`](crate::DocumentController).
#[derive(Debug, Clone)]
pub struct DocumentConfig {
    /// Where the document is autosaved and loaded from.
    pub autosave_path: PathBuf,
    /// Debounce delay for autosave.
    pub coalescing_interval: Duration,
    /// User agent sent with background fetches.
    pub user_agent: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentConfig {
    /// Create a configuration with default values.
    ///
    /// The autosave file lives in the user's documents directory, or the
    /// current directory when the platform has none.
    #[must_use]
    pub fn new() -> Self {
        Self {
            autosave_path: default_autosave_path(),
            coalescing_interval: DEFAULT_COALESCING_INTERVAL,
            user_agent: format!("emoji-art-core/{}", crate::VERSION),
        }
    }

    /// Use a different autosave file.
    #[must_use]
    pub fn with_autosave_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.autosave_path = path.into();
        self
    }

    /// Use a different debounce delay.
    #[must_use]
    pub fn with_coalescing_interval(mut self, interval: Duration) -> Self {
        self.coalescing_interval = interval;
        self
    }
}

fn default_autosave_path() -> PathBuf {
    dirs::document_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(AUTOSAVE_FILENAME)
}
