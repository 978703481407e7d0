//! # EmojiArt Core
//!
//! Document logic for the EmojiArt sticker canvas.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │             DocumentController              │
//! ├─────────────────────────────────────────────┤
//! │  Intents          │  Side effects           │
//! │  - set_background │  - Debounced autosave   │
//! │  - add_emoji      │  - Background fetch     │
//! │  - move_emoji     │  - Stale-result guard   │
//! │  - scale_emoji    │                         │
//! ├─────────────────────────────────────────────┤
//! │  EmojiArtModel    │  Seams                  │
//! │  - Background     │  - DocumentStorage      │
//! │  - Emoji list     │  - BackgroundFetcher    │
//! │  - JSON codec     │                         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Rendering and gesture handling live in the presentation layer, which reads
//! the controller's state and subscribes to its change channel.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod autosave;
pub mod background_image;
pub mod config;
pub mod document;
pub mod error;
pub mod fetch;
pub mod model;
pub mod storage;

pub use autosave::AutosaveScheduler;
pub use background_image::{BackgroundImage, ImageFormat};
pub use config::{DocumentConfig, AUTOSAVE_FILENAME, DEFAULT_COALESCING_INTERVAL};
pub use document::{DocumentController, DocumentState, FetchStatus};
pub use error::{DocumentError, DocumentResult};
pub use fetch::{BackgroundFetcher, HttpFetcher};
pub use model::{Background, Emoji, EmojiArtModel, EmojiId};
pub use storage::{DocumentStorage, FileStorage};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
