//! The observable document controller.
//!
//! Owns the live [`EmojiArtModel`], publishes every change through a
//! [`watch`] channel and drives two side effects: a debounced autosave and a
//! background image load whenever the background changes.
//!
//! ## Change protocol
//!
//! ```text
//! intent ──► mutate model ──► publish ──► reschedule autosave
//!                                   └──► background differs? ──► load image
//! ```
//!
//! URL backgrounds are fetched on a Tokio task. The result is applied only if
//! the live background still equals the URL it was fetched for; superseded
//! fetches run to completion and are ignored.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::watch;
use url::Url;

use crate::autosave::AutosaveScheduler;
use crate::background_image::BackgroundImage;
use crate::config::DocumentConfig;
use crate::error::{DocumentError, DocumentResult};
use crate::fetch::{BackgroundFetcher, HttpFetcher};
use crate::model::{Background, Emoji, EmojiArtModel, EmojiId};
use crate::storage::{DocumentStorage, FileStorage};

/// Progress of the background image load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    /// Nothing in flight for the current background.
    #[default]
    Idle,
    /// A URL background is being fetched.
    Fetching,
}

/// Everything an observer of the document can see.
#[derive(Debug, Clone, Default)]
pub struct DocumentState {
    /// The live document.
    pub model: EmojiArtModel,
    /// Decoded background, if one is loaded.
    pub background_image: Option<Arc<BackgroundImage>>,
    /// Background load progress.
    pub fetch_status: FetchStatus,
    /// Incremented on every published change.
    pub revision: u64,
}

/// What an intent did to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Unchanged,
    Model,
    Background,
}

/// Owns the document and turns user intents into model changes.
///
/// Intents never fail: load, save and fetch errors are logged where they
/// happen and leave the document in a valid state.
pub struct DocumentController {
    state: Arc<watch::Sender<DocumentState>>,
    storage: Arc<dyn DocumentStorage>,
    fetcher: Arc<dyn BackgroundFetcher>,
    autosave: AutosaveScheduler,
    runtime: Handle,
}

impl std::fmt::Debug for DocumentController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentController")
            .field("state", &*self.state.borrow())
            .field("autosave", &self.autosave)
            .finish_non_exhaustive()
    }
}

impl DocumentController {
    /// Open the autosaved document at `config.autosave_path`, fetching URL
    /// backgrounds over HTTP.
    ///
    /// Falls back to a freshly seeded document when nothing usable was saved.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::NoRuntime`] outside a Tokio runtime and
    /// [`DocumentError::Http`] if the HTTP client fails to build.
    pub fn open(config: &DocumentConfig) -> DocumentResult<Self> {
        let fetcher = HttpFetcher::new(&config.user_agent)?;
        let storage = FileStorage::new(config.autosave_path.clone());
        tracing::debug!("Autosaving to {}", storage.path().display());
        Self::with_backends(config, Arc::new(storage), Arc::new(fetcher))
    }

    /// Open a document with explicit storage and fetch backends.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::NoRuntime`] outside a Tokio runtime.
    pub fn with_backends(
        config: &DocumentConfig,
        storage: Arc<dyn DocumentStorage>,
        fetcher: Arc<dyn BackgroundFetcher>,
    ) -> DocumentResult<Self> {
        let runtime = Handle::try_current().map_err(|_| DocumentError::NoRuntime)?;

        let (model, restored) = match storage.read().and_then(|data| EmojiArtModel::from_json(&data)) {
            Ok(model) => {
                tracing::info!(
                    "Loaded autosaved document with {} emoji",
                    model.emojis().len()
                );
                (model, true)
            }
            Err(DocumentError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No autosaved document, starting a new one");
                (EmojiArtModel::seeded(), false)
            }
            Err(e) => {
                tracing::warn!("Failed to load autosaved document, starting a new one: {e}");
                (EmojiArtModel::seeded(), false)
            }
        };

        let background = model.background().clone();
        let mut initial = DocumentState {
            model,
            ..DocumentState::default()
        };
        if restored {
            initial.reset_background_display();
        }
        let (state, _) = watch::channel(initial);

        let controller = Self {
            state: Arc::new(state),
            storage,
            fetcher,
            autosave: AutosaveScheduler::new(config.coalescing_interval, runtime.clone()),
            runtime,
        };

        if restored && !background.is_blank() {
            controller.load_background(background);
        }
        Ok(controller)
    }

    // -----------------------------------------------------------------------
    // Read API
    // -----------------------------------------------------------------------

    /// Snapshot of the placed emoji in z-order.
    #[must_use]
    pub fn emojis(&self) -> Vec<Emoji> {
        self.state.borrow().model.emojis().to_vec()
    }

    /// The current background.
    #[must_use]
    pub fn background(&self) -> Background {
        self.state.borrow().model.background().clone()
    }

    /// The decoded background image, if loaded.
    #[must_use]
    pub fn background_image(&self) -> Option<Arc<BackgroundImage>> {
        self.state.borrow().background_image.clone()
    }

    /// Background load progress.
    #[must_use]
    pub fn fetch_status(&self) -> FetchStatus {
        self.state.borrow().fetch_status
    }

    /// Snapshot of the whole document.
    #[must_use]
    pub fn model(&self) -> EmojiArtModel {
        self.state.borrow().model.clone()
    }

    /// Subscribe to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DocumentState> {
        self.state.subscribe()
    }

    /// Check if an autosave is waiting for the document to go quiet.
    #[must_use]
    pub fn has_pending_autosave(&self) -> bool {
        self.autosave.is_pending()
    }

    // -----------------------------------------------------------------------
    // Intents
    // -----------------------------------------------------------------------

    /// Replace the background.
    ///
    /// Setting a background equal to the current one still schedules an
    /// autosave but does not reload the image.
    pub fn set_background(&self, background: Background) {
        tracing::debug!("Background set to {background}");
        let requested = background.clone();
        let change = self.commit(move |model| {
            let differs = model.background() != &background;
            model.set_background(background);
            if differs {
                Change::Background
            } else {
                Change::Model
            }
        });
        if change == Change::Background {
            self.load_background(requested);
        }
    }

    /// Place a new emoji at `location` (offset from the canvas centre).
    ///
    /// Ignored once the document has issued every possible id.
    pub fn add_emoji(&self, text: &str, location: (i32, i32), size: i32) {
        let change = self.commit(|model| match model.add_emoji(text, location, size) {
            Some(id) => {
                tracing::debug!("Added emoji {id} {text:?} at {location:?}");
                Change::Model
            }
            None => Change::Unchanged,
        });
        if change == Change::Unchanged {
            tracing::warn!("Emoji ids exhausted, not adding {text:?}");
        }
    }

    /// Move an emoji by the given offset. Unknown ids are ignored.
    pub fn move_emoji(&self, id: EmojiId, dx: i32, dy: i32) {
        let change = self.commit(|model| {
            if model.move_emoji(id, dx, dy) {
                Change::Model
            } else {
                Change::Unchanged
            }
        });
        if change == Change::Unchanged {
            tracing::debug!("Ignoring move of unknown emoji {id}");
        }
    }

    /// Resize an emoji by `factor`. Unknown ids and non-positive or
    /// non-finite factors are ignored.
    pub fn scale_emoji(&self, id: EmojiId, factor: f64) {
        let change = self.commit(|model| {
            if model.scale_emoji(id, factor) {
                Change::Model
            } else {
                Change::Unchanged
            }
        });
        if change == Change::Unchanged {
            tracing::debug!("Ignoring scale of emoji {id} by {factor}");
        }
    }

    /// Cancel the pending autosave and write the document now.
    ///
    /// A pending autosave is otherwise lost when the controller is dropped.
    ///
    /// # Errors
    ///
    /// Returns the encode or storage error; the in-memory document is
    /// unaffected either way.
    pub fn flush(&self) -> DocumentResult<()> {
        self.autosave.cancel();
        save_document(&self.state, self.storage.as_ref())
    }

    // -----------------------------------------------------------------------
    // Side effects
    // -----------------------------------------------------------------------

    /// Apply `mutate` to the model, publish, and schedule an autosave if
    /// anything changed.
    ///
    /// A new background is published together with the cleared image and the
    /// matching fetch status.
    fn commit<F>(&self, mutate: F) -> Change
    where
        F: FnOnce(&mut EmojiArtModel) -> Change,
    {
        let mut change = Change::Unchanged;
        self.state.send_if_modified(|state| {
            change = mutate(&mut state.model);
            match change {
                Change::Unchanged => return false,
                Change::Background => state.reset_background_display(),
                Change::Model => {}
            }
            state.revision += 1;
            true
        });

        if change != Change::Unchanged {
            self.schedule_autosave();
        }
        change
    }

    fn schedule_autosave(&self) {
        let state = Arc::clone(&self.state);
        let storage = Arc::clone(&self.storage);
        self.autosave.schedule(move || {
            if let Err(e) = save_document(&state, storage.as_ref()) {
                tracing::warn!("Autosave failed: {e}");
            }
        });
    }

    /// Load the image for `background`, whose display state was already reset.
    fn load_background(&self, background: Background) {
        match background {
            Background::Blank => {}
            Background::ImageData(data) => {
                let image = match BackgroundImage::decode(&data) {
                    Ok(image) => Some(Arc::new(image)),
                    Err(e) => {
                        tracing::warn!("Background image data is unusable: {e}");
                        None
                    }
                };
                if image.is_some() {
                    self.state.send_if_modified(|state| {
                        if !matches!(state.model.background(), Background::ImageData(current) if *current == data)
                        {
                            return false;
                        }
                        state.background_image = image;
                        state.revision += 1;
                        true
                    });
                }
            }
            Background::Url(url) => self.spawn_fetch(url),
        }
    }

    fn spawn_fetch(&self, url: Url) {
        let state = Arc::clone(&self.state);
        let fetcher = Arc::clone(&self.fetcher);
        tracing::debug!("Fetching background {url}");

        self.runtime.spawn(async move {
            let image = match fetcher.fetch(&url).await {
                Ok(bytes) => decode_off_thread(bytes).await,
                Err(e) => {
                    tracing::warn!("Failed to fetch background {url}: {e}");
                    None
                }
            };

            // The check and the apply happen under the same channel lock.
            let applied = state.send_if_modified(|state| {
                if state.model.background().url() != Some(&url) {
                    return false;
                }
                state.fetch_status = FetchStatus::Idle;
                state.background_image = image;
                state.revision += 1;
                true
            });

            if applied {
                tracing::debug!("Background {url} loaded");
            } else {
                tracing::debug!("Discarding stale fetch of {url}");
            }
        });
    }
}

impl DocumentState {
    /// Clear the image and set the fetch status the current background starts with.
    fn reset_background_display(&mut self) {
        self.background_image = None;
        self.fetch_status = if self.model.background().url().is_some() {
            FetchStatus::Fetching
        } else {
            FetchStatus::Idle
        };
    }
}

/// Decode fetched bytes on the blocking pool.
async fn decode_off_thread(bytes: Vec<u8>) -> Option<Arc<BackgroundImage>> {
    match tokio::task::spawn_blocking(move || BackgroundImage::decode(&bytes)).await {
        Ok(Ok(image)) => Some(Arc::new(image)),
        Ok(Err(e)) => {
            tracing::warn!("Fetched background is not an image: {e}");
            None
        }
        Err(e) => {
            tracing::warn!("Background decode task failed: {e}");
            None
        }
    }
}

/// Encode the live model and hand it to `storage`.
fn save_document(
    state: &watch::Sender<DocumentState>,
    storage: &dyn DocumentStorage,
) -> DocumentResult<()> {
    let data = {
        let current = state.borrow();
        if tracing::enabled!(tracing::Level::DEBUG) {
            match current.model.to_json_pretty() {
                Ok(pretty) => tracing::debug!("Saving document: {pretty}"),
                Err(e) => tracing::debug!("Saving document (not printable: {e})"),
            }
        }
        current.model.to_json()?
    };
    storage.write(&data)?;
    tracing::info!("Saved document ({} bytes)", data.len());
    Ok(())
}
