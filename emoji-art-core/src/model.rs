//! The EmojiArt document: a background plus an ordered list of placed emoji.

use std::collections::HashSet;
use std::num::NonZeroU32;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DocumentError, DocumentResult};

/// Unique identifier for an emoji within one document.
///
/// Ids start at 1 and are never zero, so a persisted `0` or negative id is a
/// decoding error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmojiId(NonZeroU32);

impl EmojiId {
    /// Create an id from a raw value. Returns `None` for zero.
    #[must_use]
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    /// The raw integer value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl std::fmt::Display for EmojiId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The canvas backdrop.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum Background {
    /// No background.
    #[default]
    Blank,
    /// A remote image that has to be fetched.
    Url(Url),
    /// Raw image bytes, already resident. Persisted as standard base64.
    ImageData(#[serde(with = "base64_bytes")] Vec<u8>),
}

impl Background {
    /// The URL, if this is a remote background.
    #[must_use]
    pub fn url(&self) -> Option<&Url> {
        match self {
            Self::Url(url) => Some(url),
            _ => None,
        }
    }

    /// Check if there is no background.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }
}

impl std::fmt::Display for Background {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank => write!(f, "blank"),
            Self::Url(url) => write!(f, "url({url})"),
            Self::ImageData(data) => write!(f, "imageData({} bytes)", data.len()),
        }
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// An emoji placed on the canvas.
///
/// Only [`EmojiArtModel`] creates or mutates emoji; outside code reads them
/// through the accessors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Emoji {
    text: String,
    x: i32,
    y: i32,
    size: i32,
    id: EmojiId,
}

impl Emoji {
    /// The emoji glyph(s).
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Horizontal offset from the canvas centre, in model units.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical offset from the canvas centre, in model units.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Nominal display size.
    #[must_use]
    pub const fn size(&self) -> i32 {
        self.size
    }

    /// Identifier, unique within the owning document.
    #[must_use]
    pub const fn id(&self) -> EmojiId {
        self.id
    }
}

/// The document model.
///
/// Equality compares the background and the emoji list; the id counter is
/// process-local and not part of the persisted form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmojiArtModel {
    background: Background,
    emojis: Vec<Emoji>,
    #[serde(skip)]
    next_id: u32,
}

impl PartialEq for EmojiArtModel {
    fn eq(&self, other: &Self) -> bool {
        self.background == other.background && self.emojis == other.emojis
    }
}

impl Eq for EmojiArtModel {}

impl EmojiArtModel {
    /// Create an empty document with a blank background.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the starter document shown when nothing was autosaved.
    #[must_use]
    pub fn seeded() -> Self {
        let mut model = Self::new();
        model.add_emoji("🥰", (-200, -100), 80);
        model.add_emoji("🫣", (50, 100), 40);
        model
    }

    /// Decode a document from JSON bytes.
    ///
    /// The id counter resumes after the highest persisted id.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Decoding`] if fields are missing or mistyped and
    /// [`DocumentError::InvalidDocument`] if two emoji share an id.
    pub fn from_json(json: &[u8]) -> DocumentResult<Self> {
        let mut model: Self = serde_json::from_slice(json)?;

        let mut seen = HashSet::with_capacity(model.emojis.len());
        for emoji in &model.emojis {
            if !seen.insert(emoji.id) {
                return Err(DocumentError::InvalidDocument(format!(
                    "duplicate emoji id {}",
                    emoji.id
                )));
            }
        }

        model.next_id = model.emojis.iter().map(|e| e.id.get()).max().unwrap_or(0);
        Ok(model)
    }

    /// Read and decode a document from a file.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Io`] if the file cannot be read, otherwise
    /// the errors of [`EmojiArtModel::from_json`].
    pub fn from_file(path: impl AsRef<Path>) -> DocumentResult<Self> {
        let data = std::fs::read(path)?;
        Self::from_json(&data)
    }

    /// Encode the background and emoji list as compact JSON.
    ///
    /// Output is deterministic: keys follow declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Decoding`] if serialization fails.
    pub fn to_json(&self) -> DocumentResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(DocumentError::Decoding)
    }

    /// Encode as indented JSON, for logs and debugging.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Decoding`] if serialization fails.
    pub fn to_json_pretty(&self) -> DocumentResult<String> {
        serde_json::to_string_pretty(self).map_err(DocumentError::Decoding)
    }

    /// The current background.
    #[must_use]
    pub fn background(&self) -> &Background {
        &self.background
    }

    /// Replace the background.
    pub fn set_background(&mut self, background: Background) {
        self.background = background;
    }

    /// Placed emoji in z-order.
    #[must_use]
    pub fn emojis(&self) -> &[Emoji] {
        &self.emojis
    }

    /// Look up an emoji by id.
    #[must_use]
    pub fn emoji(&self, id: EmojiId) -> Option<&Emoji> {
        self.emojis.iter().find(|e| e.id == id)
    }

    /// Append a new emoji and return its freshly issued id.
    ///
    /// Text, location and size are accepted as given. Returns `None` without
    /// changes once every id has been issued.
    pub fn add_emoji(
        &mut self,
        text: impl Into<String>,
        location: (i32, i32),
        size: i32,
    ) -> Option<EmojiId> {
        let id = self.next_id.checked_add(1).and_then(EmojiId::new)?;
        self.next_id = id.get();
        self.emojis.push(Emoji {
            text: text.into(),
            x: location.0,
            y: location.1,
            size,
            id,
        });
        Some(id)
    }

    /// Offset an emoji's position. Returns `false` if the id is unknown.
    pub fn move_emoji(&mut self, id: EmojiId, dx: i32, dy: i32) -> bool {
        let Some(emoji) = self.emoji_mut(id) else {
            return false;
        };
        emoji.x = emoji.x.saturating_add(dx);
        emoji.y = emoji.y.saturating_add(dy);
        true
    }

    /// Multiply an emoji's size by `factor`, rounding and clamping to at least 1.
    ///
    /// Returns `false` without changes if the id is unknown or the factor is
    /// not a finite positive number.
    pub fn scale_emoji(&mut self, id: EmojiId, factor: f64) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let Some(emoji) = self.emoji_mut(id) else {
            return false;
        };
        let scaled = (f64::from(emoji.size) * factor).round();
        // Clamped into i32 range before the cast
        #[allow(clippy::cast_possible_truncation)]
        {
            emoji.size = scaled.clamp(1.0, f64::from(i32::MAX)) as i32;
        }
        true
    }

    fn emoji_mut(&mut self, id: EmojiId) -> Option<&mut Emoji> {
        self.emojis.iter_mut().find(|e| e.id == id)
    }
}
