//! Content records consumed by the soundboard.
//!
//! Catalog tables (animals, jobs, music...) are plain data owned by the host.
//! The service only needs each card's sound reference.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// One card of a content table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundItem {
    pub id: u32,
    pub key: String,
    pub name: String,
    #[serde(default, alias = "image")]
    pub image_path: Option<String>,
    #[serde(default, alias = "sound")]
    pub sound_path: Option<String>,
}

impl SoundItem {
    pub fn new(id: u32, key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            key: key.into(),
            name: name.into(),
            image_path: None,
            sound_path: None,
        }
    }

    pub fn with_sound(mut self, path: impl Into<String>) -> Self {
        self.sound_path = Some(path.into());
        self
    }

    pub fn with_image(mut self, path: impl Into<String>) -> Self {
        self.image_path = Some(path.into());
        self
    }

    /// Sound reference, or `None` when the card has no sound. Blank strings
    /// count as no sound.
    pub fn sound(&self) -> Option<&str> {
        self.sound_path
            .as_deref()
            .map(str::trim)
            .filter(|path| !path.is_empty())
    }
}

/// Parse a JSON array of content records.
pub fn parse_catalog(json: &str) -> Result<Vec<SoundItem>> {
    Ok(serde_json::from_str(json)?)
}

/// Sound references of `items`, skipping cards without a sound.
pub fn sound_paths(items: &[SoundItem]) -> impl Iterator<Item = &str> {
    items.iter().filter_map(SoundItem::sound)
}
