//! Store directory lookup for card theming.
//!
//! The directory is external data (a JSON file of store records); the
//! ledger only reads it to pick display colors and icons for a card
//! name. Lookup failures of any kind degrade to "no match".

use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One store record in the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    /// Display name.
    pub name: String,

    /// Substrings that match card names against this store.
    pub match_strings: Vec<String>,

    /// Accent color.
    pub color: String,

    /// Header background (CSS gradient or color).
    pub background: String,

    /// Local icon path.
    pub icon: String,

    /// Optional official logo URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// Loads the store directory from a JSON file.
///
/// A missing or unreadable directory is not an error: matching simply
/// degrades to "no match" for every card.
pub fn load_directory<P: AsRef<Path>>(path: P) -> Vec<Store> {
    let path = path.as_ref();
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Failed to load store directory {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(stores) => stores,
        Err(e) => {
            warn!("Ignoring invalid store directory {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Matches a card name against the directory.
///
/// Case-insensitive substring match against each store's match strings;
/// directory order is priority order, the first matching store wins.
pub fn match_store<'a>(card_name: &str, directory: &'a [Store]) -> Option<&'a Store> {
    if card_name.is_empty() {
        return None;
    }
    let lower_name = card_name.to_lowercase();
    directory.iter().find(|store| {
        store
            .match_strings
            .iter()
            .any(|m| lower_name.contains(&m.to_lowercase()))
    })
}
