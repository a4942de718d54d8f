//! Persistence adapters for the card collection.
//!
//! The ledger calls [`CardStore::save`] after every mutating operation
//! and [`CardStore::load`] once at startup. Durability is best-effort:
//! corrupt or missing data loads as an empty collection, and write
//! failures are logged and swallowed so the in-memory collection remains
//! usable for the rest of the session.

use crate::card::Card;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Durable store for the whole card collection.
///
/// The collection is persisted as one unit; every save replaces the
/// previous snapshot (last writer wins, no batching).
pub trait CardStore {
    /// Loads the stored collection. Returns an empty collection if
    /// nothing is stored or the stored data is unreadable.
    fn load(&self) -> Vec<Card>;

    /// Persists the collection. Failures must not propagate.
    fn save(&mut self, cards: &[Card]);
}

/// File-backed store holding the collection as one JSON array.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store backed by the given file path. The file is not
    /// touched until the first load or save.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        JsonFileStore { path: path.into() }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CardStore for JsonFileStore {
    fn load(&self) -> Vec<Card> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!("No stored cards at {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(cards) => cards,
            Err(e) => {
                warn!(
                    "Ignoring corrupt card data at {}: {}",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    fn save(&mut self, cards: &[Card]) {
        let json = match serde_json::to_string_pretty(cards) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize cards: {}", e);
                return;
            }
        };

        if let Err(e) = fs::write(&self.path, json) {
            warn!("Failed to write cards to {}: {}", self.path.display(), e);
        }
    }
}

/// In-memory store for tests and embedders that manage durability
/// themselves. Records the last saved snapshot.
#[derive(Default)]
pub struct MemoryStore {
    initial: Vec<Card>,
    saved: Option<Vec<Card>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Creates a store that loads the given cards.
    pub fn with_cards(cards: Vec<Card>) -> Self {
        MemoryStore {
            initial: cards,
            saved: None,
        }
    }

    /// The most recently saved snapshot, if any save happened.
    pub fn last_saved(&self) -> Option<&[Card]> {
        self.saved.as_deref()
    }
}

impl CardStore for MemoryStore {
    fn load(&self) -> Vec<Card> {
        self.initial.clone()
    }

    fn save(&mut self, cards: &[Card]) {
        self.saved = Some(cards.to_vec());
    }
}
