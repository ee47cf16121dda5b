// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::catalog::Podcast;
use crate::error::StorageError;

use super::notify::{
    ExternalWatch, FavoritesChange, FavoritesListener, ListenerRegistry, Subscription,
};
use super::storage::{Storage, lock};

/// Storage key holding the JSON array of favorites
pub const FAVORITES_KEY: &str = "favorites";

/// A bookmarked podcast, copied from the catalog when it was saved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_count: Option<u32>,
}

impl FavoriteEntry {
    /// Project a catalog podcast onto the fields kept for a bookmark
    pub fn from_podcast(podcast: &Podcast) -> Self {
        Self {
            id: podcast.collection_id.to_string(),
            title: podcast.collection_name.clone(),
            artist: podcast.artist_name.clone(),
            image: podcast.artwork_url_600.clone(),
            genre: podcast.primary_genre_name.clone(),
            track_count: podcast.track_count,
        }
    }
}

struct StoreInner {
    storage: Box<dyn Storage>,
    registry: Arc<ListenerRegistry>,
    /// Last document this store wrote or synchronized. The lock also
    /// serializes read-modify-write cycles.
    baseline: Mutex<Option<String>>,
}

/// The single owner of bookmark state
///
/// Handles are cheap to clone and all refer to the same store. Every
/// effective mutation is persisted first and then announced to all
/// listeners registered through [`FavoritesStore::on_change`].
#[derive(Clone)]
pub struct FavoritesStore {
    inner: Arc<StoreInner>,
}

impl FavoritesStore {
    /// Open the store on top of the given storage and load its baseline
    pub fn open<S: Storage + 'static>(storage: S) -> Self {
        let baseline = storage.get(FAVORITES_KEY).unwrap_or_else(|e| {
            warn!(error = %e, "Could not read favorites, starting from empty");
            None
        });

        Self {
            inner: Arc::new(StoreInner {
                storage: Box::new(storage),
                registry: Arc::new(ListenerRegistry::default()),
                baseline: Mutex::new(baseline),
            }),
        }
    }

    /// Current favorites in insertion order
    ///
    /// Unreadable or malformed data reads as empty.
    pub fn list(&self) -> Vec<FavoriteEntry> {
        match self.read_document() {
            Ok(document) => decode_document(document.as_deref()).entries,
            Err(e) => {
                warn!(error = %e, "Could not read favorites");
                Vec::new()
            }
        }
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.list().iter().any(|entry| entry.id == id)
    }

    /// Bookmark an entry; returns `false` if its id was already present
    pub fn add(&self, entry: FavoriteEntry) -> Result<bool, StorageError> {
        let change = self.mutate(|entries| {
            if entries.iter().any(|e| e.id == entry.id) {
                return None;
            }
            let id = entry.id.clone();
            entries.push(entry);
            Some(FavoritesChange::Added(id))
        })?;
        Ok(change.is_some())
    }

    /// Remove a bookmark; returns `false` if the id was not present
    pub fn remove(&self, id: &str) -> Result<bool, StorageError> {
        let change = self.mutate(|entries| {
            let before = entries.len();
            entries.retain(|e| e.id != id);
            (entries.len() != before).then(|| FavoritesChange::Removed(id.to_string()))
        })?;
        Ok(change.is_some())
    }

    /// Add the entry if absent, remove it if present
    ///
    /// Decided against the persisted state at call time. Returns whether the
    /// entry is a favorite afterwards.
    pub fn toggle(&self, entry: FavoriteEntry) -> Result<bool, StorageError> {
        let change = self.mutate(|entries| {
            let before = entries.len();
            entries.retain(|e| e.id != entry.id);
            if entries.len() != before {
                Some(FavoritesChange::Removed(entry.id.clone()))
            } else {
                let id = entry.id.clone();
                entries.push(entry);
                Some(FavoritesChange::Added(id))
            }
        })?;
        Ok(matches!(change, Some(FavoritesChange::Added(_))))
    }

    /// Remove every bookmark
    pub fn clear_all(&self) -> Result<(), StorageError> {
        self.mutate(|entries| {
            if entries.is_empty() {
                return None;
            }
            entries.clear();
            Some(FavoritesChange::Cleared)
        })?;
        Ok(())
    }

    /// Register a listener for changes; it stays registered while the
    /// returned [`Subscription`] lives
    pub fn on_change<L: FavoritesListener + 'static>(&self, listener: L) -> Subscription {
        let id = self.inner.registry.register(Arc::new(listener));
        Subscription::new(&self.inner.registry, id)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Pick up changes written by another process
    ///
    /// Compares the persisted document against the last one this store
    /// wrote or synchronized and notifies [`FavoritesChange::External`] once
    /// if they differ. The store's own writes never show up here.
    pub fn sync_external(&self) -> bool {
        let changed = {
            let mut baseline = lock(&self.inner.baseline);
            match self.read_document() {
                Ok(current) if current != *baseline => {
                    *baseline = current;
                    true
                }
                Ok(_) => false,
                Err(e) => {
                    warn!(error = %e, "Could not check favorites for external changes");
                    false
                }
            }
        };

        if changed {
            debug!("Favorites changed outside this process");
            self.inner.registry.notify(&FavoritesChange::External);
        }
        changed
    }

    /// Run [`FavoritesStore::sync_external`] every `period` in the background
    ///
    /// Listeners hear about changes from other processes without polling
    /// themselves. The poll ends when the returned handle is dropped or once
    /// every handle to this store is gone. Must be called from within a Tokio
    /// runtime, and `period` must be non-zero.
    pub fn watch_external(&self, period: Duration) -> ExternalWatch {
        let store = Arc::downgrade(&self.inner);

        let task = tokio::spawn(async move {
            let mut ticks = tokio::time::interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticks.tick().await;
                let Some(inner) = store.upgrade() else {
                    debug!("Favorites store closed, stopping external watch");
                    break;
                };
                FavoritesStore { inner }.sync_external();
            }
        });

        ExternalWatch::new(task)
    }

    fn read_document(&self) -> Result<Option<String>, StorageError> {
        self.inner.storage.get(FAVORITES_KEY)
    }

    /// Whole-value read-modify-write; `apply` returns `None` for a no-op
    fn mutate<F>(&self, apply: F) -> Result<Option<FavoritesChange>, StorageError>
    where
        F: FnOnce(&mut Vec<FavoriteEntry>) -> Option<FavoritesChange>,
    {
        let change = {
            let mut baseline = lock(&self.inner.baseline);
            let document = self.read_document()?;
            let Decoded {
                mut entries,
                unreadable,
            } = decode_document(document.as_deref());

            let Some(change) = apply(&mut entries) else {
                return Ok(None);
            };

            // Records this store cannot read are written back untouched
            // unless everything was cleared
            let mut values = entries
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<Vec<_>, _>>()?;
            if !matches!(change, FavoritesChange::Cleared) {
                values.extend(unreadable);
            }

            let serialized = serde_json::to_string(&values)?;
            self.inner.storage.set(FAVORITES_KEY, &serialized)?;
            *baseline = Some(serialized);
            change
        };

        // Listeners run without any store lock held
        self.inner.registry.notify(&change);
        Ok(Some(change))
    }
}

/// Persisted favorites, split into entries and records that do not decode
/// as one
#[derive(Default)]
struct Decoded {
    entries: Vec<FavoriteEntry>,
    unreadable: Vec<Value>,
}

/// Decode the persisted array, setting aside malformed records and dropping
/// later duplicates of an id
fn decode_document(document: Option<&str>) -> Decoded {
    let Some(document) = document else {
        return Decoded::default();
    };

    let values: Vec<Value> = match serde_json::from_str(document) {
        Ok(values) => values,
        Err(e) => {
            warn!(error = %e, "Stored favorites are not a JSON array, treating as empty");
            return Decoded::default();
        }
    };

    let mut decoded = Decoded::default();
    let mut seen = HashSet::new();
    for value in values {
        match FavoriteEntry::deserialize(&value) {
            Ok(entry) => {
                if seen.insert(entry.id.clone()) {
                    decoded.entries.push(entry);
                }
            }
            Err(e) => {
                debug!(error = %e, "Keeping unreadable favorite aside");
                decoded.unreadable.push(value);
            }
        }
    }
    decoded
}
