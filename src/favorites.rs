//! Favorites persistence for poddeck.
//!
//! The favorites store holds a flat JSON array of podcast records and is
//! the single source of truth for favorite status. Corrupt or missing data
//! is treated as an empty list; write failures are logged and swallowed so
//! the caller never has to handle persistence errors.

use crate::types::Podcast;
use log::{error, warn};
use std::fs;
use std::io;
use std::path::PathBuf;

/// Flat key-value persistence of the favorited podcast list.
///
/// The backing path is injected at construction so tests can point the
/// store at a temp file.
pub struct FavoritesStore {
    path: PathBuf,
}

impl FavoritesStore {
    /// Create a store backed by the given file path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Get the default path for the favorites file.
    ///
    /// Returns ~/.local/share/poddeck/favorites.json on Linux,
    /// or a platform-appropriate location on other systems.
    pub fn default_path() -> Result<PathBuf, io::Error> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "Could not find data directory")
            })?
            .join("poddeck");

        Ok(data_dir.join("favorites.json"))
    }

    /// Load the favorites list.
    ///
    /// A missing file, unreadable file, or corrupt JSON all yield an empty
    /// list; the failure is logged, never propagated.
    pub fn load(&self) -> Vec<Podcast> {
        if !self.path.exists() {
            return Vec::new();
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read favorites file: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(list) => list,
            Err(e) => {
                warn!("Corrupt favorites data, treating as empty: {}", e);
                Vec::new()
            }
        }
    }

    /// Persist the favorites list, best-effort.
    pub fn save(&self, favorites: &[Podcast]) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create favorites directory: {}", e);
                return;
            }
        }

        let content = match serde_json::to_string_pretty(favorites) {
            Ok(content) => content,
            Err(e) => {
                error!("Failed to serialize favorites: {}", e);
                return;
            }
        };

        if let Err(e) = fs::write(&self.path, content) {
            error!("Failed to write favorites file: {}", e);
        }
    }

    /// Add a podcast to the favorites, persisting the new list.
    ///
    /// No-op if the id is already present. The stored copy always has
    /// `is_favorite` set.
    pub fn add(&self, podcast: &Podcast) -> Vec<Podcast> {
        let mut favorites = self.load();
        if favorites.iter().any(|p| p.id == podcast.id) {
            return favorites;
        }

        let mut entry = podcast.clone();
        entry.is_favorite = true;
        favorites.push(entry);
        self.save(&favorites);
        favorites
    }

    /// Remove a podcast by id, persisting the new list.
    pub fn remove(&self, id: u64) -> Vec<Podcast> {
        let mut favorites = self.load();
        favorites.retain(|p| p.id != id);
        self.save(&favorites);
        favorites
    }

    /// Check whether a podcast id is currently favorited.
    pub fn is_favorite(&self, id: u64) -> bool {
        self.load().iter().any(|p| p.id == id)
    }
}

/// Recompute favorite status for a list of podcasts at the read boundary.
///
/// Status is never cached on the fetched records; every displayed list goes
/// through this function so the store stays authoritative.
pub fn with_favorite_status(list: Vec<Podcast>, store: &FavoritesStore) -> Vec<Podcast> {
    let favorites = store.load();
    list.into_iter()
        .map(|mut p| {
            p.is_favorite = favorites.iter().any(|f| f.id == p.id);
            p
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_store() -> FavoritesStore {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "poddeck-favorites-test-{}-{}.json",
            std::process::id(),
            n
        ));
        let _ = fs::remove_file(&path);
        FavoritesStore::new(path)
    }

    fn podcast(id: u64, title: &str) -> Podcast {
        Podcast {
            id,
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let store = temp_store();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_load_round_trip() {
        let store = temp_store();
        let list = vec![podcast(1, "One"), podcast(2, "Two")];
        store.save(&list);
        assert_eq!(store.load(), list);
    }

    #[test]
    fn test_corrupt_data_loads_as_empty() {
        let store = temp_store();
        fs::write(&store.path, "not valid json {{{").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_add_sets_favorite_flag() {
        let store = temp_store();
        let list = store.add(&podcast(7, "Seven"));
        assert_eq!(list.len(), 1);
        assert!(list[0].is_favorite);
        assert!(store.is_favorite(7));
    }

    #[test]
    fn test_add_twice_is_idempotent() {
        let store = temp_store();
        store.add(&podcast(7, "Seven"));
        let list = store.add(&podcast(7, "Seven"));
        assert_eq!(list.len(), 1);
        assert!(list[0].is_favorite);
    }

    #[test]
    fn test_remove_absent_id_is_identity() {
        let store = temp_store();
        store.add(&podcast(1, "One"));
        let list = store.remove(99);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, 1);
    }

    #[test]
    fn test_remove_persists() {
        let store = temp_store();
        store.add(&podcast(1, "One"));
        store.add(&podcast(2, "Two"));
        let list = store.remove(1);
        assert_eq!(list.len(), 1);
        assert!(!store.is_favorite(1));
        assert!(store.is_favorite(2));
    }

    #[test]
    fn test_with_favorite_status_recomputes() {
        let store = temp_store();
        store.add(&podcast(2, "Two"));

        let list = vec![podcast(1, "One"), podcast(2, "Two")];
        let tagged = with_favorite_status(list, &store);
        assert!(!tagged[0].is_favorite);
        assert!(tagged[1].is_favorite);
    }
}
