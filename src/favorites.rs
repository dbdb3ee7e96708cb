use crate::models::Movie;
use crate::storage::FavoritesStorage;
use anyhow::{Context, Result};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// The user's favorite movies, most recently added first.
///
/// Every mutation that changes the set rewrites the storage slot in full. A failed
/// write is logged and the in-memory set stays authoritative for the session.
pub struct FavoritesStore {
    entries: Vec<Movie>,
    ids: HashSet<i32>,
    storage: Box<dyn FavoritesStorage>,
}

impl FavoritesStore {
    /// Reads the slot once. Anything unreadable degrades to an empty set.
    pub fn load(storage: Box<dyn FavoritesStorage>) -> Self {
        let entries = match read_entries(storage.as_ref()) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to load favorites, starting empty: {:#}", e);
                Vec::new()
            }
        };

        let mut store = Self {
            entries: Vec::with_capacity(entries.len()),
            ids: HashSet::with_capacity(entries.len()),
            storage,
        };
        for movie in entries {
            if store.ids.insert(movie.id) {
                store.entries.push(movie);
            } else {
                warn!("Dropping duplicate stored favorite {}", movie.id);
            }
        }
        info!("Loaded {} favorite(s)", store.entries.len());
        store
    }

    pub fn add(&mut self, movie: Movie) -> bool {
        if self.ids.contains(&movie.id) {
            return false;
        }
        debug!(movie_id = movie.id, title = %movie.title, "Adding favorite");
        self.ids.insert(movie.id);
        self.entries.insert(0, movie);
        self.persist();
        true
    }

    pub fn remove(&mut self, movie_id: i32) -> bool {
        if !self.ids.remove(&movie_id) {
            return false;
        }
        debug!(movie_id, "Removing favorite");
        self.entries.retain(|m| m.id != movie_id);
        self.persist();
        true
    }

    /// Returns the membership after the call.
    pub fn toggle(&mut self, movie: Movie) -> bool {
        if self.ids.contains(&movie.id) {
            self.remove(movie.id);
            false
        } else {
            self.add(movie)
        }
    }

    pub fn is_favorite(&self, movie_id: i32) -> bool {
        self.ids.contains(&movie_id)
    }

    pub fn clear(&mut self) {
        info!("Clearing {} favorite(s)", self.entries.len());
        self.entries.clear();
        self.ids.clear();
        self.persist();
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn favorites(&self) -> &[Movie] {
        &self.entries
    }

    /// The exact text written to the slot.
    pub fn snapshot(&self) -> Result<String> {
        serde_json::to_string(&self.entries).context("serializing favorites")
    }

    fn persist(&self) {
        let result = self
            .snapshot()
            .and_then(|json| self.storage.write(&json));
        if let Err(e) = result {
            error!("Failed to save favorites: {:#}", e);
        }
    }
}

fn read_entries(storage: &dyn FavoritesStorage) -> Result<Vec<Movie>> {
    match storage.read()? {
        Some(raw) => serde_json::from_str(&raw).context("stored favorites are not valid JSON"),
        None => Ok(Vec::new()),
    }
}
