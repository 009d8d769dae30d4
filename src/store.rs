//! In-memory entry collection, the single source of truth the UI renders
//! from. Every mutation is written through to storage immediately.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::error;

use crate::error::{Error, Result};
use crate::models::{Entry, EntryFilter};
use crate::storage::{Storage, KEY_ENTRIES};

pub struct CatalogStore {
    storage: Arc<Storage>,
    cache: Mutex<Vec<Entry>>,
}

impl CatalogStore {
    /// Loads the persisted collection; malformed or missing data means an
    /// empty library. Duplicate ids in stored data are dropped, first
    /// occurrence wins, so the unique-id invariant holds for any input.
    pub fn open(storage: Arc<Storage>) -> Self {
        let mut entries: Vec<Entry> = storage.load(KEY_ENTRIES).unwrap_or_default();
        let mut seen = HashSet::new();
        entries.retain(|e| seen.insert(e.id.clone()));
        CatalogStore {
            storage,
            cache: Mutex::new(entries),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Entry>>> {
        self.cache.lock().map_err(|e| Error::Internal(e.to_string()))
    }

    fn save(&self, entries: &[Entry]) {
        if let Err(e) = self.storage.save(KEY_ENTRIES, &entries) {
            error!(error = %e, "failed to persist entry collection");
        }
    }

    pub fn all(&self) -> Result<Vec<Entry>> {
        Ok(self.lock()?.clone())
    }

    pub fn get(&self, id: &str) -> Result<Option<Entry>> {
        Ok(self.lock()?.iter().find(|e| e.id == id).cloned())
    }

    /// Replace in place when the id exists (position preserved), otherwise
    /// prepend so the newest entry shows first.
    pub fn upsert(&self, entry: Entry) -> Result<()> {
        let mut entries = self.lock()?;
        match entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => entries.insert(0, entry),
        }
        let snapshot = entries.clone();
        drop(entries); // unlock before save
        self.save(&snapshot);
        Ok(())
    }

    /// No-op when the id is absent.
    pub fn remove(&self, id: &str) -> Result<()> {
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(());
        }
        let snapshot = entries.clone();
        drop(entries);
        self.save(&snapshot);
        Ok(())
    }

    /// Wholesale overwrite, used when a remote pull returns a well-formed
    /// collection. Never a merge.
    pub fn replace_all(&self, new_entries: Vec<Entry>) -> Result<()> {
        let mut entries = self.lock()?;
        *entries = new_entries;
        let snapshot = entries.clone();
        drop(entries);
        self.save(&snapshot);
        Ok(())
    }

    /// Pure read of the current collection; relative order is preserved.
    pub fn filter(&self, filter: &EntryFilter) -> Result<Vec<Entry>> {
        let entries = self.lock()?;
        let needle = filter.search.to_lowercase();
        Ok(entries
            .iter()
            .filter(|e| {
                let language_ok = filter.language.map_or(true, |l| e.language == l);
                let genre_ok = filter.genre.as_deref().map_or(true, |g| e.genre == g);
                let search_ok = needle.is_empty()
                    || e.title.to_lowercase().contains(&needle)
                    || e.description.to_lowercase().contains(&needle);
                language_ok && genre_ok && search_ok
            })
            .cloned()
            .collect())
    }
}
