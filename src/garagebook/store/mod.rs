//! # Storage Layer
//!
//! Every entity collection lives in one JSON file, keyed by id:
//!
//! ```text
//! <data>/
//! ├── config.json
//! ├── clients.json        # { "<uuid>": { ...client... }, ... }
//! ├── vehicles.json
//! ├── ...
//! └── expenses/
//!     └── 2026-10.json    # one file per calendar month
//! ```
//!
//! ## Pieces
//!
//! - [`Persistence`]: loads and saves whole collections. Owns the active
//!   [`AdapterRegistry`](adapters::AdapterRegistry) and the obfuscation switch.
//! - [`repository::Repository`]: the in-memory, write-through CRUD surface for
//!   one collection file.
//! - [`adapters`]: pluggable encode/decode for dates and timestamps.
//! - [`obfuscate`]: the XOR + base64 at-rest transform.
//!
//! ## Failure Model
//!
//! Loading never fails: an unreadable or unparsable file is logged and the
//! caller's default is used. Saving returns a [`PersistError`]; the repository
//! rolls back its in-memory change when that happens, so memory and disk never
//! silently diverge.
//!
//! Files are rewritten in full on every mutation. The new content goes to a
//! temporary sibling first and is renamed over the target.

use crate::entity::EntityId;
use crate::error::PersistError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use uuid::Uuid;

pub mod adapters;
pub mod obfuscate;
pub mod repository;

use adapters::AdapterRegistry;

/// A whole collection as it is held in memory and written to disk.
pub type Collection<T> = HashMap<EntityId, T>;

/// Read-only view of the ids already taken, for [`Persistence::generate_unique_id`].
pub trait IdView {
    fn contains_id(&self, id: &EntityId) -> bool;
}

impl<V> IdView for HashMap<EntityId, V> {
    fn contains_id(&self, id: &EntityId) -> bool {
        self.contains_key(id)
    }
}

pub struct Persistence {
    adapters: RefCell<Rc<AdapterRegistry>>,
    obfuscate: Cell<bool>,
}

impl Persistence {
    pub fn new(adapters: AdapterRegistry, obfuscate: bool) -> Self {
        Self {
            adapters: RefCell::new(Rc::new(adapters)),
            obfuscate: Cell::new(obfuscate),
        }
    }

    pub fn obfuscates(&self) -> bool {
        self.obfuscate.get()
    }

    /// Switches obfuscation for later saves. Files already on disk stay readable.
    pub fn set_obfuscate(&self, obfuscate: bool) {
        self.obfuscate.set(obfuscate);
    }

    /// Replaces the active adapter set. Collections already in memory are not
    /// re-read; only later loads and saves see the new adapters.
    pub fn register_adapters(&self, adapters: AdapterRegistry) {
        *self.adapters.borrow_mut() = Rc::new(adapters);
    }

    fn active_adapters(&self) -> Rc<AdapterRegistry> {
        Rc::clone(&self.adapters.borrow())
    }

    pub fn save<C: Serialize>(&self, collection: &C, path: &Path) -> Result<(), PersistError> {
        let result = self.write(collection, path);
        if let Err(e) = &result {
            tracing::error!(path = %path.display(), error = %e, "failed to save collection");
        }
        result
    }

    fn write<C: Serialize>(&self, collection: &C, path: &Path) -> Result<(), PersistError> {
        let adapters = self.active_adapters();
        let json = adapters::with_registry(&adapters, || serde_json::to_string_pretty(collection))?;
        let payload = if self.obfuscates() {
            obfuscate::obfuscate(&json)
        } else {
            json
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = path.with_file_name(format!(".{}-{}.tmp", file_name, Uuid::new_v4()));
        fs::write(&tmp, payload)?;
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        tracing::debug!(path = %path.display(), "collection saved");
        Ok(())
    }

    /// Loads a collection, falling back to `default` on any failure.
    ///
    /// A missing file (and its directory) is created empty.
    pub fn load<C: DeserializeOwned>(&self, path: &Path, default: C) -> C {
        match self.read(path) {
            Ok(Some(collection)) => collection,
            Ok(None) => default,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not load collection, starting empty");
                default
            }
        }
    }

    fn read<C: DeserializeOwned>(&self, path: &Path) -> Result<Option<C>, PersistError> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, "")?;
            tracing::debug!(path = %path.display(), "created empty collection file");
            return Ok(None);
        }

        let raw = fs::read_to_string(path)?;
        if raw.trim().is_empty() {
            return Ok(None);
        }

        let adapters = self.active_adapters();
        // A collection is always a JSON object, and base64 never starts with '{'.
        // Sniffing keeps files readable after the obfuscation switch is flipped.
        let text = if raw.trim_start().starts_with('{') {
            if self.obfuscates() {
                tracing::debug!(path = %path.display(), "reading plain collection file");
            }
            raw
        } else {
            obfuscate::deobfuscate(&raw)?
        };

        let collection = adapters::with_registry(&adapters, || serde_json::from_str::<C>(&text))?;
        Ok(Some(collection))
    }

    pub fn generate_unique_id(&self, existing: &impl IdView) -> EntityId {
        self.generate_unique_id_with(existing, EntityId::new_random)
    }

    /// Draws ids from `next` until one is not in `existing`.
    pub fn generate_unique_id_with(
        &self,
        existing: &impl IdView,
        mut next: impl FnMut() -> EntityId,
    ) -> EntityId {
        loop {
            let candidate = next();
            if !existing.contains_id(&candidate) {
                return candidate;
            }
            tracing::debug!(id = %candidate, "id collision, drawing again");
        }
    }
}

impl Default for Persistence {
    fn default() -> Self {
        Self::new(
            AdapterRegistry::with_defaults(adapters::DEFAULT_DATE_FORMAT),
            false,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        text: String,
        #[serde(with = "adapters::adapted")]
        on: NaiveDate,
    }

    fn note(text: &str) -> Note {
        Note {
            text: text.to_string(),
            on: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
        }
    }

    fn sample() -> Collection<Note> {
        let mut c = HashMap::new();
        c.insert(EntityId::new_random(), note("first"));
        c.insert(EntityId::new_random(), note("second"));
        c
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        let p = Persistence::default();

        let notes = sample();
        p.save(&notes, &path).unwrap();

        let loaded: Collection<Note> = p.load(&path, HashMap::new());
        assert_eq!(loaded, notes);
    }

    #[test]
    fn file_is_keyed_by_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        let p = Persistence::default();
        let notes = sample();
        p.save(&notes, &path).unwrap();

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let obj = raw.as_object().unwrap();
        for id in notes.keys() {
            assert!(obj.contains_key(&id.to_string()));
        }
    }

    #[test]
    fn load_missing_path_returns_default_and_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("missing.json");
        let p = Persistence::default();

        let loaded: Collection<Note> = p.load(&path, HashMap::new());
        assert!(loaded.is_empty());
        assert!(path.exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn load_garbage_returns_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        fs::write(&path, "{ this is not json").unwrap();

        let p = Persistence::default();
        let mut fallback = HashMap::new();
        fallback.insert(EntityId::new_random(), note("fallback"));
        let loaded: Collection<Note> = p.load(&path, fallback.clone());
        assert_eq!(loaded, fallback);
    }

    #[test]
    fn obfuscated_files_are_not_plain_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        let p = Persistence::new(AdapterRegistry::with_defaults("%Y-%m-%d"), true);

        let notes = sample();
        p.save(&notes, &path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("first"));
        assert!(serde_json::from_str::<serde_json::Value>(&raw).is_err());

        let loaded: Collection<Note> = p.load(&path, HashMap::new());
        assert_eq!(loaded, notes);
    }

    #[test]
    fn obfuscating_reader_accepts_plain_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        let notes = sample();
        Persistence::default().save(&notes, &path).unwrap();

        let p = Persistence::new(AdapterRegistry::with_defaults("%Y-%m-%d"), true);
        let loaded: Collection<Note> = p.load(&path, HashMap::new());
        assert_eq!(loaded, notes);
    }

    #[test]
    fn plain_reader_accepts_obfuscated_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        let notes = sample();
        Persistence::new(AdapterRegistry::with_defaults("%Y-%m-%d"), true)
            .save(&notes, &path)
            .unwrap();

        let loaded: Collection<Note> = Persistence::default().load(&path, HashMap::new());
        assert_eq!(loaded, notes);
    }

    #[test]
    fn save_uses_registered_date_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        let p = Persistence::default();
        p.register_adapters(AdapterRegistry::with_defaults("%d/%m/%Y"));

        p.save(&sample(), &path).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("19/10/2026"));
    }

    #[test]
    fn save_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        Persistence::default().save(&sample(), &path).unwrap();

        for entry in fs::read_dir(dir.path()).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().into_owned();
            assert!(!name.ends_with(".tmp"), "leftover temp file {}", name);
        }
    }

    #[test]
    fn save_into_unwritable_location_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "a file, not a directory").unwrap();

        let result = Persistence::default().save(&sample(), &blocker.join("notes.json"));
        assert!(result.is_err());
    }

    #[test]
    fn unique_id_retries_on_collision() {
        let p = Persistence::default();
        let taken = EntityId::new_random();
        let fresh = EntityId::new_random();
        let mut existing: Collection<()> = HashMap::new();
        existing.insert(taken, ());

        let mut draws = vec![fresh, taken, taken];
        let mut calls = 0;
        let id = p.generate_unique_id_with(&existing, || {
            calls += 1;
            draws.pop().unwrap()
        });

        assert_eq!(id, fresh);
        assert_eq!(calls, 3);
    }
}
