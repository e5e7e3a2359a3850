//! # Repository
//!
//! `Repository<T>` is the CRUD surface over one collection file. The whole file
//! is read once in [`Repository::open`]; after that every read is served from
//! memory and every write goes through to disk immediately.
//!
//! ## Effects
//!
//! Mutations do not notify anybody themselves. They return a [`Committed`]
//! carrying the list of [`Effect`]s that happened, and the caller (normally
//! [`Shop`](crate::shop::Shop)) decides who hears about them. That keeps the
//! flow of cross-collection updates visible at the call site.
//!
//! ## Failure
//!
//! When a save fails, the in-memory change is undone before the error is
//! returned, so the repository never holds state the disk does not.

use super::{Collection, Persistence};
use crate::entity::{Entity, EntityId};
use crate::error::{Result, ShopError};
use crate::matcher::{self, Matcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect<T> {
    Registered(T),
    Updated(T),
    Removed(T),
}

impl<T> Effect<T> {
    pub fn entity(&self) -> &T {
        match self {
            Effect::Registered(e) | Effect::Updated(e) | Effect::Removed(e) => e,
        }
    }
}

/// Result of a successful mutation.
#[derive(Debug, Clone)]
pub struct Committed<T> {
    pub id: EntityId,
    pub effects: Vec<Effect<T>>,
}

impl<T> Committed<T> {
    fn single(id: EntityId, effect: Effect<T>) -> Self {
        Self {
            id,
            effects: vec![effect],
        }
    }

    /// The entity as it was stored (or removed) by this mutation.
    pub fn entity(&self) -> Option<&T> {
        self.effects.first().map(Effect::entity)
    }
}

pub struct Repository<T: Entity> {
    path: PathBuf,
    persistence: Rc<Persistence>,
    items: Collection<T>,
}

impl<T: Entity> Repository<T> {
    pub fn open(persistence: Rc<Persistence>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut items: Collection<T> = persistence.load(&path, HashMap::new());
        for (key, entity) in items.iter_mut() {
            if entity.id() != Some(*key) {
                tracing::warn!(
                    kind = T::KIND,
                    path = %path.display(),
                    %key,
                    stored = ?entity.id(),
                    "embedded id disagrees with its key; using the key"
                );
                *entity.id_slot() = Some(*key);
            }
        }
        tracing::debug!(kind = T::KIND, path = %path.display(), count = items.len(), "repository opened");
        Self {
            path,
            persistence,
            items,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &T)> {
        self.items.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    fn persist(&self) -> Result<()> {
        self.persistence
            .save(&self.items, &self.path)
            .map_err(|source| ShopError::Persist {
                path: self.path.clone(),
                source,
            })
    }

    /// Rewrites the file from memory, e.g. after the persistence settings changed.
    pub fn flush(&self) -> Result<()> {
        self.persist()
    }

    /// Assigns a fresh id, stores and persists the entity.
    pub fn register(&mut self, mut entity: T) -> Result<Committed<T>> {
        if let Some(id) = entity.id() {
            return Err(ShopError::AlreadyRegistered { kind: T::KIND, id });
        }

        let id = self.persistence.generate_unique_id(&self.items);
        entity.assign_id(id)?;
        self.items.insert(id, entity.clone());

        if let Err(e) = self.persist() {
            self.items.remove(&id);
            return Err(e);
        }

        tracing::info!(kind = T::KIND, %id, "registered");
        Ok(Committed::single(id, Effect::Registered(entity)))
    }

    /// Replaces a stored entity. It must already carry an id known to this repository.
    pub fn update(&mut self, entity: T) -> Result<Committed<T>> {
        let id = entity.id().ok_or(ShopError::Unregistered { kind: T::KIND })?;
        if !self.items.contains_key(&id) {
            return Err(ShopError::NotFound { kind: T::KIND, id });
        }

        let previous = self.items.insert(id, entity.clone());
        if let Err(e) = self.persist() {
            if let Some(previous) = previous {
                self.items.insert(id, previous);
            }
            return Err(e);
        }

        tracing::debug!(kind = T::KIND, %id, "updated");
        Ok(Committed::single(id, Effect::Updated(entity)))
    }

    /// Removes and persists. `Ok(None)` when there was nothing to remove.
    pub fn delete(&mut self, id: &EntityId) -> Result<Option<Committed<T>>> {
        let Some(removed) = self.items.remove(id) else {
            return Ok(None);
        };

        if let Err(e) = self.persist() {
            self.items.insert(*id, removed);
            return Err(e);
        }

        tracing::info!(kind = T::KIND, %id, "removed");
        Ok(Some(Committed::single(*id, Effect::Removed(removed))))
    }

    pub fn get(&self, id: &EntityId) -> Option<&T> {
        self.items.get(id)
    }

    /// Like [`Repository::get`], but a miss is an error.
    pub fn require(&self, id: &EntityId) -> Result<&T> {
        self.get(id)
            .ok_or(ShopError::NotFound { kind: T::KIND, id: *id })
    }

    pub fn find_all(&self, predicate: impl Fn(&T) -> bool) -> Vec<&T> {
        self.items.values().filter(|e| predicate(e)).collect()
    }

    /// First match in map iteration order, which is unspecified.
    pub fn find_first(&self, predicate: impl Fn(&T) -> bool) -> Option<&T> {
        self.items.values().find(|e| predicate(e))
    }

    pub fn search<M: Matcher + ?Sized>(
        &self,
        matcher: &M,
        pattern: &str,
        extract: impl Fn(&T) -> String,
        threshold: f64,
    ) -> Vec<&T> {
        matcher::search(self.items.values(), matcher, extract, pattern, threshold)
    }

    /// Resolves a full id or a unique prefix of one (dashes optional).
    pub fn resolve(&self, query: &str) -> Result<EntityId> {
        let needle = query.trim().to_lowercase().replace('-', "");
        if needle.is_empty() {
            return Err(ShopError::NoMatch {
                kind: T::KIND,
                query: query.to_string(),
            });
        }

        let matches: Vec<EntityId> = self
            .items
            .keys()
            .filter(|id| id.as_uuid().simple().to_string().starts_with(&needle))
            .copied()
            .collect();

        match matches.as_slice() {
            [id] => Ok(*id),
            [] => Err(ShopError::NoMatch {
                kind: T::KIND,
                query: query.to_string(),
            }),
            many => Err(ShopError::Ambiguous {
                kind: T::KIND,
                query: query.to_string(),
                count: many.len(),
            }),
        }
    }
}
