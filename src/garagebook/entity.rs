//! # Entity Identity
//!
//! Every persisted record carries an [`EntityId`]: a v4 UUID assigned by the
//! owning repository at registration time. Before registration the id slot is
//! empty, which is how "never persisted" is represented. Once assigned it cannot
//! be replaced; `assign_id` on a registered entity is an error.
//!
//! Records refer to each other only through ids, never through references, so
//! independently persisted collections never form ownership cycles.

use crate::error::{Result, ShopError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// First eight hex digits, used for compact listings.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A record that lives in a [`Repository`](crate::store::repository::Repository).
pub trait Entity: Clone + Serialize + DeserializeOwned + 'static {
    /// Human readable kind, used in messages and logs ("client", "vehicle").
    const KIND: &'static str;

    fn id(&self) -> Option<EntityId>;

    /// Raw access to the id slot. Only the repository should write through it.
    #[doc(hidden)]
    fn id_slot(&mut self) -> &mut Option<EntityId>;

    fn is_registered(&self) -> bool {
        self.id().is_some()
    }

    /// Assigns the id exactly once.
    fn assign_id(&mut self, id: EntityId) -> Result<()> {
        let slot = self.id_slot();
        if let Some(existing) = *slot {
            return Err(ShopError::AlreadyRegistered {
                kind: Self::KIND,
                id: existing,
            });
        }
        *slot = Some(id);
        Ok(())
    }
}

/// Implements [`Entity`] for a struct with a private `id: Option<EntityId>` field.
macro_rules! impl_entity {
    ($ty:ty, $kind:literal) => {
        impl $crate::entity::Entity for $ty {
            const KIND: &'static str = $kind;

            fn id(&self) -> Option<$crate::entity::EntityId> {
                self.id
            }

            fn id_slot(&mut self) -> &mut Option<$crate::entity::EntityId> {
                &mut self.id
            }
        }
    };
}

pub(crate) use impl_entity;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Widget {
        id: Option<EntityId>,
    }

    impl_entity!(Widget, "widget");

    #[test]
    fn assign_id_once() {
        let mut w = Widget { id: None };
        assert!(!w.is_registered());
        let id = EntityId::new_random();
        w.assign_id(id).unwrap();
        assert_eq!(w.id(), Some(id));
    }

    #[test]
    fn assigning_twice_is_rejected() {
        let mut w = Widget { id: None };
        let first = EntityId::new_random();
        w.assign_id(first).unwrap();

        let err = w.assign_id(EntityId::new_random()).unwrap_err();
        assert!(matches!(err, ShopError::AlreadyRegistered { id, .. } if id == first));
        assert_eq!(w.id(), Some(first));
    }

    #[test]
    fn parses_and_displays() {
        let id = EntityId::new_random();
        let parsed: EntityId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert_eq!(id.short().len(), 8);
        assert!(id.to_string().replace('-', "").starts_with(&id.short()));
        assert!("not-a-uuid".parse::<EntityId>().is_err());
    }
}
