use crate::entity::EntityId;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the persistence layer itself (reading, writing, encoding).
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Payload is not valid obfuscated text: {0}")]
    Obfuscation(String),
}

#[derive(Error, Debug)]
pub enum ShopError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: EntityId },

    #[error("{kind} {id} is already registered")]
    AlreadyRegistered { kind: &'static str, id: EntityId },

    #[error("{kind} has no id; register it before updating")]
    Unregistered { kind: &'static str },

    #[error("No {kind} matches '{query}'")]
    NoMatch { kind: &'static str, query: String },

    #[error("'{query}' is ambiguous: {count} {kind} records match")]
    Ambiguous {
        kind: &'static str,
        query: String,
        count: usize,
    },

    #[error("{referrer} points at {kind} {id}, which does not exist")]
    DanglingReference {
        referrer: &'static str,
        kind: &'static str,
        id: EntityId,
    },

    #[error("Not enough stock for {item}: {available} left, {requested} requested")]
    InsufficientStock {
        item: String,
        available: u32,
        requested: u32,
    },

    #[error("Could not save {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: PersistError,
    },

    #[error("{} listener(s) failed while handling {event}: {}", .failures.len(), first_failure(.failures))]
    Broadcast {
        event: &'static str,
        failures: Vec<ShopError>,
    },

    #[error("Invalid login for '{0}'")]
    Auth(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(String),
}

fn first_failure(failures: &[ShopError]) -> String {
    failures
        .first()
        .map(|e| e.to_string())
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, ShopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_error_reports_count_and_first_failure() {
        let err = ShopError::Broadcast {
            event: "vehicle registered",
            failures: vec![
                ShopError::Invalid("first".into()),
                ShopError::Invalid("second".into()),
            ],
        };
        assert_eq!(
            err.to_string(),
            "2 listener(s) failed while handling vehicle registered: first"
        );
    }

    #[test]
    fn persist_error_names_the_path() {
        let err = ShopError::Persist {
            path: PathBuf::from("/data/clients.json"),
            source: PersistError::Obfuscation("bad".into()),
        };
        assert!(err.to_string().contains("/data/clients.json"));
    }
}
