//! Who is logged in, and how passwords are compared.
//!
//! Passwords are never stored. An employee record keeps a 64-bit digest (the
//! first eight bytes of SHA-256) and a login attempt succeeds when the digests
//! are equal. This keeps casual readers of the data files out; it is not meant
//! to stand up to anyone determined.

use crate::entity::EntityId;
use sha2::{Digest, Sha256};

pub fn password_hash(password: &str) -> u64 {
    let digest = Sha256::digest(password.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

pub fn verify_password(password: &str, hash: u64) -> bool {
    password_hash(password) == hash
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Session {
    current: Option<EntityId>,
}

impl Session {
    pub fn current(&self) -> Option<EntityId> {
        self.current
    }

    pub fn is_logged_in(&self) -> bool {
        self.current.is_some()
    }

    /// Returns whether the session actually changed.
    pub fn set(&mut self, employee: Option<EntityId>) -> bool {
        if self.current == employee {
            return false;
        }
        self.current = employee;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_and_discriminating() {
        assert_eq!(password_hash("hunter2"), password_hash("hunter2"));
        assert_ne!(password_hash("hunter2"), password_hash("hunter3"));
        // SHA-256("abc") starts with ba7816bf8f01cfea.
        assert_eq!(password_hash("abc"), 0xba78_16bf_8f01_cfea);
    }

    #[test]
    fn verify() {
        let hash = password_hash("s3cret");
        assert!(verify_password("s3cret", hash));
        assert!(!verify_password("S3cret", hash));
    }

    #[test]
    fn set_reports_changes() {
        let mut session = Session::default();
        let id = EntityId::new_random();
        assert!(session.set(Some(id)));
        assert!(!session.set(Some(id)));
        assert_eq!(session.current(), Some(id));
        assert!(session.set(None));
        assert!(!session.is_logged_in());
    }
}
