//! Reversible at-rest scrambling for collection files.
//!
//! `text → UTF-8 bytes → XOR with OBFUSCATION_KEY → base64`. This keeps a
//! casual `cat clients.json` from showing phone numbers. It is not encryption:
//! the key is a constant compiled into the binary.

use crate::error::PersistError;
use base64::{engine::general_purpose::STANDARD, Engine};

pub const OBFUSCATION_KEY: u8 = 0x5A;

pub fn obfuscate(plain: &str) -> String {
    let scrambled: Vec<u8> = plain.bytes().map(|b| b ^ OBFUSCATION_KEY).collect();
    STANDARD.encode(scrambled)
}

pub fn deobfuscate(encoded: &str) -> Result<String, PersistError> {
    let scrambled = STANDARD
        .decode(encoded.trim())
        .map_err(|e| PersistError::Obfuscation(e.to_string()))?;
    let plain: Vec<u8> = scrambled.into_iter().map(|b| b ^ OBFUSCATION_KEY).collect();
    String::from_utf8(plain).map_err(|e| PersistError::Obfuscation(e.to_string()))
}
