//! Content addressing for canonical documents.
//!
//! A DART index is `sha256(canonical_bytes)`. Member order is part of the
//! canonical bytes and therefore part of the address.

use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as Sha2Digest, Sha256};
use std::fmt;

use crate::codec;
use crate::error::{HibonError, Result};

/// Width of a DART index in bytes.
pub const DART_INDEX_SIZE: usize = 32;

/// Fixed-width content address of a canonical document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DartIndex([u8; DART_INDEX_SIZE]);

impl DartIndex {
    /// Wraps raw index bytes.
    pub fn from_bytes(bytes: [u8; DART_INDEX_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw index bytes.
    pub fn as_bytes(&self) -> &[u8; DART_INDEX_SIZE] {
        &self.0
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Base64URL (no padding) rendering.
    pub fn to_base64url(&self) -> String {
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(self.0)
    }

    /// Parses a base64url (no padding) rendering.
    pub fn from_base64url(text: &str) -> Option<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(text)
            .ok()?;
        let array: [u8; DART_INDEX_SIZE] = bytes.try_into().ok()?;
        Some(Self(array))
    }
}

impl AsRef<[u8]> for DartIndex {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for DartIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_base64url())
    }
}

impl Serialize for DartIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64url())
    }
}

impl<'de> Deserialize<'de> for DartIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        DartIndex::from_base64url(&text)
            .ok_or_else(|| serde::de::Error::custom("invalid DART index"))
    }
}

/// Derives the DART index of canonical document bytes.
///
/// The bytes are validated before hashing; an index is never derived from
/// malformed input.
///
/// # Errors
///
/// [`HibonError::InvalidDocument`] wrapping the validation failure.
pub fn dart_index(bytes: &[u8]) -> Result<DartIndex> {
    codec::validate(bytes).map_err(|e| HibonError::InvalidDocument(Box::new(e)))?;
    let hash = Sha256::digest(bytes);
    let mut index = [0u8; DART_INDEX_SIZE];
    index.copy_from_slice(&hash);
    Ok(DartIndex(index))
}
