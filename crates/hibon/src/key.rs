use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use crate::error::{HibonError, Result};

/// Maximum length of a name key in bytes.
pub const MAX_KEY_LEN: usize = 255;

/// Reserved key holding a document's record name.
pub const RECORD_NAME_KEY: &str = "$@";

/// Member key: either a name (object style) or a position (array style).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// UTF-8 member name.
    Name(String),
    /// Non-negative array index.
    Index(u32),
}

/// Borrowed form of [`Key`] used by the zero-copy reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyRef<'a> {
    /// UTF-8 member name.
    Name(&'a str),
    /// Non-negative array index.
    Index(u32),
}

fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\x00-\x20\x7f]+$").expect("invalid regex"))
}

/// Checks that `name` can be used as a name key.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_KEY_LEN || !key_pattern().is_match(name) {
        return Err(HibonError::InvalidKey(name.to_string()));
    }
    Ok(())
}

impl Key {
    /// Creates a validated name key.
    pub fn name(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Key::Name(name))
    }

    /// Borrows this key.
    pub fn as_key_ref(&self) -> KeyRef<'_> {
        match self {
            Key::Name(name) => KeyRef::Name(name),
            Key::Index(index) => KeyRef::Index(*index),
        }
    }

    /// Validates a key built through `From` conversions.
    pub fn validate(&self) -> Result<()> {
        match self {
            Key::Name(name) => validate_name(name),
            Key::Index(_) => Ok(()),
        }
    }
}

impl KeyRef<'_> {
    /// Converts to an owned key.
    pub fn into_owned(self) -> Key {
        match self {
            KeyRef::Name(name) => Key::Name(name.to_string()),
            KeyRef::Index(index) => Key::Index(index),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Name(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Name(value)
    }
}

impl From<&String> for Key {
    fn from(value: &String) -> Self {
        Key::Name(value.clone())
    }
}

impl From<u32> for Key {
    fn from(value: u32) -> Self {
        Key::Index(value)
    }
}

impl PartialEq<KeyRef<'_>> for Key {
    fn eq(&self, other: &KeyRef<'_>) -> bool {
        self.as_key_ref() == *other
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.as_key_ref(), f)
    }
}

impl fmt::Display for KeyRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyRef::Name(name) => write!(f, "{}", name),
            KeyRef::Index(index) => write!(f, "{}", index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_and_reserved_names() {
        assert!(Key::name("name").is_ok());
        assert!(Key::name(RECORD_NAME_KEY).is_ok());
        assert!(Key::name("#owner").is_ok());
        assert!(Key::name("navn-æøå").is_ok());
    }

    #[test]
    fn rejects_empty_and_control_names() {
        assert!(matches!(Key::name(""), Err(HibonError::InvalidKey(_))));
        assert!(Key::name("two words").is_err());
        assert!(Key::name("tab\there").is_err());
        assert!(Key::name("x".repeat(MAX_KEY_LEN + 1)).is_err());
        assert!(Key::name("x".repeat(MAX_KEY_LEN)).is_ok());
    }

    #[test]
    fn index_keys_are_always_valid() {
        assert!(Key::from(0u32).validate().is_ok());
        assert!(Key::from(u32::MAX).validate().is_ok());
    }

    #[test]
    fn display_matches_key_text() {
        assert_eq!(Key::from("age").to_string(), "age");
        assert_eq!(Key::from(7u32).to_string(), "7");
    }
}
