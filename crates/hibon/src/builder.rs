//! Mutable document builder.

use num_bigint::BigInt;

use crate::codec::{self, MAX_DEPTH};
use crate::dart::{self, DartIndex};
use crate::error::{HibonError, Result};
use crate::key::{Key, KeyRef, RECORD_NAME_KEY};
use crate::text::{self, TextFormat};
use crate::value::Value;

/// Write-side document: an ordered list of unique keys and typed values.
///
/// Name keys and index keys share one ordered sequence, and members keep the
/// position they were inserted at. Adding a key that already exists fails
/// with [`HibonError::DuplicateKey`]; use [`Hibon::replace`] to overwrite a
/// value in place.
///
/// # Example
///
/// ```rust
/// use hibon::Hibon;
///
/// let mut doc = Hibon::new();
/// doc.add_string("name", "alice")?;
/// doc.add_i32("age", 30)?;
/// let bytes = doc.to_document();
/// assert_eq!(hibon::decode(&bytes)?, doc);
/// # Ok::<(), hibon::HibonError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hibon {
    members: Vec<(Key, Value)>,
}

impl Hibon {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a document whose first member is the record name.
    pub fn with_record_name(name: impl Into<String>) -> Self {
        Self {
            members: vec![(Key::Name(RECORD_NAME_KEY.to_string()), Value::String(name.into()))],
        }
    }

    /// Appends a member.
    ///
    /// # Errors
    ///
    /// - [`HibonError::InvalidKey`] when a name key is empty or malformed
    /// - [`HibonError::DuplicateKey`] when the key is already present
    /// - [`HibonError::NestingTooDeep`] when the value nests more than
    ///   [`MAX_DEPTH`] containers
    pub fn add(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        key.validate()?;
        if self.position(key.as_key_ref()).is_some() {
            return Err(HibonError::DuplicateKey(key.to_string()));
        }
        let value = value.into();
        check_nesting(&value)?;
        self.members.push((key, value));
        Ok(())
    }

    /// Sets a member, overwriting an existing value at its original position.
    ///
    /// Returns the previous value, if any.
    pub fn replace(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> Result<Option<Value>> {
        let key = key.into();
        key.validate()?;
        let value = value.into();
        check_nesting(&value)?;
        match self.position(key.as_key_ref()) {
            Some(pos) => Ok(Some(std::mem::replace(&mut self.members[pos].1, value))),
            None => {
                self.members.push((key, value));
                Ok(None)
            }
        }
    }

    /// Adds a boolean.
    pub fn add_bool(&mut self, key: impl Into<Key>, value: bool) -> Result<()> {
        self.add(key, Value::Bool(value))
    }

    /// Adds a signed 32-bit integer.
    pub fn add_i32(&mut self, key: impl Into<Key>, value: i32) -> Result<()> {
        self.add(key, Value::Int32(value))
    }

    /// Adds a signed 64-bit integer.
    pub fn add_i64(&mut self, key: impl Into<Key>, value: i64) -> Result<()> {
        self.add(key, Value::Int64(value))
    }

    /// Adds an unsigned 32-bit integer.
    pub fn add_u32(&mut self, key: impl Into<Key>, value: u32) -> Result<()> {
        self.add(key, Value::Uint32(value))
    }

    /// Adds an unsigned 64-bit integer.
    pub fn add_u64(&mut self, key: impl Into<Key>, value: u64) -> Result<()> {
        self.add(key, Value::Uint64(value))
    }

    /// Adds a 32-bit float.
    pub fn add_f32(&mut self, key: impl Into<Key>, value: f32) -> Result<()> {
        self.add(key, Value::Float32(value))
    }

    /// Adds a 64-bit float.
    pub fn add_f64(&mut self, key: impl Into<Key>, value: f64) -> Result<()> {
        self.add(key, Value::Float64(value))
    }

    /// Adds a UTF-8 string.
    pub fn add_string(&mut self, key: impl Into<Key>, value: impl Into<String>) -> Result<()> {
        self.add(key, Value::String(value.into()))
    }

    /// Adds a binary blob.
    pub fn add_binary(&mut self, key: impl Into<Key>, value: impl Into<Vec<u8>>) -> Result<()> {
        self.add(key, Value::Binary(value.into()))
    }

    /// Adds an arbitrary precision integer.
    pub fn add_bigint(&mut self, key: impl Into<Key>, value: impl Into<BigInt>) -> Result<()> {
        self.add(key, Value::BigInt(value.into()))
    }

    /// Adds a timestamp (microseconds since the Unix epoch).
    pub fn add_time(&mut self, key: impl Into<Key>, micros: i64) -> Result<()> {
        self.add(key, Value::Time(micros))
    }

    /// Adds a nested builder document.
    pub fn add_hibon(&mut self, key: impl Into<Key>, value: Hibon) -> Result<()> {
        self.add(key, Value::Document(value))
    }

    /// Adds a nested document given as canonical bytes.
    ///
    /// The bytes are validated and decoded; malformed input is rejected with
    /// [`HibonError::MalformedEncoding`].
    pub fn add_document(&mut self, key: impl Into<Key>, bytes: &[u8]) -> Result<()> {
        let doc = codec::decode(bytes)?;
        self.add(key, Value::Document(doc))
    }

    /// Adds an array of documents.
    pub fn add_array(&mut self, key: impl Into<Key>, items: Vec<Hibon>) -> Result<()> {
        self.add(key, Value::Array(items))
    }

    /// Returns `true` when a member with this key exists.
    pub fn has_member(&self, key: impl Into<Key>) -> bool {
        self.position(key.into().as_key_ref()).is_some()
    }

    /// Removes a member. Returns `false` when the key was absent.
    pub fn remove(&mut self, key: impl Into<Key>) -> bool {
        match self.position(key.into().as_key_ref()) {
            Some(pos) => {
                self.members.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Looks up a member value.
    pub fn get(&self, key: impl Into<Key>) -> Option<&Value> {
        let key = key.into();
        self.position(key.as_key_ref()).map(|pos| &self.members[pos].1)
    }

    /// Record name, when the first member is a `$@` string.
    pub fn record_name(&self) -> Option<&str> {
        match self.members.first() {
            Some((Key::Name(name), Value::String(record))) if name == RECORD_NAME_KEY => Some(record),
            _ => None,
        }
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` when the document has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.members.iter().map(|(k, v)| (k, v))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.members.iter().map(|(k, _)| k)
    }

    /// Canonical bytes of this document.
    pub fn to_document(&self) -> Vec<u8> {
        codec::encode(self)
    }

    /// Renders the document as text.
    pub fn to_text(&self, format: TextFormat) -> Result<String> {
        text::render_hibon(self, format)
    }

    /// Content address of the canonical bytes.
    pub fn dart_index(&self) -> Result<DartIndex> {
        dart::dart_index(&self.to_document())
    }

    /// Deepest container level among the members; 0 when all are scalars.
    pub fn nesting(&self) -> usize {
        self.members.iter().map(|(_, v)| v.nesting()).max().unwrap_or(0)
    }

    fn position(&self, key: KeyRef<'_>) -> Option<usize> {
        self.members.iter().position(|(k, _)| *k == key)
    }
}

fn check_nesting(value: &Value) -> Result<()> {
    if value.nesting() > MAX_DEPTH {
        return Err(HibonError::NestingTooDeep(MAX_DEPTH));
    }
    Ok(())
}
