//! Zero-copy document reader.

use num_bigint::BigInt;
use std::sync::OnceLock;

use crate::builder::Hibon;
use crate::codec::{self, RawEntry};
use crate::dart::{self, DartIndex};
use crate::error::{HibonError, Result};
use crate::key::{Key, KeyRef, RECORD_NAME_KEY};
use crate::leb128::{get_sleb, get_uleb};
use crate::text::{self, TextFormat};
use crate::value::{mismatch, Value, ValueType};

type EntryTable<'a> = std::result::Result<Vec<RawEntry<'a>>, (usize, String)>;

/// Read-only view over canonical document bytes.
///
/// The view borrows its buffer and never copies it. Member lookups share an
/// offset table that is built by one linear pass on first use; after that a
/// lookup compares keys against the table without re-parsing the buffer.
/// Nested documents returned by [`Element::as_document`] are views into the
/// same buffer.
///
/// A `Document` is `Send + Sync`, so one immutable buffer can be read from
/// several threads at once.
///
/// # Example
///
/// ```rust
/// use hibon::{Document, Hibon};
///
/// let mut doc = Hibon::new();
/// doc.add_string("name", "alice")?;
/// let bytes = doc.to_document();
///
/// let view = Document::parse(&bytes)?;
/// assert_eq!(view.element_by_key("name")?.as_str()?, "alice");
/// # Ok::<(), hibon::HibonError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Document<'a> {
    data: &'a [u8],
    table: OnceLock<EntryTable<'a>>,
}

impl<'a> Document<'a> {
    /// Wraps a buffer without checking it.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            table: OnceLock::new(),
        }
    }

    /// Wraps a buffer after full structural validation.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        codec::validate(data)?;
        Ok(Self::new(data))
    }

    /// The underlying canonical bytes.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Format version from the document header.
    pub fn version(&self) -> Result<u32> {
        Ok(codec::read_header(self.data)?.version)
    }

    /// Full structural check of the buffer, including nested documents.
    pub fn validate(&self) -> Result<()> {
        codec::validate(self.data)
    }

    fn entries(&self) -> Result<&[RawEntry<'a>]> {
        let data = self.data;
        let table = self
            .table
            .get_or_init(|| codec::read_entries(data).map_err(split));
        match table {
            Ok(entries) => Ok(entries),
            Err((offset, reason)) => Err(HibonError::MalformedEncoding {
                offset: *offset,
                reason: reason.clone(),
            }),
        }
    }

    /// Number of members.
    pub fn len(&self) -> Result<usize> {
        Ok(self.entries()?.len())
    }

    /// Returns `true` when the document has no members.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.entries()?.is_empty())
    }

    /// Members in encoding order.
    pub fn elements(&self) -> Result<impl Iterator<Item = Element<'a>> + '_> {
        Ok(self.entries()?.iter().map(|entry| Element { entry: *entry }))
    }

    /// Looks up a member by name.
    pub fn element_by_key(&self, key: &str) -> Result<Element<'a>> {
        self.find(KeyRef::Name(key))
            .ok_or_else(|| HibonError::KeyNotFound(key.to_string()))
            .and_then(|found| found)
    }

    /// Looks up a member by index key.
    pub fn element_by_index(&self, index: u32) -> Result<Element<'a>> {
        let length = self.len()?;
        self.find(KeyRef::Index(index))
            .ok_or(HibonError::IndexOutOfRange {
                index: u64::from(index),
                length,
            })
            .and_then(|found| found)
    }

    /// Member at a position in encoding order.
    pub fn element_at(&self, position: usize) -> Result<Element<'a>> {
        let entries = self.entries()?;
        entries
            .get(position)
            .map(|entry| Element { entry: *entry })
            .ok_or(HibonError::IndexOutOfRange {
                index: position as u64,
                length: entries.len(),
            })
    }

    /// Returns `true` when a member with this key exists. Malformed
    /// buffers report `false`.
    pub fn has_member(&self, key: impl Into<Key>) -> bool {
        let key = key.into();
        matches!(self.find(key.as_key_ref()), Some(Ok(_)))
    }

    fn find(&self, key: KeyRef<'_>) -> Option<Result<Element<'a>>> {
        match self.entries() {
            Ok(entries) => entries
                .iter()
                .find(|entry| entry.key == key)
                .map(|entry| Ok(Element { entry: *entry })),
            Err(e) => Some(Err(e)),
        }
    }

    /// Record name held by the reserved first member `$@`.
    ///
    /// # Errors
    ///
    /// [`HibonError::KeyNotFound`] when the first member is not a `$@` string.
    pub fn record_name(&self) -> Result<&'a str> {
        let first = self.entries()?.first().copied();
        match first {
            Some(entry)
                if entry.key == KeyRef::Name(RECORD_NAME_KEY)
                    && entry.value_type == ValueType::String =>
            {
                Element { entry }.as_str()
            }
            _ => Err(HibonError::KeyNotFound(RECORD_NAME_KEY.to_string())),
        }
    }

    /// Decodes the whole document into an owned builder.
    pub fn to_hibon(&self) -> Result<Hibon> {
        codec::decode(self.data)
    }

    /// Renders the document as text.
    pub fn to_text(&self, format: TextFormat) -> Result<String> {
        text::render_document(self, format)
    }

    /// Content address of the buffer.
    pub fn dart_index(&self) -> Result<DartIndex> {
        dart::dart_index(self.data)
    }
}

fn split(err: HibonError) -> (usize, String) {
    match err {
        HibonError::MalformedEncoding { offset, reason } => (offset, reason),
        other => (0, other.to_string()),
    }
}

/// Typed accessor for one member of a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    entry: RawEntry<'a>,
}

impl<'a> Element<'a> {
    /// Member key.
    pub fn key(&self) -> KeyRef<'a> {
        self.entry.key
    }

    /// Stored type tag.
    pub fn value_type(&self) -> ValueType {
        self.entry.value_type
    }

    /// Raw value bytes as stored (LEB128 for integers, content for strings,
    /// blobs and bigints, the whole nested document for containers).
    pub fn raw_value(&self) -> &'a [u8] {
        self.entry.value
    }

    fn expect(&self, expected: ValueType) -> Result<&'a [u8]> {
        if self.entry.value_type != expected {
            return Err(mismatch(expected, self.entry.value_type));
        }
        Ok(self.entry.value)
    }

    /// Boolean value.
    pub fn as_bool(&self) -> Result<bool> {
        Ok(self.expect(ValueType::Bool)?[0] == 1)
    }

    /// Signed 32-bit value.
    pub fn as_i32(&self) -> Result<i32> {
        let raw = self.expect(ValueType::Int32)?;
        Ok(get_sleb(raw, &mut 0, 32)? as i32)
    }

    /// Signed 64-bit value.
    pub fn as_i64(&self) -> Result<i64> {
        let raw = self.expect(ValueType::Int64)?;
        get_sleb(raw, &mut 0, 64)
    }

    /// Unsigned 32-bit value.
    pub fn as_u32(&self) -> Result<u32> {
        let raw = self.expect(ValueType::Uint32)?;
        Ok(get_uleb(raw, &mut 0, 32)? as u32)
    }

    /// Unsigned 64-bit value.
    pub fn as_u64(&self) -> Result<u64> {
        let raw = self.expect(ValueType::Uint64)?;
        get_uleb(raw, &mut 0, 64)
    }

    /// 32-bit float value.
    pub fn as_f32(&self) -> Result<f32> {
        let raw = self.expect(ValueType::Float32)?;
        Ok(f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    /// 64-bit float value.
    pub fn as_f64(&self) -> Result<f64> {
        let raw = self.expect(ValueType::Float64)?;
        let mut le = [0u8; 8];
        le.copy_from_slice(raw);
        Ok(f64::from_le_bytes(le))
    }

    /// String value, borrowed from the buffer.
    pub fn as_str(&self) -> Result<&'a str> {
        let raw = self.expect(ValueType::String)?;
        std::str::from_utf8(raw)
            .map_err(|_| HibonError::malformed(self.entry.offset, "string is not UTF-8"))
    }

    /// Binary blob, borrowed from the buffer.
    pub fn as_binary(&self) -> Result<&'a [u8]> {
        self.expect(ValueType::Binary)
    }

    /// Arbitrary precision integer.
    pub fn as_bigint(&self) -> Result<BigInt> {
        Ok(BigInt::from_signed_bytes_le(self.as_bigint_bytes()?))
    }

    /// Minimal two's-complement little-endian bytes of a bigint.
    pub fn as_bigint_bytes(&self) -> Result<&'a [u8]> {
        self.expect(ValueType::BigInt)
    }

    /// Timestamp in microseconds since the Unix epoch.
    pub fn as_time(&self) -> Result<i64> {
        let raw = self.expect(ValueType::Time)?;
        get_sleb(raw, &mut 0, 64)
    }

    /// Nested document, borrowed from the buffer.
    pub fn as_document(&self) -> Result<Document<'a>> {
        Ok(Document::new(self.expect(ValueType::Document)?))
    }

    /// Nested array elements in index order, borrowed from the buffer.
    pub fn as_array(&self) -> Result<Vec<Document<'a>>> {
        let raw = self.expect(ValueType::Array)?;
        Ok(codec::read_entries(raw)?
            .into_iter()
            .map(|item| Document::new(item.value))
            .collect())
    }

    /// Decodes the value into an owned [`Value`].
    pub fn to_value(&self) -> Result<Value> {
        codec::decode_value(&self.entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Vec<u8> {
        let mut doc = Hibon::with_record_name("Person");
        doc.add_string("name", "alice").unwrap();
        doc.add_i32("age", 30).unwrap();
        doc.add_binary("pic", vec![1u8, 2, 3]).unwrap();
        doc.to_document()
    }

    #[test]
    fn lookups_by_key_and_position() {
        let bytes = person();
        let doc = Document::parse(&bytes).unwrap();
        assert_eq!(doc.len().unwrap(), 4);
        assert_eq!(doc.element_by_key("age").unwrap().as_i32().unwrap(), 30);
        assert_eq!(doc.element_at(1).unwrap().key(), KeyRef::Name("name"));
        assert!(matches!(
            doc.element_by_key("missing"),
            Err(HibonError::KeyNotFound(_))
        ));
        assert!(matches!(
            doc.element_at(4),
            Err(HibonError::IndexOutOfRange { index: 4, length: 4 })
        ));
    }

    #[test]
    fn binary_view_points_into_buffer() {
        let bytes = person();
        let doc = Document::new(&bytes);
        let pic = doc.element_by_key("pic").unwrap().as_binary().unwrap();
        assert_eq!(pic, &[1, 2, 3]);
        let start = bytes.as_ptr() as usize;
        let view = pic.as_ptr() as usize;
        assert!(view > start && view < start + bytes.len());
    }

    #[test]
    fn getters_report_type_mismatch() {
        let bytes = person();
        let doc = Document::new(&bytes);
        let age = doc.element_by_key("age").unwrap();
        assert!(matches!(
            age.as_str(),
            Err(HibonError::TypeMismatch {
                expected: "string",
                found: "i32"
            })
        ));
        assert!(age.as_i64().is_err());
        assert!(age.as_document().is_err());
    }

    #[test]
    fn record_name_requires_first_string_member() {
        let bytes = person();
        assert_eq!(Document::new(&bytes).record_name().unwrap(), "Person");

        let mut plain = Hibon::new();
        plain.add_i32(RECORD_NAME_KEY, 1).unwrap();
        let bytes = plain.to_document();
        assert!(matches!(
            Document::new(&bytes).record_name(),
            Err(HibonError::KeyNotFound(_))
        ));
    }

    #[test]
    fn index_keys_are_found_by_index() {
        let mut doc = Hibon::new();
        doc.add_string(0u32, "zero").unwrap();
        doc.add_string(5u32, "five").unwrap();
        let bytes = doc.to_document();
        let view = Document::new(&bytes);
        assert_eq!(view.element_by_index(5).unwrap().as_str().unwrap(), "five");
        assert!(matches!(
            view.element_by_index(1),
            Err(HibonError::IndexOutOfRange { index: 1, length: 2 })
        ));
        assert!(view.has_member(0u32));
        assert!(!view.has_member("0"));
    }

    #[test]
    fn malformed_buffer_errors_on_every_lookup() {
        let bytes = [0x09, 0x01, 0x00];
        let doc = Document::new(&bytes);
        assert!(doc.element_by_key("x").is_err());
        assert!(doc.element_by_key("x").is_err());
        assert!(!doc.has_member("x"));
        assert!(doc.version().is_err());
    }

    #[test]
    fn reader_is_shareable_across_threads() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<Document<'static>>();
    }
}
