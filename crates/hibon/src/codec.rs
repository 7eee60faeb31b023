//! Canonical binary encoding.
//!
//! ```text
//! document := size:uleb128 version:u32-le entry*
//! entry    := type:u8 key value
//! key      := len:uleb128(1..=255) utf8   |   0x00 index:uleb128
//! ```
//!
//! `size` counts every byte after the size prefix. Integers use minimal
//! LEB128, floats are little-endian IEEE-754, strings, blobs and bigints are
//! length prefixed, and nested documents/arrays embed a full `document`.
//! Members appear in insertion order, so the byte sequence is a pure function
//! of the ordered member list.

use num_bigint::BigInt;
use std::collections::HashSet;

use crate::builder::Hibon;
use crate::error::{HibonError, Result};
use crate::key::{validate_name, KeyRef, MAX_KEY_LEN};
use crate::leb128::{get_sleb, get_uleb, put_sleb, put_uleb};
use crate::value::{Value, ValueType};

/// Current format version written into every document header.
pub const VERSION: u32 = 1;

/// Size of the version field that follows the size prefix.
pub const VERSION_SIZE: usize = 4;

/// Deepest container nesting accepted below the top-level document.
pub const MAX_DEPTH: usize = 64;

/// Encodes a builder document to canonical bytes.
pub fn encode(doc: &Hibon) -> Vec<u8> {
    let mut buf = Vec::new();
    write_document(&mut buf, doc);
    buf
}

/// Decodes canonical bytes into an owned builder document.
///
/// The input is fully validated first, so non-canonical spellings are
/// rejected instead of being normalised.
pub fn decode(bytes: &[u8]) -> Result<Hibon> {
    validate(bytes)?;
    decode_document(bytes)
}

/// Checks that `bytes` hold exactly one well-formed canonical document.
///
/// Never reads past the end of `bytes`.
pub fn validate(bytes: &[u8]) -> Result<()> {
    validate_container(bytes, 0, false, 0)
}

fn write_container(buf: &mut Vec<u8>, fill: impl FnOnce(&mut Vec<u8>)) {
    let mut body = Vec::with_capacity(64);
    body.extend_from_slice(&VERSION.to_le_bytes());
    fill(&mut body);
    put_uleb(buf, body.len() as u64);
    buf.extend_from_slice(&body);
}

fn write_document(buf: &mut Vec<u8>, doc: &Hibon) {
    write_container(buf, |body| {
        for (key, value) in doc.iter() {
            write_member(body, key.as_key_ref(), value);
        }
    });
}

fn write_array(buf: &mut Vec<u8>, items: &[Hibon]) {
    write_container(buf, |body| {
        for (index, item) in items.iter().enumerate() {
            body.push(ValueType::Document.to_byte());
            write_key(body, KeyRef::Index(index as u32));
            write_document(body, item);
        }
    });
}

fn write_key(buf: &mut Vec<u8>, key: KeyRef<'_>) {
    match key {
        KeyRef::Name(name) => {
            put_uleb(buf, name.len() as u64);
            buf.extend_from_slice(name.as_bytes());
        }
        KeyRef::Index(index) => {
            buf.push(0x00);
            put_uleb(buf, u64::from(index));
        }
    }
}

fn write_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    put_uleb(buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

fn write_member(buf: &mut Vec<u8>, key: KeyRef<'_>, value: &Value) {
    buf.push(value.value_type().to_byte());
    write_key(buf, key);
    match value {
        Value::Bool(b) => buf.push(u8::from(*b)),
        Value::Int32(v) => put_sleb(buf, i64::from(*v)),
        Value::Int64(v) | Value::Time(v) => put_sleb(buf, *v),
        Value::Uint32(v) => put_uleb(buf, u64::from(*v)),
        Value::Uint64(v) => put_uleb(buf, *v),
        Value::Float32(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::Float64(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::String(s) => write_bytes(buf, s.as_bytes()),
        Value::Binary(bytes) => write_bytes(buf, bytes),
        Value::BigInt(big) => write_bytes(buf, &big.to_signed_bytes_le()),
        Value::Document(doc) => write_document(buf, doc),
        Value::Array(items) => write_array(buf, items),
    }
}

/// Header of a document buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
    /// Format version.
    pub version: u32,
    /// Offset of the first entry.
    pub body_start: usize,
    /// One past the last byte of the document.
    pub end: usize,
}

/// Reads the size prefix and version of the document starting at `bytes[0]`.
///
/// The document must span the whole slice.
pub(crate) fn read_header(bytes: &[u8]) -> Result<Header> {
    let mut pos = 0;
    let size = get_uleb(bytes, &mut pos, 64)?;
    let available = (bytes.len() - pos) as u64;
    if size > available {
        return Err(HibonError::malformed(
            0,
            format!("document size {} overruns buffer of {} bytes", size, available),
        ));
    }
    if size < available {
        return Err(HibonError::malformed(
            pos + size as usize,
            "trailing bytes after document",
        ));
    }
    if size < VERSION_SIZE as u64 {
        return Err(HibonError::malformed(pos, "document too small for version"));
    }
    let version = u32::from_le_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]]);
    Ok(Header {
        version,
        body_start: pos + VERSION_SIZE,
        end: bytes.len(),
    })
}

/// One member located inside a document buffer, not yet decoded.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawEntry<'a> {
    /// Offset of the type byte.
    pub offset: usize,
    /// Member key.
    pub key: KeyRef<'a>,
    /// Member type.
    pub value_type: ValueType,
    /// Value payload: LEB bytes for integers, content for strings, blobs
    /// and bigints, the complete nested document for containers.
    pub value: &'a [u8],
}

fn take<'a>(bytes: &'a [u8], pos: &mut usize, len: usize, what: &str) -> Result<&'a [u8]> {
    let start = *pos;
    let end = start
        .checked_add(len)
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| {
            HibonError::malformed(
                start,
                format!("{} of {} bytes overruns buffer", what, len),
            )
        })?;
    *pos = end;
    Ok(&bytes[start..end])
}

fn read_len(bytes: &[u8], pos: &mut usize) -> Result<usize> {
    let start = *pos;
    let len = get_uleb(bytes, pos, 64)?;
    usize::try_from(len).map_err(|_| HibonError::malformed(start, "length does not fit in memory"))
}

/// Reads the entry at `*pos`. `bytes` must end where the enclosing document
/// ends so that no read escapes it.
pub(crate) fn read_entry<'a>(bytes: &'a [u8], pos: &mut usize) -> Result<RawEntry<'a>> {
    let offset = *pos;
    let tag = bytes[offset];
    *pos += 1;
    let value_type = ValueType::from_byte(tag)
        .ok_or_else(|| HibonError::malformed(offset, format!("unknown type tag 0x{:02x}", tag)))?;

    let key_start = *pos;
    let key_len = read_len(bytes, pos)?;
    let key = if key_len == 0 {
        KeyRef::Index(get_uleb(bytes, pos, 32)? as u32)
    } else {
        if key_len > MAX_KEY_LEN {
            return Err(HibonError::malformed(key_start, "key too long"));
        }
        let raw = take(bytes, pos, key_len, "key")?;
        let name = std::str::from_utf8(raw)
            .map_err(|_| HibonError::malformed(key_start, "key is not UTF-8"))?;
        validate_name(name).map_err(|e| HibonError::malformed(key_start, e.to_string()))?;
        KeyRef::Name(name)
    };

    let value_start = *pos;
    let value = match value_type {
        ValueType::Float64 => take(bytes, pos, 8, "f64")?,
        ValueType::Float32 => take(bytes, pos, 4, "f32")?,
        ValueType::Bool => {
            let raw = take(bytes, pos, 1, "bool")?;
            if raw[0] > 1 {
                return Err(HibonError::malformed(value_start, "bool must be 0 or 1"));
            }
            raw
        }
        ValueType::Int32 => {
            get_sleb(bytes, pos, 32)?;
            &bytes[value_start..*pos]
        }
        ValueType::Int64 | ValueType::Time => {
            get_sleb(bytes, pos, 64)?;
            &bytes[value_start..*pos]
        }
        ValueType::Uint32 => {
            get_uleb(bytes, pos, 32)?;
            &bytes[value_start..*pos]
        }
        ValueType::Uint64 => {
            get_uleb(bytes, pos, 64)?;
            &bytes[value_start..*pos]
        }
        ValueType::String => {
            let len = read_len(bytes, pos)?;
            let raw = take(bytes, pos, len, "string")?;
            if std::str::from_utf8(raw).is_err() {
                return Err(HibonError::malformed(value_start, "string is not UTF-8"));
            }
            raw
        }
        ValueType::Binary => {
            let len = read_len(bytes, pos)?;
            take(bytes, pos, len, "binary")?
        }
        ValueType::BigInt => {
            let len = read_len(bytes, pos)?;
            let raw = take(bytes, pos, len, "bigint")?;
            check_bigint(raw).map_err(|reason| HibonError::malformed(value_start, reason))?;
            raw
        }
        ValueType::Document | ValueType::Array => {
            let size = read_len(bytes, pos)?;
            take(bytes, pos, size, "document")?;
            &bytes[value_start..*pos]
        }
    };

    Ok(RawEntry {
        offset,
        key,
        value_type,
        value,
    })
}

/// Walks the entries of the document occupying all of `bytes`.
/// Nested containers are not entered.
pub(crate) fn read_entries(bytes: &[u8]) -> Result<Vec<RawEntry<'_>>> {
    let header = read_header(bytes)?;
    let mut entries = Vec::new();
    let mut seen = HashSet::new();
    let mut pos = header.body_start;
    while pos < header.end {
        let entry = read_entry(bytes, &mut pos)?;
        if !seen.insert(entry.key) {
            return Err(HibonError::malformed(
                entry.offset,
                format!("duplicate key {}", entry.key),
            ));
        }
        entries.push(entry);
    }
    Ok(entries)
}

fn check_bigint(raw: &[u8]) -> std::result::Result<(), &'static str> {
    match raw {
        [] => Err("empty bigint"),
        [.., prev, last]
            if (*last == 0x00 && prev & 0x80 == 0) || (*last == 0xff && prev & 0x80 != 0) =>
        {
            Err("non-minimal bigint")
        }
        _ => Ok(()),
    }
}

fn validate_container(bytes: &[u8], base: usize, array: bool, depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(HibonError::malformed(base, "nesting too deep"));
    }
    let header = read_header(bytes).map_err(|e| e.at(base))?;
    if header.version != VERSION {
        return Err(HibonError::malformed(
            base,
            format!("unsupported version {}", header.version),
        ));
    }
    let entries = read_entries(bytes).map_err(|e| e.at(base))?;
    for (position, entry) in entries.iter().enumerate() {
        if array {
            if entry.key != KeyRef::Index(position as u32) {
                return Err(HibonError::malformed(
                    base + entry.offset,
                    format!("array key {} out of sequence, expected {}", entry.key, position),
                ));
            }
            if entry.value_type != ValueType::Document {
                return Err(HibonError::malformed(
                    base + entry.offset,
                    "array element is not a document",
                ));
            }
        }
        let nested = base + value_offset(bytes, entry.value);
        match entry.value_type {
            ValueType::Document => validate_container(entry.value, nested, false, depth + 1)?,
            ValueType::Array => validate_container(entry.value, nested, true, depth + 1)?,
            _ => {}
        }
    }
    Ok(())
}

/// Offset of `inner` within `outer`; `inner` must be a sub-slice of `outer`.
fn value_offset(outer: &[u8], inner: &[u8]) -> usize {
    inner.as_ptr() as usize - outer.as_ptr() as usize
}

fn decode_document(bytes: &[u8]) -> Result<Hibon> {
    let mut doc = Hibon::new();
    for entry in read_entries(bytes)? {
        let value = decode_value(&entry)?;
        doc.add(entry.key.into_owned(), value)?;
    }
    Ok(doc)
}

/// Converts a located entry into an owned value.
pub(crate) fn decode_value(entry: &RawEntry<'_>) -> Result<Value> {
    let raw = entry.value;
    let mut pos = 0;
    let value = match entry.value_type {
        ValueType::Bool => Value::Bool(raw[0] == 1),
        ValueType::Int32 => Value::Int32(get_sleb(raw, &mut pos, 32)? as i32),
        ValueType::Int64 => Value::Int64(get_sleb(raw, &mut pos, 64)?),
        ValueType::Time => Value::Time(get_sleb(raw, &mut pos, 64)?),
        ValueType::Uint32 => Value::Uint32(get_uleb(raw, &mut pos, 32)? as u32),
        ValueType::Uint64 => Value::Uint64(get_uleb(raw, &mut pos, 64)?),
        ValueType::Float32 => Value::Float32(f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])),
        ValueType::Float64 => {
            let mut le = [0u8; 8];
            le.copy_from_slice(raw);
            Value::Float64(f64::from_le_bytes(le))
        }
        ValueType::String => Value::String(
            std::str::from_utf8(raw)
                .map_err(|_| HibonError::malformed(entry.offset, "string is not UTF-8"))?
                .to_string(),
        ),
        ValueType::Binary => Value::Binary(raw.to_vec()),
        ValueType::BigInt => Value::BigInt(BigInt::from_signed_bytes_le(raw)),
        ValueType::Document => Value::Document(decode_document(raw)?),
        ValueType::Array => {
            let mut items = Vec::new();
            for item in read_entries(raw)? {
                items.push(decode_document(item.value)?);
            }
            Value::Array(items)
        }
    };
    Ok(value)
}
