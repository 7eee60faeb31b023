use num_bigint::BigInt;

use crate::builder::Hibon;
use crate::error::{HibonError, Result};

/// Type tag written in front of every member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueType {
    /// IEEE-754 binary64.
    Float64 = 0x01,
    /// UTF-8 string.
    String = 0x02,
    /// Nested document.
    Document = 0x03,
    /// Nested array of documents.
    Array = 0x04,
    /// Binary blob.
    Binary = 0x05,
    /// Boolean.
    Bool = 0x08,
    /// Signed 64-bit timestamp.
    Time = 0x09,
    /// Signed 32-bit integer.
    Int32 = 0x11,
    /// Signed 64-bit integer.
    Int64 = 0x12,
    /// Unsigned 32-bit integer.
    Uint32 = 0x14,
    /// Unsigned 64-bit integer.
    Uint64 = 0x15,
    /// IEEE-754 binary32.
    Float32 = 0x17,
    /// Arbitrary precision integer.
    BigInt = 0x1a,
}

impl ValueType {
    /// Parses a type tag byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        let value_type = match byte {
            0x01 => ValueType::Float64,
            0x02 => ValueType::String,
            0x03 => ValueType::Document,
            0x04 => ValueType::Array,
            0x05 => ValueType::Binary,
            0x08 => ValueType::Bool,
            0x09 => ValueType::Time,
            0x11 => ValueType::Int32,
            0x12 => ValueType::Int64,
            0x14 => ValueType::Uint32,
            0x15 => ValueType::Uint64,
            0x17 => ValueType::Float32,
            0x1a => ValueType::BigInt,
            _ => return None,
        };
        Some(value_type)
    }

    /// Tag byte for this type.
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Short type name used in text output and error messages.
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Float64 => "f64",
            ValueType::String => "string",
            ValueType::Document => "document",
            ValueType::Array => "array",
            ValueType::Binary => "bin",
            ValueType::Bool => "bool",
            ValueType::Time => "time",
            ValueType::Int32 => "i32",
            ValueType::Int64 => "i64",
            ValueType::Uint32 => "u32",
            ValueType::Uint64 => "u64",
            ValueType::Float32 => "f32",
            ValueType::BigInt => "big",
        }
    }
}

/// Owned member value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean.
    Bool(bool),
    /// Signed 32-bit integer.
    Int32(i32),
    /// Signed 64-bit integer.
    Int64(i64),
    /// Unsigned 32-bit integer.
    Uint32(u32),
    /// Unsigned 64-bit integer.
    Uint64(u64),
    /// IEEE-754 binary32.
    Float32(f32),
    /// IEEE-754 binary64.
    Float64(f64),
    /// UTF-8 string.
    String(String),
    /// Binary blob.
    Binary(Vec<u8>),
    /// Arbitrary precision integer.
    BigInt(BigInt),
    /// Timestamp in microseconds since the Unix epoch.
    Time(i64),
    /// Nested document.
    Document(Hibon),
    /// Array of documents, indexed from 0.
    Array(Vec<Hibon>),
}

impl Value {
    /// Type tag of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Int32(_) => ValueType::Int32,
            Value::Int64(_) => ValueType::Int64,
            Value::Uint32(_) => ValueType::Uint32,
            Value::Uint64(_) => ValueType::Uint64,
            Value::Float32(_) => ValueType::Float32,
            Value::Float64(_) => ValueType::Float64,
            Value::String(_) => ValueType::String,
            Value::Binary(_) => ValueType::Binary,
            Value::BigInt(_) => ValueType::BigInt,
            Value::Time(_) => ValueType::Time,
            Value::Document(_) => ValueType::Document,
            Value::Array(_) => ValueType::Array,
        }
    }

    /// Container levels this value adds below its parent; 0 for scalars.
    pub fn nesting(&self) -> usize {
        match self {
            Value::Document(doc) => 1 + doc.nesting(),
            Value::Array(items) => {
                1 + items.iter().map(|item| 1 + item.nesting()).max().unwrap_or(0)
            }
            _ => 0,
        }
    }

    /// Returns the string payload or a `TypeMismatch`.
    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(mismatch(ValueType::String, other.value_type())),
        }
    }

    /// Returns the nested document or a `TypeMismatch`.
    pub fn as_hibon(&self) -> Result<&Hibon> {
        match self {
            Value::Document(doc) => Ok(doc),
            other => Err(mismatch(ValueType::Document, other.value_type())),
        }
    }

    /// Returns the binary payload or a `TypeMismatch`.
    pub fn as_binary(&self) -> Result<&[u8]> {
        match self {
            Value::Binary(bytes) => Ok(bytes),
            other => Err(mismatch(ValueType::Binary, other.value_type())),
        }
    }
}

pub(crate) fn mismatch(expected: ValueType, found: ValueType) -> HibonError {
    HibonError::TypeMismatch {
        expected: expected.name(),
        found: found.name(),
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value.into())
                }
            }
        )*
    };
}

value_from!(
    bool => Bool,
    i32 => Int32,
    i64 => Int64,
    u32 => Uint32,
    u64 => Uint64,
    f32 => Float32,
    f64 => Float64,
    String => String,
    &str => String,
    Vec<u8> => Binary,
    &[u8] => Binary,
    BigInt => BigInt,
    Hibon => Document,
    Vec<Hibon> => Array,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_bytes_round_trip() {
        for byte in 0u8..=0xff {
            if let Some(value_type) = ValueType::from_byte(byte) {
                assert_eq!(value_type.to_byte(), byte);
            }
        }
        assert_eq!(ValueType::from_byte(0x00), None);
        assert_eq!(ValueType::from_byte(0x7f), None);
    }

    #[test]
    fn conversions_pick_the_matching_variant() {
        assert_eq!(Value::from(30i32).value_type(), ValueType::Int32);
        assert_eq!(Value::from(30u64).value_type(), ValueType::Uint64);
        assert_eq!(Value::from("alice").as_str().unwrap(), "alice");
        assert_eq!(Value::from(vec![1u8, 2]).as_binary().unwrap(), &[1, 2]);
    }

    #[test]
    fn accessor_reports_mismatch() {
        let err = Value::from(true).as_str().unwrap_err();
        assert!(matches!(
            err,
            HibonError::TypeMismatch {
                expected: "string",
                found: "bool"
            }
        ));
    }
}
