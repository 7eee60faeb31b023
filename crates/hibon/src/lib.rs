//! HiBON: a self-describing, canonical binary document format.
//!
//! This crate provides:
//! - [`Hibon`], a builder that accumulates typed members in insertion order
//! - [`encode`] / [`decode`], the canonical byte codec
//! - [`Document`], a zero-copy reader with random access by key or index
//! - [`dart_index`], the content address of canonical bytes
//! - text renderings selected by [`TextFormat`]
//!
//! Core invariants:
//! - Canonical bytes are a pure function of the ordered member list
//! - `encode(decode(b)) == b` for every accepted `b`; non-canonical input is rejected
//! - Keys are unique within a document
//!
//! ## Quick Start
//!
//! ```rust
//! use hibon::{dart_index, Document, Hibon, TextFormat};
//!
//! let mut doc = Hibon::new();
//! doc.add_string("name", "alice")?;
//! doc.add_i32("age", 30)?;
//! let bytes = doc.to_document();
//!
//! let view = Document::parse(&bytes)?;
//! assert_eq!(view.element_by_key("age")?.as_i32()?, 30);
//! assert_eq!(view.to_text(TextFormat::Json)?, r#"{"name":"alice","age":["i32",30]}"#);
//!
//! let index = dart_index(&bytes)?;
//! println!("stored at {}", index);
//! # Ok::<(), hibon::HibonError>(())
//! ```
#![deny(missing_docs)]

/// Base64url and revision helpers.
pub mod basic;
/// Mutable document builder.
pub mod builder;
/// Canonical encoder, decoder and validator.
pub mod codec;
/// Content addressing.
pub mod dart;
/// Zero-copy reader.
pub mod document;
/// Error types.
pub mod error;
/// Member keys.
pub mod key;
/// Minimal LEB128 integers.
pub mod leb128;
/// Text renderings.
pub mod text;
/// Typed values and type tags.
pub mod value;

pub use basic::{decode_base64url, encode_base64url, revision};
pub use builder::Hibon;
pub use codec::{decode, encode, validate, MAX_DEPTH, VERSION};
pub use dart::{dart_index, DartIndex, DART_INDEX_SIZE};
pub use document::{Document, Element};
pub use error::{HibonError, Result};
pub use key::{Key, KeyRef, MAX_KEY_LEN, RECORD_NAME_KEY};
pub use text::TextFormat;
pub use value::{Value, ValueType};

/// Re-exported bigint type used by [`Value::BigInt`].
pub use num_bigint::BigInt;
