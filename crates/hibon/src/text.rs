//! Human-readable renderings of documents.
//!
//! The JSON form keeps member order. Strings and booleans map to JSON
//! natives; every other scalar is written as a `[type, value]` pair so the
//! type tag survives, e.g. `["i32", 30]` or `["u64", "18446744073709551615"]`.
//! A document whose keys are exactly `0..n` renders as a JSON array. In any
//! other document an index key is written as its decimal text, so a name key
//! spelled the same way cannot be rendered and the call fails.

use base64::Engine;
use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Number, Value as Json};
use std::str::FromStr;

use crate::builder::Hibon;
use crate::document::{Document, Element};
use crate::error::{HibonError, Result};
use crate::key::KeyRef;
use crate::value::ValueType;

/// Text rendering selected by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextFormat {
    /// Compact JSON.
    Json,
    /// Indented JSON.
    PrettyJson,
    /// Base64URL (no padding) of the canonical bytes.
    Base64,
    /// Lowercase hex of the canonical bytes.
    Hex,
}

impl TextFormat {
    /// Parses the numeric format code used at the API boundary.
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(TextFormat::Json),
            1 => Ok(TextFormat::PrettyJson),
            2 => Ok(TextFormat::Base64),
            3 => Ok(TextFormat::Hex),
            other => Err(HibonError::UnknownTextFormat(other)),
        }
    }

    /// Numeric format code.
    pub fn code(self) -> i32 {
        match self {
            TextFormat::Json => 0,
            TextFormat::PrettyJson => 1,
            TextFormat::Base64 => 2,
            TextFormat::Hex => 3,
        }
    }
}

impl FromStr for TextFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "json" => Ok(TextFormat::Json),
            "pretty-json" | "pretty" => Ok(TextFormat::PrettyJson),
            "base64" => Ok(TextFormat::Base64),
            "hex" => Ok(TextFormat::Hex),
            other => Err(format!("unknown text format: {}", other)),
        }
    }
}

pub(crate) fn render_hibon(doc: &Hibon, format: TextFormat) -> Result<String> {
    let bytes = doc.to_document();
    render_document(&Document::new(&bytes), format)
}

pub(crate) fn render_document(doc: &Document<'_>, format: TextFormat) -> Result<String> {
    match format {
        TextFormat::Json => Ok(serde_json::to_string(&to_json(doc)?)?),
        TextFormat::PrettyJson => Ok(serde_json::to_string_pretty(&to_json(doc)?)?),
        TextFormat::Base64 => {
            doc.validate()?;
            Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(doc.as_bytes()))
        }
        TextFormat::Hex => {
            doc.validate()?;
            Ok(hex::encode(doc.as_bytes()))
        }
    }
}

/// Converts a document view into its JSON value form.
///
/// # Errors
///
/// - [`HibonError::MalformedEncoding`] when the bytes do not validate
/// - [`HibonError::AmbiguousTextKey`] when a name key and an index key share
///   the same text
pub fn to_json(doc: &Document<'_>) -> Result<Json> {
    doc.validate()?;
    document_json(doc)
}

fn document_json(doc: &Document<'_>) -> Result<Json> {
    let elements: Vec<Element<'_>> = doc.elements()?.collect();
    let is_array = !elements.is_empty()
        && elements
            .iter()
            .enumerate()
            .all(|(i, e)| e.key() == KeyRef::Index(i as u32));
    if is_array {
        let items = elements
            .iter()
            .map(element_json)
            .collect::<Result<Vec<_>>>()?;
        return Ok(Json::Array(items));
    }
    let mut map = Map::new();
    for element in &elements {
        let key = element.key().to_string();
        if map.contains_key(&key) {
            return Err(HibonError::AmbiguousTextKey(key));
        }
        map.insert(key, element_json(element)?);
    }
    Ok(Json::Object(map))
}

fn typed(value_type: ValueType, value: Json) -> Json {
    json!([value_type.name(), value])
}

fn float_json(value: f64, bits: String) -> Json {
    Number::from_f64(value)
        .map(Json::Number)
        .unwrap_or(Json::String(bits))
}

fn element_json(element: &Element<'_>) -> Result<Json> {
    let value_type = element.value_type();
    let json = match value_type {
        ValueType::Bool => Json::Bool(element.as_bool()?),
        ValueType::String => Json::String(element.as_str()?.to_string()),
        ValueType::Int32 => typed(value_type, json!(element.as_i32()?)),
        ValueType::Uint32 => typed(value_type, json!(element.as_u32()?)),
        ValueType::Int64 => typed(value_type, json!(element.as_i64()?.to_string())),
        ValueType::Uint64 => typed(value_type, json!(element.as_u64()?.to_string())),
        ValueType::Float32 => {
            let v = element.as_f32()?;
            typed(value_type, float_json(f64::from(v), format!("0x{:08x}", v.to_bits())))
        }
        ValueType::Float64 => {
            let v = element.as_f64()?;
            typed(value_type, float_json(v, format!("0x{:016x}", v.to_bits())))
        }
        ValueType::Binary => {
            let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(element.as_binary()?);
            typed(value_type, json!(format!("@{}", encoded)))
        }
        ValueType::BigInt => typed(value_type, json!(element.as_bigint()?.to_string())),
        ValueType::Time => {
            let micros = element.as_time()?;
            let rendered = DateTime::from_timestamp_micros(micros)
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Micros, true))
                .unwrap_or_else(|| micros.to_string());
            typed(value_type, json!(rendered))
        }
        ValueType::Document => document_json(&element.as_document()?)?,
        ValueType::Array => Json::Array(
            element
                .as_array()?
                .iter()
                .map(document_json)
                .collect::<Result<Vec<_>>>()?,
        ),
    };
    Ok(json)
}
