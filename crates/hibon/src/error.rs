use thiserror::Error;

/// Errors raised while building, encoding, decoding or navigating documents.
#[derive(Error, Debug)]
pub enum HibonError {
    /// Bytes are truncated, use an unknown tag or are not in canonical form.
    #[error("malformed encoding at offset {offset}: {reason}")]
    MalformedEncoding {
        /// Byte offset (relative to the start of the buffer) where decoding failed.
        offset: usize,
        /// Reason for rejection.
        reason: String,
    },
    /// An accessor was used on an element holding another type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Type requested by the caller.
        expected: &'static str,
        /// Type stored in the document.
        found: &'static str,
    },
    /// No member with the requested name.
    #[error("key not found: {0}")]
    KeyNotFound(String),
    /// No member with the requested index or position.
    #[error("index {index} out of range (length={length})")]
    IndexOutOfRange {
        /// Requested index.
        index: u64,
        /// Number of members in the document.
        length: usize,
    },
    /// The key is already present in the builder.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    /// The key is empty, too long or contains forbidden characters.
    #[error("invalid key: {0:?}")]
    InvalidKey(String),
    /// A value nests more containers than the format accepts.
    #[error("nesting deeper than {0} levels")]
    NestingTooDeep(usize),
    /// Two members render to the same JSON object key.
    #[error("key {0:?} is ambiguous in JSON text")]
    AmbiguousTextKey(String),
    /// Input was rejected before a content address could be derived.
    #[error("invalid document: {0}")]
    InvalidDocument(Box<HibonError>),
    /// Text format code not recognised.
    #[error("unknown text format: {0}")]
    UnknownTextFormat(i32),
    /// JSON rendering failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HibonError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        HibonError::MalformedEncoding {
            offset,
            reason: reason.into(),
        }
    }

    /// Shifts the offset of a `MalformedEncoding` error by `base` bytes.
    pub(crate) fn at(self, base: usize) -> Self {
        match self {
            HibonError::MalformedEncoding { offset, reason } => HibonError::MalformedEncoding {
                offset: offset + base,
                reason,
            },
            other => other,
        }
    }
}

/// Result alias for document operations.
pub type Result<T> = std::result::Result<T, HibonError>;
