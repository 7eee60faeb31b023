//! Error types for envelope construction and parsing.

use hibon::HibonError;
use hibon_crypto::NetError;
use thiserror::Error;

/// Errors from building or reading HiRPC envelopes.
#[derive(Error, Debug)]
pub enum HiRpcError {
    /// Method name is empty.
    #[error("invalid method name: {0:?}")]
    InvalidMethod(String),
    /// A required envelope member is absent.
    #[error("envelope is missing member {0}")]
    MissingMember(&'static str),
    /// Document record name is not `HiRPC`.
    #[error("not an envelope: record name {0:?}")]
    WrongRecord(String),
    /// Top-level members are not one of the envelope layouts.
    #[error("unexpected envelope layout: {0}")]
    UnexpectedLayout(String),
    /// Params or envelope bytes are not a valid document.
    #[error("document error: {0}")]
    Hibon(#[from] HibonError),
    /// Key derivation or signing failed.
    #[error("signing error: {0}")]
    Net(#[from] NetError),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, HiRpcError>;
