//! Error types for key and signature operations.

use hibon::HibonError;
use thiserror::Error;

/// Errors from key derivation, device documents and signing.
#[derive(Error, Debug)]
pub enum NetError {
    /// Wrong PIN, tampered device document or public key mismatch.
    #[error("authentication failed: {0}")]
    AuthError(String),
    /// Signing failed or a signature could not be parsed.
    #[error("signature error: {0}")]
    SignatureError(String),
    /// Caller supplied unusable input (empty passphrase or PIN, bad key length).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Document construction or parsing failed.
    #[error("document error: {0}")]
    Hibon(#[from] HibonError),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, NetError>;
