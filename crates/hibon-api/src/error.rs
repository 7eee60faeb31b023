//! Error types and status codes.

use hibon::HibonError;
use hibon_crypto::NetError;
use hibon_hirpc::HiRpcError;
use thiserror::Error;

/// Status code reported at the call boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    /// Success.
    None = 0,
    /// Recoverable failure: bad input, lookup miss, wrong PIN.
    Exception = -1,
    /// Misuse of the surface, such as a stale handle.
    Error = -2,
}

impl ErrorCode {
    /// Status of a result.
    pub fn of<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => ErrorCode::None,
            Err(e) => e.code(),
        }
    }
}

/// Errors from the call surface.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Handle is unknown or already released.
    #[error("invalid {kind} handle {id}")]
    InvalidHandle {
        /// Kind of value the handle refers to.
        kind: &'static str,
        /// Handle id.
        id: u64,
    },
    /// Document error.
    #[error(transparent)]
    Hibon(#[from] HibonError),
    /// Key or signing error.
    #[error(transparent)]
    Net(#[from] NetError),
    /// Envelope error.
    #[error(transparent)]
    HiRpc(#[from] HiRpcError),
}

impl ApiError {
    /// Status code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::InvalidHandle { .. } => ErrorCode::Error,
            _ => ErrorCode::Exception,
        }
    }
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, ApiError>;
