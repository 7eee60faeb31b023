//! Handle-based call surface over HiBON documents, keys and envelopes.
//!
//! [`Api`] owns every builder and key; callers refer to them through typed
//! [`Handle`]s that are never reused. Each call returns a `Result` and a
//! failing call also leaves its message in the last-error channel, with
//! [`ErrorCode`] giving the numeric status.
//!
//! ## Quick Start
//!
//! ```rust
//! use hibon_api::{Api, ErrorCode};
//!
//! let mut api = Api::new();
//! let doc = api.hibon_create();
//! api.hibon_add_string(doc, "name", "alice")?;
//! let bytes = api.hibon_get_document(doc)?;
//! api.hibon_free(doc)?;
//!
//! let element = api.document_element_by_key(&bytes, "name")?;
//! assert_eq!(api.document_get_string(&element)?, "alice");
//!
//! let again = api.hibon_free(doc);
//! assert_eq!(ErrorCode::of(&again), ErrorCode::Error);
//! assert!(api.error_text().is_some());
//! # Ok::<(), hibon_api::ApiError>(())
//! ```
#![deny(missing_docs)]

/// The call surface.
pub mod api;
/// Error types and status codes.
pub mod error;
/// Handle registry.
pub mod registry;

pub use api::Api;
pub use error::{ApiError, ErrorCode, Result};
pub use registry::{Handle, Registry};
