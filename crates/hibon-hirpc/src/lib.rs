//! HiRPC request envelopes over HiBON documents.
//!
//! ## Quick Start
//!
//! ```rust
//! use hibon::Hibon;
//! use hibon_crypto::SecureNet;
//! use hibon_hirpc::{create_signed_sender, Envelope};
//!
//! let mut params = Hibon::new();
//! params.add_u64("amount", 10)?;
//! let net = SecureNet::from_passphrase(b"passphrase", b"salt")?;
//!
//! let bytes = create_signed_sender("transfer", &params.to_document(), &net, b"invoice-1")?;
//! let envelope = Envelope::parse(&bytes)?;
//! assert_eq!(envelope.method()?, "transfer");
//! assert!(envelope.verify()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
#![deny(missing_docs)]

/// Envelope builders and reader.
pub mod envelope;
/// Error types.
pub mod error;

pub use envelope::{create_sender, create_signed_sender, Envelope, HIRPC_RECORD};
pub use error::{HiRpcError, Result};
