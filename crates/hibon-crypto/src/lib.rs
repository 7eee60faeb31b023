//! Keys and signatures for HiBON documents.
//!
//! This crate provides:
//! - [`SecureNet`], an Ed25519 signing key derived from a passphrase and salt
//! - [`generate_keypair`] / [`decrypt_device_pin`], PIN-wrapped device documents
//! - [`sign_message`] / [`verify`] over arbitrary bytes
//!
//! ## Quick Start
//!
//! ```rust
//! use hibon_crypto::{decrypt_device_pin, generate_keypair, verify};
//!
//! let (net, device) = generate_keypair(b"passphrase", b"salt", b"1234")?;
//! let signature = net.sign(b"hello")?;
//! assert!(verify(&net.public_key(), b"hello", &signature));
//!
//! let unlocked = decrypt_device_pin(b"1234", &device)?;
//! assert_eq!(unlocked.public_key(), net.public_key());
//! # Ok::<(), hibon_crypto::NetError>(())
//! ```
#![deny(missing_docs)]

/// PIN-wrapped device documents.
pub mod device;
/// Error types.
pub mod error;
/// Signing keys.
pub mod net;

pub use device::{decrypt_device_pin, generate_keypair, DEVICE_RECORD, PIN_SALT_LEN};
pub use error::{NetError, Result};
pub use net::{sign_message, verify, SecureNet, PUBLIC_KEY_SIZE, SIGNATURE_SIZE};
