//! PIN-wrapped device documents.
//!
//! A device document stores the signing seed encrypted under a key derived
//! from the PIN, so the passphrase is not needed to unlock the device:
//!
//! ```text
//! $@   : "DevicePIN"
//! salt : passphrase salt
//! U    : PIN salt (16 random bytes)
//! N    : ChaCha20-Poly1305 nonce
//! Y    : encrypted seed (AAD = public key)
//! P    : public key
//! ```

use chacha20poly1305::aead::rand_core::RngCore;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use hibon::{Document, Hibon};
use tracing::{debug, instrument, warn};
use zeroize::Zeroizing;

use crate::error::{NetError, Result};
use crate::net::{hkdf32, SecureNet, SEED_SIZE};

/// Record name of a device document.
pub const DEVICE_RECORD: &str = "DevicePIN";
/// Width of the random PIN salt.
pub const PIN_SALT_LEN: usize = 16;
/// HKDF info for the PIN wrap key.
pub const DEVICE_PIN_INFO: &[u8] = b"hibon:devicepin:v1";

const NONCE_LEN: usize = 12;

fn wrap_cipher(pin: &[u8], pin_salt: &[u8]) -> Result<ChaCha20Poly1305> {
    let key = hkdf32(pin_salt, pin, DEVICE_PIN_INFO)?;
    Ok(ChaCha20Poly1305::new(Key::from_slice(&key[..])))
}

impl SecureNet {
    /// Exports this key as a device document locked by `pin`.
    ///
    /// A fresh PIN salt and nonce are drawn on every call.
    ///
    /// # Errors
    ///
    /// [`NetError::InvalidInput`] if the PIN is empty.
    pub fn device_document(&self, pin: &[u8]) -> Result<Vec<u8>> {
        if pin.is_empty() {
            return Err(NetError::InvalidInput("PIN must not be empty".to_string()));
        }
        let mut pin_salt = [0u8; PIN_SALT_LEN];
        OsRng.fill_bytes(&mut pin_salt);
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let public_key = self.public_key();

        let ciphertext = wrap_cipher(pin, &pin_salt)?
            .encrypt(
                &nonce,
                Payload {
                    msg: self.seed(),
                    aad: &public_key,
                },
            )
            .map_err(|_| NetError::InvalidInput("seed encryption failed".to_string()))?;

        let mut doc = Hibon::with_record_name(DEVICE_RECORD);
        doc.add_binary("salt", self.salt())?;
        doc.add_binary("U", pin_salt.as_slice())?;
        doc.add_binary("N", nonce.as_slice())?;
        doc.add_binary("Y", ciphertext)?;
        doc.add_binary("P", public_key.as_slice())?;
        Ok(doc.to_document())
    }
}

/// Derives a key from `passphrase` and `salt` and wraps it under `pin`.
///
/// Returns the key and its device document.
///
/// # Errors
///
/// [`NetError::InvalidInput`] if the passphrase or PIN is empty.
#[instrument(skip_all, fields(salt_len = salt.len()))]
pub fn generate_keypair(
    passphrase: &[u8],
    salt: &[u8],
    pin: &[u8],
) -> Result<(SecureNet, Vec<u8>)> {
    if pin.is_empty() {
        return Err(NetError::InvalidInput("PIN must not be empty".to_string()));
    }
    let net = SecureNet::from_passphrase(passphrase, salt)?;
    let device = net.device_document(pin)?;
    debug!(public_key = %hex::encode(net.public_key()), "generated key pair");
    Ok((net, device))
}

fn binary_member<'a>(doc: &Document<'a>, key: &str) -> Result<&'a [u8]> {
    doc.element_by_key(key)
        .and_then(|element| element.as_binary())
        .map_err(|e| NetError::AuthError(format!("device document member {}: {}", key, e)))
}

fn unlock(pin: &[u8], device: &[u8]) -> Result<SecureNet> {
    let doc = Document::parse(device)
        .map_err(|e| NetError::AuthError(format!("device document: {}", e)))?;
    match doc.record_name() {
        Ok(DEVICE_RECORD) => {}
        _ => {
            return Err(NetError::AuthError(
                "not a device document".to_string(),
            ))
        }
    }
    let salt = binary_member(&doc, "salt")?;
    let pin_salt = binary_member(&doc, "U")?;
    let nonce = binary_member(&doc, "N")?;
    let ciphertext = binary_member(&doc, "Y")?;
    let public_key = binary_member(&doc, "P")?;
    if nonce.len() != NONCE_LEN {
        return Err(NetError::AuthError("nonce has wrong length".to_string()));
    }

    let cipher = wrap_cipher(pin, pin_salt)
        .map_err(|e| NetError::AuthError(format!("PIN key derivation: {}", e)))?;
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: public_key,
                },
            )
            .map_err(|_| NetError::AuthError("wrong PIN or tampered document".to_string()))?,
    );
    if plaintext.len() != SEED_SIZE {
        return Err(NetError::AuthError("seed has wrong length".to_string()));
    }
    let mut seed = Zeroizing::new([0u8; SEED_SIZE]);
    seed.copy_from_slice(&plaintext);

    let net = SecureNet::from_seed(seed, salt.to_vec());
    if net.public_key().as_slice() != public_key {
        return Err(NetError::AuthError("public key mismatch".to_string()));
    }
    Ok(net)
}

/// Unlocks a device document with `pin`.
///
/// # Errors
///
/// Every failure is reported as [`NetError::AuthError`]: malformed document,
/// wrong PIN, tampering or a public key that does not match the seed.
#[instrument(skip_all, fields(len = device.len()))]
pub fn decrypt_device_pin(pin: &[u8], device: &[u8]) -> Result<SecureNet> {
    match unlock(pin, device) {
        Ok(net) => {
            debug!(public_key = %hex::encode(net.public_key()), "unlocked device document");
            Ok(net)
        }
        Err(e) => {
            warn!(error = %e, "device document rejected");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_round_trip() {
        let (net, device) = generate_keypair(b"passphrase", b"salt", b"1234").unwrap();
        let unlocked = decrypt_device_pin(b"1234", &device).unwrap();
        assert_eq!(unlocked.public_key(), net.public_key());
        assert_eq!(unlocked.salt(), b"salt");
        assert_eq!(unlocked.sign(b"m").unwrap(), net.sign(b"m").unwrap());
    }

    #[test]
    fn device_document_layout() {
        let (net, device) = generate_keypair(b"passphrase", b"salt", b"1234").unwrap();
        let doc = Document::parse(&device).unwrap();
        assert_eq!(doc.record_name().unwrap(), DEVICE_RECORD);
        let keys: Vec<String> = doc.elements().unwrap().map(|e| e.key().to_string()).collect();
        assert_eq!(keys, ["$@", "salt", "U", "N", "Y", "P"]);
        assert_eq!(doc.element_by_key("U").unwrap().as_binary().unwrap().len(), PIN_SALT_LEN);
        assert_eq!(
            doc.element_by_key("P").unwrap().as_binary().unwrap(),
            net.public_key().as_slice()
        );
    }

    #[test]
    fn wrong_pin_is_auth_error() {
        let (_, device) = generate_keypair(b"passphrase", b"salt", b"1234").unwrap();
        assert!(matches!(
            decrypt_device_pin(b"4321", &device),
            Err(NetError::AuthError(_))
        ));
    }

    #[test]
    fn empty_inputs_are_rejected() {
        assert!(matches!(
            generate_keypair(b"", b"salt", b"1234"),
            Err(NetError::InvalidInput(_))
        ));
        assert!(matches!(
            generate_keypair(b"passphrase", b"salt", b""),
            Err(NetError::InvalidInput(_))
        ));
    }

    #[test]
    fn empty_pin_on_unlock_is_auth_error() {
        let (_, device) = generate_keypair(b"passphrase", b"salt", b"1234").unwrap();
        assert!(matches!(
            decrypt_device_pin(b"", &device),
            Err(NetError::AuthError(_))
        ));
    }

    #[test]
    fn garbage_is_auth_error() {
        assert!(matches!(
            decrypt_device_pin(b"1234", &[1, 2, 3]),
            Err(NetError::AuthError(_))
        ));
        let other = Hibon::with_record_name("Other").to_document();
        assert!(matches!(
            decrypt_device_pin(b"1234", &other),
            Err(NetError::AuthError(_))
        ));
    }
}
