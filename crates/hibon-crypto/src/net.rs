//! In-memory signing keys.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use hkdf::Hkdf;
use sha2::Sha256;
use std::fmt;
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{NetError, Result};

/// Width of an Ed25519 seed.
pub const SEED_SIZE: usize = 32;
/// Width of an Ed25519 public key.
pub const PUBLIC_KEY_SIZE: usize = 32;
/// Width of an Ed25519 signature.
pub const SIGNATURE_SIZE: usize = 64;

/// HKDF info for passphrase-derived seeds.
pub const KEYPAIR_INFO: &[u8] = b"hibon:keypair:v1";
/// HKDF info for child keys.
pub const DERIVE_INFO: &[u8] = b"hibon:derive:v1";

/// Expands `ikm` into a 32-byte secret with HKDF-SHA256.
pub(crate) fn hkdf32(salt: &[u8], ikm: &[u8], info: &[u8]) -> Result<Zeroizing<[u8; 32]>> {
    let hkdf = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut output = Zeroizing::new([0u8; 32]);
    hkdf.expand(info, &mut output[..])
        .map_err(|e| NetError::InvalidInput(format!("HKDF expansion failed: {}", e)))?;
    Ok(output)
}

/// A signing key held in memory.
///
/// Not `Clone`; the seed is wiped when the value is dropped. `Debug` shows
/// only the public key.
pub struct SecureNet {
    seed: Zeroizing<[u8; SEED_SIZE]>,
    signing_key: SigningKey,
    salt: Vec<u8>,
}

impl SecureNet {
    /// Derives a key from a passphrase and salt.
    ///
    /// # Errors
    ///
    /// [`NetError::InvalidInput`] if the passphrase is empty.
    pub fn from_passphrase(passphrase: &[u8], salt: &[u8]) -> Result<Self> {
        if passphrase.is_empty() {
            return Err(NetError::InvalidInput("passphrase must not be empty".to_string()));
        }
        let seed = hkdf32(salt, passphrase, KEYPAIR_INFO)?;
        Ok(Self::from_seed(seed, salt.to_vec()))
    }

    pub(crate) fn from_seed(seed: Zeroizing<[u8; SEED_SIZE]>, salt: Vec<u8>) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        Self {
            seed,
            signing_key,
            salt,
        }
    }

    pub(crate) fn seed(&self) -> &[u8; SEED_SIZE] {
        &self.seed
    }

    /// Salt the passphrase was stretched with.
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// Ed25519 public key.
    pub fn public_key(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Signs `message` and returns the 64-byte signature.
    ///
    /// # Errors
    ///
    /// [`NetError::SignatureError`] if the signer fails.
    pub fn sign(&self, message: &[u8]) -> Result<[u8; SIGNATURE_SIZE]> {
        let signature = self
            .signing_key
            .try_sign(message)
            .map_err(|e| NetError::SignatureError(e.to_string()))?;
        Ok(signature.to_bytes())
    }

    /// Derives a child key bound to `deriver`.
    ///
    /// The same parent and deriver always produce the same child.
    pub fn derive(&self, deriver: &[u8]) -> Result<SecureNet> {
        let seed = hkdf32(deriver, &self.seed[..], DERIVE_INFO)?;
        let child = Self::from_seed(seed, self.salt.clone());
        debug!(
            parent = %hex::encode(self.public_key()),
            child = %hex::encode(child.public_key()),
            "derived child key"
        );
        Ok(child)
    }

    /// Verifies a signature made by this key.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        verify(&self.public_key(), message, signature)
    }
}

impl fmt::Debug for SecureNet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureNet")
            .field("public_key", &hex::encode(self.public_key()))
            .finish_non_exhaustive()
    }
}

/// Signs `message` with `net`.
pub fn sign_message(net: &SecureNet, message: &[u8]) -> Result<[u8; SIGNATURE_SIZE]> {
    net.sign(message)
}

/// Checks an Ed25519 signature.
///
/// Returns `false` for malformed keys or signatures as well as for a
/// signature that does not match.
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let Ok(key_bytes) = <[u8; PUBLIC_KEY_SIZE]>::try_from(public_key) else {
        return false;
    };
    let Ok(sig_bytes) = <[u8; SIGNATURE_SIZE]>::try_from(signature) else {
        return false;
    };
    let Ok(key) = VerifyingKey::from_bytes(&key_bytes) else {
        return false;
    };
    key.verify_strict(message, &Signature::from_bytes(&sig_bytes))
        .is_ok()
}
