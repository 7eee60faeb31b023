//! HiRPC request envelopes.
//!
//! Member order is fixed:
//!
//! ```text
//! $@    : "HiRPC"
//! $msg  : { method, params }
//! $D    : deriver        (signed with a non-empty deriver)
//! $Y    : public key     (signed)
//! $sign : signature      (signed)
//! ```
//!
//! The signature covers the canonical bytes of the unsigned envelope
//! (`$@` and `$msg` only).

use hibon::{Document, Hibon, HibonError, RECORD_NAME_KEY};
use hibon_crypto::{verify, SecureNet};
use tracing::{debug, instrument};

use crate::error::{HiRpcError, Result};

/// Record name of an envelope.
pub const HIRPC_RECORD: &str = "HiRPC";
/// Message member.
pub const MSG_KEY: &str = "$msg";
/// Deriver member.
pub const DERIVER_KEY: &str = "$D";
/// Public key member.
pub const PUBKEY_KEY: &str = "$Y";
/// Signature member.
pub const SIGN_KEY: &str = "$sign";

const METHOD_KEY: &str = "method";
const PARAMS_KEY: &str = "params";

fn unsigned_envelope(method: &str, params: &[u8]) -> Result<Hibon> {
    if method.is_empty() {
        return Err(HiRpcError::InvalidMethod(method.to_string()));
    }
    let mut msg = Hibon::new();
    msg.add_string(METHOD_KEY, method)?;
    msg.add_document(PARAMS_KEY, params)?;

    let mut envelope = Hibon::with_record_name(HIRPC_RECORD);
    envelope.add_hibon(MSG_KEY, msg)?;
    Ok(envelope)
}

/// Builds an unsigned request envelope.
///
/// # Errors
///
/// - [`HiRpcError::InvalidMethod`] for an empty method
/// - [`HiRpcError::Hibon`] if `params` is not a canonical document
pub fn create_sender(method: &str, params: &[u8]) -> Result<Vec<u8>> {
    Ok(unsigned_envelope(method, params)?.to_document())
}

/// Builds a signed request envelope.
///
/// With a non-empty `deriver` the envelope is signed by `net.derive(deriver)`
/// and the deriver is recorded under `$D`; otherwise `net` signs directly.
#[instrument(skip_all, fields(method = method, deriver_len = deriver.len()))]
pub fn create_signed_sender(
    method: &str,
    params: &[u8],
    net: &SecureNet,
    deriver: &[u8],
) -> Result<Vec<u8>> {
    let unsigned = unsigned_envelope(method, params)?;
    let message = unsigned.to_document();

    let derived;
    let signer = if deriver.is_empty() {
        net
    } else {
        derived = net.derive(deriver)?;
        &derived
    };
    let signature = signer.sign(&message)?;
    let public_key = signer.public_key();

    let mut signed = unsigned;
    if !deriver.is_empty() {
        signed.add_binary(DERIVER_KEY, deriver)?;
    }
    signed.add_binary(PUBKEY_KEY, public_key.as_slice())?;
    signed.add_binary(SIGN_KEY, signature.as_slice())?;
    debug!(public_key = %hex::encode(public_key), "signed envelope");
    Ok(signed.to_document())
}

/// Read-only view of an envelope.
#[derive(Debug, Clone)]
pub struct Envelope<'a> {
    doc: Document<'a>,
    msg: Document<'a>,
}

impl<'a> Envelope<'a> {
    /// Validates `bytes` and checks the envelope shape.
    ///
    /// # Errors
    ///
    /// - [`HiRpcError::Hibon`] for malformed bytes or mistyped members
    /// - [`HiRpcError::MissingMember`] if `$@`, `$msg`, `method` or `params` is absent
    /// - [`HiRpcError::WrongRecord`] if the record name is not `HiRPC`
    /// - [`HiRpcError::UnexpectedLayout`] for members outside the fixed order,
    ///   an empty `$D`, or a `$Y` without `$sign`
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        let doc = Document::parse(bytes)?;
        match doc.record_name() {
            Ok(HIRPC_RECORD) => {}
            Ok(other) => return Err(HiRpcError::WrongRecord(other.to_string())),
            Err(_) => return Err(HiRpcError::MissingMember(RECORD_NAME_KEY)),
        }
        let msg = member(&doc, MSG_KEY)?.as_document()?;
        check_layout(&doc)?;
        let envelope = Self { doc, msg };
        envelope.method()?;
        envelope.params()?;
        if envelope.is_signed() {
            if matches!(envelope.deriver()?, Some(deriver) if deriver.is_empty()) {
                return Err(HiRpcError::UnexpectedLayout("empty deriver".to_string()));
            }
            envelope.public_key()?;
            envelope.signature()?;
        }
        Ok(envelope)
    }

    /// Envelope bytes.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.doc.as_bytes()
    }

    /// Called method.
    pub fn method(&self) -> Result<&'a str> {
        Ok(member(&self.msg, METHOD_KEY)?.as_str()?)
    }

    /// Method parameters.
    pub fn params(&self) -> Result<Document<'a>> {
        Ok(member(&self.msg, PARAMS_KEY)?.as_document()?)
    }

    /// Whether the envelope carries a signature.
    pub fn is_signed(&self) -> bool {
        self.doc.has_member(SIGN_KEY)
    }

    /// Deriver recorded under `$D`, if any.
    pub fn deriver(&self) -> Result<Option<&'a [u8]>> {
        if !self.doc.has_member(DERIVER_KEY) {
            return Ok(None);
        }
        Ok(Some(member(&self.doc, DERIVER_KEY)?.as_binary()?))
    }

    /// Signer public key.
    pub fn public_key(&self) -> Result<&'a [u8]> {
        Ok(member(&self.doc, PUBKEY_KEY)?.as_binary()?)
    }

    /// Signature bytes.
    pub fn signature(&self) -> Result<&'a [u8]> {
        Ok(member(&self.doc, SIGN_KEY)?.as_binary()?)
    }

    /// Re-encodes the signed portion (`$@` and `$msg`).
    pub fn unsigned_bytes(&self) -> Result<Vec<u8>> {
        let mut unsigned = Hibon::with_record_name(HIRPC_RECORD);
        unsigned.add_document(MSG_KEY, self.msg.as_bytes())?;
        Ok(unsigned.to_document())
    }

    /// Checks the signature against `$Y` over the unsigned bytes.
    ///
    /// An unsigned envelope does not verify. `$D` is not signed: it only names
    /// the child key, and `$Y` is the key that is checked.
    pub fn verify(&self) -> Result<bool> {
        if !self.is_signed() {
            return Ok(false);
        }
        let message = self.unsigned_bytes()?;
        Ok(verify(self.public_key()?, &message, self.signature()?))
    }
}

fn check_layout(doc: &Document<'_>) -> Result<()> {
    let keys: Vec<String> = doc.elements()?.map(|e| e.key().to_string()).collect();
    let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
    match keys.as_slice() {
        [RECORD_NAME_KEY, MSG_KEY]
        | [RECORD_NAME_KEY, MSG_KEY, PUBKEY_KEY, SIGN_KEY]
        | [RECORD_NAME_KEY, MSG_KEY, DERIVER_KEY, PUBKEY_KEY, SIGN_KEY] => Ok(()),
        _ => Err(HiRpcError::UnexpectedLayout(keys.join(", "))),
    }
}

fn member<'a>(doc: &Document<'a>, key: &'static str) -> Result<hibon::Element<'a>> {
    match doc.element_by_key(key) {
        Ok(element) => Ok(element),
        Err(HibonError::KeyNotFound(_)) => Err(HiRpcError::MissingMember(key)),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Vec<u8> {
        let mut params = Hibon::new();
        params.add_u64("amount", 10).unwrap();
        params.to_document()
    }

    #[test]
    fn unsigned_layout() {
        let bytes = create_sender("transfer", &params()).unwrap();
        let doc = Document::parse(&bytes).unwrap();
        let keys: Vec<String> = doc.elements().unwrap().map(|e| e.key().to_string()).collect();
        assert_eq!(keys, ["$@", "$msg"]);

        let envelope = Envelope::parse(&bytes).unwrap();
        assert_eq!(envelope.method().unwrap(), "transfer");
        assert_eq!(envelope.params().unwrap().as_bytes(), params().as_slice());
        assert!(!envelope.is_signed());
        assert!(!envelope.verify().unwrap());
        assert_eq!(envelope.unsigned_bytes().unwrap(), bytes);
    }

    #[test]
    fn empty_method_is_rejected() {
        assert!(matches!(
            create_sender("", &params()),
            Err(HiRpcError::InvalidMethod(_))
        ));
    }

    #[test]
    fn malformed_params_are_rejected() {
        assert!(matches!(
            create_sender("transfer", &[0x04, 0x01, 0x00]),
            Err(HiRpcError::Hibon(HibonError::MalformedEncoding { .. }))
        ));
    }

    #[test]
    fn signed_layout_without_deriver() {
        let net = SecureNet::from_passphrase(b"pw", b"salt").unwrap();
        let bytes = create_signed_sender("transfer", &params(), &net, &[]).unwrap();
        let doc = Document::parse(&bytes).unwrap();
        let keys: Vec<String> = doc.elements().unwrap().map(|e| e.key().to_string()).collect();
        assert_eq!(keys, ["$@", "$msg", "$Y", "$sign"]);

        let envelope = Envelope::parse(&bytes).unwrap();
        assert!(envelope.is_signed());
        assert_eq!(envelope.deriver().unwrap(), None);
        assert_eq!(envelope.public_key().unwrap(), net.public_key().as_slice());
        assert!(envelope.verify().unwrap());
    }

    #[test]
    fn missing_members_are_reported() {
        let mut doc = Hibon::with_record_name(HIRPC_RECORD);
        doc.add_i32("x", 1).unwrap();
        let bytes = doc.to_document();
        assert!(matches!(
            Envelope::parse(&bytes),
            Err(HiRpcError::MissingMember(MSG_KEY))
        ));
        let other = Hibon::with_record_name("Other").to_document();
        assert!(matches!(
            Envelope::parse(&other),
            Err(HiRpcError::WrongRecord(name)) if name == "Other"
        ));
        let bare = Hibon::new().to_document();
        assert!(matches!(
            Envelope::parse(&bare),
            Err(HiRpcError::MissingMember(RECORD_NAME_KEY))
        ));
    }
}
