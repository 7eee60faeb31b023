//! The handle-based call surface.
//!
//! Builders and keys live in registries owned by [`Api`]; callers hold
//! [`Handle`]s. Reader calls work directly on caller-owned byte buffers and
//! never copy them. Every failing call also records its message in the
//! last-error channel ([`Api::error_text`]).

use hibon::{BigInt, DartIndex, Document, Element, Hibon, Key, TextFormat, Value};
use hibon_crypto::{SecureNet, SIGNATURE_SIZE};
use tracing::warn;

use crate::error::{ApiError, Result};
use crate::registry::{Handle, Registry};

/// Owner of all builder and key handles.
#[derive(Debug)]
pub struct Api {
    builders: Registry<Hibon>,
    nets: Registry<SecureNet>,
    last_error: Option<String>,
}

impl Default for Api {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! element_getters {
    ($lt:lifetime; $($(#[$doc:meta])* $name:ident => $method:ident -> $ty:ty;)*) => {
        $(
            $(#[$doc])*
            pub fn $name<$lt>(&mut self, element: &Element<$lt>) -> Result<$ty> {
                let result = element.$method();
                self.track(result)
            }
        )*
    };
}

impl Api {
    /// Creates an empty surface.
    pub fn new() -> Self {
        Self {
            builders: Registry::new("hibon"),
            nets: Registry::new("securenet"),
            last_error: None,
        }
    }

    fn track<T, E: Into<ApiError>>(&mut self, result: std::result::Result<T, E>) -> Result<T> {
        result.map_err(|e| {
            let e = e.into();
            warn!(error = %e, "call failed");
            self.last_error = Some(e.to_string());
            e
        })
    }

    /// Message of the most recent failure, if not cleared.
    pub fn error_text(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Clears the last-error channel.
    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    // ---- builders ----

    /// Creates an empty builder.
    pub fn hibon_create(&mut self) -> Handle<Hibon> {
        self.builders.insert(Hibon::new())
    }

    /// Releases a builder.
    pub fn hibon_free(&mut self, handle: Handle<Hibon>) -> Result<()> {
        let result = self.builders.release(handle).map(drop);
        self.track(result)
    }

    /// Number of live builders.
    pub fn live_builders(&self) -> usize {
        self.builders.len()
    }

    /// Adds any value under a name or index key.
    pub fn hibon_add(
        &mut self,
        handle: Handle<Hibon>,
        key: impl Into<Key>,
        value: impl Into<Value>,
    ) -> Result<()> {
        let result = self
            .builders
            .get_mut(handle)
            .and_then(|doc| doc.add(key, value).map_err(ApiError::from));
        self.track(result)
    }

    /// Adds a string.
    pub fn hibon_add_string(
        &mut self,
        handle: Handle<Hibon>,
        key: impl Into<Key>,
        value: &str,
    ) -> Result<()> {
        self.hibon_add(handle, key, value)
    }

    /// Adds a binary blob.
    pub fn hibon_add_binary(
        &mut self,
        handle: Handle<Hibon>,
        key: impl Into<Key>,
        value: &[u8],
    ) -> Result<()> {
        self.hibon_add(handle, key, value)
    }

    /// Adds a boolean.
    pub fn hibon_add_bool(
        &mut self,
        handle: Handle<Hibon>,
        key: impl Into<Key>,
        value: bool,
    ) -> Result<()> {
        self.hibon_add(handle, key, value)
    }

    /// Adds a signed 32-bit integer.
    pub fn hibon_add_i32(
        &mut self,
        handle: Handle<Hibon>,
        key: impl Into<Key>,
        value: i32,
    ) -> Result<()> {
        self.hibon_add(handle, key, value)
    }

    /// Adds a signed 64-bit integer.
    pub fn hibon_add_i64(
        &mut self,
        handle: Handle<Hibon>,
        key: impl Into<Key>,
        value: i64,
    ) -> Result<()> {
        self.hibon_add(handle, key, value)
    }

    /// Adds an unsigned 32-bit integer.
    pub fn hibon_add_u32(
        &mut self,
        handle: Handle<Hibon>,
        key: impl Into<Key>,
        value: u32,
    ) -> Result<()> {
        self.hibon_add(handle, key, value)
    }

    /// Adds an unsigned 64-bit integer.
    pub fn hibon_add_u64(
        &mut self,
        handle: Handle<Hibon>,
        key: impl Into<Key>,
        value: u64,
    ) -> Result<()> {
        self.hibon_add(handle, key, value)
    }

    /// Adds a 32-bit float.
    pub fn hibon_add_f32(
        &mut self,
        handle: Handle<Hibon>,
        key: impl Into<Key>,
        value: f32,
    ) -> Result<()> {
        self.hibon_add(handle, key, value)
    }

    /// Adds a 64-bit float.
    pub fn hibon_add_f64(
        &mut self,
        handle: Handle<Hibon>,
        key: impl Into<Key>,
        value: f64,
    ) -> Result<()> {
        self.hibon_add(handle, key, value)
    }

    /// Adds a timestamp in microseconds since the Unix epoch.
    pub fn hibon_add_time(
        &mut self,
        handle: Handle<Hibon>,
        key: impl Into<Key>,
        micros: i64,
    ) -> Result<()> {
        self.hibon_add(handle, key, Value::Time(micros))
    }

    /// Adds an arbitrary precision integer.
    pub fn hibon_add_bigint(
        &mut self,
        handle: Handle<Hibon>,
        key: impl Into<Key>,
        value: BigInt,
    ) -> Result<()> {
        self.hibon_add(handle, key, value)
    }

    /// Adds a nested document given as canonical bytes.
    pub fn hibon_add_document(
        &mut self,
        handle: Handle<Hibon>,
        key: impl Into<Key>,
        bytes: &[u8],
    ) -> Result<()> {
        let result = self
            .builders
            .get_mut(handle)
            .and_then(|doc| doc.add_document(key, bytes).map_err(ApiError::from));
        self.track(result)
    }

    /// Adds a snapshot of another builder. The child handle stays live.
    pub fn hibon_add_hibon(
        &mut self,
        handle: Handle<Hibon>,
        key: impl Into<Key>,
        child: Handle<Hibon>,
    ) -> Result<()> {
        let snapshot = self.builders.get(child).cloned();
        let result = snapshot.and_then(|child| {
            self.builders
                .get_mut(handle)
                .and_then(|doc| doc.add_hibon(key, child).map_err(ApiError::from))
        });
        self.track(result)
    }

    /// Returns `true` when the builder has a member with this key.
    pub fn hibon_has_member(&mut self, handle: Handle<Hibon>, key: impl Into<Key>) -> Result<bool> {
        let result = self.builders.get(handle).map(|doc| doc.has_member(key));
        self.track(result)
    }

    /// Removes a member; returns whether one was present.
    pub fn hibon_remove(&mut self, handle: Handle<Hibon>, key: impl Into<Key>) -> Result<bool> {
        let result = self.builders.get_mut(handle).map(|doc| doc.remove(key));
        self.track(result)
    }

    /// Canonical bytes of the builder.
    pub fn hibon_get_document(&mut self, handle: Handle<Hibon>) -> Result<Vec<u8>> {
        let result = self.builders.get(handle).map(Hibon::to_document);
        self.track(result)
    }

    /// Text rendering of the builder for a numeric format code.
    pub fn hibon_get_text(&mut self, handle: Handle<Hibon>, format: i32) -> Result<String> {
        let result = self.builders.get(handle).and_then(|doc| {
            let format = TextFormat::from_code(format)?;
            Ok(doc.to_text(format)?)
        });
        self.track(result)
    }

    // ---- readers ----

    /// Validates a buffer.
    pub fn document_valid(&mut self, bytes: &[u8]) -> Result<()> {
        self.track(hibon::validate(bytes))
    }

    /// Format version of a buffer.
    pub fn document_get_version(&mut self, bytes: &[u8]) -> Result<u32> {
        self.track(Document::new(bytes).version())
    }

    /// Record name of a buffer.
    pub fn document_get_record_name<'a>(&mut self, bytes: &'a [u8]) -> Result<&'a str> {
        self.track(Document::new(bytes).record_name())
    }

    /// Member of a buffer by name.
    pub fn document_element_by_key<'a>(
        &mut self,
        bytes: &'a [u8],
        key: &str,
    ) -> Result<Element<'a>> {
        self.track(Document::new(bytes).element_by_key(key))
    }

    /// Member of a buffer by index key.
    pub fn document_element_by_index<'a>(
        &mut self,
        bytes: &'a [u8],
        index: u32,
    ) -> Result<Element<'a>> {
        self.track(Document::new(bytes).element_by_index(index))
    }

    /// Text rendering of a buffer for a numeric format code.
    pub fn document_get_text(&mut self, bytes: &[u8], format: i32) -> Result<String> {
        let result =
            TextFormat::from_code(format).and_then(|format| Document::new(bytes).to_text(format));
        self.track(result)
    }

    /// Bytes of a nested document member, borrowed from the buffer.
    pub fn document_get_document<'a>(&mut self, element: &Element<'a>) -> Result<&'a [u8]> {
        let result = element.as_document().map(|doc| doc.as_bytes());
        self.track(result)
    }

    element_getters! {
        'a;
        /// String member.
        document_get_string => as_str -> &'a str;
        /// Binary member.
        document_get_binary => as_binary -> &'a [u8];
        /// Bigint member as minimal two's-complement little-endian bytes.
        document_get_bigint => as_bigint_bytes -> &'a [u8];
        /// Time member in microseconds.
        document_get_time => as_time -> i64;
        /// Boolean member.
        document_get_bool => as_bool -> bool;
        /// Signed 32-bit member.
        document_get_i32 => as_i32 -> i32;
        /// Signed 64-bit member.
        document_get_i64 => as_i64 -> i64;
        /// Unsigned 32-bit member.
        document_get_u32 => as_u32 -> u32;
        /// Unsigned 64-bit member.
        document_get_u64 => as_u64 -> u64;
        /// 32-bit float member.
        document_get_f32 => as_f32 -> f32;
        /// 64-bit float member.
        document_get_f64 => as_f64 -> f64;
    }

    // ---- basic ----

    /// DART index of a buffer.
    pub fn create_dart_index(&mut self, bytes: &[u8]) -> Result<DartIndex> {
        self.track(hibon::dart_index(bytes))
    }

    /// Base64url (no padding) rendering of bytes.
    pub fn encode_base64url(&self, bytes: &[u8]) -> String {
        hibon::encode_base64url(bytes)
    }

    /// Library name and version.
    pub fn revision(&self) -> String {
        hibon::revision()
    }

    // ---- keys ----

    /// Derives a key and its PIN-wrapped device document.
    pub fn generate_keypair(
        &mut self,
        passphrase: &[u8],
        salt: &[u8],
        pin: &[u8],
    ) -> Result<(Handle<SecureNet>, Vec<u8>)> {
        let result = hibon_crypto::generate_keypair(passphrase, salt, pin);
        let (net, device) = self.track(result)?;
        Ok((self.nets.insert(net), device))
    }

    /// Unlocks a device document.
    pub fn decrypt_device_pin(&mut self, pin: &[u8], device: &[u8]) -> Result<Handle<SecureNet>> {
        let result = hibon_crypto::decrypt_device_pin(pin, device);
        let net = self.track(result)?;
        Ok(self.nets.insert(net))
    }

    /// Signs bytes with a key.
    pub fn sign_message(
        &mut self,
        handle: Handle<SecureNet>,
        message: &[u8],
    ) -> Result<[u8; SIGNATURE_SIZE]> {
        let result = self
            .nets
            .get(handle)
            .and_then(|net| Ok(hibon_crypto::sign_message(net, message)?));
        self.track(result)
    }

    /// Releases a key; its seed is wiped.
    pub fn net_free(&mut self, handle: Handle<SecureNet>) -> Result<()> {
        let result = self.nets.release(handle).map(drop);
        self.track(result)
    }

    // ---- envelopes ----

    /// Builds an unsigned envelope.
    pub fn hirpc_create_sender(&mut self, method: &str, params: &[u8]) -> Result<Vec<u8>> {
        self.track(hibon_hirpc::create_sender(method, params))
    }

    /// Builds a signed envelope.
    pub fn hirpc_create_signed_sender(
        &mut self,
        method: &str,
        params: &[u8],
        net: Handle<SecureNet>,
        deriver: &[u8],
    ) -> Result<Vec<u8>> {
        let result = self.nets.get(net).and_then(|net| {
            Ok(hibon_hirpc::create_signed_sender(method, params, net, deriver)?)
        });
        self.track(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use hibon::HibonError;

    #[test]
    fn builder_lifecycle() {
        let mut api = Api::new();
        let handle = api.hibon_create();
        api.hibon_add_string(handle, "name", "alice").unwrap();
        api.hibon_add_i32(handle, "age", 30).unwrap();
        assert!(api.hibon_has_member(handle, "age").unwrap());
        assert_eq!(
            api.hibon_get_text(handle, 0).unwrap(),
            r#"{"name":"alice","age":["i32",30]}"#
        );
        api.hibon_free(handle).unwrap();
        assert_eq!(api.live_builders(), 0);
    }

    #[test]
    fn failures_fill_the_error_channel() {
        let mut api = Api::new();
        let handle = api.hibon_create();
        api.hibon_add_i32(handle, "n", 1).unwrap();
        let result = api.hibon_add_i32(handle, "n", 2);
        assert_eq!(ErrorCode::of(&result), ErrorCode::Exception);
        assert!(matches!(result, Err(ApiError::Hibon(HibonError::DuplicateKey(_)))));
        assert!(api.error_text().unwrap().contains("n"));
        api.clear_error();
        assert_eq!(api.error_text(), None);
    }

    #[test]
    fn stale_handles_are_errors() {
        let mut api = Api::new();
        let handle = api.hibon_create();
        api.hibon_free(handle).unwrap();
        let result = api.hibon_free(handle);
        assert_eq!(ErrorCode::of(&result), ErrorCode::Error);
        assert!(api.hibon_add_bool(handle, "b", true).is_err());
        assert!(api.error_text().unwrap().contains("invalid hibon handle"));
    }

    #[test]
    fn child_builder_is_copied() {
        let mut api = Api::new();
        let parent = api.hibon_create();
        let child = api.hibon_create();
        api.hibon_add_u32(child, "x", 1).unwrap();
        api.hibon_add_hibon(parent, "child", child).unwrap();
        api.hibon_add_u32(child, "y", 2).unwrap();

        let bytes = api.hibon_get_document(parent).unwrap();
        let element = api.document_element_by_key(&bytes, "child").unwrap();
        let nested = api.document_get_document(&element).unwrap();
        assert_eq!(Document::new(nested).len().unwrap(), 1);
        assert_eq!(api.live_builders(), 2);
    }

    #[test]
    fn unknown_text_format_code() {
        let mut api = Api::new();
        let handle = api.hibon_create();
        assert!(matches!(
            api.hibon_get_text(handle, 42),
            Err(ApiError::Hibon(HibonError::UnknownTextFormat(42)))
        ));
        let bytes = api.hibon_get_document(handle).unwrap();
        assert_eq!(api.document_get_text(&bytes, 3).unwrap(), "0401000000");
    }
}
