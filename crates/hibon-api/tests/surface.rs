use hibon::{BigInt, Document, HibonError};
use hibon_api::{Api, ApiError, ErrorCode};
use hibon_crypto::NetError;
use hibon_hirpc::Envelope;

#[test]
fn build_read_and_address_a_document() {
    let mut api = Api::new();
    let doc = api.hibon_create();
    api.hibon_add_string(doc, "name", "alice").unwrap();
    api.hibon_add_i32(doc, "age", 30).unwrap();
    api.hibon_add_bigint(doc, "big", BigInt::from(-129)).unwrap();
    api.hibon_add_time(doc, "at", 42).unwrap();
    api.hibon_add_binary(doc, 7u32, &[1, 2, 3]).unwrap();
    assert!(api.hibon_has_member(doc, 7u32).unwrap());
    assert!(api.hibon_remove(doc, 7u32).unwrap());
    assert!(!api.hibon_remove(doc, 7u32).unwrap());
    let bytes = api.hibon_get_document(doc).unwrap();

    api.document_valid(&bytes).unwrap();
    assert_eq!(api.document_get_version(&bytes).unwrap(), 1);
    let age = api.document_element_by_key(&bytes, "age").unwrap();
    assert_eq!(api.document_get_i32(&age).unwrap(), 30);
    let big = api.document_element_by_key(&bytes, "big").unwrap();
    assert_eq!(api.document_get_bigint(&big).unwrap(), &[0x7f, 0xff]);
    let at = api.document_element_by_key(&bytes, "at").unwrap();
    assert_eq!(api.document_get_time(&at).unwrap(), 42);

    let index = api.create_dart_index(&bytes).unwrap();
    assert_eq!(index, Document::new(&bytes).dart_index().unwrap());
    assert_eq!(api.encode_base64url(index.as_bytes()), index.to_base64url());
    assert!(api.revision().starts_with("hibon"));
}

#[test]
fn type_mismatch_is_an_exception() {
    let mut api = Api::new();
    let doc = api.hibon_create();
    api.hibon_add_u64(doc, "n", 5).unwrap();
    let bytes = api.hibon_get_document(doc).unwrap();
    let element = api.document_element_by_key(&bytes, "n").unwrap();

    let result = api.document_get_i64(&element);
    assert_eq!(ErrorCode::of(&result), ErrorCode::Exception);
    assert!(matches!(result, Err(ApiError::Hibon(HibonError::TypeMismatch { .. }))));
    assert!(api.error_text().unwrap().contains("expected i64"));

    let missing = api.document_element_by_key(&bytes, "absent");
    assert!(matches!(missing, Err(ApiError::Hibon(HibonError::KeyNotFound(_)))));
    let by_index = api.document_element_by_index(&bytes, 0);
    assert!(matches!(by_index, Err(ApiError::Hibon(HibonError::IndexOutOfRange { .. }))));
}

#[test]
fn keys_and_envelopes_through_handles() {
    let mut api = Api::new();
    let (net, device) = api.generate_keypair(b"passphrase", b"salt", b"1234").unwrap();
    let unlocked = api.decrypt_device_pin(b"1234", &device).unwrap();
    assert_ne!(net, unlocked);
    assert_eq!(
        api.sign_message(net, b"m").unwrap(),
        api.sign_message(unlocked, b"m").unwrap()
    );

    let wrong = api.decrypt_device_pin(b"9999", &device);
    assert!(matches!(wrong, Err(ApiError::Net(NetError::AuthError(_)))));
    assert_eq!(ErrorCode::of(&wrong), ErrorCode::Exception);

    let params = api.hibon_create();
    api.hibon_add_u64(params, "amount", 1).unwrap();
    let params = api.hibon_get_document(params).unwrap();
    let signed = api
        .hirpc_create_signed_sender("transfer", &params, net, b"")
        .unwrap();
    assert!(Envelope::parse(&signed).unwrap().verify().unwrap());
    let unsigned = api.hirpc_create_sender("transfer", &params).unwrap();
    assert!(!Envelope::parse(&unsigned).unwrap().is_signed());

    api.net_free(net).unwrap();
    let stale = api.sign_message(net, b"m");
    assert_eq!(ErrorCode::of(&stale), ErrorCode::Error);
    let stale = api.hirpc_create_signed_sender("transfer", &params, net, b"");
    assert!(matches!(stale, Err(ApiError::InvalidHandle { kind: "securenet", .. })));
}
