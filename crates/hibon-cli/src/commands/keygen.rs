//! Keygen command implementation.

use crate::{input, output};
use hibon_crypto::generate_keypair;

pub fn run(
    passphrase: String,
    salt: String,
    pin: String,
    out: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let (net, device) = generate_keypair(passphrase.as_bytes(), salt.as_bytes(), pin.as_bytes())?;
    input::write_bytes(&out, &device)?;

    output::print_rows(&[
        ("public key", hex::encode(net.public_key())),
        ("device", out),
        ("dart index", hibon::dart_index(&device)?.to_base64url()),
    ]);
    Ok(())
}
