//! Sender command implementation.

use crate::{input, output};
use hibon::Hibon;
use hibon_crypto::decrypt_device_pin;
use hibon_hirpc::{create_sender, create_signed_sender};

pub fn run(
    method: String,
    params: Option<String>,
    device: Option<String>,
    pin: Option<String>,
    deriver: String,
    out: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let params = match params {
        Some(path) => input::read_bytes(Some(path.as_str()))?,
        None => Hibon::new().to_document(),
    };
    let deriver = hex::decode(&deriver).map_err(|e| format!("Invalid deriver hex: {}", e))?;

    let envelope = match device {
        Some(device) => {
            let pin = pin.ok_or("--pin is required with --device")?;
            let device = input::read_bytes(Some(device.as_str()))?;
            let net = decrypt_device_pin(pin.as_bytes(), &device)?;
            create_signed_sender(&method, &params, &net, &deriver)?
        }
        None => create_sender(&method, &params)?,
    };
    input::write_bytes(&out, &envelope)?;

    output::print_rows(&[
        ("method", method),
        ("envelope", out),
        ("dart index", hibon::dart_index(&envelope)?.to_base64url()),
    ]);
    Ok(())
}
