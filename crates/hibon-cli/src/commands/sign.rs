//! Sign command implementation.

use crate::input;
use hibon_crypto::decrypt_device_pin;

pub fn run(
    device: String,
    pin: String,
    input: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let device = input::read_bytes(Some(device.as_str()))?;
    let net = decrypt_device_pin(pin.as_bytes(), &device)?;
    let message = input::read_bytes(input.as_deref())?;
    println!("{}", hex::encode(net.sign(&message)?));
    Ok(())
}
