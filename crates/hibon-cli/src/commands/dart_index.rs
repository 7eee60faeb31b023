//! DART index command implementation.

use crate::input;

pub fn run(input: Option<String>, hex: bool) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = input::read_bytes(input.as_deref())?;
    let index = hibon::dart_index(&bytes)?;
    if hex {
        println!("{}", index.to_hex());
    } else {
        println!("{}", index.to_base64url());
    }
    Ok(())
}
