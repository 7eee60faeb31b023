//! Text command implementation.

use crate::input;
use hibon::{Document, TextFormat};

pub fn run(input: Option<String>, format: TextFormat) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = input::read_bytes(input.as_deref())?;
    let doc = Document::parse(&bytes).map_err(|e| format!("Invalid document: {}", e))?;
    println!("{}", doc.to_text(format)?);
    Ok(())
}
