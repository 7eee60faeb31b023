//! Envelope command implementation.

use crate::{input, output};
use hibon::TextFormat;
use hibon_hirpc::Envelope;

pub fn run(input: Option<String>, strict: bool) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = input::read_bytes(input.as_deref())?;
    let envelope = Envelope::parse(&bytes)?;

    let mut rows = vec![
        ("method", envelope.method()?.to_string()),
        ("params", envelope.params()?.to_text(TextFormat::Json)?),
    ];
    let verified = if envelope.is_signed() {
        if let Some(deriver) = envelope.deriver()? {
            rows.push(("deriver", hex::encode(deriver)));
        }
        rows.push(("public key", hex::encode(envelope.public_key()?)));
        let verified = envelope.verify()?;
        rows.push(("signature", if verified { "valid" } else { "INVALID" }.to_string()));
        verified
    } else {
        rows.push(("signature", "none".to_string()));
        false
    };
    output::print_rows(&rows);

    if strict && !verified {
        return Err("envelope signature did not verify".into());
    }
    Ok(())
}
