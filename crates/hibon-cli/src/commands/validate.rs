//! Validate command implementation.

use crate::{input, output};
use hibon::HibonError;
use serde_json::json;

pub fn run(input: Option<String>, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = input::read_bytes(input.as_deref())?;
    let result = hibon::validate(&bytes);

    if json_output {
        let report = match &result {
            Ok(()) => json!({ "valid": true, "size": bytes.len() }),
            Err(HibonError::MalformedEncoding { offset, reason }) => {
                json!({ "valid": false, "offset": offset, "reason": reason })
            }
            Err(e) => json!({ "valid": false, "reason": e.to_string() }),
        };
        println!("{}", output::format_json(&report));
    } else if result.is_ok() {
        println!("valid ({} bytes)", bytes.len());
    }

    result.map_err(|e| format!("Invalid document: {}", e).into())
}
