//! Reading inputs from files or stdin.

use std::io::{self, Read};

/// Reads a whole file, or stdin when no path is given.
pub fn read_bytes(input: Option<&str>) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    match input {
        Some(path) => {
            std::fs::read(path).map_err(|e| format!("Failed to read file {}: {}", path, e).into())
        }
        None => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer)?;
            Ok(buffer)
        }
    }
}

/// Writes `bytes` to `path`.
pub fn write_bytes(path: &str, bytes: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, bytes).map_err(|e| format!("Failed to write file {}: {}", path, e).into())
}
