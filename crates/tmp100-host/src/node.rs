use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use tmp100::{DecodedTemperature, RENDERED_MAX};

/// Read the node once from offset 0 and parse the reading.
pub fn read_node(path: &Path) -> Result<DecodedTemperature> {
    let mut file = File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    // Anything longer than a reading is malformed.
    let mut buf = [0u8; RENDERED_MAX + 1];
    let len = file
        .read(&mut buf)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    parse_reading(&buf[..len])
}

pub fn parse_reading(bytes: &[u8]) -> Result<DecodedTemperature> {
    let text = std::str::from_utf8(bytes).context("Reading is not UTF-8")?;
    if !text.ends_with('\n') {
        anyhow::bail!("Reading {text:?} is not newline terminated");
    }
    text.parse()
        .map_err(|e| anyhow::anyhow!("Malformed reading {text:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_rendered_text() {
        let reading = parse_reading(b"-4.2\n").unwrap();
        assert_eq!(reading.integer_part, -4);
        assert_eq!(reading.fraction_digit, 2);
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(parse_reading(b"23.8").is_err());
        assert!(parse_reading(b"23\n").is_err());
        assert!(parse_reading(b"\xff\n").is_err());
    }

    #[test]
    fn reads_a_node_file() {
        let path = std::env::temp_dir()
            .join(format!("tmp100-node-{}", std::process::id()));
        std::fs::write(&path, "23.8\n").unwrap();
        let reading = read_node(&path);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(reading.unwrap().to_string(), "23.8");

        assert!(read_node(Path::new("/nonexistent/tmp100")).is_err());
    }
}
