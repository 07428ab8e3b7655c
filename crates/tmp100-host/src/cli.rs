use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::sim::Step;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "TMP100 driver utilities",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read the temperature from a device node
    Read {
        /// Path to the node, e.g. /dev/tmp100
        #[arg(long, default_value = "/dev/tmp100")]
        node: PathBuf,

        /// Number of readings to take
        #[arg(long, default_value_t = 1)]
        count: u32,

        /// Delay between readings
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
    /// Decode a raw temperature register word (hex with 0x, or decimal)
    Decode {
        #[arg(value_parser = parse_word)]
        raw: u16,
    },
    /// Attach, read and detach against a simulated bus and registry
    Simulate {
        /// Word the simulated sensor returns
        #[arg(long, value_parser = parse_word, default_value = "0x17E0")]
        raw: u16,

        /// Make this registration step fail
        #[arg(long, value_enum)]
        fail_at: Option<Step>,

        /// Simulate a sensor that does not acknowledge
        #[arg(long)]
        absent: bool,

        #[arg(long, default_value_t = 3)]
        reads: u32,
    },
}

/// Parse `0x17E0`, `0X17e0` or `6112`.
pub fn parse_word(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    };
    parsed.map_err(|e| format!("invalid register word {s:?}: {e}"))
}
