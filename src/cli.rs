//! CLI argument parsing

use crate::probes;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
pub fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Generate dynamic help text for the probe argument
fn probe_help() -> String {
    format!("Probe adapter to use [available: {}]", probes::probe_names_short())
}

#[derive(Parser)]
#[command(name = "rprobe")]
#[command(author, version, about = "Debug probe flash programming tool", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Per-block erase delay in milliseconds (default: driver-specific)
    #[arg(long, global = true)]
    pub erase_delay: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe for a known target
    Probe {
        /// Probe adapter to use
        #[arg(short, long, help = probe_help())]
        probe: String,
    },

    /// Show the attached target's memory map and monitor commands
    Info {
        /// Probe adapter to use
        #[arg(short, long, help = probe_help())]
        probe: String,
    },

    /// Erase a flash address range
    Erase {
        /// Probe adapter to use
        #[arg(short, long, help = probe_help())]
        probe: String,

        /// Start address (must be erase-block aligned)
        #[arg(long, value_parser = parse_hex_u32)]
        addr: u32,

        /// Number of bytes to erase (must be a multiple of the erase block)
        #[arg(long, value_parser = parse_hex_u32)]
        len: u32,
    },

    /// Write a file to flash
    Write {
        /// Probe adapter to use
        #[arg(short, long, help = probe_help())]
        probe: String,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Destination address
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        addr: u32,

        /// Verify flash contents after writing
        #[arg(long)]
        verify: bool,

        /// Skip erasing the covering blocks first
        #[arg(long)]
        no_erase: bool,
    },

    /// Read target memory to a file
    Read {
        /// Probe adapter to use
        #[arg(short, long, help = probe_help())]
        probe: String,

        /// Start address
        #[arg(long, value_parser = parse_hex_u32)]
        addr: u32,

        /// Number of bytes to read
        #[arg(long, value_parser = parse_hex_u32)]
        len: u32,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Verify flash contents against a file
    Verify {
        /// Probe adapter to use
        #[arg(short, long, help = probe_help())]
        probe: String,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Start address
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        addr: u32,
    },

    /// Run a driver monitor command (or list them)
    Monitor {
        /// Probe adapter to use
        #[arg(short, long, help = probe_help())]
        probe: String,

        /// Command name; omit to list available commands
        name: Option<String>,

        /// Arguments passed through to the command
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },

    /// List available probe adapters
    ListProbes,
}
