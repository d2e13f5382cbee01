//! mkcom64 - host tool to wrap a flat x86-64 binary into `.COM64`
//!
//! Layout: a 64-byte little-endian header followed by the payload verbatim.
//!
//! | offset | size | field                               |
//! |--------|------|-------------------------------------|
//! | 0      | 8    | magic `64DOSCOM`                    |
//! | 8      | 4    | header size (64)                    |
//! | 12     | 4    | flags (0)                           |
//! | 16     | 8    | entry point, relative to payload    |
//! | 24     | 8    | bytes to zero after the payload     |
//! | 32     | 24   | reserved, zero                      |

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

const MAGIC: &[u8; 8] = b"64DOSCOM";
const HEADER_SIZE: usize = 64;

#[derive(Debug, Parser)]
#[command(name = "mkcom64", version, about = "Wrap a flat binary into a .COM64 image")]
struct Args {
    /// Flat binary to wrap
    payload: PathBuf,
    /// Output image
    output: PathBuf,
    /// Entry point offset into the payload (decimal, 0x hex or 0 octal)
    #[arg(value_parser = parse_number, default_value = "0")]
    entry_rva: u64,
    /// Zero-filled bytes after the payload
    #[arg(value_parser = parse_number, default_value = "0")]
    bss_size: u64,
}

/// Parse an unsigned number the way C's `strtoull(s, NULL, 0)` picks the base
fn parse_number(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let (digits, radix) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8)
    } else {
        (s, 10)
    };
    u64::from_str_radix(digits, radix).map_err(|e| format!("invalid number {:?}: {}", s, e))
}

/// Encode the image header
fn header(entry_rva: u64, bss_size: u64) -> [u8; HEADER_SIZE] {
    let mut h = [0u8; HEADER_SIZE];
    h[0..8].copy_from_slice(MAGIC);
    h[8..12].copy_from_slice(&(HEADER_SIZE as u32).to_le_bytes());
    h[12..16].copy_from_slice(&0u32.to_le_bytes());
    h[16..24].copy_from_slice(&entry_rva.to_le_bytes());
    h[24..32].copy_from_slice(&bss_size.to_le_bytes());
    h
}

/// Header followed by the payload
fn build_image(payload: &[u8], entry_rva: u64, bss_size: u64) -> Vec<u8> {
    let mut image = Vec::with_capacity(HEADER_SIZE + payload.len());
    image.extend_from_slice(&header(entry_rva, bss_size));
    image.extend_from_slice(payload);
    image
}

fn main() -> Result<()> {
    let args = Args::parse();

    let payload = fs::read(&args.payload)
        .with_context(|| format!("failed to open input {}", args.payload.display()))?;
    let image = build_image(&payload, args.entry_rva, args.bss_size);
    fs::write(&args.output, image)
        .with_context(|| format!("failed to write output {}", args.output.display()))?;
    Ok(())
}
