//! Library entry for seekfield-cli used by integration tests and embedding.

pub mod commands;

use anyhow::{bail, Result};
use seekfield_core::LineEnding;

// Re-export commands for convenience
pub use commands::*;

/// Line ending selection on the command line
#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LineEndingArg {
    /// `\n`
    Lf,
    /// `\r\n`
    Crlf,
    /// `\r`
    Cr,
    /// Let the cursor detect it
    Auto,
}

impl LineEndingArg {
    /// `None` asks the cursor to detect the convention
    pub fn to_line_ending(self) -> Option<LineEnding> {
        match self {
            LineEndingArg::Lf => Some(LineEnding::Lf),
            LineEndingArg::Crlf => Some(LineEnding::Crlf),
            LineEndingArg::Cr => Some(LineEnding::Cr),
            LineEndingArg::Auto => None,
        }
    }
}

/// Field extraction strategy
#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum FieldStrategy {
    /// Byte-accurate cursor walk
    Cursor,
    /// Read a line, then split it on all delimiters at once
    Bulk,
}

/// Turn a delimiter argument into bytes, honouring `\t`, `\r`, `\n` and `\\`
pub fn parse_delimiter(arg: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(arg.len());
    let mut bytes = arg.bytes();
    while let Some(byte) = bytes.next() {
        if byte != b'\\' {
            out.push(byte);
            continue;
        }
        match bytes.next() {
            Some(b't') => out.push(b'\t'),
            Some(b'r') => out.push(b'\r'),
            Some(b'n') => out.push(b'\n'),
            Some(b'\\') => out.push(b'\\'),
            Some(other) => bail!("Unknown escape \\{} in delimiter {:?}", other as char, arg),
            None => bail!("Dangling backslash in delimiter {:?}", arg),
        }
    }
    if out.is_empty() {
        bail!("Delimiter must not be empty");
    }
    Ok(out)
}
