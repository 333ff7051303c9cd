//! Core types shared by the cursor layers

use crate::constants::{codes, CR, CRLF, LF};
use crate::error::ScanError;
use bytes::Bytes;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use std::io::SeekFrom;

/// Line termination convention
///
/// End of line (EOL) sequences:
/// - Unix: `"\n"`   0x0a
/// - DOS:  `"\r\n"` 0x0d0a
/// - Mac:  `"\r"`   0x0d
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    Crlf,
    /// `\r`
    Cr,
}

impl LineEnding {
    /// The literal terminator bytes for this convention
    pub const fn terminator(&self) -> &'static [u8] {
        match self {
            LineEnding::Lf => LF,
            LineEnding::Crlf => CRLF,
            LineEnding::Cr => CR,
        }
    }

    /// Terminator length in bytes (1 or 2)
    pub const fn byte_len(&self) -> usize {
        self.terminator().len()
    }

    /// Numeric code of this convention (1 = Unix, 2 = DOS, 3 = Mac)
    pub const fn code(&self) -> u8 {
        match self {
            LineEnding::Lf => codes::UNIX,
            LineEnding::Crlf => codes::DOS,
            LineEnding::Cr => codes::MAC,
        }
    }

    /// Short lowercase name, as accepted by [`FromStr`]
    pub const fn name(&self) -> &'static str {
        match self {
            LineEnding::Lf => "lf",
            LineEnding::Crlf => "crlf",
            LineEnding::Cr => "cr",
        }
    }
}

impl TryFrom<u8> for LineEnding {
    type Error = ScanError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            codes::UNIX => Ok(LineEnding::Lf),
            codes::DOS => Ok(LineEnding::Crlf),
            codes::MAC => Ok(LineEnding::Cr),
            other => Err(ScanError::InvalidFormat(format!(
                "unknown line ending code {}",
                other
            ))),
        }
    }
}

impl FromStr for LineEnding {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lf" | "unix" => Ok(LineEnding::Lf),
            "crlf" | "dos" => Ok(LineEnding::Crlf),
            "cr" | "mac" => Ok(LineEnding::Cr),
            other => Err(ScanError::InvalidFormat(format!(
                "unknown line ending {:?}",
                other
            ))),
        }
    }
}

impl core::fmt::Display for LineEnding {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Reference point for a relative seek
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Whence {
    /// Offset from the start of the stream
    #[default]
    Start,
    /// Offset from the current position
    Current,
    /// Offset from the end of the stream
    End,
}

impl Whence {
    /// Resolve into a `SeekFrom`, or `None` when the target is before offset 0
    pub fn to_seek_from(self, offset: i64) -> Option<SeekFrom> {
        match self {
            Whence::Start => u64::try_from(offset).ok().map(SeekFrom::Start),
            Whence::Current => Some(SeekFrom::Current(offset)),
            Whence::End => Some(SeekFrom::End(offset)),
        }
    }
}

/// A field together with the delimiter that ended it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field content, never including a delimiter
    pub value: Bytes,

    /// The delimiter that terminated this field, `None` when the field ran
    /// to the end of the stream
    pub delimiter: Option<Bytes>,
}

impl Field {
    /// Write the field followed by its delimiter back into `out`
    pub fn write_raw(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.value);
        if let Some(delimiter) = &self.delimiter {
            out.extend_from_slice(delimiter);
        }
    }
}
