//! Constants and defaults for the seekfield scanners

/// Bytes requested from the source per step of the buffered line scan
pub const READ_CHUNK_SIZE: usize = 128;

/// Delimiter used when a field cursor is built without one
pub const DEFAULT_DELIMITER: &[u8] = b",";

/// Unix end of line sequence (0x0a)
pub const LF: &[u8] = b"\n";

/// DOS end of line sequence (0x0d 0x0a)
pub const CRLF: &[u8] = b"\r\n";

/// Classic Mac end of line sequence (0x0d)
pub const CR: &[u8] = b"\r";

/// Numeric line ending codes accepted by `LineEnding::try_from(u8)`
pub mod codes {
    /// `\n`
    pub const UNIX: u8 = 1;
    /// `\r\n`
    pub const DOS: u8 = 2;
    /// `\r`
    pub const MAC: u8 = 3;
}
