//! # Seekfield Core
//!
//! Random-access, cursor-based text scanning over seekable byte streams.
//!
//! ## Modules
//!
//! - `constants`: Chunk sizes, terminators and defaults
//! - `types`: Core types (LineEnding, Whence, Field)
//! - `cursor`: Seekable byte cursor with a save/restore position stack
//! - `text`: Line-ending aware navigation and buffered line reads
//! - `delimited`: Field extraction on one or more multi-byte delimiters
//!
//! Data flows upward only: [`DelimitedCursor`] drives a [`TextCursor`],
//! which drives a [`CursorStream`].

#![warn(missing_docs)]

pub mod constants;
pub mod cursor;
pub mod delimited;
pub mod error;
pub mod text;
pub mod types;

// Re-export commonly used types
pub use cursor::CursorStream;
pub use delimited::{DelimitedCursor, DelimitedCursorBuilder};
pub use error::ScanError;
pub use text::TextCursor;
pub use types::{Field, LineEnding, Whence};

/// Result type alias for seekfield operations
pub type Result<T> = core::result::Result<T, ScanError>;
