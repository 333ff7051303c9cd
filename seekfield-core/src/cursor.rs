//! Cursor stream over a seekable byte source
//!
//! A [`CursorStream`] owns its source for its whole lifetime and tracks the
//! current offset. Lookahead is done with a LIFO stack of saved offsets:
//! every `push` is matched by exactly one `pop`, and [`CursorStream::scoped`]
//! guarantees that pairing on every exit path, errors included.

use crate::constants::READ_CHUNK_SIZE;
use crate::error::ScanError;
use crate::types::Whence;
use crate::Result;
use bytes::{Bytes, BytesMut};
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Seekable byte cursor with a save/restore position stack
#[derive(Debug)]
pub struct CursorStream<S> {
    source: S,
    position: u64,
    saved_positions: Vec<u64>,
}

impl CursorStream<File> {
    /// Open a file and take ownership of the handle
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| ScanError::InvalidSource(format!("{}: {}", path.display(), e)))?;
        Self::new(file)
    }
}

impl<S: Read + Seek> CursorStream<S> {
    /// Take exclusive ownership of an already-open source
    ///
    /// Fails with [`ScanError::InvalidSource`] if the source cannot report
    /// its position.
    pub fn new(mut source: S) -> Result<Self> {
        let position = source
            .stream_position()
            .map_err(|e| ScanError::InvalidSource(e.to_string()))?;

        #[cfg(feature = "logging")]
        debug!("Cursor stream opened at offset {}", position);

        Ok(Self {
            source,
            position,
            saved_positions: Vec::new(),
        })
    }

    /// Current offset into the source
    pub fn tell(&self) -> u64 {
        self.position
    }

    /// True when the cursor is at offset 0
    pub fn is_start(&self) -> bool {
        self.position == 0
    }

    /// Size of the source in bytes; the cursor does not move
    pub fn len(&mut self) -> Result<u64> {
        let end = self.source.seek(SeekFrom::End(0));
        let restored = self.source.seek(SeekFrom::Start(self.position));
        let end = end?;
        restored?;
        Ok(end)
    }

    /// True when the source holds no bytes at all
    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Number of positions currently saved on the stack
    pub fn saved_depth(&self) -> usize {
        self.saved_positions.len()
    }

    /// Borrow the underlying source
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Release the underlying source
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Reposition the cursor relative to `whence`
    ///
    /// Returns `Ok(false)` when the seek is refused (for example a target
    /// before offset 0); the position is then unchanged. When
    /// `allow_past_end` is false and the cursor ends up at or beyond the end
    /// of the stream, it is pinned to the end and `Ok(false)` is returned.
    pub fn seek(&mut self, offset: i64, whence: Whence, allow_past_end: bool) -> Result<bool> {
        let moved = match whence.to_seek_from(offset) {
            Some(target) => match self.source.seek(target) {
                Ok(position) => {
                    self.position = position;
                    true
                }
                Err(_e) => {
                    #[cfg(feature = "logging")]
                    debug!(
                        "Seek by {} from {:?} refused at offset {}: {}",
                        offset, whence, self.position, _e
                    );
                    false
                }
            },
            None => false,
        };

        if !allow_past_end && self.at_end()? {
            self.position = self.source.seek(SeekFrom::End(0))?;
            return Ok(false);
        }

        Ok(moved)
    }

    /// Move back to offset 0
    pub fn rewind(&mut self) -> Result<bool> {
        self.seek(0, Whence::Start, true)
    }

    /// True iff reading the current byte yields nothing
    ///
    /// Computed with an actual read attempt: some sources only report the end
    /// after a read has been tried at that exact offset.
    pub fn at_end(&mut self) -> Result<bool> {
        Ok(self.peek_byte()?.is_none())
    }

    /// Read and consume one byte, `None` at end of stream
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.source.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.position += 1;
                    return Ok(Some(buf[0]));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.resync();
                    return Err(e.into());
                }
            }
        }
    }

    /// Read and consume up to `length` bytes; shorter only at end of stream
    pub fn read(&mut self, length: usize) -> Result<Bytes> {
        let mut buf = Vec::with_capacity(length.min(READ_CHUNK_SIZE * 64));
        let read = (&mut self.source).take(length as u64).read_to_end(&mut buf);
        match read {
            Ok(n) => {
                self.position += n as u64;
                Ok(Bytes::from(buf))
            }
            Err(e) => {
                self.resync();
                Err(e.into())
            }
        }
    }

    /// Byte at the cursor without consuming it, `None` at end of stream
    pub fn peek_byte(&mut self) -> Result<Option<u8>> {
        self.scoped(|s| s.read_byte())
    }

    /// Peek at the rest of the current line, newline included
    ///
    /// Reading stops after `max_length - 1` bytes, after a `\n`, or at the
    /// end of the stream, whichever comes first. A `max_length` of 0 means no
    /// length limit. Returns `None` at end of stream.
    pub fn peek_string(&mut self, max_length: usize) -> Result<Option<Bytes>> {
        self.scoped(|s| {
            if s.at_end()? {
                return Ok(None);
            }

            let limit = max_length.checked_sub(1);
            let mut line = BytesMut::new();
            loop {
                let want = match limit {
                    Some(limit) => (limit - line.len()).min(READ_CHUNK_SIZE),
                    None => READ_CHUNK_SIZE,
                };
                if want == 0 {
                    break;
                }

                let chunk = s.read(want)?;
                if chunk.is_empty() {
                    break;
                }
                if let Some(newline) = memchr::memchr(b'\n', &chunk) {
                    line.extend_from_slice(&chunk[..=newline]);
                    break;
                }
                line.extend_from_slice(&chunk);
            }

            Ok(Some(line.freeze()))
        })
    }

    /// Peek `length` bytes starting `offset` bytes from the cursor
    ///
    /// Returns an empty result when the relative seek is refused.
    pub fn peek_range(&mut self, offset: i64, length: usize, allow_past_end: bool) -> Result<Bytes> {
        self.scoped(|s| {
            if !s.seek(offset, Whence::Current, allow_past_end)? {
                return Ok(Bytes::new());
            }
            s.read(length)
        })
    }

    /// Save the current offset
    pub fn push(&mut self) {
        self.saved_positions.push(self.position);
    }

    /// Restore and discard the most recently saved offset
    ///
    /// Returns the restored offset, or `None` if nothing was saved.
    pub fn pop(&mut self) -> Result<Option<u64>> {
        match self.saved_positions.pop() {
            Some(saved) => {
                self.position = self.source.seek(SeekFrom::Start(saved))?;
                Ok(Some(saved))
            }
            None => Ok(None),
        }
    }

    /// Run `f` and move the cursor back to where it was, on every exit path
    pub fn scoped<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.push();
        let depth = self.saved_positions.len();
        let result = f(self);
        let restored = self.restore_to_depth(depth);
        let value = result?;
        restored?;
        Ok(value)
    }

    /// Discard anything saved above `depth`, then pop the entry at `depth`
    ///
    /// Offsets pushed by an inner operation that bailed out early belong to
    /// it, not to the caller.
    pub(crate) fn restore_to_depth(&mut self, depth: usize) -> Result<Option<u64>> {
        self.saved_positions.truncate(depth);
        self.pop()
    }

    /// Re-read the source offset after a failed read left it unknown
    fn resync(&mut self) {
        if let Ok(position) = self.source.stream_position() {
            #[cfg(feature = "logging")]
            trace!("Resynced cursor from {} to {}", self.position, position);
            self.position = position;
        }
    }
}
