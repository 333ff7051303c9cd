//! Line-ending aware cursor
//!
//! [`TextCursor`] layers one of three line termination conventions on top of
//! a [`CursorStream`]. Navigation works on terminator boundaries; a CRLF
//! terminator is recognised whichever of its two bytes the cursor sits on.

use crate::constants::READ_CHUNK_SIZE;
use crate::cursor::CursorStream;
use crate::types::{LineEnding, Whence};
use crate::Result;
use bytes::{Bytes, BytesMut};
use core::ops::{Deref, DerefMut};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

impl LineEnding {
    /// Guess the line ending convention of a stream
    ///
    /// Detection is not implemented yet: this always answers [`LineEnding::Lf`]
    /// and leaves the stream untouched.
    pub fn detect<S: Read + Seek>(_stream: &mut CursorStream<S>) -> Result<LineEnding> {
        #[cfg(feature = "logging")]
        debug!("Line ending detection not implemented, defaulting to LF");

        Ok(LineEnding::Lf)
    }
}

/// Cursor that understands line endings
#[derive(Debug)]
pub struct TextCursor<S> {
    stream: CursorStream<S>,
    ending: LineEnding,
    chunk_size: usize,
}

impl TextCursor<File> {
    /// Open a file with the given convention (detected when `None`)
    pub fn open<P: AsRef<Path>>(path: P, ending: Option<LineEnding>) -> Result<Self> {
        Self::from_stream(CursorStream::open(path)?, ending)
    }
}

impl<S: Read + Seek> TextCursor<S> {
    /// Wrap a source; the convention is detected when `ending` is `None`
    pub fn new(source: S, ending: Option<LineEnding>) -> Result<Self> {
        Self::from_stream(CursorStream::new(source)?, ending)
    }

    /// Wrap a source using a numeric convention code (1 = LF, 2 = CRLF, 3 = CR)
    pub fn with_format_code(source: S, code: u8) -> Result<Self> {
        let ending = LineEnding::try_from(code)?;
        Self::new(source, Some(ending))
    }

    /// Wrap an existing cursor stream
    pub fn from_stream(mut stream: CursorStream<S>, ending: Option<LineEnding>) -> Result<Self> {
        let ending = match ending {
            Some(ending) => ending,
            None => LineEnding::detect(&mut stream)?,
        };

        #[cfg(feature = "logging")]
        debug!("Text cursor using {} line endings", ending);

        Ok(Self {
            stream,
            ending,
            chunk_size: READ_CHUNK_SIZE,
        })
    }

    /// Override the chunk size of the buffered line scan
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// The line ending convention, fixed for the cursor's lifetime
    pub fn line_ending(&self) -> LineEnding {
        self.ending
    }

    /// The literal terminator bytes
    pub fn terminator(&self) -> &'static [u8] {
        self.ending.terminator()
    }

    /// Chunk size of the buffered line scan
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Release the underlying stream
    pub fn into_stream(self) -> CursorStream<S> {
        self.stream
    }

    /// Run `f` and move the cursor back to where it was, on every exit path
    pub fn scoped<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.stream.push();
        let depth = self.stream.saved_depth();
        let result = f(self);
        let restored = self.stream.restore_to_depth(depth);
        let value = result?;
        restored?;
        Ok(value)
    }

    /// How far into a terminator the cursor is, `None` when not on one
    fn eol_offset(&mut self) -> Result<Option<u64>> {
        match self.ending {
            LineEnding::Lf | LineEnding::Cr => {
                let terminator = self.ending.terminator()[0];
                Ok((self.stream.peek_byte()? == Some(terminator)).then_some(0))
            }
            LineEnding::Crlf => {
                let terminator = self.ending.terminator();
                if &self.stream.peek_range(0, 2, true)?[..] == terminator {
                    return Ok(Some(0));
                }
                if &self.stream.peek_range(-1, 2, true)?[..] == terminator {
                    return Ok(Some(1));
                }
                Ok(None)
            }
        }
    }

    /// True when the cursor is on any byte of a terminator
    pub fn is_at_eol(&mut self) -> Result<bool> {
        Ok(self.eol_offset()?.is_some())
    }

    /// If on a terminator, move to its last byte
    ///
    /// Only ever moves for CRLF, from the `\r` onto the `\n`.
    pub fn seek_to_last_terminator_byte(&mut self) -> Result<u64> {
        if let Some(k) = self.eol_offset()? {
            let remaining = self.ending.byte_len() as i64 - 1 - k as i64;
            if remaining > 0 {
                self.stream.seek(remaining, Whence::Current, true)?;
            }
        }
        Ok(self.stream.tell())
    }

    /// If on a terminator, move to the byte just before it
    ///
    /// A terminator at the very start of the stream has nothing before it;
    /// the cursor then stays put.
    pub fn seek_before_eol(&mut self) -> Result<u64> {
        if let Some(k) = self.eol_offset()? {
            self.stream.seek(-(k as i64 + 1), Whence::Current, true)?;
        }
        Ok(self.stream.tell())
    }

    /// If on a terminator, move just past its last byte, never past the end
    ///
    /// Only moves once: consecutive empty lines are not skipped.
    pub fn seek_after_eol(&mut self) -> Result<u64> {
        if let Some(k) = self.eol_offset()? {
            let step = self.ending.byte_len() as i64 - k as i64;
            self.stream.seek(step, Whence::Current, false)?;
        }
        Ok(self.stream.tell())
    }

    /// Move to the first byte of the line holding the cursor
    ///
    /// That is offset 0, or the first byte after the previous line's
    /// terminator.
    pub fn seek_line_start(&mut self) -> Result<u64> {
        if self.stream.at_end()? {
            self.stream.seek(0, Whence::End, true)?;
        }

        if let Some(k) = self.eol_offset()? {
            if self.stream.tell() <= k {
                // Empty first line
                self.stream.seek(0, Whence::Start, true)?;
                return Ok(0);
            }
            self.stream.seek(-(k as i64 + 1), Whence::Current, true)?;
        }

        // Byte-at-a-time walk back; stops at 0 or the previous terminator
        loop {
            if self.is_at_eol()? {
                self.seek_after_eol()?;
                break;
            }
            if !self.stream.seek(-1, Whence::Current, true)? {
                break;
            }
        }

        Ok(self.stream.tell())
    }

    /// Move to the last terminator byte of the current line
    ///
    /// A final line without a terminator ends at the end of the stream, and
    /// a cursor past the end is brought back to it.
    pub fn seek_line_end(&mut self) -> Result<u64> {
        if self.stream.at_end()? {
            self.stream.seek(0, Whence::End, true)?;
        }

        loop {
            if self.is_at_eol()? {
                self.seek_to_last_terminator_byte()?;
                break;
            }
            if !self.stream.seek(1, Whence::Current, false)? {
                break;
            }
        }

        Ok(self.stream.tell())
    }

    /// Move to the last terminator byte of the previous line
    ///
    /// On the first line the cursor ends at 0 and `false` is returned.
    pub fn seek_prev_line_end(&mut self) -> Result<bool> {
        self.seek_line_start()?;
        self.stream.seek(-1, Whence::Current, true)
    }

    /// Move to the start of the previous line, clamped to 0
    pub fn seek_prev_line_start(&mut self) -> Result<u64> {
        self.seek_prev_line_end()?;
        self.seek_line_start()
    }

    /// Move to the start of the next line, never past the end
    pub fn seek_next_line_start(&mut self) -> Result<u64> {
        self.seek_line_end()?;
        if !self.stream.at_end()? {
            self.stream.seek(1, Whence::Current, true)?;
        }
        Ok(self.stream.tell())
    }

    /// Move to the end of the next line
    pub fn seek_next_line_end(&mut self) -> Result<u64> {
        self.seek_next_line_start()?;
        self.seek_line_end()
    }

    /// Move to the start of the line `offset` lines away from `whence`
    ///
    /// Negative offsets walk backwards. The walk stops early once the cursor
    /// is pinned at the start or end of the stream.
    pub fn seek_line(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        self.stream.seek(0, whence, true)?;
        let mut position = self.seek_line_start()?;

        for _ in 0..offset.unsigned_abs() {
            let next = if offset >= 0 {
                self.seek_next_line_start()?
            } else {
                self.seek_prev_line_start()?
            };
            if next == position {
                break;
            }
            position = next;
        }

        Ok(position)
    }

    /// Start and content end of the line holding the cursor
    ///
    /// The range `start..content_end` covers the line without its
    /// terminator. The cursor does not move.
    pub fn line_bounds(&mut self) -> Result<(u64, u64)> {
        let terminator_len = self.ending.byte_len() as u64;
        self.scoped(|t| {
            let start = t.seek_line_start()?;
            let end = t.seek_line_end()?;
            let content_end = if t.is_at_eol()? {
                end + 1 - terminator_len
            } else {
                end
            };
            Ok((start, content_end))
        })
    }

    /// Read the next line without its terminator
    ///
    /// Scans forward in chunks; a terminator split across two chunks is still
    /// found. The cursor ends just past the terminator. An unterminated final
    /// line is returned as is; `None` means no lines remain.
    pub fn read_line(&mut self) -> Result<Option<Bytes>> {
        if self.stream.at_end()? {
            return Ok(None);
        }

        let start = self.stream.tell();
        let terminator = self.ending.terminator();
        let mut buffer = BytesMut::with_capacity(self.chunk_size);
        let mut search_from = 0;

        loop {
            let chunk = self.stream.read(self.chunk_size)?;
            if chunk.is_empty() {
                break;
            }
            buffer.extend_from_slice(&chunk);

            #[cfg(feature = "logging")]
            trace!(
                "Line scan from {}: {} bytes buffered, searching from {}",
                start,
                buffer.len(),
                search_from
            );

            if let Some(found) = memchr::memmem::find(&buffer[search_from..], terminator) {
                let content_len = search_from + found;
                let resume = start + (content_len + terminator.len()) as u64;
                self.stream.seek(resume as i64, Whence::Start, true)?;
                buffer.truncate(content_len);
                return Ok(Some(buffer.freeze()));
            }

            // The first terminator byte may be the last byte buffered
            search_from = buffer.len().saturating_sub(terminator.len() - 1);
        }

        if buffer.is_empty() {
            Ok(None)
        } else {
            Ok(Some(buffer.freeze()))
        }
    }

    /// Iterate over the remaining lines via [`TextCursor::read_line`]
    pub fn lines(&mut self) -> Lines<'_, S> {
        Lines { cursor: self }
    }
}

impl<S> Deref for TextCursor<S> {
    type Target = CursorStream<S>;

    fn deref(&self) -> &Self::Target {
        &self.stream
    }
}

impl<S> DerefMut for TextCursor<S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.stream
    }
}

/// Iterator over lines, see [`TextCursor::lines`]
pub struct Lines<'a, S> {
    cursor: &'a mut TextCursor<S>,
}

impl<S: Read + Seek> Iterator for Lines<'_, S> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.read_line().transpose()
    }
}
