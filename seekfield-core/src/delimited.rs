//! Delimited field extraction
//!
//! Fields are the bytes between any configured delimiters and/or the start
//! and end of the stream. Unlike lines, fields never include their delimiter.
//!
//! Two strategies are available:
//! - [`DelimitedCursor::get_field`] / [`DelimitedCursor::get_fields_safe`]
//!   walk the cursor byte by byte. Correct for any delimiter mix, including
//!   delimiters other than the line terminator.
//! - [`DelimitedCursor::get_fields`] reads a whole line and splits it with
//!   one combined pattern. Much faster, but line-granular.
//!
//! # Delimiter restrictions
//!
//! A delimiter is identified by locating the current byte inside it and
//! checking the bytes around that offset. So no delimiter may contain the
//! same byte twice, and no two delimiters may overlap in a way that makes
//! that offset ambiguous. Such configurations are accepted but their
//! results are unspecified.

use crate::constants::DEFAULT_DELIMITER;
use crate::cursor::CursorStream;
use crate::error::ScanError;
use crate::text::TextCursor;
use crate::types::{Field, LineEnding, Whence};
use crate::Result;
use bytes::{BufMut, Bytes, BytesMut};
use core::ops::{Deref, DerefMut};
use regex::bytes::Regex;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

#[cfg(feature = "logging")]
use tracing::debug;

/// Cursor that splits content on one or more delimiters
#[derive(Debug)]
pub struct DelimitedCursor<S> {
    text: TextCursor<S>,
    delimiters: Vec<Bytes>,
    pattern: Regex,
}

impl DelimitedCursor<File> {
    /// Open a file with the given line ending and delimiters
    pub fn open<P, I, D>(path: P, ending: LineEnding, delimiters: I) -> Result<Self>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = D>,
        D: AsRef<[u8]>,
    {
        Self::from_text(TextCursor::open(path, Some(ending))?, delimiters)
    }
}

impl<S: Read + Seek> DelimitedCursor<S> {
    /// Wrap a source with the given line ending and delimiters
    pub fn new<I, D>(source: S, ending: LineEnding, delimiters: I) -> Result<Self>
    where
        I: IntoIterator<Item = D>,
        D: AsRef<[u8]>,
    {
        Self::from_text(TextCursor::new(source, Some(ending))?, delimiters)
    }

    /// Wrap an existing text cursor
    ///
    /// The line terminator is appended to the delimiters when missing, so a
    /// field never runs across a line boundary.
    pub fn from_text<I, D>(text: TextCursor<S>, delimiters: I) -> Result<Self>
    where
        I: IntoIterator<Item = D>,
        D: AsRef<[u8]>,
    {
        let delimiters = normalize_delimiters(delimiters, text.terminator())?;
        let pattern = build_pattern(&delimiters)?;

        #[cfg(feature = "logging")]
        debug!(
            "Delimited cursor with {} delimiters, pattern {}",
            delimiters.len(),
            pattern.as_str()
        );

        Ok(Self {
            text,
            delimiters,
            pattern,
        })
    }

    /// Start configuring a delimited cursor
    pub fn builder() -> DelimitedCursorBuilder {
        DelimitedCursorBuilder::new()
    }

    /// Configured delimiters, line terminator included
    pub fn delimiters(&self) -> &[Bytes] {
        &self.delimiters
    }

    /// Replace the delimiters and rebuild the combined pattern
    pub fn set_delimiters<I, D>(&mut self, delimiters: I) -> Result<()>
    where
        I: IntoIterator<Item = D>,
        D: AsRef<[u8]>,
    {
        let delimiters = normalize_delimiters(delimiters, self.text.terminator())?;
        self.pattern = build_pattern(&delimiters)?;
        self.delimiters = delimiters;
        Ok(())
    }

    /// Release the line layer
    pub fn into_text(self) -> TextCursor<S> {
        self.text
    }

    /// Release the underlying stream
    pub fn into_stream(self) -> CursorStream<S> {
        self.text.into_stream()
    }

    /// Index of the delimiter under the cursor and the cursor's offset in it
    fn find_delimiter(&mut self) -> Result<Option<(usize, usize)>> {
        let current = match self.text.peek_byte()? {
            Some(byte) => byte,
            None => return Ok(None),
        };

        for (index, delimiter) in self.delimiters.iter().enumerate() {
            // First occurrence only; see the module docs
            if let Some(k) = memchr::memchr(current, delimiter) {
                let candidate = self.text.peek_range(-(k as i64), delimiter.len(), true)?;
                if candidate[..] == delimiter[..] {
                    return Ok(Some((index, k)));
                }
            }
        }

        Ok(None)
    }

    /// The delimiter the cursor is on, if any
    pub fn matched_delimiter(&mut self) -> Result<Option<Bytes>> {
        Ok(self
            .find_delimiter()?
            .map(|(index, _)| self.delimiters[index].clone()))
    }

    /// True on any byte of a delimiter, and always at end of stream
    pub fn is_on_delimiter(&mut self) -> Result<bool> {
        if self.text.at_end()? {
            return Ok(true);
        }
        Ok(self.find_delimiter()?.is_some())
    }

    /// If on a delimiter, move just past its last byte
    pub fn seek_after_delimiter(&mut self) -> Result<u64> {
        self.skip_delimiter()?;
        Ok(self.text.tell())
    }

    fn skip_delimiter(&mut self) -> Result<Option<Bytes>> {
        match self.find_delimiter()? {
            Some((index, k)) => {
                let delimiter = self.delimiters[index].clone();
                self.text
                    .seek((delimiter.len() - k) as i64, Whence::Current, true)?;
                Ok(Some(delimiter))
            }
            None => Ok(None),
        }
    }

    /// Read the field at the cursor along with the delimiter that ends it
    ///
    /// The cursor ends at the start of the next field. `None` means no
    /// fields remain.
    pub fn read_field(&mut self) -> Result<Option<Field>> {
        if self.text.at_end()? {
            return Ok(None);
        }

        let mut value = BytesMut::new();
        while !self.is_on_delimiter()? {
            match self.text.read_byte()? {
                Some(byte) => value.put_u8(byte),
                None => break,
            }
        }
        let delimiter = self.skip_delimiter()?;

        Ok(Some(Field {
            value: value.freeze(),
            delimiter,
        }))
    }

    /// Read the field at the cursor; empty for adjacent delimiters
    pub fn get_field(&mut self) -> Result<Option<Bytes>> {
        Ok(self.read_field()?.map(|field| field.value))
    }

    /// Read up to `count` fields
    ///
    /// Stops early when the stream runs out. Returns `None` when no field at
    /// all could be read.
    pub fn get_fields_safe(&mut self, count: usize) -> Result<Option<Vec<Bytes>>> {
        let mut fields = Vec::new();
        while fields.len() < count {
            match self.get_field()? {
                Some(field) => fields.push(field),
                None => break,
            }
        }
        Ok(if fields.is_empty() { None } else { Some(fields) })
    }

    /// Read the next line and split it on every configured delimiter
    ///
    /// Fields are zero-copy slices of the line. Returns `None` when no lines
    /// remain.
    pub fn get_fields(&mut self) -> Result<Option<Vec<Bytes>>> {
        let line = match self.text.read_line()? {
            Some(line) => line,
            None => return Ok(None),
        };
        Ok(Some(split_line(&self.pattern, &line)))
    }

    /// Iterate over fields via [`DelimitedCursor::read_field`]
    pub fn fields(&mut self) -> Fields<'_, S> {
        Fields { cursor: self }
    }

    /// Iterate over split lines via [`DelimitedCursor::get_fields`]
    pub fn records(&mut self) -> Records<'_, S> {
        Records { cursor: self }
    }
}

impl<S> Deref for DelimitedCursor<S> {
    type Target = TextCursor<S>;

    fn deref(&self) -> &Self::Target {
        &self.text
    }
}

impl<S> DerefMut for DelimitedCursor<S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.text
    }
}

/// Split `line` on `pattern`, slicing rather than copying
fn split_line(pattern: &Regex, line: &Bytes) -> Vec<Bytes> {
    let mut fields = Vec::new();
    let mut last = 0;
    for found in pattern.find_iter(line) {
        fields.push(line.slice(last..found.start()));
        last = found.end();
    }
    fields.push(line.slice(last..));
    fields
}

/// Validate, de-duplicate and complete the delimiter list
fn normalize_delimiters<I, D>(delimiters: I, terminator: &[u8]) -> Result<Vec<Bytes>>
where
    I: IntoIterator<Item = D>,
    D: AsRef<[u8]>,
{
    let mut normalized: Vec<Bytes> = Vec::new();
    for delimiter in delimiters {
        let delimiter = delimiter.as_ref();
        if delimiter.is_empty() {
            return Err(ScanError::InvalidDelimiter(
                "delimiters must not be empty".into(),
            ));
        }
        if !normalized.iter().any(|d| d == delimiter) {
            normalized.push(Bytes::copy_from_slice(delimiter));
        }
    }

    if !normalized.iter().any(|d| d == terminator) {
        normalized.push(Bytes::copy_from_slice(terminator));
    }

    Ok(normalized)
}

/// Build one alternation matching any delimiter, earlier delimiters first
fn build_pattern(delimiters: &[Bytes]) -> Result<Regex> {
    let alternatives: Vec<String> = delimiters
        .iter()
        .map(|delimiter| {
            delimiter
                .iter()
                .map(|byte| format!("\\x{:02X}", byte))
                .collect::<String>()
        })
        .collect();

    // Unicode off so \xNN matches raw bytes
    let source = format!("(?-u:{})", alternatives.join("|"));
    Regex::new(&source).map_err(|e| ScanError::InvalidDelimiter(e.to_string()))
}

/// Builder for [`DelimitedCursor`]
#[derive(Debug, Clone)]
pub struct DelimitedCursorBuilder {
    ending: Option<LineEnding>,
    delimiters: Vec<Bytes>,
    chunk_size: Option<usize>,
}

impl Default for DelimitedCursorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DelimitedCursorBuilder {
    /// New builder: detected line ending, no delimiters yet
    pub fn new() -> Self {
        Self {
            ending: None,
            delimiters: Vec::new(),
            chunk_size: None,
        }
    }

    /// Set the line ending convention
    pub fn line_ending(mut self, ending: LineEnding) -> Self {
        self.ending = Some(ending);
        self
    }

    /// Add one delimiter
    pub fn delimiter<D: AsRef<[u8]>>(mut self, delimiter: D) -> Self {
        self.delimiters
            .push(Bytes::copy_from_slice(delimiter.as_ref()));
        self
    }

    /// Add several delimiters, in priority order
    pub fn delimiters<I, D>(mut self, delimiters: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: AsRef<[u8]>,
    {
        self.delimiters.extend(
            delimiters
                .into_iter()
                .map(|d| Bytes::copy_from_slice(d.as_ref())),
        );
        self
    }

    /// Chunk size of the buffered line scan
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    /// Build over `source`; `,` is used when no delimiter was added
    pub fn build<S: Read + Seek>(self, source: S) -> Result<DelimitedCursor<S>> {
        let mut text = TextCursor::new(source, self.ending)?;
        if let Some(chunk_size) = self.chunk_size {
            text = text.with_chunk_size(chunk_size);
        }

        if self.delimiters.is_empty() {
            DelimitedCursor::from_text(text, [DEFAULT_DELIMITER])
        } else {
            DelimitedCursor::from_text(text, self.delimiters)
        }
    }
}

/// Iterator over fields, see [`DelimitedCursor::fields`]
pub struct Fields<'a, S> {
    cursor: &'a mut DelimitedCursor<S>,
}

impl<S: Read + Seek> Iterator for Fields<'_, S> {
    type Item = Result<Field>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.read_field().transpose()
    }
}

/// Iterator over split lines, see [`DelimitedCursor::records`]
pub struct Records<'a, S> {
    cursor: &'a mut DelimitedCursor<S>,
}

impl<S: Read + Seek> Iterator for Records<'_, S> {
    type Item = Result<Vec<Bytes>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.get_fields().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn delimited(data: &[u8], ending: LineEnding, delimiters: &[&[u8]]) -> DelimitedCursor<Cursor<Vec<u8>>> {
        DelimitedCursor::new(Cursor::new(data.to_vec()), ending, delimiters.iter().copied()).unwrap()
    }

    fn strings(fields: &[Bytes]) -> Vec<String> {
        fields
            .iter()
            .map(|f| String::from_utf8_lossy(f).into_owned())
            .collect()
    }

    #[test]
    fn test_terminator_appended_once() {
        let d = delimited(b"", LineEnding::Lf, &[b","]);
        assert_eq!(d.delimiters(), &[Bytes::from_static(b","), Bytes::from_static(b"\n")]);

        let d = delimited(b"", LineEnding::Lf, &[b"\n", b","]);
        assert_eq!(d.delimiters(), &[Bytes::from_static(b"\n"), Bytes::from_static(b",")]);

        let d = delimited(b"", LineEnding::Crlf, &[b";", b";"]);
        assert_eq!(d.delimiters(), &[Bytes::from_static(b";"), Bytes::from_static(b"\r\n")]);
    }

    #[test]
    fn test_empty_delimiter_rejected() {
        let err = DelimitedCursor::new(Cursor::new(Vec::new()), LineEnding::Lf, [&b""[..]]).unwrap_err();
        assert!(matches!(err, ScanError::InvalidDelimiter(_)));
    }

    #[test]
    fn test_builder_defaults() {
        let d = DelimitedCursor::<Cursor<Vec<u8>>>::builder().build(Cursor::new(b"a,b".to_vec())).unwrap();
        assert_eq!(d.line_ending(), LineEnding::Lf);
        assert_eq!(d.delimiters(), &[Bytes::from_static(b","), Bytes::from_static(b"\n")]);

        let d = DelimitedCursorBuilder::new()
            .line_ending(LineEnding::Cr)
            .delimiter("\t")
            .delimiters(["|", "=>"])
            .chunk_size(4)
            .build(Cursor::new(Vec::new()))
            .unwrap();
        assert_eq!(d.delimiters().len(), 4);
        assert_eq!(d.chunk_size(), 4);
    }

    #[test]
    fn test_is_on_delimiter() {
        // a0 =1 >2 b3 ,4 c5
        let mut d = delimited(b"a=>b,c", LineEnding::Lf, &[b"=>", b","]);
        let hits: Vec<bool> = (0..7)
            .map(|p| {
                d.seek(p, Whence::Start, true).unwrap();
                d.is_on_delimiter().unwrap()
            })
            .collect();
        // End of stream always counts
        assert_eq!(hits, vec![false, true, true, false, true, false, true]);
        assert_eq!(d.saved_depth(), 0);
    }

    #[test]
    fn test_lone_delimiter_byte_is_not_a_match() {
        let mut d = delimited(b"a=b>c", LineEnding::Lf, &[b"=>"]);
        for p in 0..5 {
            d.seek(p, Whence::Start, true).unwrap();
            assert!(!d.is_on_delimiter().unwrap(), "offset {}", p);
        }
    }

    #[test]
    fn test_seek_after_delimiter_from_either_byte() {
        let mut d = delimited(b"a=>b", LineEnding::Lf, &[b"=>"]);
        d.seek(1, Whence::Start, true).unwrap();
        assert_eq!(d.seek_after_delimiter().unwrap(), 3);
        d.seek(2, Whence::Start, true).unwrap();
        assert_eq!(d.seek_after_delimiter().unwrap(), 3);
        assert_eq!(d.matched_delimiter().unwrap(), None);
        assert_eq!(d.seek_after_delimiter().unwrap(), 3);
    }

    #[test]
    fn test_get_field_sequence() {
        let mut d = delimited(b"a,b,,c\nd", LineEnding::Lf, &[b","]);
        let mut fields = Vec::new();
        while let Some(field) = d.get_field().unwrap() {
            fields.push(field);
        }
        assert_eq!(strings(&fields), vec!["a", "b", "", "c", "d"]);
        assert_eq!(d.get_field().unwrap(), None);
    }

    #[test]
    fn test_get_field_trailing_delimiter() {
        let mut d = delimited(b"a,b,", LineEnding::Lf, &[b","]);
        assert_eq!(&d.get_field().unwrap().unwrap()[..], b"a");
        assert_eq!(&d.get_field().unwrap().unwrap()[..], b"b");
        assert_eq!(d.get_field().unwrap(), None);
    }

    #[test]
    fn test_get_field_crlf() {
        let mut d = delimited(b"a,b\r\nc", LineEnding::Crlf, &[b","]);
        assert_eq!(&d.get_field().unwrap().unwrap()[..], b"a");
        assert_eq!(&d.get_field().unwrap().unwrap()[..], b"b");
        assert_eq!(d.tell(), 5);
        assert_eq!(&d.get_field().unwrap().unwrap()[..], b"c");
    }

    #[test]
    fn test_read_field_records_delimiter() {
        let data = b"k=>v,x\r\ny";
        let mut d = delimited(data, LineEnding::Crlf, &[b"=>", b","]);
        let fields: Vec<Field> = d.fields().collect::<Result<_>>().unwrap();

        let delimiters: Vec<Option<&[u8]>> = fields.iter().map(|f| f.delimiter.as_deref()).collect();
        assert_eq!(
            delimiters,
            vec![Some(&b"=>"[..]), Some(&b","[..]), Some(&b"\r\n"[..]), None]
        );

        let mut rebuilt = Vec::new();
        for field in &fields {
            field.write_raw(&mut rebuilt);
        }
        assert_eq!(rebuilt, data);
    }

    #[test]
    fn test_get_fields_safe() {
        let mut d = delimited(b"a,b,c", LineEnding::Lf, &[b","]);
        let fields = d.get_fields_safe(2).unwrap().unwrap();
        assert_eq!(strings(&fields), vec!["a", "b"]);
        assert_eq!(d.tell(), 4);

        let rest = d.get_fields_safe(10).unwrap().unwrap();
        assert_eq!(strings(&rest), vec!["c"]);
        assert_eq!(d.get_fields_safe(10).unwrap(), None);
    }

    #[test]
    fn test_get_fields_safe_zero() {
        let mut d = delimited(b"a,b", LineEnding::Lf, &[b","]);
        assert_eq!(d.get_fields_safe(0).unwrap(), None);
        assert_eq!(d.tell(), 0);
    }

    #[test]
    fn test_get_fields_bulk() {
        let mut d = delimited(b"a,b,,c\nx;y\n\n", LineEnding::Lf, &[b",", b";"]);
        assert_eq!(strings(&d.get_fields().unwrap().unwrap()), vec!["a", "b", "", "c"]);
        assert_eq!(strings(&d.get_fields().unwrap().unwrap()), vec!["x", "y"]);
        assert_eq!(strings(&d.get_fields().unwrap().unwrap()), vec![""]);
        assert_eq!(d.get_fields().unwrap(), None);
    }

    #[test]
    fn test_get_fields_raw_bytes() {
        let mut d = delimited(b"a\xFF\xFEb.c\n", LineEnding::Lf, &[b"\xFF\xFE", b"."]);
        let fields = d.get_fields().unwrap().unwrap();
        assert_eq!(
            fields,
            vec![
                Bytes::from_static(b"a"),
                Bytes::from_static(b"b"),
                Bytes::from_static(b"c")
            ]
        );
    }

    #[test]
    fn test_get_fields_earlier_delimiter_wins() {
        let mut d = delimited(b"a<>b\n", LineEnding::Lf, &[b"<", b"<>"]);
        assert_eq!(strings(&d.get_fields().unwrap().unwrap()), vec!["a", ">b"]);
    }

    #[test]
    fn test_both_strategies_agree_on_single_line() {
        let data = b"one|two=>three|=>four";
        let mut walk = delimited(data, LineEnding::Lf, &[b"|", b"=>"]);
        let mut bulk = delimited(data, LineEnding::Lf, &[b"|", b"=>"]);

        let walked = walk.get_fields_safe(usize::MAX).unwrap().unwrap();
        let split = bulk.get_fields().unwrap().unwrap();
        assert_eq!(walked, split);
    }

    #[test]
    fn test_set_delimiters_rebuilds_pattern() {
        let mut d = delimited(b"a;b,c\n", LineEnding::Lf, &[b","]);
        d.set_delimiters([";"]).unwrap();
        assert_eq!(d.delimiters(), &[Bytes::from_static(b";"), Bytes::from_static(b"\n")]);
        assert_eq!(strings(&d.get_fields().unwrap().unwrap()), vec!["a", "b,c"]);
    }

    #[test]
    fn test_records_iterator() {
        let mut d = delimited(b"1,2\n3,4", LineEnding::Lf, &[b","]);
        let records: Vec<Vec<Bytes>> = d.records().collect::<Result<_>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(strings(&records[1]), vec!["3", "4"]);
    }

    #[test]
    fn test_repeated_byte_delimiter_limitation() {
        // x0 :1 y2 :3 :4 z5
        let mut d = delimited(b"x:y::z", LineEnding::Lf, &[b"::"]);
        d.seek(3, Whence::Start, true).unwrap();
        assert!(d.is_on_delimiter().unwrap());
        // On the second ':' the first occurrence is assumed, so the match is missed
        d.seek(4, Whence::Start, true).unwrap();
        assert!(!d.is_on_delimiter().unwrap());
    }
}
