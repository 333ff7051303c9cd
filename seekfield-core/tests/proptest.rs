//! Property-based tests using proptest

use bytes::Bytes;
use proptest::prelude::*;
use seekfield_core::{CursorStream, DelimitedCursor, LineEnding, TextCursor, Whence};
use std::io::Cursor;

fn any_ending() -> impl Strategy<Value = LineEnding> {
    prop_oneof![
        Just(LineEnding::Lf),
        Just(LineEnding::Crlf),
        Just(LineEnding::Cr)
    ]
}

/// Bytes drawn from a small alphabet so terminators show up often
fn text_bytes(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        prop_oneof![Just(b'a'), Just(b'b'), Just(b'\r'), Just(b'\n')],
        0..max_len,
    )
}

/// Line contents free of terminator bytes
fn line_contents() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(b'a'..=b'z', 0..12), 1..8)
}

fn join(lines: &[Vec<u8>], terminator: &[u8]) -> Vec<u8> {
    lines.join(terminator)
}

proptest! {
    #[test]
    fn prop_push_pop_restores_position(
        data in prop::collection::vec(any::<u8>(), 1..64),
        seeks in prop::collection::vec((0i64..80, 0i64..80), 1..8)
    ) {
        let mut s = CursorStream::new(Cursor::new(data)).unwrap();
        let mut expected = Vec::new();

        for (before, _) in &seeks {
            s.seek(*before, Whence::Start, true).unwrap();
            expected.push(s.tell());
            s.push();
        }
        for (_, after) in seeks.iter().rev() {
            s.seek(*after, Whence::Start, true).unwrap();
            s.pop().unwrap();
            prop_assert_eq!(Some(s.tell()), expected.pop());
        }
        prop_assert_eq!(s.saved_depth(), 0);
    }

    #[test]
    fn prop_single_byte_eol(data in text_bytes(48), ending in prop_oneof![Just(LineEnding::Lf), Just(LineEnding::Cr)]) {
        let terminator = ending.terminator()[0];
        let mut t = TextCursor::new(Cursor::new(data.clone()), Some(ending)).unwrap();
        for (p, byte) in data.iter().enumerate() {
            t.seek(p as i64, Whence::Start, true).unwrap();
            prop_assert_eq!(t.is_at_eol().unwrap(), *byte == terminator);
        }
    }

    #[test]
    fn prop_crlf_eol_on_either_byte(data in text_bytes(48)) {
        let mut t = TextCursor::new(Cursor::new(data.clone()), Some(LineEnding::Crlf)).unwrap();
        for p in 0..=data.len() {
            let starts = data[p..].starts_with(b"\r\n");
            let ends = p >= 1 && data[p - 1..].starts_with(b"\r\n");
            t.seek(p as i64, Whence::Start, true).unwrap();
            prop_assert_eq!(t.is_at_eol().unwrap(), starts || ends, "offset {}", p);
        }
    }

    #[test]
    fn prop_seek_line_start_idempotent(
        data in text_bytes(48),
        ending in any_ending(),
        position in 0i64..60
    ) {
        let mut t = TextCursor::new(Cursor::new(data), Some(ending)).unwrap();
        t.seek(position, Whence::Start, true).unwrap();
        let once = t.seek_line_start().unwrap();
        let twice = t.seek_line_start().unwrap();
        prop_assert_eq!(once, twice);
        prop_assert_eq!(t.saved_depth(), 0);
    }

    #[test]
    fn prop_line_bounds_bracket_content(
        lines in line_contents(),
        ending in any_ending(),
        pick in any::<prop::sample::Index>(),
        within in any::<prop::sample::Index>()
    ) {
        let data = join(&lines, ending.terminator());
        let line = pick.index(lines.len());
        let start: usize = lines[..line]
            .iter()
            .map(|l| l.len() + ending.byte_len())
            .sum();
        let offset = start + within.index(lines[line].len() + 1);

        let mut t = TextCursor::new(Cursor::new(data.clone()), Some(ending)).unwrap();
        t.seek(offset as i64, Whence::Start, true).unwrap();
        let (from, to) = t.line_bounds().unwrap();
        prop_assert_eq!(&data[from as usize..to as usize], &lines[line][..]);
    }

    #[test]
    fn prop_read_line_returns_every_line(
        lines in line_contents(),
        ending in any_ending(),
        chunk_size in 1usize..9
    ) {
        let mut data = join(&lines, ending.terminator());
        data.extend_from_slice(ending.terminator());

        let mut t = TextCursor::new(Cursor::new(data.clone()), Some(ending))
            .unwrap()
            .with_chunk_size(chunk_size);
        for line in &lines {
            let read = t.read_line().unwrap();
            prop_assert_eq!(read.as_deref(), Some(&line[..]));
        }
        prop_assert_eq!(t.read_line().unwrap(), None);
        prop_assert_eq!(t.tell(), data.len() as u64);
    }

    #[test]
    fn prop_fields_rejoin_to_input(
        values in prop::collection::vec(prop::collection::vec(b'a'..=b'z', 0..6), 1..10),
        separators in prop::collection::vec(0usize..3, 10)
    ) {
        let delimiters: [&[u8]; 3] = [b",", b"=>", b"\n"];
        let mut data = Vec::new();
        for (i, value) in values.iter().enumerate() {
            data.extend_from_slice(value);
            if i + 1 < values.len() {
                data.extend_from_slice(delimiters[separators[i]]);
            }
        }

        let mut d = DelimitedCursor::new(Cursor::new(data.clone()), LineEnding::Lf, [",", "=>"]).unwrap();
        let mut rebuilt = Vec::new();
        while let Some(field) = d.read_field().unwrap() {
            field.write_raw(&mut rebuilt);
        }
        prop_assert_eq!(rebuilt, data);
    }

    #[test]
    fn prop_strategies_agree_per_line(
        values in prop::collection::vec(prop::collection::vec(b'a'..=b'z', 1..6), 1..10)
    ) {
        let line = values.join(&b';');
        let mut walk = DelimitedCursor::new(Cursor::new(line.clone()), LineEnding::Lf, [";"]).unwrap();
        let mut bulk = DelimitedCursor::new(Cursor::new(line), LineEnding::Lf, [";"]).unwrap();

        let walked = walk.get_fields_safe(usize::MAX).unwrap().unwrap();
        let split = bulk.get_fields().unwrap().unwrap();
        let expected: Vec<Bytes> = values.into_iter().map(Bytes::from).collect();
        prop_assert_eq!(&walked, &expected);
        prop_assert_eq!(&split, &expected);
    }

    #[test]
    fn prop_read_line_never_panics(data in prop::collection::vec(any::<u8>(), 0..512), ending in any_ending()) {
        let mut t = TextCursor::new(Cursor::new(data), Some(ending)).unwrap();
        for line in t.lines() {
            let _ = line.unwrap();
        }
    }
}
