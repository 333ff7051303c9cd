//! Fuzzing entry points for seekfield-core
//!
//! To use with cargo-fuzz:
//! 1. Install cargo-fuzz: cargo install cargo-fuzz
//! 2. Run fuzzer: cargo fuzz run fuzz_lines

use seekfield_core::{DelimitedCursor, LineEnding, TextCursor, Whence};
use std::io::Cursor;

const ENDINGS: [LineEnding; 3] = [LineEnding::Lf, LineEnding::Crlf, LineEnding::Cr];

pub fn fuzz_lines(data: &[u8]) {
    for ending in ENDINGS {
        let Ok(mut cursor) = TextCursor::new(Cursor::new(data), Some(ending)) else {
            continue;
        };

        // Read and navigate - should never panic
        for line in cursor.lines() {
            if line.is_err() {
                break;
            }
        }
        let _ = cursor.seek_line(-1, Whence::End);
        let _ = cursor.line_bounds();
        let _ = cursor.seek_prev_line_start();
    }
}

pub fn fuzz_fields(data: &[u8]) {
    // First byte picks the line ending, the next two the delimiter
    let (header, body) = data.split_at(data.len().min(3));
    let ending = ENDINGS[header.first().map_or(0, |b| *b as usize % ENDINGS.len())];
    let delimiter = match header.get(1..) {
        Some(d) if !d.is_empty() => d,
        _ => b",",
    };

    let Ok(mut cursor) = DelimitedCursor::new(Cursor::new(body), ending, [delimiter]) else {
        return;
    };

    // Walk every field - should never panic
    for field in cursor.fields() {
        if field.is_err() {
            break;
        }
    }

    let _ = cursor.rewind();
    for record in cursor.records() {
        if record.is_err() {
            break;
        }
    }
}
