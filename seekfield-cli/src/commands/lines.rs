use anyhow::{Context, Result};
use colored::Colorize;
use seekfield_core::{LineEnding, TextCursor, Whence};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::info;

/// One line as written to the JSON output
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct LineRecord {
    /// Zero-based line number
    pub number: u64,
    /// Byte offset where the line starts
    pub offset: u64,
    /// Line content without its terminator
    pub text: String,
}

pub fn execute(
    input: &str,
    output: Option<&str>,
    ending: Option<LineEnding>,
    from_line: u64,
    max_lines: Option<usize>,
) -> Result<()> {
    info!("Reading lines from: {}", input);

    let mut cursor = TextCursor::open(input, ending)
        .with_context(|| format!("Failed to open input file: {}", input))?;

    info!("Line ending: {}", cursor.line_ending());

    if from_line > 0 {
        let offset = i64::try_from(from_line)
            .with_context(|| format!("Line number out of range: {}", from_line))?;
        cursor
            .seek_line(offset, Whence::Start)
            .with_context(|| format!("Failed to seek to line {}", from_line))?;
    }

    let mut records = Vec::new();
    let mut number = from_line;
    loop {
        if max_lines.is_some_and(|max| records.len() >= max) {
            break;
        }
        let offset = cursor.tell();
        let line = match cursor
            .read_line()
            .with_context(|| format!("Failed to read line {}", number))?
        {
            Some(line) => line,
            None => break,
        };
        records.push(LineRecord {
            number,
            offset,
            text: String::from_utf8_lossy(&line).into_owned(),
        });
        number += 1;
    }

    info!("Read {} lines", records.len());

    if let Some(output_path) = output {
        let json = serde_json::to_string_pretty(&records)
            .with_context(|| "Failed to serialize lines")?;

        fs::write(output_path, json)
            .with_context(|| format!("Failed to write output file: {}", output_path))?;

        info!("Lines written to: {}", output_path);
    } else {
        for record in &records {
            println!(
                "{} {}",
                format!("{:>6}", record.number).dimmed(),
                record.text
            );
        }
    }

    Ok(())
}
