use anyhow::{Context, Result};
use seekfield_core::{LineEnding, TextCursor, Whence};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::info;

/// Where a line sits in the file
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct LineLocation {
    /// Requested line offset
    pub line: i64,
    /// First byte of the line
    pub start: u64,
    /// One past the last content byte
    pub content_end: u64,
    /// Line content without its terminator
    pub text: String,
}

pub fn execute(
    input: &str,
    output: Option<&str>,
    ending: Option<LineEnding>,
    line: i64,
    from_end: bool,
) -> Result<()> {
    let whence = if from_end { Whence::End } else { Whence::Start };
    info!("Seeking to line {} from {:?} in: {}", line, whence, input);

    let mut cursor = TextCursor::open(input, ending)
        .with_context(|| format!("Failed to open input file: {}", input))?;

    let start = cursor
        .seek_line(line, whence)
        .with_context(|| format!("Failed to seek to line {}", line))?;
    let (_, content_end) = cursor
        .line_bounds()
        .with_context(|| "Failed to locate line bounds")?;
    let text = cursor
        .read_line()
        .with_context(|| "Failed to read line")?
        .map(|l| String::from_utf8_lossy(&l).into_owned())
        .unwrap_or_default();

    let location = LineLocation {
        line,
        start,
        content_end,
        text,
    };

    println!(
        "Line {} @ bytes {}..{}: {}",
        location.line, location.start, location.content_end, location.text
    );

    if let Some(output_path) = output {
        let json = serde_json::to_string_pretty(&location)
            .with_context(|| "Failed to serialize line location")?;

        fs::write(output_path, json)
            .with_context(|| format!("Failed to write output file: {}", output_path))?;

        info!("Line location written to: {}", output_path);
    }

    Ok(())
}
