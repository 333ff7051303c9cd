use crate::FieldStrategy;
use anyhow::{Context, Result};
use bytes::Bytes;
use seekfield_core::{DelimitedCursor, DelimitedCursorBuilder, LineEnding};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use tracing::{debug, info};

/// Fields extracted from one record
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct FieldRecord {
    /// Zero-based record number
    pub record: usize,
    /// Field values, delimiters removed
    pub fields: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct FieldsOutput {
    strategy: String,
    line_ending: LineEnding,
    delimiters: Vec<String>,
    records: Vec<FieldRecord>,
}

pub fn execute(
    input: &str,
    output: Option<&str>,
    ending: Option<LineEnding>,
    delimiters: &[Vec<u8>],
    strategy: FieldStrategy,
) -> Result<()> {
    info!("Extracting fields from: {} ({:?} strategy)", input, strategy);

    let file = File::open(input).with_context(|| format!("Failed to open input file: {}", input))?;

    let mut builder = DelimitedCursorBuilder::new().delimiters(delimiters);
    if let Some(ending) = ending {
        builder = builder.line_ending(ending);
    }
    let mut cursor = builder
        .build(file)
        .with_context(|| format!("Failed to configure delimiters for: {}", input))?;

    let records = match strategy {
        FieldStrategy::Cursor => walk_records(&mut cursor)?,
        FieldStrategy::Bulk => split_records(&mut cursor)?,
    };

    info!("Extracted {} records", records.len());

    let result = FieldsOutput {
        strategy: format!("{:?}", strategy).to_lowercase(),
        line_ending: cursor.line_ending(),
        delimiters: cursor
            .delimiters()
            .iter()
            .map(|d| String::from_utf8_lossy(d).into_owned())
            .collect(),
        records: records
            .into_iter()
            .enumerate()
            .map(|(record, fields)| FieldRecord {
                record,
                fields: fields
                    .iter()
                    .map(|f| String::from_utf8_lossy(f).into_owned())
                    .collect(),
            })
            .collect(),
    };

    if let Some(output_path) = output {
        let json = serde_json::to_string_pretty(&result)
            .with_context(|| "Failed to serialize fields")?;

        fs::write(output_path, json)
            .with_context(|| format!("Failed to write output file: {}", output_path))?;

        info!("Fields written to: {}", output_path);
    } else {
        for record in &result.records {
            println!("{}", record.fields.join("\t"));
        }
    }

    Ok(())
}

/// Group fields into records, one record per line terminator
fn walk_records(cursor: &mut DelimitedCursor<File>) -> Result<Vec<Vec<Bytes>>> {
    let terminator = cursor.terminator();
    let mut records = Vec::new();
    let mut current = Vec::new();

    for field in cursor.fields() {
        let field = field.with_context(|| "Failed to read field")?;
        let ends_record = match &field.delimiter {
            Some(delimiter) => &delimiter[..] == terminator,
            None => true,
        };
        current.push(field.value);
        if ends_record {
            debug!("Record {} has {} fields", records.len(), current.len());
            records.push(std::mem::take(&mut current));
        }
    }

    // Stream ended right after a field delimiter
    if !current.is_empty() {
        records.push(current);
    }

    Ok(records)
}

fn split_records(cursor: &mut DelimitedCursor<File>) -> Result<Vec<Vec<Bytes>>> {
    cursor
        .records()
        .collect::<seekfield_core::Result<Vec<_>>>()
        .with_context(|| "Failed to read record")
}
