//! Tab-separated well table reading
//!
//! Candidate and reference wells arrive as headerless text: one well per
//! line, EOV easting and northing separated by a single tab. The format
//! is strict; a malformed line fails the whole read with its 1-based
//! line number rather than silently dropping the row.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::vector::{Well, WellSet};
use std::path::Path;

/// Read a well table from a file.
///
/// The set takes its name from the file stem. Coordinates are EOV
/// metres; the table format has no CRS channel.
pub fn read_well_table<P: AsRef<Path>>(path: P) -> Result<WellSet> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("wells")
        .to_string();
    let data = std::fs::read(path)?;
    parse_well_table(&data, &name, &path.display().to_string())
}

/// Read a well table from an in-memory buffer.
pub fn read_well_table_from_buffer(data: &[u8], name: &str) -> Result<WellSet> {
    parse_well_table(data, name, name)
}

fn parse_well_table(data: &[u8], name: &str, source_id: &str) -> Result<WellSet> {
    let text = std::str::from_utf8(data).map_err(|e| {
        let line = data[..e.valid_up_to()].iter().filter(|&&b| b == b'\n').count() + 1;
        malformed(source_id, line, "not valid UTF-8")
    })?;

    let mut lines: Vec<&str> = text.lines().collect();
    // Trailing blank lines are editor noise, not rows
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }

    let mut wells = Vec::with_capacity(lines.len());
    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            return Err(malformed(source_id, line_no, "blank line inside the table"));
        }
        let mut fields = line.split('\t');
        let (Some(first), Some(second), None) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(malformed(
                source_id,
                line_no,
                "expected exactly two tab-separated fields",
            ));
        };
        let x = parse_coord(first, source_id, line_no, "easting")?;
        let y = parse_coord(second, source_id, line_no, "northing")?;
        wells.push(Well::new(x, y));
    }
    Ok(WellSet::new(name, wells, CRS::eov()))
}

fn parse_coord(field: &str, source_id: &str, line: usize, which: &str) -> Result<f64> {
    let trimmed = field.trim();
    let value: f64 = trimmed
        .parse()
        .map_err(|_| malformed(source_id, line, format!("cannot parse {which} value {trimmed:?}")))?;
    if !value.is_finite() {
        return Err(malformed(
            source_id,
            line,
            format!("non-finite {which} value {trimmed:?}"),
        ));
    }
    Ok(value)
}

fn malformed(source_id: &str, line: usize, reason: impl Into<String>) -> Error {
    Error::MalformedRow {
        source_id: source_id.to_string(),
        line,
        reason: reason.into(),
    }
}
