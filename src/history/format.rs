//! Line-oriented text form of a history table
//!
//! ```text
//! [runtime(ms), left_drive, right_drive]
//! [1200, 0.0, 0.0]
//! [450, 0.5, -0.5]
//! ```
//!
//! The first line is the header; each following line is one value row
//! whose first column is an integer millisecond count and whose remaining
//! columns are floats. Floats are written with Rust's shortest round-trip
//! representation, so `parse(serialize(t)) == t` holds exactly.
//!
//! Parsing is strict: any line that does not fit the header aborts the
//! load. No partial table is ever returned. Durations must be plain digits
//! and values must be finite, so `+5`, `NaN` and `inf` are rejected.

use std::fmt::Write;

use super::{HistoryRow, HistoryTable};
use crate::error::{ReplayError, Result};

/// Render a table as text, one line per header/row
pub fn serialize(table: &HistoryTable) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "[{}]", table.header().join(", "));

    for row in table.rows() {
        out.push('[');
        let _ = write!(out, "{}", row.duration_ms);
        for value in &row.values {
            let _ = write!(out, ", {:?}", value);
        }
        out.push_str("]\n");
    }

    out
}

/// Parse text produced by [`serialize`] back into a table
pub fn parse(text: &str) -> Result<HistoryTable> {
    let mut lines: Vec<&str> = text.lines().collect();
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }

    let Some((header_line, value_lines)) = lines.split_first() else {
        return Err(ReplayError::MalformedHeader("input is empty".to_string()));
    };

    let header = parse_header(header_line)?;
    let mut table = HistoryTable::new(header);

    for (idx, line) in value_lines.iter().enumerate() {
        // Header is line 1
        let line_number = idx + 2;
        let row = parse_row(line, table.column_count()).map_err(|reason| {
            ReplayError::MalformedRow {
                line: line_number,
                reason,
            }
        })?;
        table.append_row(row)?;
    }

    tracing::debug!(
        "Parsed history with {} columns and {} rows",
        table.column_count(),
        table.row_count()
    );

    Ok(table)
}

/// Strip the brackets and split on commas, trimming each field
fn split_fields(line: &str) -> Option<Vec<&str>> {
    let inner = line.trim().strip_prefix('[')?.strip_suffix(']')?;
    if inner.trim().is_empty() {
        return Some(Vec::new());
    }
    Some(inner.split(',').map(str::trim).collect())
}

fn parse_header(line: &str) -> Result<Vec<String>> {
    let malformed = |reason: String| ReplayError::MalformedHeader(reason);

    let fields = split_fields(line)
        .ok_or_else(|| malformed(format!("expected a bracketed list, got {:?}", line)))?;

    if fields.is_empty() {
        return Err(malformed("header has no columns".to_string()));
    }

    let mut header: Vec<String> = Vec::with_capacity(fields.len());
    for (i, name) in fields.into_iter().enumerate() {
        if name.is_empty() {
            return Err(malformed(format!("column {} has no name", i)));
        }
        if header.iter().any(|h| h == name) {
            return Err(malformed(format!("duplicate column {}", name)));
        }
        header.push(name.to_string());
    }

    Ok(header)
}

fn parse_row(line: &str, columns: usize) -> std::result::Result<HistoryRow, String> {
    let fields =
        split_fields(line).ok_or_else(|| format!("expected a bracketed list, got {:?}", line))?;

    if fields.len() != columns {
        return Err(format!(
            "expected {} columns, got {}",
            columns,
            fields.len()
        ));
    }

    let (duration, values) = fields
        .split_first()
        .ok_or_else(|| "row has no columns".to_string())?;

    if !duration.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(format!("duration {:?} is not a millisecond count", duration));
    }
    let duration_ms = duration
        .parse::<u64>()
        .map_err(|e| format!("duration {:?} is not a millisecond count: {}", duration, e))?;

    let values = values
        .iter()
        .enumerate()
        .map(|(i, field)| match field.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            Ok(_) => Err(format!("column {} value {:?} is not finite", i + 1, field)),
            Err(e) => Err(format!("column {} value {:?}: {}", i + 1, field, e)),
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(HistoryRow::new(duration_ms, values))
}
