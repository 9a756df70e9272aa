//! CSV reading and writing for the subject list and the output table.
//!
//! The output table is rewritten in full after every subject; the file
//! on disk is the only accumulated state. Last successful write wins.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use tracing::warn;

use crate::types::{OutputRow, Subject};

/// Read the subject list: a header row, then name in column 0 and a
/// non-negative integer identifier in column 1. Malformed input is
/// fatal.
pub fn read_subjects(path: &Path) -> Result<Vec<Subject>> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open input file: {}", path.display()))?;
    read_subjects_from(file)
        .with_context(|| format!("Failed to read input file: {}", path.display()))
}

fn read_subjects_from<R: Read>(reader: R) -> Result<Vec<Subject>> {
    let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let mut subjects = Vec::new();
    for (idx, record) in csv_reader.records().enumerate() {
        // Row numbers are 1-based and account for the header
        let row = idx + 2;
        let record = record.with_context(|| format!("Row {}: unreadable record", row))?;

        let name = match record.get(0).map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => bail!("Row {}: missing name", row),
        };
        let raw_id = record.get(1).map(str::trim).unwrap_or("");
        let identifier: u64 = raw_id.parse().with_context(|| {
            format!(
                "Row {}: identifier {:?} is not a non-negative integer",
                row, raw_id
            )
        })?;

        subjects.push(Subject { name, identifier });
    }
    Ok(subjects)
}

/// Read the accumulated output table. A missing file is an empty table.
pub fn read_table(path: &Path) -> Result<Vec<OutputRow>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open output file: {}", path.display()))?;
    read_table_from(file)
        .with_context(|| format!("Failed to read output file: {}", path.display()))
}

fn read_table_from<R: Read>(reader: R) -> Result<Vec<OutputRow>> {
    let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let mut rows = Vec::new();
    for record in csv_reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

fn write_table_to<W: Write>(writer: W, rows: &[OutputRow]) -> Result<()> {
    let mut csv_writer = WriterBuilder::new().has_headers(true).from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn write_table(path: &Path, rows: &[OutputRow]) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    write_table_to(file, rows)
}

/// Rewrite the whole output table, asking the user to retry or skip on
/// failure (the usual cause is the file being open in a viewer).
/// Skipping abandons this update only; the previous file contents stay
/// and the run continues. Returns whether the write landed.
pub fn write_table_with_prompt(path: &Path, rows: &[OutputRow]) -> Result<bool> {
    loop {
        match write_table(path, rows) {
            Ok(()) => return Ok(true),
            Err(err) => {
                warn!("Failed to write {}: {:#}", path.display(), err);
                eprintln!(
                    "Could not update {}. Close the file if you are viewing it.",
                    path.display()
                );
                if !prompt_retry()? {
                    warn!("Skipped update of {} at user request", path.display());
                    return Ok(false);
                }
            }
        }
    }
}

fn prompt_retry() -> Result<bool> {
    eprint!("Retry? [Y/n] ");
    io::stderr().flush()?;
    let mut line = String::new();
    let read = io::stdin()
        .read_line(&mut line)
        .context("Failed to read response")?;
    if read == 0 {
        // stdin closed; decline rather than prompting forever
        return Ok(false);
    }
    let answer = line.trim().to_lowercase();
    Ok(answer != "n" && answer != "no")
}

/// First free numbered variant of `path`: "out.csv" becomes "out(1).csv",
/// then "out(2).csv", and so on. Returns `path` itself if nothing is
/// there yet.
pub fn fresh_output_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let ext = path.extension().and_then(|s| s.to_str());
    let parent = path.parent().unwrap_or_else(|| Path::new(""));

    let mut count = 1;
    loop {
        let name = match ext {
            Some(e) => format!("{}({}).{}", stem, count, e),
            None => format!("{}({})", stem, count),
        };
        let candidate = parent.join(name);
        if !candidate.exists() {
            return candidate;
        }
        count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_subjects_positionally_after_header() {
        let input = "NAME,NUMBER\nJane Doe,7\nBob,12345678901\n";
        let subjects = read_subjects_from(Cursor::new(input)).unwrap();
        assert_eq!(subjects.len(), 2);
        assert_eq!(subjects[0], Subject::new("Jane Doe", 7));
        assert_eq!(subjects[1], Subject::new("Bob", 12345678901));
    }

    #[test]
    fn test_read_subjects_rejects_bad_identifier() {
        let err = read_subjects_from(Cursor::new("NAME,NUMBER\nJane,abc\n")).unwrap_err();
        assert!(err.to_string().contains("Row 2"));

        assert!(read_subjects_from(Cursor::new("NAME,NUMBER\nJane,-3\n")).is_err());
        assert!(read_subjects_from(Cursor::new("NAME,NUMBER\n,7\n")).is_err());
    }

    #[test]
    fn test_write_fixed_three_column_layout() {
        let rows = vec![
            OutputRow::new("Alice", "00000001", "a@x.com"),
            OutputRow::new("", "", "a2@x.com"),
            OutputRow::new("Bob", "00000002", ""),
        ];
        let mut buf = Vec::new();
        write_table_to(&mut buf, &rows).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "name,identifier,email\nAlice,00000001,a@x.com\n,,a2@x.com\nBob,00000002,\n"
        );
    }

    #[test]
    fn test_read_back_preserves_blanked_rows() {
        let stored = "name,identifier,email\nAlice,00000001,a@x.com\n,,a2@x.com\n";
        let rows = read_table_from(Cursor::new(stored)).unwrap();
        assert_eq!(
            rows,
            vec![
                OutputRow::new("Alice", "00000001", "a@x.com"),
                OutputRow::new("", "", "a2@x.com"),
            ]
        );
    }

    #[test]
    fn test_read_empty_table() {
        assert!(read_table_from(Cursor::new("")).unwrap().is_empty());
    }
}
