// glaciertool/src/report/mod.rs
//! Semicolon-delimited report files, one per operation.

use chrono::Local;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::errors::ReportError;

pub const DELIMITER: char = ';';

/// A record that can be written as one report row.
pub trait ReportRow {
    /// Column names, in field order.
    const HEADER: &'static [&'static str];

    fn fields(&self) -> Vec<String>;
}

/// Buffered writer for one report file. Rows are flushed by `finish`; a
/// writer dropped early still flushes what it buffered, but errors are lost.
pub struct ReportWriter {
    path: PathBuf,
    writer: BufWriter<File>,
}

/// `<operation>_<bucket>_<timestamp>.txt`
pub fn report_file_name(operation: &str, bucket: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d_%H_%M_%S");
    format!("{}_{}_{}.txt", operation, bucket, timestamp)
}

impl ReportWriter {
    /// Creates the report file in `dir` and writes the header for `R`.
    pub fn create<R: ReportRow>(dir: &Path, operation: &str, bucket: &str) -> Result<Self, ReportError> {
        let path = dir.join(report_file_name(operation, bucket));
        let file = File::create(&path).map_err(|source| ReportError::Create {
            path: path.clone(),
            source,
        })?;

        let mut report = ReportWriter {
            path,
            writer: BufWriter::new(file),
        };
        report.write_line(R::HEADER.iter().copied())?;
        Ok(report)
    }

    pub fn write_row<R: ReportRow>(&mut self, row: &R) -> Result<(), ReportError> {
        let fields = row.fields();
        self.write_line(fields.iter().map(String::as_str))
    }

    pub fn write_rows<'a, R: ReportRow + 'a>(
        &mut self,
        rows: impl IntoIterator<Item = &'a R>,
    ) -> Result<(), ReportError> {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    /// Flushes and closes the file, returning its path.
    pub fn finish(mut self) -> Result<PathBuf, ReportError> {
        self.writer.flush().map_err(|source| ReportError::Write {
            path: self.path.clone(),
            source,
        })?;
        Ok(self.path)
    }

    fn write_line<'a>(&mut self, fields: impl Iterator<Item = &'a str>) -> Result<(), ReportError> {
        let mut line = String::new();
        for (i, field) in fields.enumerate() {
            if i > 0 {
                line.push(DELIMITER);
            }
            line.push_str(field);
        }
        line.push('\n');
        self.writer.write_all(line.as_bytes()).map_err(|source| ReportError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
