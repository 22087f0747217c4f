//! CSV output
//!
//! The header is written when the sink is created and every record is
//! flushed as soon as it is written.

use crate::incident::{Incident, CSV_HEADER};
use crate::output::traits::{IncidentSink, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Streams incidents to delimited text
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    rows: u64,
}

impl CsvSink<File> {
    /// Creates (or truncates) `path` and writes the header row
    pub fn create(path: &Path) -> OutputResult<Self> {
        let file = File::create(path)?;
        Self::new(file)
    }
}

impl<W: Write> CsvSink<W> {
    /// Wraps a writer and writes the header row
    pub fn new(inner: W) -> OutputResult<Self> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(CSV_HEADER)?;
        writer.flush()?;
        Ok(Self { writer, rows: 0 })
    }

    /// Data rows written so far
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flushes and returns the underlying writer
    pub fn into_inner(self) -> OutputResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| std::io::Error::new(e.error().kind(), e.error().to_string()).into())
    }
}

impl<W: Write> IncidentSink for CsvSink<W> {
    fn write_incident(&mut self, incident: &Incident) -> OutputResult<()> {
        self.writer.write_record(incident.to_record()?)?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
