//! Output sink trait and errors

use crate::incident::Incident;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to serialize field: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for finished incident records
///
/// Records arrive one at a time, in crawl order. Implementations must make
/// each record durable before returning so a failed run keeps what it wrote.
pub trait IncidentSink {
    /// Writes one incident
    fn write_incident(&mut self, incident: &Incident) -> OutputResult<()>;

    /// Flushes any buffered output
    fn finish(&mut self) -> OutputResult<()>;
}

/// Collects incidents in memory
impl IncidentSink for Vec<Incident> {
    fn write_incident(&mut self, incident: &Incident) -> OutputResult<()> {
        self.push(incident.clone());
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        Ok(())
    }
}
