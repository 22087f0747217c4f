//! Output generation module
//!
//! Incidents leave the crawler through an [`IncidentSink`]; the CSV sink is
//! the production implementation.

mod csv_sink;
mod stats;
mod traits;

pub use csv_sink::CsvSink;
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{IncidentSink, OutputError, OutputResult};
