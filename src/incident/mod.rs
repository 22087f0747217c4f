//! Incident records
//!
//! An incident is split into its nine identity-bearing core fields and the
//! descriptive details scraped from its detail page. The SHA-256 identity
//! hash covers the core fields only.

mod fields;
mod record;

pub use fields::FieldMap;
pub use record::{Incident, IncidentCore, IncidentDetails, CSV_HEADER};
