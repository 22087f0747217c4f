//! Incident record and its content-derived identity

use crate::incident::FieldMap;
use sha2::{Digest, Sha256};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Column names of a serialized incident, in output order
pub const CSV_HEADER: [&str; 17] = [
    "sha256",
    "year",
    "month",
    "day",
    "state",
    "city_or_county",
    "address",
    "num_killed",
    "num_injured",
    "incident_link",
    "lat",
    "lon",
    "participants",
    "characteristics",
    "notes",
    "guns_involved",
    "district",
];

/// The nine fields that make up an incident's identity
///
/// Field order is significant: the identity hash is taken over the string
/// forms of these fields, concatenated in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentCore {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub state: String,
    pub city_or_county: String,
    pub address: String,
    pub num_killed: u32,
    pub num_injured: u32,
    /// Absolute URL of the incident's detail page
    pub incident_link: String,
}

impl Default for IncidentCore {
    fn default() -> Self {
        Self {
            year: 1970,
            month: 1,
            day: 1,
            state: String::new(),
            city_or_county: String::new(),
            address: String::new(),
            num_killed: 0,
            num_injured: 0,
            incident_link: String::new(),
        }
    }
}

impl IncidentCore {
    /// The concatenated, separator-free string the identity hash covers
    pub fn identity_input(&self) -> String {
        format!(
            "{}{}{}{}{}{}{}{}{}",
            self.year,
            self.month,
            self.day,
            self.state,
            self.city_or_county,
            self.address,
            self.num_killed,
            self.num_injured,
            self.incident_link
        )
    }

    /// Hex-encoded SHA-256 of [`identity_input`](Self::identity_input)
    pub fn identity_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.identity_input().as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Descriptive attributes read from the detail page
///
/// None of these contribute to the identity hash.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentDetails {
    /// Decimal degrees; 0.0 means unknown
    pub latitude: f64,
    /// Decimal degrees; 0.0 means unknown
    pub longitude: f64,
    pub participants: Vec<FieldMap>,
    pub characteristics: Vec<String>,
    pub notes: String,
    pub guns_involved: Vec<FieldMap>,
    pub district: FieldMap,
}

/// One reported incident
///
/// The core fields are private so that every change to them goes through
/// [`update_core`](Self::update_core), which keeps the identity hash current.
/// Equality and hashing use the identity hash only.
#[derive(Debug, Clone)]
pub struct Incident {
    core: IncidentCore,
    sha256: String,
    details: IncidentDetails,
}

impl Default for Incident {
    fn default() -> Self {
        Self::from_core(IncidentCore::default())
    }
}

impl Incident {
    /// Creates an empty incident (1970-01-01, zero counts, empty text)
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an incident from its core fields, computing the identity
    pub fn from_core(core: IncidentCore) -> Self {
        let sha256 = core.identity_hash();
        Self {
            core,
            sha256,
            details: IncidentDetails::default(),
        }
    }

    pub fn core(&self) -> &IncidentCore {
        &self.core
    }

    /// Mutates the core fields, then recomputes the identity hash
    ///
    /// # Example
    ///
    /// ```
    /// use shootings_crawler::Incident;
    ///
    /// let mut incident = Incident::new();
    /// let before = incident.sha256().to_string();
    /// incident.update_core(|core| core.num_killed = 4);
    /// assert_ne!(incident.sha256(), before);
    /// ```
    pub fn update_core<F>(&mut self, update: F)
    where
        F: FnOnce(&mut IncidentCore),
    {
        update(&mut self.core);
        self.recompute_identity();
    }

    /// Hex-encoded identity hash
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    pub fn details(&self) -> &IncidentDetails {
        &self.details
    }

    /// Mutable access to the secondary fields; never touches the identity
    pub fn details_mut(&mut self) -> &mut IncidentDetails {
        &mut self.details
    }

    pub fn incident_link(&self) -> &str {
        &self.core.incident_link
    }

    fn recompute_identity(&mut self) {
        self.sha256 = self.core.identity_hash();
    }

    /// Serializes the incident as one output row, in [`CSV_HEADER`] order
    ///
    /// Collection fields become compact JSON text.
    pub fn to_record(&self) -> Result<Vec<String>, serde_json::Error> {
        let core = &self.core;
        let details = &self.details;

        Ok(vec![
            self.sha256.clone(),
            core.year.to_string(),
            core.month.to_string(),
            core.day.to_string(),
            core.state.clone(),
            core.city_or_county.clone(),
            core.address.clone(),
            core.num_killed.to_string(),
            core.num_injured.to_string(),
            core.incident_link.clone(),
            details.latitude.to_string(),
            details.longitude.to_string(),
            serde_json::to_string(&details.participants)?,
            serde_json::to_string(&details.characteristics)?,
            details.notes.clone(),
            serde_json::to_string(&details.guns_involved)?,
            serde_json::to_string(&details.district)?,
        ])
    }
}

impl PartialEq for Incident {
    fn eq(&self, other: &Self) -> bool {
        self.sha256 == other.sha256
    }
}

impl Eq for Incident {}

impl Hash for Incident {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sha256.hash(state);
    }
}

impl fmt::Display for Incident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}, {}",
            self.core.year, self.core.month, self.core.day, self.core.incident_link
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn las_vegas() -> IncidentCore {
        IncidentCore {
            year: 2017,
            month: 10,
            day: 1,
            state: "Nevada".to_string(),
            city_or_county: "Las Vegas".to_string(),
            address: "3950 Las Vegas Blvd S".to_string(),
            num_killed: 58,
            num_injured: 489,
            incident_link: "https://www.gunviolencearchive.org/incident/946229".to_string(),
        }
    }

    fn sha256_hex(input: &str) -> String {
        hex::encode(Sha256::digest(input.as_bytes()))
    }

    #[test]
    fn test_empty_incident_defaults() {
        let incident = Incident::new();
        let core = incident.core();

        assert_eq!((core.year, core.month, core.day), (1970, 1, 1));
        assert_eq!(core.num_killed, 0);
        assert_eq!(core.num_injured, 0);
        assert!(core.state.is_empty());
        assert_eq!(incident.details().latitude, 0.0);
        assert_eq!(incident.details().longitude, 0.0);
        assert_eq!(incident.sha256(), sha256_hex("19701100"));
    }

    #[test]
    fn test_identity_input_has_no_separators() {
        assert_eq!(
            las_vegas().identity_input(),
            "2017101NevadaLas Vegas3950 Las Vegas Blvd S58489https://www.gunviolencearchive.org/incident/946229"
        );
    }

    #[test]
    fn test_identity_hash_is_sha256_of_input() {
        let incident = Incident::from_core(las_vegas());
        assert_eq!(
            incident.sha256(),
            sha256_hex(&las_vegas().identity_input())
        );
        assert_eq!(incident.sha256().len(), 64);
    }

    #[test]
    fn test_identity_hash_is_idempotent() {
        let incident = Incident::from_core(las_vegas());
        assert_eq!(incident.core().identity_hash(), incident.core().identity_hash());
        assert_eq!(incident.sha256(), incident.core().identity_hash());
    }

    #[test]
    fn test_every_core_field_changes_hash() {
        let mutations: Vec<Box<dyn Fn(&mut IncidentCore)>> = vec![
            Box::new(|c| c.year = 2018),
            Box::new(|c| c.month = 11),
            Box::new(|c| c.day = 2),
            Box::new(|c| c.state = "Texas".to_string()),
            Box::new(|c| c.city_or_county = "Paradise".to_string()),
            Box::new(|c| c.address = "Mandalay Bay".to_string()),
            Box::new(|c| c.num_killed = 59),
            Box::new(|c| c.num_injured = 441),
            Box::new(|c| c.incident_link = "https://example.com/incident/1".to_string()),
        ];

        let original = Incident::from_core(las_vegas());
        for mutate in mutations {
            let mut changed = original.clone();
            changed.update_core(|c| mutate(c));
            assert_ne!(changed.sha256(), original.sha256());
            assert_eq!(changed.sha256(), changed.core().identity_hash());
        }
    }

    #[test]
    fn test_secondary_fields_do_not_change_hash() {
        let mut incident = Incident::from_core(las_vegas());
        let before = incident.sha256().to_string();

        let details = incident.details_mut();
        details.latitude = 36.0952;
        details.longitude = -115.171;
        details.notes = "Shots fired from hotel".to_string();
        details.characteristics.push("Mass Shooting".to_string());
        details.participants.push(FieldMap::from_iter([("Type", "Victim")]));
        details.guns_involved.push(FieldMap::from_iter([("Type", "Rifle")]));
        details.district.insert("Congressional District", "3");

        assert_eq!(incident.sha256(), before);
    }

    #[test]
    fn test_equality_ignores_secondary_fields() {
        let a = Incident::from_core(las_vegas());
        let mut b = Incident::from_core(las_vegas());
        b.details_mut().notes = "different".to_string();

        assert_eq!(a, b);

        let mut c = Incident::from_core(las_vegas());
        c.update_core(|core| core.num_injured = 0);
        assert_ne!(a, c);
    }

    #[test]
    fn test_record_column_order() {
        let mut incident = Incident::from_core(las_vegas());
        incident.details_mut().characteristics = vec!["Mass Shooting".to_string()];
        incident.details_mut().notes = "notes".to_string();

        let record = incident.to_record().unwrap();

        assert_eq!(record.len(), CSV_HEADER.len());
        assert_eq!(record[0], incident.sha256());
        assert_eq!(&record[1..4], &["2017", "10", "1"]);
        assert_eq!(record[4], "Nevada");
        assert_eq!(record[7], "58");
        assert_eq!(record[8], "489");
        assert_eq!(record[10], "0");
        assert_eq!(record[11], "0");
        assert_eq!(record[12], "[]");
        assert_eq!(record[13], r#"["Mass Shooting"]"#);
        assert_eq!(record[14], "notes");
        assert_eq!(record[15], "[]");
        assert_eq!(record[16], "{}");
    }

    #[test]
    fn test_display() {
        let incident = Incident::from_core(las_vegas());
        assert_eq!(
            incident.to_string(),
            "2017/10/1, https://www.gunviolencearchive.org/incident/946229"
        );
    }
}
