//! # Incidents
//!
//! An incident is one observed event on the campaign trail: a rally, an arrest,
//! a clash. The struct doubles as the wire shape of the live feed, the remote
//! snapshot store and the enrichment service, so everything beyond the
//! identifying triple (`id`, `type`, `location`) is optional on input.

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use super::InvalidRecord;

/// Category of an incident.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum IncidentType {
    /// Physical violence, clashes, shootings.
    Violence,
    /// Demonstrations and marches.
    Protest,
    /// Detentions of candidates, agents or supporters.
    Arrest,
    /// Threats, blockades, voter intimidation.
    Intimidation,
    /// Campaign rallies.
    Rally,
}

impl IncidentType {
    /// Base severity used by the violence index.
    pub const fn base_weight(self) -> f64 {
        match self {
            Self::Violence => 8.0,
            Self::Protest => 5.0,
            Self::Arrest | Self::Intimidation | Self::Rally => 1.0,
        }
    }
}

/// One time-stamped step in a forensic reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    /// Free-form time label, e.g. `14:30`.
    pub time: String,
    /// What happened.
    pub event: String,
}

/// Analyst annotation attached to a verified incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForensicAnalysis {
    /// Letter grade of the reporting source (A is best).
    pub source_reliability: String,
    /// Credibility between 0 and 100.
    pub credibility_score: f64,
    /// Named sources.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Analyst narrative.
    #[serde(default)]
    pub analysis: String,
    /// Ordered reconstruction.
    #[serde(default)]
    pub timeline: Vec<TimelineEvent>,
}

/// A reported election incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    /// Stable identifier, unique within the incident collection.
    pub id: String,
    /// Day the incident happened, `YYYY-MM-DD`.
    #[serde(default)]
    pub date: String,
    /// Human-readable place name.
    pub location: String,
    /// Latitude and longitude.
    #[serde(default)]
    pub coordinates: (f64, f64),
    /// Category.
    #[serde(rename = "type")]
    pub incident_type: IncidentType,
    /// Reported deaths.
    #[serde(default)]
    pub fatalities: u32,
    /// Reported injuries.
    #[serde(default)]
    pub injuries: u32,
    /// Free-text account.
    #[serde(default)]
    pub description: String,
    /// Whether the incident was independently verified.
    #[serde(default)]
    pub verified: bool,
    /// Optional analyst annotation.
    #[serde(default, alias = "forensicAnalysis", skip_serializing_if = "Option::is_none")]
    pub forensic: Option<ForensicAnalysis>,
}

fn date_pattern() -> &'static Regex {
    static DATE_RE: OnceLock<Regex> = OnceLock::new();
    DATE_RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap_or_else(|_| unreachable!()))
}

/// Parses a day-granularity date, accepting only the zero-padded `YYYY-MM-DD` form.
pub fn parse_incident_date(value: &str) -> Option<NaiveDate> {
    if !date_pattern().is_match(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

impl Incident {
    /// The incident date, if it is a valid strict `YYYY-MM-DD` date.
    pub fn day(&self) -> Option<NaiveDate> {
        parse_incident_date(&self.date)
    }

    /// Year of the incident date, if valid.
    pub fn year(&self) -> Option<i32> {
        self.day().map(|d| d.year())
    }

    /// The minimum a live frame must carry: a non-empty id and location. The
    /// category is already enforced by deserialization.
    pub fn check_identity(&self) -> Result<(), InvalidRecord> {
        if self.id.trim().is_empty() {
            return Err(InvalidRecord::MissingField("id"));
        }
        if self.location.trim().is_empty() {
            return Err(InvalidRecord::MissingField("location"));
        }
        Ok(())
    }

    /// Full validation applied before an incident may enter a canonical collection.
    pub fn validate(&self) -> Result<(), InvalidRecord> {
        self.check_identity()?;
        if self.day().is_none() {
            return Err(InvalidRecord::InvalidDate(self.date.clone()));
        }
        if let Some(forensic) = &self.forensic {
            super::check_score("credibilityScore", forensic.credibility_score)?;
        }
        Ok(())
    }
}
