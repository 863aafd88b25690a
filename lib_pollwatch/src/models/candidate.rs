//! # Candidates
//!
//! Presidential and parliamentary candidates as tracked by the dashboard, plus
//! the partial update shape produced by enrichment runs.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use super::{check_score, InvalidRecord};

/// A presidential candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Stable identifier.
    pub id: String,
    /// Full display name.
    pub name: String,
    /// Party label.
    pub party: String,
    /// Home district.
    #[serde(default)]
    pub district: String,
    /// Sentiment between 0 and 100.
    pub sentiment_score: f64,
    /// Media mentions.
    #[serde(default)]
    pub mentions: u64,
    /// Projected vote share between 0 and 100.
    pub vote_projection: f64,
    /// Portrait reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Analyst notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Candidate {
    /// Checks the identifier and the 0-100 scores.
    pub fn validate(&self) -> Result<(), InvalidRecord> {
        if self.id.trim().is_empty() {
            return Err(InvalidRecord::MissingField("id"));
        }
        if self.name.trim().is_empty() {
            return Err(InvalidRecord::MissingField("name"));
        }
        check_score("sentimentScore", self.sentiment_score)?;
        check_score("voteProjection", self.vote_projection)
    }
}

/// Seat type contested by a parliamentary candidate.
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
pub enum MpCategory {
    /// District woman representative.
    #[serde(rename = "Woman MP")]
    #[strum(serialize = "Woman MP")]
    WomanMp,
    /// Directly elected constituency seat.
    Constituency,
    /// Youth, workers, army, disability and elderly representatives.
    #[serde(rename = "Special Interest")]
    #[strum(serialize = "Special Interest")]
    SpecialInterest,
}

/// A parliamentary candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParliamentaryCandidate {
    /// Stable identifier.
    pub id: String,
    /// Full display name.
    pub name: String,
    /// Constituency the seat belongs to.
    pub constituency: String,
    /// Party label.
    pub party: String,
    /// Seat type.
    pub category: MpCategory,
    /// Sentiment between 0 and 100.
    pub sentiment_score: f64,
    /// Projected vote share between 0 and 100.
    pub vote_projection: f64,
    /// Media mentions.
    #[serde(default)]
    pub mentions: u64,
}

impl ParliamentaryCandidate {
    /// Checks the identifier, constituency and the 0-100 scores.
    pub fn validate(&self) -> Result<(), InvalidRecord> {
        if self.id.trim().is_empty() {
            return Err(InvalidRecord::MissingField("id"));
        }
        if self.constituency.trim().is_empty() {
            return Err(InvalidRecord::MissingField("constituency"));
        }
        check_score("sentimentScore", self.sentiment_score)?;
        check_score("voteProjection", self.vote_projection)
    }
}

/// Partial sentiment refresh for a presidential candidate, matched by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateUpdate {
    /// Full or partial name used for matching.
    pub name: String,
    /// New sentiment, if provided.
    #[serde(default)]
    pub sentiment_score: Option<f64>,
    /// New mention count, if provided.
    #[serde(default)]
    pub mentions: Option<u64>,
}

impl CandidateUpdate {
    /// An update needs a name to match on and in-range values.
    pub fn validate(&self) -> Result<(), InvalidRecord> {
        if self.name.trim().is_empty() {
            return Err(InvalidRecord::MissingField("name"));
        }
        if let Some(score) = self.sentiment_score {
            check_score("sentimentScore", score)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mp_category_wire_names() {
        let mp: ParliamentaryCandidate = serde_json::from_value(json!({
            "id": "p-1",
            "name": "Jane Akello",
            "constituency": "Lira City",
            "party": "NRM",
            "category": "Woman MP",
            "sentimentScore": 55,
            "voteProjection": 48.5
        }))
        .unwrap();
        assert_eq!(mp.category, MpCategory::WomanMp);
        assert_eq!(mp.category.to_string(), "Woman MP");
        assert_eq!("Special Interest".parse::<MpCategory>().unwrap(), MpCategory::SpecialInterest);
    }

    #[test]
    fn test_candidate_score_out_of_range() {
        let candidate = Candidate {
            id: "c-1".into(),
            name: "Test".into(),
            party: "IND".into(),
            district: String::new(),
            sentiment_score: 101.0,
            mentions: 0,
            vote_projection: 10.0,
            image: None,
            notes: None,
        };
        assert!(candidate.validate().is_err());
    }

    #[test]
    fn test_update_requires_name() {
        let update: CandidateUpdate =
            serde_json::from_value(json!({"name": " ", "sentimentScore": 80})).unwrap();
        assert_eq!(update.validate(), Err(InvalidRecord::MissingField("name")));
    }
}
