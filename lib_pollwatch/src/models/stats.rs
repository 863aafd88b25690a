use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

use super::ParliamentaryCandidate;

/// Mood of the race, derived from the weighted sentiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
pub enum SentimentLabel {
    /// Weighted sentiment above 60.
    Optimistic,
    /// Weighted sentiment above 45.
    Tense,
    /// Anything lower.
    Volatile,
}

impl SentimentLabel {
    /// Maps a 0-100 weighted sentiment onto a label.
    pub fn from_score(score: f64) -> Self {
        if score > 60.0 {
            Self::Optimistic
        } else if score > 45.0 {
            Self::Tense
        } else {
            Self::Volatile
        }
    }
}

/// Headline numbers shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Severity-weighted violence index, 0 to 10, one decimal.
    pub violence_index: f64,
    /// Incidents inside the recent window.
    pub recent_incidents: usize,
    /// Incidents in the canonical view.
    pub total_incidents: usize,
    /// Sum of fatalities across the canonical view.
    pub total_fatalities: u64,
    /// Sum of injuries across the canonical view.
    pub total_injuries: u64,
    /// Vote-share-weighted mean sentiment.
    pub weighted_sentiment: f64,
    /// Label for `weighted_sentiment`.
    pub sentiment_label: SentimentLabel,
    /// Whole days left until the target date, never negative.
    pub days_to_election: i64,
}

impl Default for DashboardStats {
    fn default() -> Self {
        Self {
            violence_index: 0.0,
            recent_incidents: 0,
            total_incidents: 0,
            total_fatalities: 0,
            total_injuries: 0,
            weighted_sentiment: 0.0,
            sentiment_label: SentimentLabel::Volatile,
            days_to_election: 0,
        }
    }
}

/// Race summary for one constituency.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstituencyProjection {
    /// Constituency name.
    pub constituency: String,
    /// Candidate with the highest projected share.
    pub leader: ParliamentaryCandidate,
    /// Second highest, if the seat is contested.
    pub runner_up: Option<ParliamentaryCandidate>,
    /// Leader share minus runner-up share (leader share when uncontested).
    pub margin: f64,
}
