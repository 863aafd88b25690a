//! # Dashboard Aggregates
//!
//! Pure functions of the canonical collections. Nothing here holds state and
//! nothing is cached: `DataReconciler::stats` calls [`compute_aggregates`] on
//! every read with the incidents currently inside the window.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::configs::ReconcilerConfig;
use crate::core::temporal::within_days;
use crate::models::{
    Candidate, ConstituencyProjection, DashboardStats, Incident, ParliamentaryCandidate,
    SentimentLabel,
};

const FATALITY_WEIGHT: f64 = 5.0;
const INJURY_WEIGHT: f64 = 0.5;
const INDEX_SCALE: f64 = 1.5;
const INDEX_CAP: f64 = 10.0;

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Severity of a single incident: category base weight plus casualties.
pub fn incident_severity(incident: &Incident) -> f64 {
    incident.incident_type.base_weight()
        + FATALITY_WEIGHT * f64::from(incident.fatalities)
        + INJURY_WEIGHT * f64::from(incident.injuries)
}

/// Mean severity scaled by 1.5, capped at 10 and rounded to one decimal. An
/// empty slice yields 0.
pub fn violence_index(incidents: &[Incident]) -> f64 {
    let total: f64 = incidents.iter().map(incident_severity).sum();
    let count = incidents.len().max(1) as f64;
    round_one_decimal((total / count * INDEX_SCALE).min(INDEX_CAP))
}

/// Vote-share-weighted mean sentiment. A candidate without projected share
/// weighs 1.
pub fn weighted_sentiment(candidates: &[Candidate]) -> f64 {
    let (weighted, weights) = candidates.iter().fold((0.0, 0.0), |(sum, w), c| {
        let weight = if c.vote_projection > 0.0 {
            c.vote_projection
        } else {
            1.0
        };
        (sum + c.sentiment_score * weight, w + weight)
    });
    let weights = if weights == 0.0 { 1.0 } else { weights };
    weighted / weights
}

/// Whole days from `today` until `target`, clamped at zero once the day has passed.
pub fn days_until(target: NaiveDate, today: NaiveDate) -> i64 {
    (target - today).num_days().max(0)
}

/// Recomputes every headline number from the current collections.
pub fn compute_aggregates(
    incidents: &[Incident],
    candidates: &[Candidate],
    config: &ReconcilerConfig,
    today: NaiveDate,
) -> DashboardStats {
    let recent_incidents = incidents
        .iter()
        .filter_map(Incident::day)
        .filter(|day| within_days(*day, today, config.recent_window_days))
        .count();
    let sentiment = weighted_sentiment(candidates);

    DashboardStats {
        violence_index: violence_index(incidents),
        recent_incidents,
        total_incidents: incidents.len(),
        total_fatalities: incidents.iter().map(|i| u64::from(i.fatalities)).sum(),
        total_injuries: incidents.iter().map(|i| u64::from(i.injuries)).sum(),
        weighted_sentiment: round_one_decimal(sentiment),
        sentiment_label: SentimentLabel::from_score(sentiment),
        days_to_election: days_until(config.target_date, today),
    }
}

fn by_share_desc(a: &ParliamentaryCandidate, b: &ParliamentaryCandidate) -> Ordering {
    b.vote_projection
        .total_cmp(&a.vote_projection)
        .then_with(|| a.name.cmp(&b.name))
}

/// Groups candidates by constituency and picks leader, runner-up and margin.
/// Ties on share are broken by name so the result is stable.
pub fn constituency_projections(
    candidates: &[ParliamentaryCandidate],
) -> Vec<ConstituencyProjection> {
    let mut groups: BTreeMap<&str, Vec<&ParliamentaryCandidate>> = BTreeMap::new();
    for candidate in candidates {
        groups
            .entry(candidate.constituency.as_str())
            .or_default()
            .push(candidate);
    }

    groups
        .into_iter()
        .filter_map(|(constituency, mut group)| {
            group.sort_by(|a, b| by_share_desc(a, b));
            let leader = (*group.first()?).clone();
            let runner_up = group.get(1).map(|c| (*c).clone());
            let margin = match &runner_up {
                Some(r) => leader.vote_projection - r.vote_projection,
                None => leader.vote_projection,
            };
            Some(ConstituencyProjection {
                constituency: constituency.to_string(),
                leader,
                runner_up,
                margin: round_one_decimal(margin),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IncidentType, MpCategory};

    fn incident(kind: IncidentType, fatalities: u32, injuries: u32, date: &str) -> Incident {
        Incident {
            id: format!("{kind}-{date}"),
            date: date.into(),
            location: "Arua".into(),
            coordinates: (3.02, 30.91),
            incident_type: kind,
            fatalities,
            injuries,
            description: String::new(),
            verified: true,
            forensic: None,
        }
    }

    fn candidate(name: &str, sentiment: f64, share: f64) -> Candidate {
        Candidate {
            id: name.to_lowercase(),
            name: name.into(),
            party: "IND".into(),
            district: String::new(),
            sentiment_score: sentiment,
            mentions: 0,
            vote_projection: share,
            image: None,
            notes: None,
        }
    }

    fn mp(name: &str, constituency: &str, share: f64) -> ParliamentaryCandidate {
        ParliamentaryCandidate {
            id: name.to_lowercase(),
            name: name.into(),
            constituency: constituency.into(),
            party: "IND".into(),
            category: MpCategory::Constituency,
            sentiment_score: 50.0,
            vote_projection: share,
            mentions: 0,
        }
    }

    #[test]
    fn test_single_fatal_violence_caps_index() {
        let incidents = vec![incident(IncidentType::Violence, 1, 0, "2025-10-01")];
        assert_eq!(incident_severity(&incidents[0]), 13.0);
        assert_eq!(violence_index(&incidents), 10.0);
    }

    #[test]
    fn test_empty_index_is_zero() {
        assert_eq!(violence_index(&[]), 0.0);
    }

    #[test]
    fn test_index_rounds_to_one_decimal() {
        // (1 + 1 + 0.5) / 2 * 1.5 = 1.875 -> 1.9
        let incidents = vec![
            incident(IncidentType::Rally, 0, 0, "2025-10-01"),
            incident(IncidentType::Arrest, 0, 1, "2025-10-02"),
        ];
        assert_eq!(violence_index(&incidents), 1.9);
    }

    #[test]
    fn test_even_split_sentiment_is_tense() {
        let candidates = vec![candidate("A", 70.0, 50.0), candidate("B", 30.0, 50.0)];
        let score = weighted_sentiment(&candidates);
        assert_eq!(score, 50.0);
        assert_eq!(SentimentLabel::from_score(score), SentimentLabel::Tense);
    }

    #[test]
    fn test_zero_share_weighs_one_and_empty_is_volatile() {
        let candidates = vec![candidate("A", 80.0, 0.0), candidate("B", 40.0, 0.0)];
        assert_eq!(weighted_sentiment(&candidates), 60.0);
        assert_eq!(SentimentLabel::from_score(60.0), SentimentLabel::Tense);
        assert_eq!(weighted_sentiment(&[]), 0.0);
        assert_eq!(SentimentLabel::from_score(0.0), SentimentLabel::Volatile);
        assert_eq!(SentimentLabel::from_score(60.1), SentimentLabel::Optimistic);
    }

    #[test]
    fn test_compute_aggregates_counts_recent_and_countdown() {
        let config = ReconcilerConfig::default();
        let today = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let incidents = vec![
            incident(IncidentType::Protest, 0, 4, "2025-11-20"),
            incident(IncidentType::Rally, 0, 0, "2025-10-15"),
        ];
        let stats = compute_aggregates(&incidents, &[], &config, today);
        assert_eq!(stats.recent_incidents, 1);
        assert_eq!(stats.total_incidents, 2);
        assert_eq!(stats.total_injuries, 4);
        assert_eq!(stats.days_to_election, 45);
        assert_eq!(stats.sentiment_label, SentimentLabel::Volatile);
    }

    #[test]
    fn test_countdown_never_negative() {
        let target = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let after = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(days_until(target, after), 0);
    }

    #[test]
    fn test_constituency_projections() {
        let candidates = vec![
            mp("Okello", "Gulu City", 41.0),
            mp("Acan", "Gulu City", 47.5),
            mp("Nambi", "Mukono North", 62.0),
        ];
        let projections = constituency_projections(&candidates);
        assert_eq!(projections.len(), 2);
        assert_eq!(projections[0].constituency, "Gulu City");
        assert_eq!(projections[0].leader.name, "Acan");
        assert_eq!(projections[0].runner_up.as_ref().unwrap().name, "Okello");
        assert_eq!(projections[0].margin, 6.5);
        assert!(projections[1].runner_up.is_none());
        assert_eq!(projections[1].margin, 62.0);
    }
}
