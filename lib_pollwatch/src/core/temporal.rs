//! # Temporal Validity Window
//!
//! Two independent gates decide whether an incident is part of the canonical
//! view: its year must equal the acceptance year, and its date must not be
//! older than `window_days` before the reference date. The same lower-bound
//! check, with a shorter window, drives the "recent incidents" counter.

use chrono::{Datelike, Days, NaiveDate};

use crate::models::Incident;

/// First day still inside a window of `days` ending at `reference`.
fn window_start(reference: NaiveDate, days: i64) -> NaiveDate {
    let days = u64::try_from(days).unwrap_or(0);
    reference.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

/// `true` when `day` is no older than `days` before `reference`.
pub fn within_days(day: NaiveDate, reference: NaiveDate, days: i64) -> bool {
    day >= window_start(reference, days)
}

/// The combined recency and acceptance-year gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalWindow {
    /// Usually today.
    pub reference_date: NaiveDate,
    /// Maximum age in days.
    pub window_days: i64,
    /// Only this calendar year is accepted.
    pub acceptance_year: i32,
}

impl TemporalWindow {
    /// Whether the incident passes both gates. Undated or malformed dates never do.
    pub fn admits(&self, incident: &Incident) -> bool {
        match incident.day() {
            Some(day) => {
                day.year() == self.acceptance_year
                    && within_days(day, self.reference_date, self.window_days)
            }
            None => false,
        }
    }
}

/// Keeps the incidents inside the window, preserving order.
pub fn apply_temporal_filter(
    incidents: Vec<Incident>,
    window_days: i64,
    reference_date: NaiveDate,
    acceptance_year: i32,
) -> Vec<Incident> {
    let window = TemporalWindow {
        reference_date,
        window_days,
        acceptance_year,
    };
    incidents.into_iter().filter(|i| window.admits(i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IncidentType;

    fn incident(id: &str, date: &str) -> Incident {
        Incident {
            id: id.into(),
            date: date.into(),
            location: "Kampala".into(),
            coordinates: (0.31, 32.58),
            incident_type: IncidentType::Rally,
            fatalities: 0,
            injuries: 0,
            description: String::new(),
            verified: false,
            forensic: None,
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_boundary_day_is_included_and_day_before_is_not() {
        // 2025-12-31 minus 90 days is 2025-10-02.
        let kept = apply_temporal_filter(
            vec![incident("edge", "2025-10-02"), incident("out", "2025-10-01")],
            90,
            day("2025-12-31"),
            2025,
        );
        let ids: Vec<&str> = kept.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["edge"]);
    }

    #[test]
    fn test_wrong_year_is_excluded_even_inside_window() {
        let kept = apply_temporal_filter(
            vec![incident("new-year", "2026-01-02"), incident("old", "2025-12-30")],
            90,
            day("2026-01-05"),
            2025,
        );
        let ids: Vec<&str> = kept.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["old"]);
    }

    #[test]
    fn test_malformed_dates_are_excluded() {
        let kept = apply_temporal_filter(
            vec![incident("a", ""), incident("b", "2025-13-01"), incident("c", "2025-9-01")],
            365,
            day("2025-12-31"),
            2025,
        );
        assert!(kept.is_empty());
    }

    #[test]
    fn test_within_days() {
        assert!(within_days(day("2025-11-01"), day("2025-11-30"), 30));
        assert!(!within_days(day("2025-10-30"), day("2025-11-30"), 30));
    }
}
