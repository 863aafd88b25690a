//! Bundled seed set shown until a remote source reports in.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Candidate, Collection, Incident, ParliamentaryCandidate};

const BUNDLED_SEED: &str = include_str!("../../data/seed.json");

/// Seed loading failures.
#[derive(Debug, Error)]
pub enum SeedError {
    /// The override file could not be read.
    #[error("cannot read seed file {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The document does not have the seed shape.
    #[error("invalid seed document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Initial contents of all three collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedSet {
    /// Seed incidents.
    pub incidents: Vec<Incident>,
    /// Seed presidential field.
    pub presidential: Vec<Candidate>,
    /// Seed parliamentary field.
    pub parliamentary: Vec<ParliamentaryCandidate>,
}

impl SeedSet {
    /// One batch per collection, ready for `DataReconciler::apply_seed`.
    pub fn into_collections(self) -> [Collection; 3] {
        [
            Collection::Incidents(self.incidents),
            Collection::Presidential(self.presidential),
            Collection::Parliamentary(self.parliamentary),
        ]
    }
}

/// Parses a seed document.
pub fn parse_seed(text: &str) -> Result<SeedSet, SeedError> {
    Ok(serde_json::from_str(text)?)
}

/// The seed compiled into the library.
pub fn load_seed() -> Result<SeedSet, SeedError> {
    parse_seed(BUNDLED_SEED)
}

/// Reads a seed document from disk.
pub fn from_path(path: impl AsRef<Path>) -> Result<SeedSet, SeedError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_seed(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::ReconcilerConfig;
    use crate::core::reconciler::DataReconciler;
    use chrono::NaiveDate;
    use std::io::Write;

    #[test]
    fn test_bundled_seed_is_valid() {
        let seed = load_seed().unwrap();
        assert!(!seed.incidents.is_empty());
        assert!(seed.incidents.iter().all(|i| i.validate().is_ok()));
        assert!(seed.presidential.iter().all(|c| c.validate().is_ok()));
        assert!(seed.parliamentary.iter().all(|c| c.validate().is_ok()));
        assert!(seed
            .presidential
            .iter()
            .any(|c| c.name == "Robert Kyagulanyi Ssentamu (Bobi Wine)"));
    }

    #[test]
    fn test_bundled_seed_survives_the_window() {
        let reference = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        let mut reconciler = DataReconciler::new(ReconcilerConfig::default())
            .with_reference_date(reference);
        let seed = load_seed().unwrap();
        let total = seed.incidents.len();
        for collection in seed.into_collections() {
            reconciler.apply_seed(collection);
        }
        assert_eq!(reconciler.incidents().len(), total);
        assert!(!reconciler.constituencies().is_empty());
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"presidential": []}}"#).unwrap();
        let seed = from_path(file.path()).unwrap();
        assert!(seed.incidents.is_empty());

        assert!(matches!(
            from_path("/definitely/not/here.json"),
            Err(SeedError::Io { .. })
        ));
        assert!(matches!(parse_seed("{"), Err(SeedError::Parse(_))));
    }
}
