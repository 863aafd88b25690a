//! Decoding of inbound live-stream frames.

use thiserror::Error;

use crate::models::{Incident, InvalidRecord};

/// Why a frame was dropped.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Not JSON, not an object, unknown `type`, or wrongly typed fields.
    #[error("undecodable frame: {0}")]
    Decode(#[from] serde_json::Error),

    /// Decoded, but `id` or `location` is blank.
    #[error("incomplete frame: {0}")]
    Incomplete(#[from] InvalidRecord),
}

/// Turns a text frame into an incident. Only the identifying triple is
/// required here; the reconciler applies the full checks later.
pub fn decode_frame(text: &str) -> Result<Incident, FrameError> {
    let incident: Incident = serde_json::from_str(text)?;
    incident.check_identity()?;
    Ok(incident)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_frame() {
        let incident =
            decode_frame(r#"{"id":"x1","type":"Arrest","location":"Kampala","fatalities":0}"#)
                .unwrap();
        assert_eq!(incident.id, "x1");
    }

    #[test]
    fn test_rejections() {
        let cases = [
            r#"{"type":"Arrest","location":"Kampala"}"#,
            r#"{"id":"","type":"Arrest","location":"Kampala"}"#,
            r#"{"id":"x2","location":"Kampala"}"#,
            r#"{"id":"x3","type":"Parade","location":"Kampala"}"#,
            r#"{"id":"x4","type":"Arrest"}"#,
            r#"{"id":"x5","type":"Arrest","location":"   "}"#,
            r#"{"id":"x6","type":"Arrest","location":"Kampala","fatalities":-2}"#,
            "not json",
            "[]",
        ];
        for case in cases {
            assert!(decode_frame(case).is_err(), "accepted {case}");
        }
    }
}
