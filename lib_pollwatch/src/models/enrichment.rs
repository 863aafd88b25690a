use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{decode_items, CandidateUpdate, Decoded, Incident, InvalidRecord};

/// One round of enrichment: fresh incidents plus partial candidate updates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentBatch {
    /// Newly discovered incidents, newest first.
    #[serde(default)]
    pub new_incidents: Vec<Incident>,
    /// Sentiment refreshes keyed by candidate name.
    #[serde(default)]
    pub candidate_updates: Vec<CandidateUpdate>,
}

impl EnrichmentBatch {
    /// `true` when the batch carries nothing to apply.
    pub fn is_empty(&self) -> bool {
        self.new_incidents.is_empty() && self.candidate_updates.is_empty()
    }

    /// Validates a loosely-typed payload item by item.
    ///
    /// The payload must be an object; both lists are optional. Rejected
    /// indices refer to the position inside their own list, incidents first.
    pub fn decode(payload: Value) -> Result<Decoded<Self>, InvalidRecord> {
        let Value::Object(mut fields) = payload else {
            return Err(InvalidRecord::Malformed(
                "enrichment payload is not an object".into(),
            ));
        };

        let incidents = decode_items(list(fields.remove("newIncidents"))?, Incident::validate);
        let updates = decode_items(
            list(fields.remove("candidateUpdates"))?,
            CandidateUpdate::validate,
        );

        let mut rejected = incidents.rejected;
        rejected.extend(updates.rejected);
        Ok(Decoded {
            items: Self {
                new_incidents: incidents.items,
                candidate_updates: updates.items,
            },
            rejected,
        })
    }
}

fn list(value: Option<Value>) -> Result<Vec<Value>, InvalidRecord> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(InvalidRecord::Malformed(format!(
            "expected a list, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_filters_bad_items() {
        let payload = json!({
            "newIncidents": [
                {"id": "e1", "date": "2025-11-02", "type": "Arrest", "location": "Masaka"},
                {"id": "e2", "date": "02/11/2025", "type": "Arrest", "location": "Masaka"},
                {"id": "e3", "date": "2025-11-02", "type": "Riot", "location": "Masaka"}
            ],
            "candidateUpdates": [
                {"name": "Bobi", "sentimentScore": 80},
                {"name": "", "mentions": 4},
                {"name": "Museveni", "sentimentScore": 140}
            ]
        });
        let decoded = EnrichmentBatch::decode(payload).unwrap();
        assert_eq!(decoded.items.new_incidents.len(), 1);
        assert_eq!(decoded.items.candidate_updates.len(), 1);
        assert_eq!(decoded.rejected.len(), 4);
    }

    #[test]
    fn test_missing_lists_are_empty() {
        let decoded = EnrichmentBatch::decode(json!({})).unwrap();
        assert!(decoded.items.is_empty());
        assert!(EnrichmentBatch::decode(json!([1, 2])).is_err());
        assert!(EnrichmentBatch::decode(json!({"newIncidents": "none"})).is_err());
    }
}
