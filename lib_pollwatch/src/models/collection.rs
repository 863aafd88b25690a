use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use super::{Candidate, Incident, InvalidRecord, ParliamentaryCandidate};

/// The three canonical collections.
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
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CollectionKind {
    /// Election incidents.
    Incidents,
    /// Presidential candidates.
    Presidential,
    /// Parliamentary candidates.
    Parliamentary,
}

impl CollectionKind {
    /// Every kind, in display order.
    pub const ALL: [Self; 3] = [Self::Incidents, Self::Presidential, Self::Parliamentary];

    /// Resource name of this collection on the remote snapshot store.
    pub const fn remote_path(self) -> &'static str {
        match self {
            Self::Incidents => "incidents",
            Self::Presidential => "candidates",
            Self::Parliamentary => "parliamentary",
        }
    }
}

/// A typed batch of one collection kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "lowercase")]
pub enum Collection {
    /// Incidents.
    Incidents(Vec<Incident>),
    /// Presidential candidates.
    Presidential(Vec<Candidate>),
    /// Parliamentary candidates.
    Parliamentary(Vec<ParliamentaryCandidate>),
}

/// Outcome of decoding loosely-typed items: the survivors and, by position,
/// why the others were refused.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    /// Items that decoded and validated.
    pub items: T,
    /// Index in the input and the reason for every refused item.
    pub rejected: Vec<(usize, InvalidRecord)>,
}

/// Decodes each value independently; one bad item never spoils the batch.
pub fn decode_items<T, F>(values: Vec<Value>, validate: F) -> Decoded<Vec<T>>
where
    T: DeserializeOwned,
    F: Fn(&T) -> Result<(), InvalidRecord>,
{
    let mut items = Vec::with_capacity(values.len());
    let mut rejected = Vec::new();
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<T>(value) {
            Ok(item) => match validate(&item) {
                Ok(()) => items.push(item),
                Err(reason) => rejected.push((index, reason)),
            },
            Err(e) => rejected.push((index, InvalidRecord::Malformed(e.to_string()))),
        }
    }
    Decoded { items, rejected }
}

impl Collection {
    /// An empty batch of the given kind.
    pub fn empty(kind: CollectionKind) -> Self {
        match kind {
            CollectionKind::Incidents => Self::Incidents(Vec::new()),
            CollectionKind::Presidential => Self::Presidential(Vec::new()),
            CollectionKind::Parliamentary => Self::Parliamentary(Vec::new()),
        }
    }

    /// Decodes and validates raw JSON items into a batch of `kind`.
    pub fn decode(kind: CollectionKind, values: Vec<Value>) -> Decoded<Self> {
        match kind {
            CollectionKind::Incidents => {
                let d = decode_items(values, Incident::validate);
                Decoded {
                    items: Self::Incidents(d.items),
                    rejected: d.rejected,
                }
            }
            CollectionKind::Presidential => {
                let d = decode_items(values, Candidate::validate);
                Decoded {
                    items: Self::Presidential(d.items),
                    rejected: d.rejected,
                }
            }
            CollectionKind::Parliamentary => {
                let d = decode_items(values, ParliamentaryCandidate::validate);
                Decoded {
                    items: Self::Parliamentary(d.items),
                    rejected: d.rejected,
                }
            }
        }
    }

    /// Which collection this batch belongs to.
    pub const fn kind(&self) -> CollectionKind {
        match self {
            Self::Incidents(_) => CollectionKind::Incidents,
            Self::Presidential(_) => CollectionKind::Presidential,
            Self::Parliamentary(_) => CollectionKind::Parliamentary,
        }
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        match self {
            Self::Incidents(v) => v.len(),
            Self::Presidential(v) => v.len(),
            Self::Parliamentary(v) => v.len(),
        }
    }

    /// `true` when the batch has no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
