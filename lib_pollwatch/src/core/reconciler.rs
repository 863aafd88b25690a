//! # Data Reconciler
//!
//! Owns the three canonical collections the dashboard reads from and merges
//! every source into them:
//!
//! - the bundled seed set (startup fallback),
//! - remote snapshots (wholesale replacement per collection),
//! - push events from live syncs and enrichment (new first, capped),
//! - partial sentiment updates matched by candidate name.
//!
//! Every install path validates items, drops duplicates by id and, for
//! incidents, applies the temporal window. The window moves with the
//! reference day, so reads re-check it and every mutation first expires
//! incidents that have aged out. Aggregates are a pure function of the
//! current collections and are computed on demand.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::{Local, NaiveDate};
use thiserror::Error;

use crate::configs::{EmptySnapshotPolicy, ReconcilerConfig};
use crate::core::aggregates::{compute_aggregates, constituency_projections};
use crate::core::temporal::TemporalWindow;
use crate::models::{
    Candidate, CandidateUpdate, Collection, CollectionKind, ConstituencyProjection,
    DashboardStats, EnrichmentBatch, Incident, InvalidRecord, ParliamentaryCandidate,
};

/// Reconciliation failures. These indicate a wiring bug upstream, so they are
/// logged at error level as well as returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// The batch does not belong to the collection it was addressed to.
    #[error("batch of kind '{actual}' sent to collection '{expected}'")]
    KindMismatch {
        /// Target collection.
        expected: CollectionKind,
        /// What the batch actually holds.
        actual: CollectionKind,
    },

    /// A collection name that does not exist.
    #[error("unknown collection kind '{0}'")]
    UnknownKind(String),
}

/// Resolves a collection name such as `"presidential"`.
pub fn parse_kind(name: &str) -> Result<CollectionKind, ReconcileError> {
    CollectionKind::from_str(name).map_err(|_| {
        log::error!("Update addressed to unknown collection '{}'", name);
        ReconcileError::UnknownKind(name.to_string())
    })
}

/// What the remote source last said about a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceState {
    /// Nothing heard yet; the seed is showing.
    #[default]
    Unknown,
    /// The source reported an empty collection.
    Empty,
    /// The source delivered items.
    Populated,
}

/// Notification from a remote snapshot source.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotEvent {
    /// Full contents of one collection.
    Data(Collection),
    /// The source reports the collection as empty.
    Empty(CollectionKind),
    /// The subscription failed; the current contents are kept.
    Error {
        /// Affected collection.
        kind: CollectionKind,
        /// Source-provided description.
        message: String,
    },
}

/// Result of applying a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    /// The collection now holds exactly the accepted items.
    Replaced {
        /// Items installed.
        retained: usize,
        /// Items refused by validation, duplicates or the temporal window.
        discarded: usize,
    },
    /// Empty snapshot under [`EmptySnapshotPolicy::Ignore`]; nothing changed.
    Ignored,
    /// Empty snapshot under [`EmptySnapshotPolicy::Clear`].
    Cleared,
    /// An error event; nothing changed.
    Failed,
}

/// Result of a push merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    /// Fresh items that made it in.
    pub added: usize,
    /// Existing items pushed past the cap.
    pub evicted: usize,
}

/// Result of applying an enrichment batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnrichmentOutcome {
    /// Incident merge result.
    pub incidents: MergeOutcome,
    /// Presidential candidates whose sentiment changed.
    pub patched: usize,
}

/// Uniform access to the three item types.
trait Record: Clone {
    fn key(&self) -> &str;
    fn check(&self) -> Result<(), InvalidRecord>;
}

impl Record for Incident {
    fn key(&self) -> &str {
        &self.id
    }

    fn check(&self) -> Result<(), InvalidRecord> {
        self.validate()
    }
}

impl Record for Candidate {
    fn key(&self) -> &str {
        &self.id
    }

    fn check(&self) -> Result<(), InvalidRecord> {
        self.validate()
    }
}

impl Record for ParliamentaryCandidate {
    fn key(&self) -> &str {
        &self.id
    }

    fn check(&self) -> Result<(), InvalidRecord> {
        self.validate()
    }
}

/// Drops invalid items and later duplicates, keeping order.
fn sanitize<T: Record>(items: Vec<T>, kind: CollectionKind) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| match item.check() {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Refusing {} item '{}': {}", kind, item.key(), e);
                false
            }
        })
        .filter(|item| seen.insert(item.key().to_string()))
        .collect()
}

/// Fresh items first, then the existing ones not superseded by id, truncated
/// to `cap`. Returns how many existing items fell off the end.
fn merge_front<T: Record>(fresh: Vec<T>, existing: &mut Vec<T>, cap: usize) -> usize {
    let fresh_keys: HashSet<String> = fresh.iter().map(|i| i.key().to_string()).collect();
    let survivors: Vec<T> = existing
        .drain(..)
        .filter(|item| !fresh_keys.contains(item.key()))
        .collect();
    let fresh_len = fresh.len();
    let survivor_len = survivors.len();

    let mut merged = fresh;
    merged.extend(survivors);
    merged.truncate(cap);
    *existing = merged;

    (fresh_len + survivor_len).saturating_sub(cap.max(fresh_len))
}

/// Picks the update for `candidate_name`: the first one, in update order, whose
/// name contains or is contained in the candidate name. Matching is
/// case-sensitive and blank names never match.
pub fn match_update<'a>(
    candidate_name: &str,
    updates: &'a [CandidateUpdate],
) -> Option<&'a CandidateUpdate> {
    updates.iter().find(|u| {
        !u.name.is_empty()
            && !candidate_name.is_empty()
            && (candidate_name.contains(u.name.as_str()) || u.name.contains(candidate_name))
    })
}

/// Canonical, presentation-ready collections plus source bookkeeping.
#[derive(Debug, Clone)]
pub struct DataReconciler {
    config: ReconcilerConfig,
    reference_date: Option<NaiveDate>,
    incidents: Vec<Incident>,
    presidential: Vec<Candidate>,
    parliamentary: Vec<ParliamentaryCandidate>,
    states: [SourceState; 3],
}

fn slot(kind: CollectionKind) -> usize {
    match kind {
        CollectionKind::Incidents => 0,
        CollectionKind::Presidential => 1,
        CollectionKind::Parliamentary => 2,
    }
}

impl DataReconciler {
    /// Empty reconciler. Call [`apply_seed`](Self::apply_seed) to show something
    /// before the first snapshot.
    pub fn new(config: ReconcilerConfig) -> Self {
        Self {
            config,
            reference_date: None,
            incidents: Vec::new(),
            presidential: Vec::new(),
            parliamentary: Vec::new(),
            states: [SourceState::Unknown; 3],
        }
    }

    /// Pins "today" for the temporal window and countdown. Without it the local
    /// calendar date is used.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// Moves "today". `None` goes back to the local calendar date. Incidents
    /// that fall out of the window stop being served immediately and are
    /// dropped on the next mutation.
    pub fn set_reference_date(&mut self, date: Option<NaiveDate>) {
        self.reference_date = date;
    }

    /// The active configuration.
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Date used as "today".
    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }

    fn window(&self) -> TemporalWindow {
        TemporalWindow {
            reference_date: self.reference_date(),
            window_days: self.config.window_days,
            acceptance_year: self.config.acceptance_year,
        }
    }

    fn admit_incidents(&self, incidents: Vec<Incident>) -> Vec<Incident> {
        let window = self.window();
        let before = incidents.len();
        let admitted: Vec<Incident> = sanitize(incidents, CollectionKind::Incidents)
            .into_iter()
            .filter(|i| window.admits(i))
            .collect();
        if admitted.len() < before {
            log::debug!(
                "Excluded {} incident(s) outside {} / {} days",
                before - admitted.len(),
                window.acceptance_year,
                window.window_days
            );
        }
        admitted
    }

    /// Drops incidents that no longer pass the window for the current
    /// reference day. Returns how many were removed.
    pub fn expire_incidents(&mut self) -> usize {
        let window = self.window();
        let before = self.incidents.len();
        self.incidents.retain(|i| window.admits(i));
        let expired = before - self.incidents.len();
        if expired > 0 {
            log::info!(
                "Expired {} incident(s) older than {} days before {}",
                expired,
                window.window_days,
                window.reference_date
            );
        }
        expired
    }

    fn install(&mut self, collection: Collection) -> usize {
        match collection {
            Collection::Incidents(items) => {
                self.incidents = self.admit_incidents(items);
                self.incidents.len()
            }
            Collection::Presidential(items) => {
                self.presidential = sanitize(items, CollectionKind::Presidential);
                self.presidential.len()
            }
            Collection::Parliamentary(items) => {
                self.parliamentary = sanitize(items, CollectionKind::Parliamentary);
                self.parliamentary.len()
            }
        }
    }

    /// Installs a seed collection. Always succeeds; invalid seed items are
    /// dropped like any other.
    pub fn apply_seed(&mut self, collection: Collection) -> usize {
        let kind = collection.kind();
        let installed = self.install(collection);
        log::info!("Seeded {} with {} item(s)", kind, installed);
        installed
    }

    /// Applies a full remote snapshot of `kind`.
    ///
    /// A non-empty snapshot replaces the collection wholesale. An empty one is
    /// handled by the configured [`EmptySnapshotPolicy`].
    pub fn apply_remote_snapshot(
        &mut self,
        kind: CollectionKind,
        collection: Collection,
    ) -> Result<SnapshotOutcome, ReconcileError> {
        check_kind(kind, &collection)?;
        self.expire_incidents();

        if collection.is_empty() {
            self.states[slot(kind)] = SourceState::Empty;
            return Ok(match self.config.empty_snapshot_policy {
                EmptySnapshotPolicy::Ignore => {
                    log::debug!("Empty {} snapshot ignored; keeping current items", kind);
                    SnapshotOutcome::Ignored
                }
                EmptySnapshotPolicy::Clear => {
                    self.install(Collection::empty(kind));
                    log::info!("Empty {} snapshot cleared the collection", kind);
                    SnapshotOutcome::Cleared
                }
            });
        }

        let received = collection.len();
        let retained = self.install(collection);
        self.states[slot(kind)] = SourceState::Populated;
        log::info!(
            "Replaced {} from remote snapshot: {} of {} item(s) kept",
            kind,
            retained,
            received
        );
        Ok(SnapshotOutcome::Replaced {
            retained,
            discarded: received - retained,
        })
    }

    /// Routes a [`SnapshotEvent`] from a remote source.
    pub fn apply_snapshot_event(
        &mut self,
        event: SnapshotEvent,
    ) -> Result<SnapshotOutcome, ReconcileError> {
        match event {
            SnapshotEvent::Data(collection) => {
                self.apply_remote_snapshot(collection.kind(), collection)
            }
            SnapshotEvent::Empty(kind) => {
                self.apply_remote_snapshot(kind, Collection::empty(kind))
            }
            SnapshotEvent::Error { kind, message } => {
                log::error!("Remote {} subscription failed: {}", kind, message);
                Ok(SnapshotOutcome::Failed)
            }
        }
    }

    /// Merges freshly synced items in front of the existing ones and caps the
    /// collection at the configured live size. A fresh item replaces an
    /// existing one with the same id.
    pub fn apply_push_event(
        &mut self,
        kind: CollectionKind,
        collection: Collection,
    ) -> Result<MergeOutcome, ReconcileError> {
        check_kind(kind, &collection)?;
        self.expire_incidents();
        let cap = self.config.live_cap;

        let outcome = match collection {
            Collection::Incidents(items) => {
                let fresh = self.admit_incidents(items);
                let added = fresh.len();
                let evicted = merge_front(fresh, &mut self.incidents, cap);
                MergeOutcome { added: added.min(cap), evicted }
            }
            Collection::Presidential(items) => {
                let fresh = sanitize(items, kind);
                let added = fresh.len();
                let evicted = merge_front(fresh, &mut self.presidential, cap);
                MergeOutcome { added: added.min(cap), evicted }
            }
            Collection::Parliamentary(items) => {
                let fresh = sanitize(items, kind);
                let added = fresh.len();
                let evicted = merge_front(fresh, &mut self.parliamentary, cap);
                MergeOutcome { added: added.min(cap), evicted }
            }
        };

        log::debug!(
            "Push into {}: {} added, {} evicted",
            kind,
            outcome.added,
            outcome.evicted
        );
        Ok(outcome)
    }

    /// Overwrites `sentimentScore` and `mentions` of every presidential
    /// candidate matched by [`match_update`]. Other fields are untouched and
    /// invalid updates are skipped. Returns the number of candidates changed.
    pub fn patch_presidential_sentiment(&mut self, updates: &[CandidateUpdate]) -> usize {
        let valid: Vec<CandidateUpdate> = updates
            .iter()
            .filter(|u| match u.validate() {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("Skipping candidate update '{}': {}", u.name, e);
                    false
                }
            })
            .cloned()
            .collect();

        let mut patched = 0;
        for candidate in &mut self.presidential {
            let Some(update) = match_update(&candidate.name, &valid) else {
                continue;
            };
            if let Some(score) = update.sentiment_score {
                candidate.sentiment_score = score;
            }
            if let Some(mentions) = update.mentions {
                candidate.mentions = mentions;
            }
            patched += 1;
        }
        patched
    }

    /// Applies an enrichment round: new incidents are push-merged and candidate
    /// updates patched in.
    pub fn apply_enrichment(&mut self, batch: EnrichmentBatch) -> EnrichmentOutcome {
        let incidents = if batch.new_incidents.is_empty() {
            MergeOutcome::default()
        } else {
            self.apply_push_event(
                CollectionKind::Incidents,
                Collection::Incidents(batch.new_incidents),
            )
            .unwrap_or_default()
        };
        let patched = self.patch_presidential_sentiment(&batch.candidate_updates);
        log::info!(
            "Enrichment applied: {} incident(s) added, {} candidate(s) patched",
            incidents.added,
            patched
        );
        EnrichmentOutcome { incidents, patched }
    }

    /// Headline numbers for the current collections.
    pub fn stats(&self) -> DashboardStats {
        compute_aggregates(
            &self.incidents(),
            &self.presidential,
            &self.config,
            self.reference_date(),
        )
    }

    /// Per-constituency leaders and margins.
    pub fn constituencies(&self) -> Vec<ConstituencyProjection> {
        constituency_projections(&self.parliamentary)
    }

    /// Canonical incidents still inside the window for the current
    /// reference day.
    pub fn incidents(&self) -> Vec<Incident> {
        let window = self.window();
        self.incidents
            .iter()
            .filter(|i| window.admits(i))
            .cloned()
            .collect()
    }

    /// Canonical presidential candidates.
    pub fn presidential(&self) -> &[Candidate] {
        &self.presidential
    }

    /// Canonical parliamentary candidates.
    pub fn parliamentary(&self) -> &[ParliamentaryCandidate] {
        &self.parliamentary
    }

    /// A copy of one collection.
    pub fn collection(&self, kind: CollectionKind) -> Collection {
        match kind {
            CollectionKind::Incidents => Collection::Incidents(self.incidents()),
            CollectionKind::Presidential => Collection::Presidential(self.presidential.clone()),
            CollectionKind::Parliamentary => {
                Collection::Parliamentary(self.parliamentary.clone())
            }
        }
    }

    /// What the remote source last reported for `kind`.
    pub fn source_state(&self, kind: CollectionKind) -> SourceState {
        self.states[slot(kind)]
    }
}

fn check_kind(expected: CollectionKind, collection: &Collection) -> Result<(), ReconcileError> {
    let actual = collection.kind();
    if actual == expected {
        return Ok(());
    }
    log::error!("Batch of {} addressed to {}; dropped", actual, expected);
    Err(ReconcileError::KindMismatch { expected, actual })
}
