use lib_pollwatch::core::{DataReconciler, EnrichmentOutcome, StreamSubscriptionManager};
use lib_pollwatch::feeds::{Enricher, EnrichmentError, EnrichmentRequest};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared handles passed to every task and request handler.
#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<Mutex<DataReconciler>>,
    pub stream: Arc<StreamSubscriptionManager>,
    enricher: Option<Arc<dyn Enricher>>,
}

#[derive(Debug)]
pub enum SyncError {
    Disabled,
    Failed(EnrichmentError),
}

/// What a sync changed, as reported to the API caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub incidents_added: usize,
    pub incidents_evicted: usize,
    pub candidates_patched: usize,
}

impl From<EnrichmentOutcome> for SyncReport {
    fn from(outcome: EnrichmentOutcome) -> Self {
        Self {
            incidents_added: outcome.incidents.added,
            incidents_evicted: outcome.incidents.evicted,
            candidates_patched: outcome.patched,
        }
    }
}

impl AppState {
    pub fn new(
        reconciler: DataReconciler,
        stream: Arc<StreamSubscriptionManager>,
        enricher: Option<Arc<dyn Enricher>>,
    ) -> Self {
        Self {
            reconciler: Arc::new(Mutex::new(reconciler)),
            stream,
            enricher,
        }
    }

    pub fn enrichment_enabled(&self) -> bool {
        self.enricher.is_some()
    }

    /// One enrichment round. The reconciler is not locked while the request
    /// is in flight.
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        let enricher = self.enricher.as_ref().ok_or(SyncError::Disabled)?;

        let request = {
            let reconciler = self.reconciler.lock().await;
            EnrichmentRequest::from_reconciler(&reconciler)
        };

        let batch = enricher.fetch(&request).await.map_err(|e| {
            log::error!("Enrichment failed: {}", e);
            SyncError::Failed(e)
        })?;

        let outcome = self.reconciler.lock().await.apply_enrichment(batch);
        Ok(outcome.into())
    }
}
