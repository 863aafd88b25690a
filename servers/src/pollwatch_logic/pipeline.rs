use crate::pollwatch_logic::state::AppState;
use lib_pollwatch::core::listener;
use lib_pollwatch::feeds::{SnapshotEvent, SnapshotSource};
use lib_pollwatch::models::{Collection, CollectionKind, Incident};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

/// Feeds live incidents into the reconciler for as long as the server runs.
///
/// Listener callbacks run on the stream task, so they only forward into a
/// channel; the merge happens here under the async lock.
pub async fn run_live_ingest(state: AppState, mut shutdown: broadcast::Receiver<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Incident>();
    let forward = listener(move |incident: &Incident| {
        let _ = tx.send(incident.clone());
    });
    state.stream.subscribe(Arc::clone(&forward));

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            Some(incident) = rx.recv() => {
                let id = incident.id.clone();
                let mut reconciler = state.reconciler.lock().await;
                match reconciler.apply_push_event(CollectionKind::Incidents, Collection::Incidents(vec![incident])) {
                    Ok(outcome) if outcome.added == 0 => log::debug!("Live incident '{}' outside the reporting window", id),
                    Ok(_) => log::info!("Live incident '{}' merged", id),
                    Err(e) => log::error!("Live incident '{}' not merged: {}", id, e),
                }
            }
        }
    }

    state.stream.unsubscribe(&forward);
    log::info!("Live ingest stopped.");
}

/// Subscribes to every collection on `source` and applies the events.
pub async fn run_snapshot_pump(
    state: AppState,
    source: Arc<dyn SnapshotSource>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let (tx, mut rx) = mpsc::channel::<SnapshotEvent>(16);
    let handles: Vec<_> = CollectionKind::ALL
        .iter()
        .map(|kind| source.subscribe(*kind, tx.clone()))
        .collect();
    drop(tx);

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            event = rx.recv() => {
                let Some(event) = event else { break };
                let mut reconciler = state.reconciler.lock().await;
                if let Err(e) = reconciler.apply_snapshot_event(event) {
                    log::error!("Snapshot not applied: {}", e);
                }
            }
        }
    }

    drop(handles);
    log::info!("Snapshot pump stopped.");
}

/// Runs an enrichment round every `period`. The first run happens one period
/// after start-up.
pub async fn run_enrichment_timer(
    state: AppState,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            _ = ticker.tick() => {
                match state.sync().await {
                    Ok(report) => log::info!("Scheduled enrichment: {:?}", report),
                    Err(e) => log::warn!("Scheduled enrichment skipped: {:?}", e),
                }
            }
        }
    }
    log::info!("Enrichment timer stopped.");
}
