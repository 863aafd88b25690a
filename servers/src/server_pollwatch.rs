//! # PollWatch Server
//!
//! Composition root of the dashboard backend. It owns the live-stream
//! manager, the reconciler, the optional remote snapshot source and the
//! optional enrichment client, wires them together and serves the canonical
//! collections as JSON.

use anyhow::{Context, Result};
use lib_pollwatch::core::{Connector, DataReconciler, StreamSubscriptionManager};
use lib_pollwatch::feeds::{Enricher, EnrichmentClient, RestSnapshotSource, SnapshotSource, seed};
use lib_pollwatch::ingestors::WsConnector;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

mod pollwatch_logic;
use pollwatch_logic::{api, config, logger, pipeline, state};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_config();
    logger::setup_logging(&config.log_dir(), config.log_level(), config.log_keep())?;

    let stream_config = config.stream_config()?;
    let reconciler_config = config.reconciler_config()?;
    let feed_config = config.feed_config();

    let mut reconciler = DataReconciler::new(reconciler_config);
    if let Some(date) = config.reference_date()? {
        reconciler = reconciler.with_reference_date(date);
    }
    let seed_set = match &config.seed_path {
        Some(path) => seed::from_path(path)?,
        None => seed::load_seed()?,
    };
    for collection in seed_set.into_collections() {
        reconciler.apply_seed(collection);
    }

    let connector: Arc<dyn Connector> = Arc::new(WsConnector::from_config(&stream_config));
    let stream = Arc::new(StreamSubscriptionManager::new(connector, stream_config.reconnect));

    let enricher: Option<Arc<dyn Enricher>> = EnrichmentClient::from_config(&feed_config)
        .context("invalid enrichment endpoint")?
        .map(|client| Arc::new(client) as Arc<dyn Enricher>);
    let snapshot_source: Option<Arc<dyn SnapshotSource>> = RestSnapshotSource::from_config(&feed_config)
        .context("invalid snapshot base url")?
        .map(|source| Arc::new(source) as Arc<dyn SnapshotSource>);

    let app_state = state::AppState::new(reconciler, Arc::clone(&stream), enricher);
    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
    let mut handles = Vec::new();

    handles.push(tokio::spawn(pipeline::run_live_ingest(
        app_state.clone(),
        shutdown_tx.subscribe(),
    )));

    match snapshot_source {
        Some(source) => handles.push(tokio::spawn(pipeline::run_snapshot_pump(
            app_state.clone(),
            source,
            shutdown_tx.subscribe(),
        ))),
        None => log::info!("No remote snapshot store configured; serving seed and live data."),
    }

    if let (true, Some(period)) = (app_state.enrichment_enabled(), feed_config.enrichment_interval()) {
        handles.push(tokio::spawn(pipeline::run_enrichment_timer(
            app_state.clone(),
            period,
            shutdown_tx.subscribe(),
        )));
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port()));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind {}", addr))?;
    log::info!("PollWatch API listening on {}", addr);

    let mut server_shutdown = shutdown_tx.subscribe();
    handles.push(tokio::spawn(async move {
        let served = axum::serve(listener, api::router(app_state))
            .with_graceful_shutdown(async move {
                server_shutdown.recv().await.ok();
                log::info!("API server shutting down.");
            })
            .await;
        if let Err(e) = served {
            log::error!("API server failed: {}", e);
        }
    }));

    // Wait for shutdown signal
    tokio::select! {
        _ = signal::ctrl_c() => {
            log::info!("Ctrl-C received, initiating shutdown.");
        }
        _ = async {
            #[cfg(unix)]
            {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut term_signal) => {
                        term_signal.recv().await;
                        log::info!("SIGTERM received, initiating shutdown.");
                    }
                    Err(e) => {
                        log::warn!("Cannot listen for SIGTERM: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
            #[cfg(not(unix))]
            {
                // On non-unix platforms, just wait forever.
                std::future::pending::<()>().await;
            }
        } => {}
    }

    // Send shutdown signal to all components
    let _ = shutdown_tx.send(());

    for handle in handles {
        let _ = handle.await;
    }
    stream.shutdown();

    log::info!("Shutdown complete.");
    Ok(())
}
