//! # Live Stream Smoke Test
//!
//! Connects the stream manager to a running incident feed, prints every
//! delivered incident for a while, then unsubscribes and checks that the
//! manager went idle.
//!
//! ```text
//! cargo run -p project_tests --bin test_live_stream -- --url ws://localhost:8080/incidents --seconds 30
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use lib_pollwatch::configs::ReconnectPolicy;
use lib_pollwatch::configs::config_stream::DEFAULT_STREAM_URL;
use lib_pollwatch::core::{ConnectionState, Connector, StreamSubscriptionManager, listener};
use lib_pollwatch::ingestors::WsConnector;
use lib_pollwatch::models::Incident;

/// Command-line options.
#[derive(Parser, Debug)]
#[command(about = "Watch the live incident feed for a while")]
struct Args {
    /// Feed URL.
    #[arg(long, env = "POLLWATCH_STREAM_URL", default_value = DEFAULT_STREAM_URL)]
    url: String,

    /// How long to listen.
    #[arg(long, default_value_t = 30)]
    seconds: u64,

    /// Reconnect delay in milliseconds.
    #[arg(long, default_value_t = 5000)]
    reconnect_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}] {}",
                chrono::Local::now().format("[%H:%M:%S]"),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stdout())
        .apply()?;

    let connector: Arc<dyn Connector> = Arc::new(WsConnector::new(args.url.clone()));
    let manager = StreamSubscriptionManager::new(
        connector,
        ReconnectPolicy::Fixed {
            delay_ms: args.reconnect_ms,
        },
    );

    let printer = listener(|incident: &Incident| {
        println!(
            "{} | {} | {} | {} dead, {} injured",
            incident.date, incident.incident_type, incident.location, incident.fatalities, incident.injuries
        );
    });

    println!("--- Listening to {} for {}s ---", args.url, args.seconds);
    manager.subscribe(Arc::clone(&printer));
    tokio::time::sleep(Duration::from_secs(args.seconds)).await;
    manager.unsubscribe(&printer);

    let stats = manager.stats();
    println!(
        "--- Done: {} attempt(s), {} delivered, {} dropped ---",
        stats.connection_attempts, stats.delivered, stats.dropped
    );
    anyhow::ensure!(
        manager.state() == ConnectionState::Idle,
        "manager still active after the last unsubscribe"
    );
    Ok(())
}
