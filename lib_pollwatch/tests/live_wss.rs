//! End-to-end: the stream manager over a real WebSocket connection to a local
//! server.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use lib_pollwatch::configs::ReconnectPolicy;
use lib_pollwatch::core::{listener, ConnectionState, Connector, StreamSubscriptionManager};
use lib_pollwatch::ingestors::WsConnector;
use lib_pollwatch::models::Incident;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

const WAIT: Duration = Duration::from_secs(5);

/// Accepts two sessions. The first gets two good frames and a bad one, then is
/// closed by the server. The second gets one frame and reports when the client
/// closes it.
async fn scripted_server(listener: TcpListener, client_closed: mpsc::Sender<()>) {
    let (stream, _) = listener.accept().await.unwrap();
    let mut ws = accept_async(stream).await.unwrap();
    ws.send(Message::text(
        r#"{"id":"w1","type":"Violence","location":"Masaka","date":"2025-12-11","fatalities":1}"#,
    ))
    .await
    .unwrap();
    ws.send(Message::text(r#"{"id":"w2","type":"Rally"}"#))
        .await
        .unwrap();
    ws.send(Message::binary(
        br#"{"id":"w3","type":"Arrest","location":"Gulu"}"#.to_vec(),
    ))
    .await
    .unwrap();
    ws.close(None).await.unwrap();

    let (stream, _) = listener.accept().await.unwrap();
    let mut ws = accept_async(stream).await.unwrap();
    ws.send(Message::text(
        r#"{"id":"w4","type":"Protest","location":"Jinja"}"#,
    ))
    .await
    .unwrap();
    while let Some(msg) = ws.next().await {
        if matches!(msg, Ok(Message::Close(_)) | Err(_)) {
            break;
        }
    }
    let _ = client_closed.send(()).await;
}

#[tokio::test]
async fn test_live_stream_over_websocket() {
    let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", server.local_addr().unwrap());
    let (closed_tx, mut closed_rx) = mpsc::channel(1);
    tokio::spawn(scripted_server(server, closed_tx));

    let connector: Arc<dyn Connector> = Arc::new(WsConnector::new(url));
    let manager = StreamSubscriptionManager::new(connector, ReconnectPolicy::Fixed { delay_ms: 50 });

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let on_incident = listener(move |incident: &Incident| {
        let _ = tx.send(incident.id.clone());
    });
    manager.subscribe(Arc::clone(&on_incident));

    let mut ids = Vec::new();
    for _ in 0..3 {
        let id = tokio::time::timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        ids.push(id);
    }
    assert_eq!(ids, vec!["w1", "w3", "w4"]);

    let stats = manager.stats();
    assert_eq!(stats.connection_attempts, 2);
    assert_eq!(stats.dropped, 1);
    assert_eq!(manager.state(), ConnectionState::Open);

    assert!(manager.unsubscribe(&on_incident));
    assert_eq!(manager.state(), ConnectionState::Idle);
    tokio::time::timeout(WAIT, closed_rx.recv())
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_idle_watchdog_forces_reconnect() {
    let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", server.local_addr().unwrap());
    tokio::spawn(async move {
        let mut sessions = Vec::new();
        while let Ok((stream, _)) = server.accept().await {
            // Hold the socket open and say nothing.
            if let Ok(ws) = accept_async(stream).await {
                sessions.push(ws);
            }
        }
    });

    let connector: Arc<dyn Connector> =
        Arc::new(WsConnector::new(url).with_idle_timeout(Duration::from_millis(100)));
    let manager = StreamSubscriptionManager::new(connector, ReconnectPolicy::Fixed { delay_ms: 20 });
    let on_incident = listener(|_: &Incident| {});
    manager.subscribe(Arc::clone(&on_incident));

    tokio::time::timeout(WAIT, async {
        while manager.stats().connection_attempts < 3 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();

    manager.shutdown();
    assert_eq!(manager.listener_count(), 0);
    assert_eq!(manager.state(), ConnectionState::Idle);
}
