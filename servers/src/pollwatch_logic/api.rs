use crate::pollwatch_logic::state::{AppState, SyncError, SyncReport};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use lib_pollwatch::core::{StreamStats, parse_kind};
use lib_pollwatch::models::{
    Candidate, Collection, ConstituencyProjection, DashboardStats, Incident,
    ParliamentaryCandidate,
};
use serde::Serialize;
use serde_json::{Value, json};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/incidents", get(incidents_handler))
        .route("/api/candidates/presidential", get(presidential_handler))
        .route("/api/candidates/parliamentary", get(parliamentary_handler))
        .route("/api/collections/{kind}", get(collection_handler))
        .route("/api/constituencies", get(constituencies_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/sync", post(sync_handler))
        .with_state(state)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Health {
    status: &'static str,
    stream_state: String,
    listeners: usize,
    connection_attempts: u64,
    frames_delivered: u64,
    frames_dropped: u64,
    enrichment_enabled: bool,
}

async fn health_handler(State(state): State<AppState>) -> Json<Health> {
    let StreamStats {
        connection_attempts,
        delivered,
        dropped,
    } = state.stream.stats();
    Json(Health {
        status: "ok",
        stream_state: format!("{:?}", state.stream.state()),
        listeners: state.stream.listener_count(),
        connection_attempts,
        frames_delivered: delivered,
        frames_dropped: dropped,
        enrichment_enabled: state.enrichment_enabled(),
    })
}

async fn incidents_handler(State(state): State<AppState>) -> Json<Vec<Incident>> {
    Json(state.reconciler.lock().await.incidents())
}

async fn presidential_handler(State(state): State<AppState>) -> Json<Vec<Candidate>> {
    Json(state.reconciler.lock().await.presidential().to_vec())
}

async fn parliamentary_handler(State(state): State<AppState>) -> Json<Vec<ParliamentaryCandidate>> {
    Json(state.reconciler.lock().await.parliamentary().to_vec())
}

async fn collection_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Collection>, (StatusCode, Json<Value>)> {
    let kind = parse_kind(&name)
        .map_err(|e| (StatusCode::NOT_FOUND, Json(json!({ "error": e.to_string() }))))?;
    Ok(Json(state.reconciler.lock().await.collection(kind)))
}

async fn constituencies_handler(State(state): State<AppState>) -> Json<Vec<ConstituencyProjection>> {
    Json(state.reconciler.lock().await.constituencies())
}

async fn stats_handler(State(state): State<AppState>) -> Json<DashboardStats> {
    Json(state.reconciler.lock().await.stats())
}

async fn sync_handler(State(state): State<AppState>) -> Result<Json<SyncReport>, SyncError> {
    state.sync().await.map(Json)
}

impl IntoResponse for SyncError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            SyncError::Disabled => (
                StatusCode::SERVICE_UNAVAILABLE,
                "enrichment is not configured".to_string(),
            ),
            SyncError::Failed(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
        };
        (status, Json(json!({ "error": message, "retry": true }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use lib_pollwatch::configs::{ReconcilerConfig, ReconnectPolicy};
    use lib_pollwatch::core::{Connection, Connector, DataReconciler, StreamSubscriptionManager, TransportError};
    use lib_pollwatch::feeds::{Enricher, EnrichmentError, EnrichmentRequest, load_seed};
    use lib_pollwatch::models::{CandidateUpdate, EnrichmentBatch};
    use std::sync::Arc;

    struct Unreachable;

    #[async_trait]
    impl Connector for Unreachable {
        async fn connect(&self) -> Result<Box<dyn Connection>, TransportError> {
            Err(TransportError::Connect("offline".into()))
        }

        fn endpoint(&self) -> String {
            "offline://".into()
        }
    }

    struct FixedEnricher;

    #[async_trait]
    impl Enricher for FixedEnricher {
        async fn fetch(&self, _: &EnrichmentRequest) -> Result<EnrichmentBatch, EnrichmentError> {
            Ok(EnrichmentBatch {
                new_incidents: vec![],
                candidate_updates: vec![CandidateUpdate {
                    name: "Bobi".into(),
                    sentiment_score: Some(80.0),
                    mentions: None,
                }],
            })
        }
    }

    async fn serve(enricher: Option<Arc<dyn Enricher>>) -> String {
        let mut reconciler = DataReconciler::new(ReconcilerConfig::default())
            .with_reference_date(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        for collection in load_seed().unwrap().into_collections() {
            reconciler.apply_seed(collection);
        }
        let stream = Arc::new(StreamSubscriptionManager::new(
            Arc::new(Unreachable),
            ReconnectPolicy::default(),
        ));
        let app = router(AppState::new(reconciler, stream, enricher));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_read_endpoints() {
        let base = serve(None).await;
        let client = reqwest::Client::new();

        let health: Value = client.get(format!("{base}/health")).send().await.unwrap().json().await.unwrap();
        assert_eq!(health["status"], "ok");
        assert_eq!(health["streamState"], "Idle");

        let incidents: Value = client.get(format!("{base}/api/incidents")).send().await.unwrap().json().await.unwrap();
        assert!(!incidents.as_array().unwrap().is_empty());
        assert!(incidents[0].get("type").is_some());

        let stats: Value = client.get(format!("{base}/api/stats")).send().await.unwrap().json().await.unwrap();
        assert_eq!(stats["daysToElection"], 15);

        let field: Value = client
            .get(format!("{base}/api/collections/presidential"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(field["kind"], "presidential");
        assert_eq!(field["items"].as_array().unwrap().len(), 4);

        let unknown = client.get(format!("{base}/api/collections/senate")).send().await.unwrap();
        assert_eq!(unknown.status(), reqwest::StatusCode::NOT_FOUND);
        let body: Value = unknown.json().await.unwrap();
        assert_eq!(body["error"], "unknown collection kind 'senate'");

        let seats: Value = client.get(format!("{base}/api/constituencies")).send().await.unwrap().json().await.unwrap();
        assert_eq!(seats[0]["constituency"], "Gulu City");
    }

    #[tokio::test]
    async fn test_sync_endpoint() {
        let base = serve(None).await;
        let client = reqwest::Client::new();
        let refused = client.post(format!("{base}/api/sync")).send().await.unwrap();
        assert_eq!(refused.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);

        let enricher: Arc<dyn Enricher> = Arc::new(FixedEnricher);
        let base = serve(Some(enricher)).await;
        let report: Value = client.post(format!("{base}/api/sync")).send().await.unwrap().json().await.unwrap();
        assert_eq!(report["candidatesPatched"], 1);

        let field: Value = client
            .get(format!("{base}/api/candidates/presidential"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let bobi = field
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["name"].as_str().unwrap().contains("Bobi"))
            .unwrap();
        assert_eq!(bobi["sentimentScore"], 80.0);
    }
}
