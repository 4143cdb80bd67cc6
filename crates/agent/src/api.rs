//! HTTP API: ingestion, alert administration, health checks and Prometheus metrics

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use sentinel_core::{
    alerts::{AlertCategory, AlertSeverity, NewAlert, RuleUpdate, SettingsUpdate},
    anomaly::AnomalySeverity,
    health::{ComponentStatus, HealthRegistry},
    insights::InsightCategory,
    MetricSnapshot, Monitor, SnapshotSender, SourceError,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub monitor: Monitor,
    pub health_registry: HealthRegistry,
    pub ingest: SnapshotSender,
}

impl AppState {
    pub fn new(monitor: Monitor, health_registry: HealthRegistry, ingest: SnapshotSender) -> Self {
        Self {
            monitor,
            health_registry,
            ingest,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("ingestion unavailable: {0}")]
    Unavailable(#[from] SourceError),
    #[error("metrics encoding failed: {0}")]
    Encoding(#[from] prometheus::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Result<impl IntoResponse, ApiError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder.encode(&metric_families, &mut buffer)?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    ))
}

/// Queue a snapshot for the next analysis tick
async fn ingest_metrics(
    State(state): State<Arc<AppState>>,
    Json(snapshot): Json<MetricSnapshot>,
) -> Result<impl IntoResponse, ApiError> {
    let metrics = snapshot.len();
    state.ingest.push(snapshot).map_err(|e| {
        warn!(error = %e, "Rejected metric snapshot");
        e
    })?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "queued": true, "metrics": metrics })),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct AlertQuery {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub unacknowledged: bool,
    pub category: Option<AlertCategory>,
    pub severity: Option<AlertSeverity>,
}

async fn list_alerts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AlertQuery>,
) -> impl IntoResponse {
    let alerts: Vec<_> = state
        .monitor
        .alerts()
        .into_iter()
        .filter(|a| !query.active || !a.resolved)
        .filter(|a| !query.unacknowledged || !a.acknowledged)
        .filter(|a| query.category.map_or(true, |c| a.category == c))
        .filter(|a| query.severity.map_or(true, |s| a.severity == s))
        .collect();

    Json(alerts)
}

async fn create_alert(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewAlert>,
) -> impl IntoResponse {
    let alert = state.monitor.create_manual(new);
    info!(alert_id = %alert.id, "Manual alert created");
    (StatusCode::CREATED, Json(alert))
}

async fn acknowledge_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    Json(json!({ "changed": state.monitor.acknowledge(&id) }))
}

async fn resolve_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    Json(json!({ "changed": state.monitor.resolve(&id) }))
}

async fn dismiss_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    Json(json!({ "changed": state.monitor.dismiss(&id) }))
}

async fn list_rules(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.monitor.list_rules())
}

async fn update_rule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<RuleUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.monitor.update_rule(&id, update) {
        return Err(ApiError::NotFound(format!("rule {id}")));
    }

    let rule = state
        .monitor
        .list_rules()
        .into_iter()
        .find(|r| r.id == id)
        .ok_or_else(|| ApiError::NotFound(format!("rule {id}")))?;
    Ok(Json(rule))
}

#[derive(Debug, Default, Deserialize)]
pub struct AnomalyQuery {
    pub severity: Option<AnomalySeverity>,
}

async fn list_anomalies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnomalyQuery>,
) -> impl IntoResponse {
    let anomalies = match query.severity {
        Some(severity) => state.monitor.anomalies_by_severity(severity),
        None => state.monitor.anomalies(),
    };
    Json(anomalies)
}

#[derive(Debug, Default, Deserialize)]
pub struct InsightQuery {
    pub category: Option<InsightCategory>,
}

async fn list_insights(
    State(state): State<Arc<AppState>>,
    Query(query): Query<InsightQuery>,
) -> impl IntoResponse {
    let insights = match query.category {
        Some(category) => state.monitor.insights_by_category(category),
        None => state.monitor.insights(),
    };
    Json(insights)
}

async fn get_notifications(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.monitor.settings())
}

async fn update_notifications(
    State(state): State<Arc<AppState>>,
    Json(update): Json<SettingsUpdate>,
) -> impl IntoResponse {
    let settings = state.monitor.update_settings(update);
    info!(
        enabled = settings.enabled,
        threshold = %settings.threshold,
        "Notification settings updated"
    );
    Json(settings)
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/metrics", post(ingest_metrics))
        .route("/api/v1/alerts", get(list_alerts).post(create_alert))
        .route("/api/v1/alerts/:id", delete(dismiss_alert))
        .route("/api/v1/alerts/:id/acknowledge", post(acknowledge_alert))
        .route("/api/v1/alerts/:id/resolve", post(resolve_alert))
        .route("/api/v1/rules", get(list_rules))
        .route("/api/v1/rules/:id", patch(update_rule))
        .route("/api/v1/anomalies", get(list_anomalies))
        .route("/api/v1/insights", get(list_insights))
        .route(
            "/api/v1/notifications",
            get(get_notifications).patch(update_notifications),
        )
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
