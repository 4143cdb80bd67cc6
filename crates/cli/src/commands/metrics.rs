//! Metric ingestion and daemon status commands

use anyhow::Result;
use colored::Colorize;
use sentinel_core::health::{ComponentStatus, HealthResponse, ReadinessResponse};
use sentinel_core::MetricSnapshot;
use tabled::Tabled;

use crate::client::{ApiClient, IngestResponse};
use crate::output::{color_status, print_json, print_rows, print_success, OutputFormat};

/// Row for component health table
#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

fn status_label(status: ComponentStatus) -> &'static str {
    match status {
        ComponentStatus::Healthy => "healthy",
        ComponentStatus::Degraded => "degraded",
        ComponentStatus::Unhealthy => "unhealthy",
    }
}

/// Parse a `metric=value` argument
pub fn parse_metric(arg: &str) -> Result<(String, f64), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected metric=value, got '{arg}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing metric name in '{arg}'"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid value for {name}: '{value}'"))?;
    if !value.is_finite() {
        return Err(format!("value for {name} must be finite"));
    }

    Ok((name.to_string(), value))
}

/// Push one snapshot to the daemon
pub async fn ingest(
    client: &ApiClient,
    metrics: Vec<(String, f64)>,
    format: OutputFormat,
) -> Result<()> {
    let snapshot: MetricSnapshot = metrics.into_iter().collect();
    let response: IngestResponse = client.post("api/v1/metrics", &snapshot).await?;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => {
            print_success(&format!(
                "Snapshot with {} metrics queued for analysis",
                response.metrics
            ));
        }
    }

    Ok(())
}

/// Show daemon health and readiness
pub async fn show_status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health: HealthResponse = client.get("healthz").await?;
    let readiness: ReadinessResponse = client.get("readyz").await?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "health": health,
            "readiness": readiness,
        }))?,
        OutputFormat::Table => {
            println!("{}", "Sentinel Daemon Status".bold());
            println!("{}", "=".repeat(40));
            println!("Endpoint:  {}", client.base_url().as_str().cyan());
            println!("Health:    {}", color_status(status_label(health.status)));
            let ready = if readiness.ready { "ready" } else { "not ready" };
            println!("Readiness: {}", color_status(ready));
            if let Some(reason) = &readiness.reason {
                println!("Reason:    {}", reason);
            }
            println!();

            let mut rows: Vec<ComponentRow> = health
                .components
                .iter()
                .map(|(name, component)| ComponentRow {
                    name: name.clone(),
                    status: color_status(status_label(component.status)),
                    message: component.message.clone().unwrap_or_default(),
                })
                .collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));
            print_rows(rows);
        }
    }

    Ok(())
}
