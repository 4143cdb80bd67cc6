//! Anomaly and insight CLI commands

use anyhow::Result;
use colored::Colorize;
use sentinel_core::anomaly::AnomalyDetection;
use sentinel_core::insights::AiInsight;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{
    color_anomaly_severity, color_confidence, format_flag, format_timestamp, print_json,
    print_rows, print_warning, OutputFormat,
};

/// Row for anomalies table
#[derive(Tabled)]
struct AnomalyRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Detected")]
    detected: String,
    #[tabled(rename = "Description")]
    description: String,
}

/// Row for insights table
#[derive(Tabled)]
struct InsightRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Actionable")]
    actionable: String,
}

/// Show anomalies in the daemon's rolling window
pub async fn list_anomalies(
    client: &ApiClient,
    severity: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let anomalies: Vec<AnomalyDetection> = match &severity {
        Some(s) => {
            client
                .get_with_query("api/v1/anomalies", &[("severity", s.as_str())])
                .await?
        }
        None => client.get("api/v1/anomalies").await?,
    };

    match format {
        OutputFormat::Json => print_json(&anomalies)?,
        OutputFormat::Table => {
            if anomalies.is_empty() {
                print_warning("No anomalies in the current window");
                return Ok(());
            }

            let rows: Vec<AnomalyRow> = anomalies
                .iter()
                .map(|a| AnomalyRow {
                    metric: a.metric.clone(),
                    kind: a.kind.to_string(),
                    severity: color_anomaly_severity(a.severity),
                    confidence: color_confidence(a.confidence),
                    detected: format_timestamp(a.timestamp),
                    description: a.description.clone(),
                })
                .collect();

            print_rows(rows);

            println!("\n{}", "Recommendations".bold());
            for anomaly in &anomalies {
                println!("  {} {}", "→".cyan(), anomaly.recommendation);
                if let Some(impact) = &anomaly.predicted_impact {
                    println!("    {}", impact.dimmed());
                }
            }
        }
    }

    Ok(())
}

/// Show insights from the latest snapshot
pub async fn list_insights(
    client: &ApiClient,
    category: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let insights: Vec<AiInsight> = match &category {
        Some(c) => {
            client
                .get_with_query("api/v1/insights", &[("category", c.as_str())])
                .await?
        }
        None => client.get("api/v1/insights").await?,
    };

    match format {
        OutputFormat::Json => print_json(&insights)?,
        OutputFormat::Table => {
            if insights.is_empty() {
                print_warning("No insights for the latest snapshot");
                return Ok(());
            }

            let rows: Vec<InsightRow> = insights
                .iter()
                .map(|i| InsightRow {
                    category: i.category.to_string(),
                    title: i.title.clone(),
                    confidence: color_confidence(i.confidence),
                    actionable: format_flag(i.actionable),
                })
                .collect();

            print_rows(rows);

            for insight in &insights {
                if let Some(recommendation) = &insight.recommendation {
                    println!("  {} {}: {}", "→".cyan(), insight.title, recommendation);
                }
            }
        }
    }

    Ok(())
}
