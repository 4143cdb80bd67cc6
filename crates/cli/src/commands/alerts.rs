//! Alert-related CLI commands

use anyhow::Result;
use colored::Colorize;
use sentinel_core::alerts::{Alert, NewAlert};
use tabled::Tabled;

use crate::client::{AlertFilter, ApiClient, ChangeResponse};
use crate::output::{
    color_severity, color_status, format_timestamp, print_info, print_json, print_rows,
    print_success, print_warning, truncate_id, OutputFormat,
};

/// Row for alerts table
#[derive(Tabled)]
struct AlertRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Raised")]
    raised: String,
    #[tabled(rename = "Status")]
    status: String,
}

fn alert_status(alert: &Alert) -> &'static str {
    if alert.resolved {
        "resolved"
    } else if alert.acknowledged {
        "acknowledged"
    } else {
        "active"
    }
}

/// List alerts with optional filters
pub async fn list_alerts(
    client: &ApiClient,
    filter: AlertFilter,
    format: OutputFormat,
) -> Result<()> {
    let alerts: Vec<Alert> = client.get_with_query("api/v1/alerts", &filter).await?;

    match format {
        OutputFormat::Json => print_json(&alerts)?,
        OutputFormat::Table => {
            if alerts.is_empty() {
                print_warning("No alerts found");
                return Ok(());
            }

            let unacknowledged = alerts.iter().filter(|a| !a.acknowledged).count();
            let rows: Vec<AlertRow> = alerts
                .iter()
                .map(|a| AlertRow {
                    id: truncate_id(&a.id),
                    severity: color_severity(a.severity),
                    category: a.category.to_string(),
                    source: a.source.to_string(),
                    title: a.title.clone(),
                    raised: format_timestamp(a.timestamp),
                    status: color_status(alert_status(a)),
                })
                .collect();

            print_rows(rows);
            println!(
                "\nTotal: {} alerts ({} unacknowledged)",
                alerts.len(),
                unacknowledged
            );
        }
    }

    Ok(())
}

/// Show one alert in full
pub async fn show_alert(client: &ApiClient, id: &str, format: OutputFormat) -> Result<()> {
    let alerts: Vec<Alert> = client.get("api/v1/alerts").await?;
    let Some(alert) = alerts.into_iter().find(|a| a.id == id) else {
        anyhow::bail!("Alert {} not found", id);
    };

    match format {
        OutputFormat::Json => print_json(&alert)?,
        OutputFormat::Table => {
            println!("{}", alert.title.bold());
            println!("{}", "=".repeat(60));
            println!("ID:       {}", alert.id.cyan());
            println!("Severity: {}", color_severity(alert.severity));
            println!("Category: {}", alert.category);
            println!("Source:   {}", alert.source);
            println!("Raised:   {}", format_timestamp(alert.timestamp));
            println!("Status:   {}", color_status(alert_status(&alert)));
            println!("\n{}", alert.message);

            if !alert.metadata.is_empty() {
                println!("\n{}", "Metadata".bold());
                for (key, value) in &alert.metadata {
                    println!("  {}: {}", key, value);
                }
            }
            for action in &alert.actions {
                print_info(&format!("Action available: {} ({})", action.label, action.id));
            }
        }
    }

    Ok(())
}

/// Raise a manual alert
pub async fn create_alert(client: &ApiClient, new: NewAlert, format: OutputFormat) -> Result<()> {
    let alert: Alert = client.post("api/v1/alerts", &new).await?;

    match format {
        OutputFormat::Json => print_json(&alert)?,
        OutputFormat::Table => {
            print_success(&format!("Alert {} created", alert.id));
        }
    }

    Ok(())
}

/// Lifecycle transitions exposed by the daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Acknowledge,
    Resolve,
    Dismiss,
}

impl Transition {
    fn past_tense(&self) -> &'static str {
        match self {
            Transition::Acknowledge => "acknowledged",
            Transition::Resolve => "resolved",
            Transition::Dismiss => "dismissed",
        }
    }
}

/// Acknowledge, resolve or dismiss an alert
pub async fn transition_alert(
    client: &ApiClient,
    id: &str,
    transition: Transition,
    format: OutputFormat,
) -> Result<()> {
    let response: ChangeResponse = match transition {
        Transition::Acknowledge => {
            client
                .post_empty(&format!("api/v1/alerts/{}/acknowledge", id))
                .await?
        }
        Transition::Resolve => {
            client
                .post_empty(&format!("api/v1/alerts/{}/resolve", id))
                .await?
        }
        Transition::Dismiss => client.delete(&format!("api/v1/alerts/{}", id)).await?,
    };

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => {
            if response.changed {
                print_success(&format!("Alert {} {}", id, transition.past_tense()));
            } else {
                print_warning(&format!(
                    "Alert {} not changed (unknown id or already {})",
                    id,
                    transition.past_tense()
                ));
            }
        }
    }

    Ok(())
}
