//! Threshold rule CLI commands

use anyhow::Result;
use sentinel_core::alerts::{AlertRule, RuleCondition, RuleUpdate};
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{
    color_severity, format_flag, format_timestamp, print_json, print_rows, print_success,
    print_warning, OutputFormat,
};

/// Row for rules table
#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Condition")]
    condition: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Cooldown")]
    cooldown: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
    #[tabled(rename = "Last Fired")]
    last_triggered: String,
}

fn condition_symbol(condition: RuleCondition) -> &'static str {
    match condition {
        RuleCondition::GreaterThan => ">",
        RuleCondition::LessThan => "<",
        RuleCondition::Equals => "==",
        RuleCondition::NotEquals => "!=",
    }
}

/// List threshold rules
pub async fn list_rules(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let rules: Vec<AlertRule> = client.get("api/v1/rules").await?;

    match format {
        OutputFormat::Json => print_json(&rules)?,
        OutputFormat::Table => {
            if rules.is_empty() {
                print_warning("No rules configured");
                return Ok(());
            }

            let rows: Vec<RuleRow> = rules
                .iter()
                .map(|r| RuleRow {
                    id: r.id.clone(),
                    metric: r.metric.clone(),
                    condition: format!("{} {}", condition_symbol(r.condition), r.threshold),
                    severity: color_severity(r.severity),
                    cooldown: format!("{}m", r.cooldown_minutes),
                    enabled: format_flag(r.enabled),
                    last_triggered: r
                        .last_triggered
                        .map(format_timestamp)
                        .unwrap_or_else(|| "-".to_string()),
                })
                .collect();

            print_rows(rows);
        }
    }

    Ok(())
}

/// Merge fields into one rule
pub async fn update_rule(
    client: &ApiClient,
    id: &str,
    update: RuleUpdate,
    format: OutputFormat,
) -> Result<()> {
    if update == RuleUpdate::default() {
        print_warning("Nothing to update");
        return Ok(());
    }

    let rule: AlertRule = client.patch(&format!("api/v1/rules/{}", id), &update).await?;

    match format {
        OutputFormat::Json => print_json(&rule)?,
        OutputFormat::Table => {
            print_success(&format!("Rule {} updated", rule.id));
            println!(
                "{} {} {} ({}, enabled: {})",
                rule.metric,
                condition_symbol(rule.condition),
                rule.threshold,
                rule.severity,
                rule.enabled
            );
        }
    }

    Ok(())
}
