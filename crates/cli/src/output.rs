//! Output formatting utilities

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use sentinel_core::alerts::AlertSeverity;
use sentinel_core::anomaly::AnomalySeverity;
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print any response as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print rows as a rounded table
pub fn print_rows<T: tabled::Tabled>(rows: Vec<T>) {
    let table = tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string();
    println!("{}", table);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a 0-100 confidence as a percentage
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.0}%", confidence)
}

/// Format epoch milliseconds as UTC time
pub fn format_timestamp(ms: i64) -> String {
    match chrono::DateTime::from_timestamp_millis(ms) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => ms.to_string(),
    }
}

/// Check mark for true, blank for false
pub fn format_flag(value: bool) -> String {
    if value {
        "✓".to_string()
    } else {
        String::new()
    }
}

/// Shorten long ids for table display
pub fn truncate_id(id: &str) -> String {
    if id.chars().count() > 14 {
        let head: String = id.chars().take(14).collect();
        format!("{}...", head)
    } else {
        id.to_string()
    }
}

/// Color an alert severity
pub fn color_severity(severity: AlertSeverity) -> String {
    let text = severity.to_string();
    match severity {
        AlertSeverity::Info => text.blue().to_string(),
        AlertSeverity::Warning => text.yellow().to_string(),
        AlertSeverity::Error => text.red().to_string(),
        AlertSeverity::Critical => text.red().bold().to_string(),
    }
}

/// Color an anomaly severity
pub fn color_anomaly_severity(severity: AnomalySeverity) -> String {
    let text = severity.to_string();
    match severity {
        AnomalySeverity::Low => text.blue().to_string(),
        AnomalySeverity::Medium => text.yellow().to_string(),
        AnomalySeverity::High => text.red().to_string(),
        AnomalySeverity::Critical => text.red().bold().to_string(),
    }
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" | "ready" | "active" => status.green().to_string(),
        "degraded" | "acknowledged" => status.yellow().to_string(),
        "unhealthy" | "not ready" => status.red().to_string(),
        "resolved" => status.dimmed().to_string(),
        _ => status.to_string(),
    }
}

/// Color confidence based on value
pub fn color_confidence(confidence: f64) -> String {
    let formatted = format_confidence(confidence);
    if confidence >= 80.0 {
        formatted.green().to_string()
    } else if confidence >= 60.0 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}
