//! Notification settings CLI commands

use anyhow::Result;
use colored::Colorize;
use sentinel_core::alerts::{NotificationSettings, SettingsUpdate};

use crate::client::ApiClient;
use crate::output::{color_severity, print_json, print_success, print_warning, OutputFormat};

fn print_settings(settings: &NotificationSettings) {
    println!("{}", "Notification Settings".bold());
    println!("{}", "=".repeat(40));
    println!("Enabled:   {}", settings.enabled);
    println!("Threshold: {}", color_severity(settings.threshold));
    let channels = settings.channels();
    if channels.is_empty() {
        println!("Channels:  {}", "none".dimmed());
    } else {
        println!("Channels:  {}", channels.join(", "));
    }
}

/// Show the daemon's notification settings
pub async fn show_settings(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let settings: NotificationSettings = client.get("api/v1/notifications").await?;

    match format {
        OutputFormat::Json => print_json(&settings)?,
        OutputFormat::Table => print_settings(&settings),
    }

    Ok(())
}

/// Merge fields into the notification settings
pub async fn update_settings(
    client: &ApiClient,
    update: SettingsUpdate,
    format: OutputFormat,
) -> Result<()> {
    if update == SettingsUpdate::default() {
        print_warning("Nothing to update");
        return Ok(());
    }

    let settings: NotificationSettings = client.patch("api/v1/notifications", &update).await?;

    match format {
        OutputFormat::Json => print_json(&settings)?,
        OutputFormat::Table => {
            print_success("Notification settings updated");
            print_settings(&settings);
        }
    }

    Ok(())
}
