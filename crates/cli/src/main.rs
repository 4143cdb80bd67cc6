//! Sentinel CLI
//!
//! A command-line tool for inspecting and administering alerts, rules,
//! anomalies and notification settings on a running Sentinel daemon.

use anyhow::Result;
use clap::{Parser, Subcommand};
use sentinel_cli::client::{AlertFilter, ApiClient};
use sentinel_cli::commands::alerts::Transition;
use sentinel_cli::commands::{alerts, analysis, metrics, notifications, rules};
use sentinel_cli::config::Config;
use sentinel_cli::output::{print_error, print_info, print_warning, OutputFormat};
use sentinel_core::alerts::{
    AlertCategory, AlertSeverity, AlertSource, NewAlert, RuleCondition, RuleUpdate,
    SettingsUpdate,
};

/// Sentinel monitoring CLI
#[derive(Parser)]
#[command(name = "sentinelctl")]
#[command(author, version, about = "CLI for the Sentinel monitoring daemon", long_about = None)]
pub struct Cli {
    /// Daemon URL (can also be set via SENTINEL_API_URL or the config file)
    #[arg(long, env = "SENTINEL_API_URL")]
    pub api_url: Option<String>,

    /// Output format [default: table]
    #[arg(long, short)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show daemon health and readiness
    Status,

    /// Push one metric snapshot (e.g. responseTime=250 errorRate=0.02)
    Ingest {
        /// Metric readings as name=value
        #[arg(required = true, value_parser = metrics::parse_metric)]
        metrics: Vec<(String, f64)>,
    },

    /// Manage alerts
    #[command(subcommand)]
    Alerts(AlertCommands),

    /// Manage threshold rules
    #[command(subcommand)]
    Rules(RuleCommands),

    /// Show anomalies in the current detection window
    Anomalies {
        /// Filter by severity (low, medium, high, critical)
        #[arg(long, short)]
        severity: Option<String>,
    },

    /// Show insights for the latest snapshot
    Insights {
        /// Filter by category (performance, traffic, security, prediction)
        #[arg(long, short)]
        category: Option<String>,
    },

    /// View or change notification settings
    #[command(subcommand)]
    Notifications(NotificationCommands),
}

#[derive(Subcommand)]
pub enum AlertCommands {
    /// List alerts
    List {
        /// Only alerts that are not resolved
        #[arg(long)]
        active: bool,

        /// Only alerts that are not acknowledged
        #[arg(long)]
        unacknowledged: bool,

        /// Filter by category (performance, traffic, security, system, ai)
        #[arg(long, short)]
        category: Option<AlertCategory>,

        /// Filter by severity (info, warning, error, critical)
        #[arg(long, short)]
        severity: Option<AlertSeverity>,
    },

    /// Show one alert with metadata and actions
    Show {
        /// Alert ID
        id: String,
    },

    /// Raise a manual alert
    Create {
        #[arg(long)]
        title: String,

        #[arg(long)]
        message: String,

        #[arg(long, default_value = "warning")]
        severity: AlertSeverity,

        #[arg(long, default_value = "system")]
        category: AlertCategory,
    },

    /// Acknowledge an alert
    Ack {
        /// Alert ID
        id: String,
    },

    /// Resolve an alert
    Resolve {
        /// Alert ID
        id: String,
    },

    /// Remove an alert
    Dismiss {
        /// Alert ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum RuleCommands {
    /// List threshold rules
    List,

    /// Update fields of a rule
    Update {
        /// Rule ID
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        metric: Option<String>,

        /// Comparison (greater_than, less_than, equals, not_equals)
        #[arg(long, value_parser = parse_condition)]
        condition: Option<RuleCondition>,

        #[arg(long)]
        threshold: Option<f64>,

        #[arg(long)]
        severity: Option<AlertSeverity>,

        #[arg(long)]
        enabled: Option<bool>,

        #[arg(long)]
        cooldown_minutes: Option<u32>,

        /// Clear the last-fired time so the rule can fire on the next tick
        #[arg(long)]
        reset_cooldown: bool,
    },
}

#[derive(Subcommand)]
pub enum NotificationCommands {
    /// Show notification settings
    Show,

    /// Change notification settings
    Set {
        #[arg(long)]
        enabled: Option<bool>,

        #[arg(long)]
        sound: Option<bool>,

        #[arg(long)]
        desktop: Option<bool>,

        #[arg(long)]
        email: Option<bool>,

        #[arg(long)]
        slack: Option<bool>,

        /// Lowest severity that triggers a notification
        #[arg(long)]
        threshold: Option<AlertSeverity>,
    },
}

fn parse_condition(arg: &str) -> Result<RuleCondition, String> {
    serde_json::from_value(serde_json::Value::String(arg.to_string()))
        .map_err(|_| format!("unknown condition: {arg}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            print_warning(&format!("Ignoring config file: {:#}", e));
            Config::default()
        }
    };

    let api_url = config.resolve_api_url(cli.api_url.as_deref());
    let format = cli.format.unwrap_or_else(|| match config.default_format.as_deref() {
        Some("json") => OutputFormat::Json,
        _ => OutputFormat::Table,
    });
    if cli.verbose {
        print_info(&format!("Using API endpoint {}", api_url));
    }

    // Initialize client
    let client = ApiClient::new(&api_url)?;

    // Execute command
    match cli.command {
        Commands::Status => metrics::show_status(&client, format).await?,
        Commands::Ingest { metrics: readings } => {
            metrics::ingest(&client, readings, format).await?;
        }
        Commands::Alerts(alert_cmd) => match alert_cmd {
            AlertCommands::List {
                active,
                unacknowledged,
                category,
                severity,
            } => {
                let filter = AlertFilter {
                    active,
                    unacknowledged,
                    category,
                    severity,
                };
                alerts::list_alerts(&client, filter, format).await?;
            }
            AlertCommands::Show { id } => alerts::show_alert(&client, &id, format).await?,
            AlertCommands::Create {
                title,
                message,
                severity,
                category,
            } => {
                let new = NewAlert::new(title, message, severity, category, AlertSource::Manual);
                alerts::create_alert(&client, new, format).await?;
            }
            AlertCommands::Ack { id } => {
                alerts::transition_alert(&client, &id, Transition::Acknowledge, format).await?;
            }
            AlertCommands::Resolve { id } => {
                alerts::transition_alert(&client, &id, Transition::Resolve, format).await?;
            }
            AlertCommands::Dismiss { id } => {
                alerts::transition_alert(&client, &id, Transition::Dismiss, format).await?;
            }
        },
        Commands::Rules(rule_cmd) => match rule_cmd {
            RuleCommands::List => rules::list_rules(&client, format).await?,
            RuleCommands::Update {
                id,
                name,
                metric,
                condition,
                threshold,
                severity,
                enabled,
                cooldown_minutes,
                reset_cooldown,
            } => {
                let update = RuleUpdate {
                    name,
                    metric,
                    condition,
                    threshold,
                    severity,
                    enabled,
                    cooldown_minutes,
                    last_triggered: reset_cooldown.then_some(None),
                };
                rules::update_rule(&client, &id, update, format).await?;
            }
        },
        Commands::Anomalies { severity } => {
            analysis::list_anomalies(&client, severity, format).await?;
        }
        Commands::Insights { category } => {
            analysis::list_insights(&client, category, format).await?;
        }
        Commands::Notifications(notify_cmd) => match notify_cmd {
            NotificationCommands::Show => notifications::show_settings(&client, format).await?,
            NotificationCommands::Set {
                enabled,
                sound,
                desktop,
                email,
                slack,
                threshold,
            } => {
                let update = SettingsUpdate {
                    enabled,
                    sound,
                    desktop,
                    email,
                    slack,
                    threshold,
                };
                notifications::update_settings(&client, update, format).await?;
            }
        },
    }

    Ok(())
}
