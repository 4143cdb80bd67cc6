//! Subcommand implementations

pub mod alerts;
pub mod analysis;
pub mod metrics;
pub mod notifications;
pub mod rules;
