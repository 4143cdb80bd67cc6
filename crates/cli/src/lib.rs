//! Sentinel CLI library
//!
//! The `sentinelctl` binary is a thin argument parser over these modules.

pub mod client;
pub mod commands;
pub mod config;
pub mod output;
