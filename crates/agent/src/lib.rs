//! Sentinel daemon: configuration and HTTP surface
//!
//! The binary in `main.rs` wires these together with the core analysis loop.

pub mod api;
pub mod config;
