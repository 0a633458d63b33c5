//! Core types and configuration for the galaxy-trader system.
//!
//! This crate provides shared types used across all other crates:
//! - Market data types (bars, signals, fills)
//! - The `SignalProvider` capability consumed by the backtest engine
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod provider;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use provider::SignalProvider;
pub use types::*;
