//! Backtesting engine for the galaxy-trader system.
//!
//! This crate provides:
//! - Single-pass, single-position bar replay
//! - Close-price fill modeling with fee and slippage
//! - Position tracking and trade records
//! - Performance metrics from the equity curve
//! - Parallel parameter sweeps

pub mod engine;
pub mod fill_model;
pub mod metrics;
pub mod observer;
pub mod position;
pub mod scripted;
pub mod sweep;

pub use engine::{BacktestConfig, BacktestEngine, BacktestResult};
pub use fill_model::FillModel;
pub use metrics::{EquityPoint, MetricsCalculator, PerformanceMetrics};
pub use observer::{BacktestObserver, NoopObserver, TracingObserver};
pub use position::{ExitReason, PositionTracker, Trade};
pub use scripted::ScriptedProvider;
pub use sweep::{run_sweep, SweepOutcome};
