//! Signal generation and risk sizing for the galaxy-trader system.
//!
//! This crate handles:
//! - RSI computation (Wilder smoothing and the `ta` crate)
//! - The RSI + sentiment signal provider
//! - Position sizing with stop-loss and take-profit levels

pub mod risk;
pub mod rsi;
pub mod signal;

pub use risk::{OrderPlan, RiskManager};
pub use rsi::{ta_rsi, wilder_rsi, WilderRsi};
pub use signal::RsiSentimentStrategy;
