//! Reporting hooks for a backtest run.
//!
//! The engine performs no logging of its own; callers that want progress
//! output inject an observer.

use galaxy_core::{PriceBar, Signal};
use tracing::{debug, info};

use crate::metrics::EquityPoint;
use crate::position::Trade;

/// Callbacks invoked by the engine during a run. All methods default to no-ops.
pub trait BacktestObserver {
    /// Called after each bar is processed.
    fn on_step(&mut self, _index: usize, _bar: &PriceBar, _signal: &Signal, _point: &EquityPoint) {}

    /// Called when a trade closes, including the forced end-of-data exit.
    fn on_trade(&mut self, _trade: &Trade) {}
}

/// Observer that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl BacktestObserver for NoopObserver {}

/// Observer that forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl BacktestObserver for TracingObserver {
    fn on_step(&mut self, index: usize, bar: &PriceBar, signal: &Signal, point: &EquityPoint) {
        debug!(
            index,
            ts_ms = bar.ts_ms,
            close = bar.close,
            action = %signal.action,
            indicator = ?signal.indicator,
            equity = point.equity,
            "backtest step"
        );
    }

    fn on_trade(&mut self, trade: &Trade) {
        info!(
            entry_time = trade.entry_time,
            exit_time = trade.exit_time,
            entry_price = trade.entry_price,
            exit_price = trade.exit_price,
            profit_pct = trade.profit_pct,
            exit_reason = ?trade.exit_reason,
            "trade closed"
        );
    }
}
