//! Position tracking for backtesting.
//!
//! Tracks the cash balance, the single open position and the closed trades.

use galaxy_core::{Fill, TimestampMs};
use serde::{Deserialize, Serialize};

/// An open long position.
///
/// Invariant: `entry_price > 0` and `quantity > 0` while open.
#[derive(Debug, Clone)]
pub struct Position {
    /// Entry timestamp.
    pub entry_ts: TimestampMs,
    /// Entry price (after slippage).
    pub entry_price: f64,
    /// Quantity held.
    pub quantity: f64,
}

impl Position {
    /// Mark-to-market value at `price`.
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }
}

/// Reason for exiting a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Strategy emitted a Sell.
    Signal,
    /// Position still open after the last bar.
    EndOfData,
}

/// Closed trade record. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Entry timestamp.
    pub entry_time: TimestampMs,
    /// Exit timestamp.
    pub exit_time: TimestampMs,
    /// Entry price.
    pub entry_price: f64,
    /// Exit price.
    pub exit_price: f64,
    /// `(exit_price - entry_price) / entry_price`.
    pub profit_pct: f64,
    /// Quantity traded.
    pub quantity: f64,
    /// Exit reason.
    pub exit_reason: ExitReason,
}

impl Trade {
    /// Whether the trade made money before fees.
    pub fn is_win(&self) -> bool {
        self.profit_pct > 0.0
    }
}

/// Position tracker for backtesting.
#[derive(Debug)]
pub struct PositionTracker {
    /// Cash balance.
    pub cash: f64,
    /// Current open position.
    pub position: Option<Position>,
    /// Closed trades.
    pub trades: Vec<Trade>,
}

impl PositionTracker {
    /// Create a tracker holding `initial_cash` and no position.
    pub fn new(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash,
            position: None,
            trades: Vec::new(),
        }
    }

    /// Check if there's an open position.
    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }

    /// Open a position from a buy fill, paying notional plus fee.
    ///
    /// Returns false (and changes nothing) when a position is already open
    /// or the fill quantity is not positive.
    pub fn open_position(&mut self, fill: &Fill) -> bool {
        if self.position.is_some() || !(fill.quantity > 0.0) {
            return false;
        }
        self.cash -= fill.notional() + fill.fee;
        self.position = Some(Position {
            entry_ts: fill.ts_ms,
            entry_price: fill.price,
            quantity: fill.quantity,
        });
        true
    }

    /// Close the open position with a sell fill.
    pub fn close_position(&mut self, fill: &Fill, reason: ExitReason) -> Option<&Trade> {
        let position = self.position.take()?;

        self.cash += fill.notional() - fill.fee;

        let profit_pct = (fill.price - position.entry_price) / position.entry_price;
        self.trades.push(Trade {
            entry_time: position.entry_ts,
            exit_time: fill.ts_ms,
            entry_price: position.entry_price,
            exit_price: fill.price,
            profit_pct,
            quantity: position.quantity,
            exit_reason: reason,
        });

        self.trades.last()
    }

    /// Quantity currently held (0 when flat).
    pub fn quantity(&self) -> f64 {
        self.position.as_ref().map(|p| p.quantity).unwrap_or(0.0)
    }

    /// Cash plus mark-to-market value of the open position.
    pub fn equity(&self, mark_price: f64) -> f64 {
        self.cash
            + self
                .position
                .as_ref()
                .map(|p| p.market_value(mark_price))
                .unwrap_or(0.0)
    }

    /// Consume the tracker, returning the closed trades.
    pub fn into_trades(self) -> Vec<Trade> {
        self.trades
    }
}
