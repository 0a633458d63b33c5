//! Fill model for backtesting.
//!
//! Fills at the bar close with proportional slippage and a proportional fee.

use galaxy_core::{Fill, FillSide, TimestampMs};

/// Configuration for the fill model.
#[derive(Debug, Clone, Copy)]
pub struct FillModelConfig {
    /// Fee rate charged on notional (0.001 = 10 bps).
    pub fee_rate: f64,
    /// Adverse price move as a fraction of the close.
    pub slippage_rate: f64,
}

impl Default for FillModelConfig {
    fn default() -> Self {
        Self {
            fee_rate: 0.001,
            slippage_rate: 0.0005,
        }
    }
}

/// Fill model for simulating order execution.
#[derive(Debug, Clone)]
pub struct FillModel {
    config: FillModelConfig,
}

impl FillModel {
    /// Create a new fill model.
    pub fn new(config: FillModelConfig) -> Self {
        Self { config }
    }

    /// Spend all of `cash` on a market buy at `close`.
    ///
    /// The quantity is sized so that the notional equals `cash`; the fee is
    /// charged on top of it.
    pub fn buy(&self, ts_ms: TimestampMs, close: f64, cash: f64) -> Fill {
        let price = close * (1.0 + self.config.slippage_rate);
        let quantity = cash / price;
        let fee = self.calculate_fee(quantity * price);

        Fill {
            ts_ms,
            price,
            quantity,
            side: FillSide::Buy,
            fee,
        }
    }

    /// Market sell of `quantity` at `close`.
    pub fn sell(&self, ts_ms: TimestampMs, close: f64, quantity: f64) -> Fill {
        let price = close * (1.0 - self.config.slippage_rate);
        let fee = self.calculate_fee(quantity * price);

        Fill {
            ts_ms,
            price,
            quantity,
            side: FillSide::Sell,
            fee,
        }
    }

    /// Forced end-of-data exit: raw close, no slippage, normal fee.
    pub fn liquidate(&self, ts_ms: TimestampMs, close: f64, quantity: f64) -> Fill {
        let fee = self.calculate_fee(quantity * close);

        Fill {
            ts_ms,
            price: close,
            quantity,
            side: FillSide::Sell,
            fee,
        }
    }

    /// Fee for a given notional.
    pub fn calculate_fee(&self, notional: f64) -> f64 {
        notional * self.config.fee_rate
    }
}
