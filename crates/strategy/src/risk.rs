//! Position sizing and protective price levels.

use galaxy_core::config::RiskConfig;
use galaxy_core::{Error, Result};
use serde::Serialize;

/// Suggested order parameters for a long entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrderPlan {
    pub quantity: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

/// Risk manager.
#[derive(Debug, Clone)]
pub struct RiskManager {
    config: RiskConfig,
}

impl RiskManager {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Quantity to buy: `balance * max_position_size / price`.
    pub fn position_size(&self, balance: f64, price: f64) -> Result<f64> {
        if !(price.is_finite() && price > 0.0) {
            return Err(Error::invalid_input(format!("price must be positive, got {price}")));
        }
        Ok(balance * self.config.max_position_size / price)
    }

    pub fn stop_loss_price(&self, entry: f64) -> f64 {
        entry * (1.0 - self.config.stop_loss)
    }

    pub fn take_profit_price(&self, entry: f64) -> f64 {
        entry * (1.0 + self.config.take_profit)
    }

    /// Size and protective levels for entering at `price`.
    pub fn plan(&self, balance: f64, price: f64) -> Result<OrderPlan> {
        Ok(OrderPlan {
            quantity: self.position_size(balance, price)?,
            entry_price: price,
            stop_loss: self.stop_loss_price(price),
            take_profit: self.take_profit_price(price),
        })
    }
}

impl Default for RiskManager {
    fn default() -> Self {
        Self::new(RiskConfig::default())
    }
}
