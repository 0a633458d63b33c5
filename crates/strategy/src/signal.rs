//! RSI + sentiment signal provider.

use galaxy_core::config::{RsiMethod, StrategyConfig};
use galaxy_core::{closes, Action, PriceBar, Result, Signal, SignalProvider};

use crate::rsi::{ta_rsi, wilder_rsi};

/// Buys oversold markets with strong sentiment, sells overbought ones.
///
/// - `rsi < oversold && sentiment > threshold` => Buy
/// - `rsi > overbought` => Sell
/// - otherwise Hold
///
/// Too little history to compute the RSI is a Hold with no indicator.
#[derive(Debug, Clone)]
pub struct RsiSentimentStrategy {
    config: StrategyConfig,
}

impl RsiSentimentStrategy {
    /// Create a strategy. Fails with a config error on invalid parameters.
    pub fn new(config: StrategyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// RSI of the last close in `prefix`.
    pub fn rsi(&self, prefix: &[PriceBar]) -> Option<f64> {
        let closes = closes(prefix);
        match self.config.rsi_method {
            RsiMethod::Wilder => wilder_rsi(&closes, self.config.rsi_period),
            RsiMethod::Ta => ta_rsi(&closes, self.config.rsi_period),
        }
    }

    /// Map an RSI value and sentiment score to an action.
    pub fn decide(&self, rsi: f64, sentiment_score: f64) -> Action {
        if rsi < self.config.oversold && sentiment_score > self.config.galaxy_score_threshold {
            Action::Buy
        } else if rsi > self.config.overbought {
            Action::Sell
        } else {
            Action::Hold
        }
    }
}

impl SignalProvider for RsiSentimentStrategy {
    fn generate(&self, prefix: &[PriceBar], sentiment_score: f64) -> Result<Signal> {
        let signal = match self.rsi(prefix) {
            Some(rsi) => Signal::new(self.decide(rsi, sentiment_score)).with_indicator(rsi),
            None => Signal::hold(),
        };
        Ok(signal.with_sentiment(sentiment_score))
    }
}
