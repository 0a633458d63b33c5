//! Signal provider capability.
//!
//! The backtest engine consults a provider once per step with the bars
//! visible up to and including that step. Implementations must be
//! deterministic for identical inputs.

use crate::error::Result;
use crate::types::{PriceBar, Signal};

/// Produces a per-step trading signal.
pub trait SignalProvider: Send + Sync {
    /// Generate the signal for the last bar of `prefix`.
    ///
    /// `prefix` always starts at the first bar of the series and ends at the
    /// current step. It is never empty when called by the engine.
    fn generate(&self, prefix: &[PriceBar], sentiment_score: f64) -> Result<Signal>;
}

impl<T: SignalProvider + ?Sized> SignalProvider for &T {
    fn generate(&self, prefix: &[PriceBar], sentiment_score: f64) -> Result<Signal> {
        (**self).generate(prefix, sentiment_score)
    }
}

impl<T: SignalProvider + ?Sized> SignalProvider for Box<T> {
    fn generate(&self, prefix: &[PriceBar], sentiment_score: f64) -> Result<Signal> {
        (**self).generate(prefix, sentiment_score)
    }
}
