//! Relative strength index.
//!
//! Two computations are available: Wilder smoothing seeded with a simple
//! average (TA-Lib compatible), and the `ta` crate's indicator, which
//! smooths with an EMA and does not match TA-Lib. Both need more than
//! `period` closes before producing a value.

use ta::indicators::RelativeStrengthIndex;
use ta::Next;

/// Streaming Wilder RSI.
pub struct WilderRsi {
    /// Lookback period.
    period: usize,
    /// Previous close.
    prev_price: Option<f64>,
    /// Number of price changes seen.
    changes: usize,
    /// Smoothed (or, during warm-up, summed) gain.
    avg_gain: f64,
    /// Smoothed (or, during warm-up, summed) loss.
    avg_loss: f64,
}

impl WilderRsi {
    /// Create a new RSI calculator.
    pub fn new(period: usize) -> Self {
        Self {
            period,
            prev_price: None,
            changes: 0,
            avg_gain: 0.0,
            avg_loss: 0.0,
        }
    }

    /// Add a close price.
    ///
    /// Returns the current RSI once `period` price changes have been seen.
    pub fn add_price(&mut self, price: f64) -> Option<f64> {
        if let Some(prev) = self.prev_price {
            let change = price - prev;
            let gain = change.max(0.0);
            let loss = (-change).max(0.0);
            self.changes += 1;

            if self.changes <= self.period {
                self.avg_gain += gain;
                self.avg_loss += loss;
                if self.changes == self.period {
                    // Seed with the simple mean
                    self.avg_gain /= self.period as f64;
                    self.avg_loss /= self.period as f64;
                }
            } else {
                let n = self.period as f64;
                self.avg_gain = (self.avg_gain * (n - 1.0) + gain) / n;
                self.avg_loss = (self.avg_loss * (n - 1.0) + loss) / n;
            }
        }
        self.prev_price = Some(price);
        self.value()
    }

    /// Current RSI, if warmed up.
    pub fn value(&self) -> Option<f64> {
        if self.period == 0 || self.changes < self.period {
            return None;
        }
        let total = self.avg_gain + self.avg_loss;
        if total == 0.0 {
            // Flat series
            return Some(50.0);
        }
        Some(100.0 * self.avg_gain / total)
    }
}

/// Wilder RSI of the last close in `closes`.
///
/// `None` when `period` is zero or `closes.len() <= period`.
pub fn wilder_rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() <= period {
        return None;
    }
    let mut rsi = WilderRsi::new(period);
    closes.iter().fold(None, |_, &price| rsi.add_price(price))
}

/// RSI of the last close using `ta::indicators::RelativeStrengthIndex`.
///
/// `ta` smooths gains and losses with an EMA (`alpha = 2 / (period + 1)`)
/// rather than Wilder's `1 / period`, so values differ from [`wilder_rsi`]
/// and from TA-Lib. Same warm-up rule as [`wilder_rsi`].
pub fn ta_rsi(closes: &[f64], period: usize) -> Option<f64> {
    if closes.len() <= period {
        return None;
    }
    let mut rsi = RelativeStrengthIndex::new(period).ok()?;
    closes.iter().fold(None, |_, &price| Some(rsi.next(price)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // Wilder's worked example from "New Concepts in Technical Trading Systems"
    const CLOSES: [f64; 15] = [
        44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03, 45.61,
        46.28, 46.28,
    ];

    #[test]
    fn test_wilder_seed_value() {
        let rsi = wilder_rsi(&CLOSES, 14).unwrap();
        assert_relative_eq!(rsi, 70.46, epsilon = 0.01);
    }

    #[test]
    fn test_wilder_smoothing_step() {
        let mut closes = CLOSES.to_vec();
        closes.push(46.00);
        let rsi = wilder_rsi(&closes, 14).unwrap();

        // Manually smooth one step past the seed
        let seed_gain = 3.34 / 14.0;
        let seed_loss = 1.40 / 14.0;
        let avg_gain = seed_gain * 13.0 / 14.0;
        let avg_loss = (seed_loss * 13.0 + 0.28) / 14.0;
        let expected = 100.0 * avg_gain / (avg_gain + avg_loss);
        assert_relative_eq!(rsi, expected, epsilon = 1e-9);
        assert_relative_eq!(rsi, 66.25, epsilon = 0.01);
    }

    #[test]
    fn test_warm_up() {
        assert!(wilder_rsi(&CLOSES[..14], 14).is_none());
        assert!(wilder_rsi(&CLOSES[..15], 14).is_some());
        assert!(wilder_rsi(&CLOSES, 0).is_none());
        assert!(ta_rsi(&CLOSES[..14], 14).is_none());
    }

    #[test]
    fn test_extremes() {
        let rising: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        assert_eq!(wilder_rsi(&rising, 14), Some(100.0));

        let falling: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        assert_eq!(wilder_rsi(&falling, 14), Some(0.0));

        let flat = vec![100.0; 20];
        assert_eq!(wilder_rsi(&flat, 14), Some(50.0));
    }

    #[test]
    fn test_streaming_matches_batch() {
        let mut rsi = WilderRsi::new(5);
        let mut last = None;
        for (i, &price) in CLOSES.iter().enumerate() {
            last = rsi.add_price(price);
            if i >= 5 {
                assert_eq!(last, wilder_rsi(&CLOSES[..=i], 5));
            } else {
                assert!(last.is_none());
            }
        }
        assert!(last.is_some());
    }

    #[test]
    fn test_ta_rsi_bounds() {
        let rsi = ta_rsi(&CLOSES, 14).unwrap();
        assert!((0.0..=100.0).contains(&rsi));
        // Same direction as Wilder on a mostly rising series
        assert!(rsi > 50.0);
        // EMA smoothing, not Wilder's
        assert!((rsi - wilder_rsi(&CLOSES, 14).unwrap()).abs() > 1e-6);
    }
}
