//! Backtest performance metrics.
//!
//! Derives risk/return statistics from the per-bar equity curve and the
//! closed trades.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::position::Trade;
use galaxy_core::TimestampMs;

/// Default annualization constant (trading days per year).
///
/// Applied regardless of the bar interval. Pass a different value through
/// `BacktestConfig::periods_per_year` for non-daily data.
pub const DEFAULT_PERIODS_PER_YEAR: f64 = 252.0;

/// Equity curve point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub ts_ms: TimestampMs,
    pub equity: f64,
}

/// Backtest performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Annualized Sharpe ratio (0 when returns have no variance).
    pub sharpe: f64,
    /// Most negative drawdown from the running peak (<= 0).
    pub max_drawdown: f64,
    /// Fraction of trades with positive profit (0-1).
    pub win_rate: f64,
    /// Final equity relative to the initial balance.
    pub total_return: f64,
    /// Annualized standard deviation of per-bar returns.
    pub volatility: f64,
    /// Total return over |max drawdown| (+inf with no drawdown).
    #[serde(with = "ratio_serde")]
    pub calmar_ratio: f64,
}

/// JSON has no infinities: non-finite ratios travel as `"inf"`, `"-inf"` or
/// `"nan"`.
pub mod ratio_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("nan")
        } else if *value > 0.0 {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(v),
            Repr::Text(s) => match s.as_str() {
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                "nan" => Ok(f64::NAN),
                other => Err(serde::de::Error::custom(format!("invalid ratio {other:?}"))),
            },
        }
    }
}

/// Metrics calculator.
pub struct MetricsCalculator {
    initial_balance: f64,
    periods_per_year: f64,
}

impl MetricsCalculator {
    /// Create a new metrics calculator.
    pub fn new(initial_balance: f64, periods_per_year: f64) -> Self {
        Self {
            initial_balance,
            periods_per_year,
        }
    }

    /// Calculate metrics from the equity curve and closed trades.
    pub fn calculate(&self, equity_curve: &[EquityPoint], trades: &[Trade]) -> PerformanceMetrics {
        let equity: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();
        let returns = compute_returns(&equity);
        let std_dev = sample_std_dev(&returns);
        let annualization = self.periods_per_year.sqrt();

        let sharpe = if std_dev > 0.0 {
            returns.iter().mean() / std_dev * annualization
        } else {
            0.0
        };

        let max_drawdown = max_drawdown(&equity);
        let total_return = match equity.last() {
            Some(last) => (last - self.initial_balance) / self.initial_balance,
            None => 0.0,
        };
        let calmar_ratio = if max_drawdown < 0.0 {
            total_return / max_drawdown.abs()
        } else {
            f64::INFINITY
        };

        PerformanceMetrics {
            sharpe,
            max_drawdown,
            win_rate: win_rate(trades),
            total_return,
            volatility: std_dev * annualization,
            calmar_ratio,
        }
    }
}

/// Simple returns with a leading zero: `r[0] = 0`, `r[i] = e[i]/e[i-1] - 1`.
///
/// A zero previous equity yields a zero return.
pub fn compute_returns(equity: &[f64]) -> Vec<f64> {
    if equity.is_empty() {
        return Vec::new();
    }
    std::iter::once(0.0)
        .chain(equity.windows(2).map(|w| {
            if w[0] == 0.0 {
                0.0
            } else {
                w[1] / w[0] - 1.0
            }
        }))
        .collect()
}

/// Sample standard deviation (n - 1). Zero for fewer than two values.
fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let std_dev = values.iter().std_dev();
    if std_dev.is_finite() {
        std_dev
    } else {
        0.0
    }
}

/// Minimum of `equity / running_max - 1`. Never positive.
pub fn max_drawdown(equity: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0f64;
    for &value in equity {
        peak = peak.max(value);
        if peak > 0.0 {
            max_dd = max_dd.min(value / peak - 1.0);
        }
    }
    max_dd
}

/// Fraction of trades with `profit_pct > 0`; 0 with no trades.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let wins = trades.iter().filter(|t| t.is_win()).count();
    wins as f64 / trades.len() as f64
}
