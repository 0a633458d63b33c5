//! Core data types for the galaxy-trader system.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Timestamp in milliseconds since Unix epoch (UTC).
pub type TimestampMs = i64;

/// Convert a millisecond timestamp to a UTC datetime.
#[inline]
pub fn ts_to_datetime(ts_ms: TimestampMs) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ts_ms).single()
}

/// One OHLCV sample at a fixed timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Bar open time in milliseconds.
    pub ts_ms: TimestampMs,
    /// Open price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Close price.
    pub close: f64,
    /// Traded volume.
    pub volume: f64,
}

impl PriceBar {
    /// Create a new bar.
    pub fn new(ts_ms: TimestampMs, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            ts_ms,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Create a bar where every price field equals `close`.
    pub fn from_close(ts_ms: TimestampMs, close: f64) -> Self {
        Self::new(ts_ms, close, close, close, close, 0.0)
    }

    /// Whether all numeric fields are finite.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
    }

    /// Bar time as a UTC datetime.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        ts_to_datetime(self.ts_ms)
    }
}

/// Extract close prices from a bar slice.
pub fn closes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Check that a price series is non-empty and strictly ascending by timestamp.
pub fn validate_series(bars: &[PriceBar]) -> Result<()> {
    if bars.is_empty() {
        return Err(Error::invalid_input("price series is empty"));
    }
    for (i, pair) in bars.windows(2).enumerate() {
        if pair[1].ts_ms <= pair[0].ts_ms {
            return Err(Error::invalid_input(format!(
                "price series is not strictly ascending at index {}: {} follows {}",
                i + 1,
                pair[1].ts_ms,
                pair[0].ts_ms
            )));
        }
    }
    Ok(())
}

/// Strategy decision for a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Open a long position if flat.
    Buy,
    /// Close the open position if any.
    Sell,
    /// Do nothing.
    #[default]
    Hold,
}

impl Action {
    /// Lowercase name, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Buy => "buy",
            Action::Sell => "sell",
            Action::Hold => "hold",
        }
    }

    /// Parse a signal name. Empty strings and "none" mean Hold.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "buy" => Ok(Action::Buy),
            "sell" => Ok(Action::Sell),
            "hold" | "none" | "" => Ok(Action::Hold),
            other => Err(Error::signal(format!("unknown signal: {other}"))),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A strategy signal with diagnostics.
///
/// Only `action` drives the engine; the rest is informational.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Signal {
    /// Decision for this step.
    pub action: Action,
    /// Indicator value that produced the decision, if computed.
    pub indicator: Option<f64>,
    /// Sentiment score the decision was made with.
    pub sentiment_score: Option<f64>,
}

impl Signal {
    /// Signal with no diagnostics.
    pub fn new(action: Action) -> Self {
        Self {
            action,
            indicator: None,
            sentiment_score: None,
        }
    }

    /// A Hold signal.
    pub fn hold() -> Self {
        Self::new(Action::Hold)
    }

    /// Attach an indicator value.
    pub fn with_indicator(mut self, value: f64) -> Self {
        self.indicator = Some(value);
        self
    }

    /// Attach the sentiment score.
    pub fn with_sentiment(mut self, score: f64) -> Self {
        self.sentiment_score = Some(score);
        self
    }
}

/// Side of a simulated fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillSide {
    Buy,
    Sell,
}

/// Fill information for a simulated trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    /// Timestamp of fill.
    pub ts_ms: TimestampMs,
    /// Fill price after slippage.
    pub price: f64,
    /// Filled quantity (positive).
    pub quantity: f64,
    /// Side of the fill.
    pub side: FillSide,
    /// Fee paid in quote currency (positive).
    pub fee: f64,
}

impl Fill {
    /// Notional value before fees.
    #[inline]
    pub fn notional(&self) -> f64 {
        self.price * self.quantity
    }
}
