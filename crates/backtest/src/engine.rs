//! Backtest engine.
//!
//! Walks a time-ordered price series once, consults the signal provider at
//! every bar, holds at most one long position and derives the performance
//! report from the resulting equity curve.

use galaxy_core::{validate_series, Action, Error, PriceBar, Result, SignalProvider};
use serde::{Deserialize, Serialize};

use crate::fill_model::{FillModel, FillModelConfig};
use crate::metrics::{ratio_serde, EquityPoint, MetricsCalculator, PerformanceMetrics, DEFAULT_PERIODS_PER_YEAR};
use crate::observer::{BacktestObserver, NoopObserver};
use crate::position::{ExitReason, PositionTracker, Trade};

/// Backtest configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Starting cash balance.
    pub initial_balance: f64,
    /// Fee rate charged on each fill.
    pub fee_rate: f64,
    /// Adverse price move applied to signal fills.
    pub slippage_rate: f64,
    /// Annualization constant for Sharpe and volatility.
    pub periods_per_year: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_balance: 1000.0,
            fee_rate: 0.001,
            slippage_rate: 0.0005,
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
        }
    }
}

impl BacktestConfig {
    /// Zero fee and zero slippage.
    pub fn frictionless(initial_balance: f64) -> Self {
        Self {
            initial_balance,
            fee_rate: 0.0,
            slippage_rate: 0.0,
            ..Default::default()
        }
    }

    /// Check preconditions on the run parameters.
    pub fn validate(&self) -> Result<()> {
        if !(self.initial_balance.is_finite() && self.initial_balance > 0.0) {
            return Err(Error::invalid_input(format!(
                "initial_balance must be positive, got {}",
                self.initial_balance
            )));
        }
        if !(self.fee_rate.is_finite() && self.fee_rate >= 0.0) {
            return Err(Error::invalid_input(format!(
                "fee_rate must be non-negative, got {}",
                self.fee_rate
            )));
        }
        if !(self.slippage_rate.is_finite() && self.slippage_rate >= 0.0) {
            return Err(Error::invalid_input(format!(
                "slippage_rate must be non-negative, got {}",
                self.slippage_rate
            )));
        }
        if !(self.periods_per_year.is_finite() && self.periods_per_year > 0.0) {
            return Err(Error::invalid_input(format!(
                "periods_per_year must be positive, got {}",
                self.periods_per_year
            )));
        }
        Ok(())
    }
}

impl From<&galaxy_core::config::BacktestConfig> for BacktestConfig {
    fn from(config: &galaxy_core::config::BacktestConfig) -> Self {
        Self {
            initial_balance: config.initial_balance,
            fee_rate: config.fee_rate,
            slippage_rate: config.slippage_rate,
            periods_per_year: config.periods_per_year,
        }
    }
}

/// Full backtest result. Created once at the end of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub total_return: f64,
    pub volatility: f64,
    #[serde(with = "ratio_serde")]
    pub calmar_ratio: f64,
    /// Starting cash balance of the run.
    pub initial_balance: f64,
    /// Closed trades in exit order.
    pub trades: Vec<Trade>,
    /// One point per input bar, same order.
    pub equity_curve: Vec<EquityPoint>,
}

impl BacktestResult {
    fn new(
        metrics: PerformanceMetrics,
        initial_balance: f64,
        trades: Vec<Trade>,
        equity_curve: Vec<EquityPoint>,
    ) -> Self {
        Self {
            sharpe: metrics.sharpe,
            max_drawdown: metrics.max_drawdown,
            win_rate: metrics.win_rate,
            total_return: metrics.total_return,
            volatility: metrics.volatility,
            calmar_ratio: metrics.calmar_ratio,
            initial_balance,
            trades,
            equity_curve,
        }
    }

    /// The six summary statistics.
    pub fn metrics(&self) -> PerformanceMetrics {
        PerformanceMetrics {
            sharpe: self.sharpe,
            max_drawdown: self.max_drawdown,
            win_rate: self.win_rate,
            total_return: self.total_return,
            volatility: self.volatility,
            calmar_ratio: self.calmar_ratio,
        }
    }

    /// Equity after the last bar.
    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.initial_balance)
    }

    /// Number of closed trades.
    pub fn total_trades(&self) -> usize {
        self.trades.len()
    }
}

/// Event-driven, single-position backtest engine.
///
/// A run is a pure function of its inputs: no I/O, no shared state. The
/// provider only ever sees `bars[..=i]` at step `i`.
#[derive(Debug, Clone)]
pub struct BacktestEngine {
    config: BacktestConfig,
    fill_model: FillModel,
}

impl BacktestEngine {
    /// Create a new engine.
    pub fn new(config: BacktestConfig) -> Self {
        let fill_model = FillModel::new(FillModelConfig {
            fee_rate: config.fee_rate,
            slippage_rate: config.slippage_rate,
        });
        Self { config, fill_model }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run a full backtest.
    pub fn run<P>(&self, bars: &[PriceBar], provider: &P, sentiment_score: f64) -> Result<BacktestResult>
    where
        P: SignalProvider + ?Sized,
    {
        self.run_with_observer(bars, provider, sentiment_score, &mut NoopObserver)
    }

    /// Run a full backtest, reporting steps and trades to `observer`.
    pub fn run_with_observer<P>(
        &self,
        bars: &[PriceBar],
        provider: &P,
        sentiment_score: f64,
        observer: &mut dyn BacktestObserver,
    ) -> Result<BacktestResult>
    where
        P: SignalProvider + ?Sized,
    {
        self.config.validate()?;
        validate_series(bars)?;
        if let Some(bad) = bars.iter().find(|b| !(b.close.is_finite() && b.close > 0.0)) {
            return Err(Error::invalid_input(format!(
                "close price must be positive and finite, got {} at {}",
                bad.close, bad.ts_ms
            )));
        }

        let mut tracker = PositionTracker::new(self.config.initial_balance);
        let mut equity_curve = Vec::with_capacity(bars.len());

        for (i, bar) in bars.iter().enumerate() {
            let signal = provider.generate(&bars[..=i], sentiment_score)?;

            match signal.action {
                // A wiped-out account cannot size a long
                Action::Buy if !tracker.has_position() && tracker.cash > 0.0 => {
                    let fill = self.fill_model.buy(bar.ts_ms, bar.close, tracker.cash);
                    tracker.open_position(&fill);
                }
                Action::Sell if tracker.has_position() => {
                    let fill = self.fill_model.sell(bar.ts_ms, bar.close, tracker.quantity());
                    if let Some(trade) = tracker.close_position(&fill, ExitReason::Signal) {
                        observer.on_trade(trade);
                    }
                }
                _ => {}
            }

            let point = EquityPoint {
                ts_ms: bar.ts_ms,
                equity: tracker.equity(bar.close),
            };
            observer.on_step(i, bar, &signal, &point);
            equity_curve.push(point);
        }

        // Liquidate anything still open at the last close
        if let (true, Some(last)) = (tracker.has_position(), bars.last()) {
            let fill = self.fill_model.liquidate(last.ts_ms, last.close, tracker.quantity());
            if let Some(trade) = tracker.close_position(&fill, ExitReason::EndOfData) {
                observer.on_trade(trade);
            }
            if let Some(point) = equity_curve.last_mut() {
                point.equity = tracker.cash;
            }
        }

        let trades = tracker.into_trades();
        let metrics = MetricsCalculator::new(self.config.initial_balance, self.config.periods_per_year)
            .calculate(&equity_curve, &trades);

        Ok(BacktestResult::new(
            metrics,
            self.config.initial_balance,
            trades,
            equity_curve,
        ))
    }
}

impl Default for BacktestEngine {
    fn default() -> Self {
        Self::new(BacktestConfig::default())
    }
}
