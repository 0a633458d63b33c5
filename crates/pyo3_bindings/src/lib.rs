//! PyO3 bindings for galaxy-trader Rust components.
//!
//! Exposes the Rust implementations to Python:
//! - Price bars and trade records
//! - The RSI + sentiment strategy
//! - The backtest engine (precomputed signals or the RSI strategy)

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use galaxy_backtest::{
    BacktestConfig, BacktestEngine, BacktestResult as RustBacktestResult, ExitReason,
    ScriptedProvider, Trade as RustTrade,
};
use galaxy_core::config::{RsiMethod, StrategyConfig};
use galaxy_core::{Error as RustError, PriceBar as RustPriceBar, SignalProvider};
use galaxy_strategy::RsiSentimentStrategy;

fn to_py_err(e: RustError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

// ============================================================================
// Python-exposed Types
// ============================================================================

/// One OHLCV bar.
#[pyclass]
#[derive(Clone)]
pub struct PriceBar {
    #[pyo3(get, set)]
    pub ts_ms: i64,
    #[pyo3(get, set)]
    pub open: f64,
    #[pyo3(get, set)]
    pub high: f64,
    #[pyo3(get, set)]
    pub low: f64,
    #[pyo3(get, set)]
    pub close: f64,
    #[pyo3(get, set)]
    pub volume: f64,
}

#[pymethods]
impl PriceBar {
    #[new]
    #[pyo3(signature = (ts_ms, open, high, low, close, volume=0.0))]
    fn new(ts_ms: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        PriceBar { ts_ms, open, high, low, close, volume }
    }

    fn __repr__(&self) -> String {
        format!(
            "PriceBar(ts_ms={}, o={:.4}, h={:.4}, l={:.4}, c={:.4}, v={:.2})",
            self.ts_ms, self.open, self.high, self.low, self.close, self.volume
        )
    }
}

impl From<PriceBar> for RustPriceBar {
    fn from(b: PriceBar) -> Self {
        RustPriceBar::new(b.ts_ms, b.open, b.high, b.low, b.close, b.volume)
    }
}

impl From<RustPriceBar> for PriceBar {
    fn from(b: RustPriceBar) -> Self {
        PriceBar {
            ts_ms: b.ts_ms,
            open: b.open,
            high: b.high,
            low: b.low,
            close: b.close,
            volume: b.volume,
        }
    }
}

/// A closed trade.
#[pyclass]
#[derive(Clone)]
pub struct Trade {
    #[pyo3(get)]
    pub entry_time: i64,
    #[pyo3(get)]
    pub exit_time: i64,
    #[pyo3(get)]
    pub entry_price: f64,
    #[pyo3(get)]
    pub exit_price: f64,
    #[pyo3(get)]
    pub profit_pct: f64,
    #[pyo3(get)]
    pub quantity: f64,
    /// "signal" or "end_of_data".
    #[pyo3(get)]
    pub exit_reason: String,
}

#[pymethods]
impl Trade {
    fn __repr__(&self) -> String {
        format!(
            "Trade(entry={}@{:.4}, exit={}@{:.4}, profit_pct={:.4})",
            self.entry_time, self.entry_price, self.exit_time, self.exit_price, self.profit_pct
        )
    }
}

impl From<&RustTrade> for Trade {
    fn from(t: &RustTrade) -> Self {
        Trade {
            entry_time: t.entry_time,
            exit_time: t.exit_time,
            entry_price: t.entry_price,
            exit_price: t.exit_price,
            profit_pct: t.profit_pct,
            quantity: t.quantity,
            exit_reason: match t.exit_reason {
                ExitReason::Signal => "signal",
                ExitReason::EndOfData => "end_of_data",
            }
            .to_string(),
        }
    }
}

/// Backtest report.
#[pyclass]
pub struct BacktestResult {
    inner: RustBacktestResult,
}

#[pymethods]
impl BacktestResult {
    #[getter]
    fn sharpe(&self) -> f64 {
        self.inner.sharpe
    }

    #[getter]
    fn max_drawdown(&self) -> f64 {
        self.inner.max_drawdown
    }

    #[getter]
    fn win_rate(&self) -> f64 {
        self.inner.win_rate
    }

    #[getter]
    fn total_return(&self) -> f64 {
        self.inner.total_return
    }

    #[getter]
    fn volatility(&self) -> f64 {
        self.inner.volatility
    }

    #[getter]
    fn calmar_ratio(&self) -> f64 {
        self.inner.calmar_ratio
    }

    #[getter]
    fn final_equity(&self) -> f64 {
        self.inner.final_equity()
    }

    #[getter]
    fn trades(&self) -> Vec<Trade> {
        self.inner.trades.iter().map(Trade::from).collect()
    }

    /// Equity curve as `(ts_ms, equity)` pairs.
    #[getter]
    fn equity_curve(&self) -> Vec<(i64, f64)> {
        self.inner
            .equity_curve
            .iter()
            .map(|p| (p.ts_ms, p.equity))
            .collect()
    }

    /// Serialize the full report to JSON.
    fn to_json(&self) -> PyResult<String> {
        serde_json::to_string(&self.inner).map_err(|e| PyValueError::new_err(e.to_string()))
    }

    fn __repr__(&self) -> String {
        format!(
            "BacktestResult(trades={}, total_return={:.4}, sharpe={:.4}, max_drawdown={:.4})",
            self.inner.total_trades(),
            self.inner.total_return,
            self.inner.sharpe,
            self.inner.max_drawdown
        )
    }
}

// ============================================================================
// Strategy and Engine
// ============================================================================

/// RSI + sentiment strategy.
#[pyclass]
pub struct RsiStrategy {
    inner: RsiSentimentStrategy,
}

#[pymethods]
impl RsiStrategy {
    #[new]
    #[pyo3(signature = (rsi_period=14, galaxy_score_threshold=70.0, oversold=30.0, overbought=70.0, method="wilder"))]
    fn new(
        rsi_period: usize,
        galaxy_score_threshold: f64,
        oversold: f64,
        overbought: f64,
        method: &str,
    ) -> PyResult<Self> {
        let rsi_method = match method {
            "wilder" => RsiMethod::Wilder,
            "ta" => RsiMethod::Ta,
            other => {
                return Err(PyValueError::new_err(format!("unknown RSI method: {other}")));
            }
        };
        let config = StrategyConfig {
            rsi_period,
            galaxy_score_threshold,
            oversold,
            overbought,
            rsi_method,
        };
        let inner = RsiSentimentStrategy::new(config).map_err(to_py_err)?;
        Ok(RsiStrategy { inner })
    }

    /// Signal for the last bar: "buy", "sell" or "hold".
    fn generate(&self, bars: Vec<PriceBar>, sentiment_score: f64) -> PyResult<String> {
        let bars = to_rust_bars(bars);
        let signal = self.inner.generate(&bars, sentiment_score).map_err(to_py_err)?;
        Ok(signal.action.as_str().to_string())
    }

    /// RSI of the last bar, if enough history.
    fn rsi(&self, bars: Vec<PriceBar>) -> Option<f64> {
        self.inner.rsi(&to_rust_bars(bars))
    }
}

fn to_rust_bars(bars: Vec<PriceBar>) -> Vec<RustPriceBar> {
    bars.into_iter().map(RustPriceBar::from).collect()
}

fn engine(
    initial_balance: f64,
    fee_rate: f64,
    slippage_rate: f64,
    periods_per_year: f64,
) -> BacktestEngine {
    BacktestEngine::new(BacktestConfig {
        initial_balance,
        fee_rate,
        slippage_rate,
        periods_per_year,
    })
}

/// Backtest precomputed signals ("buy", "sell", "hold" or "", one per bar).
///
/// Raises `ValueError` when `signals` and `bars` differ in length.
#[pyfunction]
#[pyo3(signature = (bars, signals, initial_balance=1000.0, fee_rate=0.001, slippage_rate=0.0005, periods_per_year=252.0))]
fn run_backtest(
    bars: Vec<PriceBar>,
    signals: Vec<String>,
    initial_balance: f64,
    fee_rate: f64,
    slippage_rate: f64,
    periods_per_year: f64,
) -> PyResult<BacktestResult> {
    let provider = ScriptedProvider::aligned(&signals, bars.len()).map_err(to_py_err)?;
    let inner = engine(initial_balance, fee_rate, slippage_rate, periods_per_year)
        .run(&to_rust_bars(bars), &provider, 0.0)
        .map_err(to_py_err)?;
    Ok(BacktestResult { inner })
}

/// Backtest the RSI + sentiment strategy.
#[pyfunction]
#[pyo3(signature = (bars, strategy, sentiment_score, initial_balance=1000.0, fee_rate=0.001, slippage_rate=0.0005, periods_per_year=252.0))]
fn run_rsi_backtest(
    bars: Vec<PriceBar>,
    strategy: &RsiStrategy,
    sentiment_score: f64,
    initial_balance: f64,
    fee_rate: f64,
    slippage_rate: f64,
    periods_per_year: f64,
) -> PyResult<BacktestResult> {
    let inner = engine(initial_balance, fee_rate, slippage_rate, periods_per_year)
        .run(&to_rust_bars(bars), &strategy.inner, sentiment_score)
        .map_err(to_py_err)?;
    Ok(BacktestResult { inner })
}

// ============================================================================
// Module Definition
// ============================================================================

/// Galaxy Trader Core - Rust backtesting components for Python.
#[pymodule]
fn galaxy_trader_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Types
    m.add_class::<PriceBar>()?;
    m.add_class::<Trade>()?;
    m.add_class::<BacktestResult>()?;

    // Strategy
    m.add_class::<RsiStrategy>()?;

    // Engine
    m.add_function(wrap_pyfunction!(run_backtest, m)?)?;
    m.add_function(wrap_pyfunction!(run_rsi_backtest, m)?)?;

    Ok(())
}
