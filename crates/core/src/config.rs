//! Configuration structures for the galaxy-trader system.
//!
//! Every section and field is optional in the TOML file; missing values
//! fall back to the defaults below.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration for the trading system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Signal strategy configuration.
    pub strategies: StrategyConfig,
    /// Risk management configuration.
    pub risk: RiskConfig,
    /// Exchange credentials.
    pub exchange: ExchangeConfig,
    /// LunarCrush sentiment API configuration.
    pub lunarcrush: LunarCrushConfig,
    /// Backtest configuration.
    pub backtest: BacktestConfig,
    /// Market data configuration.
    pub data: DataConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(|e| Error::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges across all sections.
    pub fn validate(&self) -> Result<()> {
        self.strategies.validate()?;
        self.risk.validate()?;
        self.backtest.validate()?;
        if self.data.limit == 0 {
            return Err(Error::config("data.limit must be positive"));
        }
        Ok(())
    }
}

/// RSI computation used by the reference strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsiMethod {
    /// Wilder smoothing seeded with a simple average.
    #[default]
    Wilder,
    /// The `ta` crate's RSI indicator.
    Ta,
}

/// Signal strategy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// RSI lookback period.
    pub rsi_period: usize,
    /// Minimum sentiment (galaxy score) required to buy.
    pub galaxy_score_threshold: f64,
    /// RSI level below which the market is oversold.
    pub oversold: f64,
    /// RSI level above which the market is overbought.
    pub overbought: f64,
    /// RSI computation.
    pub rsi_method: RsiMethod,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            galaxy_score_threshold: 70.0,
            oversold: 30.0,
            overbought: 70.0,
            rsi_method: RsiMethod::Wilder,
        }
    }
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rsi_period == 0 {
            return Err(Error::config("strategies.rsi_period must be positive"));
        }
        if self.oversold >= self.overbought {
            return Err(Error::config(format!(
                "strategies.oversold ({}) must be below strategies.overbought ({})",
                self.oversold, self.overbought
            )));
        }
        Ok(())
    }
}

/// Risk management configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Maximum position size as a fraction of balance.
    pub max_position_size: f64,
    /// Stop loss distance as a fraction of entry price.
    pub stop_loss: f64,
    /// Take profit distance as a fraction of entry price.
    pub take_profit: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_position_size: 0.05,
            stop_loss: 0.02,
            take_profit: 0.04,
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.max_position_size > 0.0 && self.max_position_size <= 1.0) {
            return Err(Error::config("risk.max_position_size must be in (0, 1]"));
        }
        if !(0.0..1.0).contains(&self.stop_loss) {
            return Err(Error::config("risk.stop_loss must be in [0, 1)"));
        }
        if self.take_profit < 0.0 {
            return Err(Error::config("risk.take_profit must be non-negative"));
        }
        Ok(())
    }
}

/// Exchange credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub api_key: String,
    pub secret: String,
    /// Use the exchange sandbox.
    pub sandbox: bool,
}

/// LunarCrush API configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LunarCrushConfig {
    pub api_key: String,
}

/// Backtest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Starting cash balance.
    pub initial_balance: f64,
    /// Fee rate charged on each fill (0.001 = 10 bps).
    pub fee_rate: f64,
    /// Adverse price move applied to fills (0.0005 = 5 bps).
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
            periods_per_year: 252.0,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.initial_balance.is_finite() && self.initial_balance > 0.0) {
            return Err(Error::config("backtest.initial_balance must be positive"));
        }
        if !(self.fee_rate.is_finite() && self.fee_rate >= 0.0) {
            return Err(Error::config("backtest.fee_rate must be non-negative"));
        }
        if !(self.slippage_rate.is_finite() && self.slippage_rate >= 0.0) {
            return Err(Error::config("backtest.slippage_rate must be non-negative"));
        }
        if !(self.periods_per_year.is_finite() && self.periods_per_year > 0.0) {
            return Err(Error::config("backtest.periods_per_year must be positive"));
        }
        Ok(())
    }
}

/// Market data configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Market symbol (e.g., "BTC_USDT").
    pub symbol: String,
    /// Bar timeframe (e.g., "1h").
    pub timeframe: String,
    /// Maximum bars per API request.
    pub limit: u32,
    /// Directory holding cached bar tables.
    pub cache_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            symbol: "BTC_USDT".to_string(),
            timeframe: "1h".to_string(),
            limit: 1000,
            cache_dir: PathBuf::from("./data_cache"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.strategies.rsi_period, 14);
        assert_eq!(config.strategies.galaxy_score_threshold, 70.0);
        assert_eq!(config.risk.max_position_size, 0.05);
        assert_eq!(config.backtest.periods_per_year, 252.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::from_toml_str(
            r#"
            [exchange]
            api_key = "key"

            [strategies]
            rsi_period = 7
            "#,
        )
        .unwrap();

        assert_eq!(config.exchange.api_key, "key");
        assert!(!config.exchange.sandbox);
        assert_eq!(config.strategies.rsi_period, 7);
        // Untouched fields keep defaults
        assert_eq!(config.strategies.overbought, 70.0);
        assert_eq!(config.data.symbol, "BTC_USDT");
    }

    #[test]
    fn test_rsi_method_lowercase() {
        let config = Config::from_toml_str("[strategies]\nrsi_method = \"ta\"\n").unwrap();
        assert_eq!(config.strategies.rsi_method, RsiMethod::Ta);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            Config::from_toml_str("[backtest]\nfee_rate = -0.1\n"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[strategies]\nrsi_period = 0\n"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[strategies]\noversold = 80.0\n"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            Config::from_toml_str("[exchange\napi_key = 1"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[exchange]\napi_key = \"key\"\nsecret = \"s\"\nsandbox = true").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.exchange.api_key, "key");
        assert!(config.exchange.sandbox);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Config::from_file("/nonexistent/galaxy.toml"),
            Err(Error::Io(_))
        ));
    }
}
