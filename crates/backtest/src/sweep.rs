//! Parallel parameter sweeps.
//!
//! Each configuration gets its own strategy and its own engine run; runs
//! share nothing but the read-only price series.

use galaxy_core::config::StrategyConfig;
use galaxy_core::{PriceBar, Result};
use galaxy_strategy::RsiSentimentStrategy;
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::engine::{BacktestEngine, BacktestResult};

/// Result of one sweep configuration.
#[derive(Debug, Clone, Serialize)]
pub struct SweepOutcome {
    pub config: StrategyConfig,
    pub result: BacktestResult,
}

/// Run one backtest per strategy configuration, in parallel.
///
/// Results keep the order of `configs`. The first failing run aborts the
/// sweep.
pub fn run_sweep(
    engine: &BacktestEngine,
    bars: &[PriceBar],
    sentiment_score: f64,
    configs: &[StrategyConfig],
) -> Result<Vec<SweepOutcome>> {
    info!(runs = configs.len(), bars = bars.len(), "starting parameter sweep");

    let outcomes = configs
        .par_iter()
        .map(|config| -> Result<SweepOutcome> {
            let strategy = RsiSentimentStrategy::new(config.clone())?;
            let result = engine.run(bars, &strategy, sentiment_score)?;
            Ok(SweepOutcome {
                config: config.clone(),
                result,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    info!(runs = outcomes.len(), "parameter sweep complete");
    Ok(outcomes)
}

/// Cartesian product of RSI periods and sentiment thresholds over `base`.
pub fn grid(base: &StrategyConfig, rsi_periods: &[usize], thresholds: &[f64]) -> Vec<StrategyConfig> {
    rsi_periods
        .iter()
        .flat_map(|&rsi_period| {
            thresholds.iter().map(move |&galaxy_score_threshold| StrategyConfig {
                rsi_period,
                galaxy_score_threshold,
                ..base.clone()
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BacktestConfig;
    use galaxy_core::Error;

    fn make_bars(n: usize) -> Vec<PriceBar> {
        (0..n)
            .map(|i| {
                let price = 100.0 + ((i as f64) * 0.7).sin() * 8.0;
                PriceBar::from_close(1_704_067_200_000 + i as i64 * 3_600_000, price)
            })
            .collect()
    }

    #[test]
    fn test_grid() {
        let configs = grid(&StrategyConfig::default(), &[7, 14], &[50.0, 60.0, 70.0]);
        assert_eq!(configs.len(), 6);
        assert_eq!(configs[0].rsi_period, 7);
        assert_eq!(configs[0].galaxy_score_threshold, 50.0);
        assert_eq!(configs[5].rsi_period, 14);
        assert_eq!(configs[5].galaxy_score_threshold, 70.0);
    }

    #[test]
    fn test_sweep_matches_sequential_runs() {
        let bars = make_bars(120);
        let engine = BacktestEngine::new(BacktestConfig::frictionless(1000.0));
        let configs = grid(&StrategyConfig::default(), &[5, 9, 14], &[10.0, 90.0]);

        let outcomes = run_sweep(&engine, &bars, 80.0, &configs).unwrap();
        assert_eq!(outcomes.len(), configs.len());

        for (outcome, config) in outcomes.iter().zip(&configs) {
            assert_eq!(outcome.config.rsi_period, config.rsi_period);
            let strategy = RsiSentimentStrategy::new(config.clone()).unwrap();
            let sequential = engine.run(&bars, &strategy, 80.0).unwrap();
            assert_eq!(outcome.result.trades, sequential.trades);
            assert_eq!(outcome.result.total_return, sequential.total_return);
        }
    }

    #[test]
    fn test_sweep_rejects_invalid_config() {
        let bars = make_bars(30);
        let configs = vec![StrategyConfig {
            rsi_period: 0,
            ..Default::default()
        }];
        let err = run_sweep(&BacktestEngine::default(), &bars, 80.0, &configs).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
