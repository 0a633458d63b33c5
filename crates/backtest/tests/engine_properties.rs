//! Engine-level properties checked across the backtest and strategy crates.

use std::sync::Mutex;

use approx::assert_relative_eq;
use galaxy_backtest::{BacktestConfig, BacktestEngine, ExitReason, ScriptedProvider};
use galaxy_core::config::StrategyConfig;
use galaxy_core::{Action, PriceBar, Result, Signal, SignalProvider};
use galaxy_strategy::RsiSentimentStrategy;

const HOUR_MS: i64 = 3_600_000;

fn wave_bars(n: usize) -> Vec<PriceBar> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            let close = 100.0 + (t * 0.12).sin() * 20.0 + (t * 0.05).cos() * 4.0;
            PriceBar::new(
                1_704_067_200_000 + i as i64 * HOUR_MS,
                close,
                close + 0.5,
                close - 0.5,
                close,
                10.0,
            )
        })
        .collect()
}

/// Pseudo-random but reproducible action script.
fn action_script(n: usize, seed: u64) -> Vec<Action> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
            match (state >> 33) % 4 {
                0 => Action::Buy,
                1 => Action::Sell,
                _ => Action::Hold,
            }
        })
        .collect()
}

/// Records the prefix length handed to it at every call.
struct PrefixRecorder {
    seen: Mutex<Vec<(usize, i64)>>,
}

impl SignalProvider for PrefixRecorder {
    fn generate(&self, prefix: &[PriceBar], _sentiment_score: f64) -> Result<Signal> {
        let last_ts = prefix.last().map(|b| b.ts_ms).unwrap_or_default();
        self.seen
            .lock()
            .map_err(|_| galaxy_core::Error::signal("poisoned"))?
            .push((prefix.len(), last_ts));
        Ok(Signal::new(if prefix.len() % 3 == 1 { Action::Buy } else { Action::Sell }))
    }
}

#[test]
fn test_provider_never_sees_future_bars() {
    let bars = wave_bars(50);
    let recorder = PrefixRecorder {
        seen: Mutex::new(Vec::new()),
    };

    BacktestEngine::default().run(&bars, &recorder, 0.0).unwrap();

    let seen = recorder.seen.into_inner().unwrap();
    assert_eq!(seen.len(), bars.len());
    for (i, (len, last_ts)) in seen.into_iter().enumerate() {
        assert_eq!(len, i + 1);
        assert_eq!(last_ts, bars[i].ts_ms);
    }
}

#[test]
fn test_every_acted_buy_has_a_trade() {
    let bars = wave_bars(80);
    for seed in 1..20 {
        let actions = action_script(bars.len(), seed);
        let provider = ScriptedProvider::new(actions.clone());
        let result = BacktestEngine::default().run(&bars, &provider, 0.0).unwrap();

        // Replay the state machine to count buys that opened a position
        let mut open = false;
        let mut acted_buys = 0;
        for action in &actions {
            match action {
                Action::Buy if !open => {
                    open = true;
                    acted_buys += 1;
                }
                Action::Sell if open => open = false,
                _ => {}
            }
        }

        assert_eq!(result.trades.len(), acted_buys, "seed {seed}");
        if open {
            let last = result.trades.last().unwrap();
            assert_eq!(last.exit_reason, ExitReason::EndOfData);
            assert_eq!(last.exit_price, bars.last().unwrap().close);
        }
    }
}

#[test]
fn test_metric_bounds_hold_for_many_scripts() {
    let bars = wave_bars(120);
    for seed in 1..30 {
        let provider = ScriptedProvider::new(action_script(bars.len(), seed));
        let result = BacktestEngine::default().run(&bars, &provider, 0.0).unwrap();

        assert!((0.0..=1.0).contains(&result.win_rate), "seed {seed}");
        assert!(result.max_drawdown <= 0.0, "seed {seed}");
        assert_eq!(result.equity_curve.len(), bars.len());
        for (point, bar) in result.equity_curve.iter().zip(&bars) {
            assert_eq!(point.ts_ms, bar.ts_ms);
        }
    }
}

#[test]
fn test_profit_pct_and_flat_equity_without_costs() {
    let bars = wave_bars(60);
    let provider = ScriptedProvider::new(action_script(bars.len(), 7));
    let engine = BacktestEngine::new(BacktestConfig::frictionless(1000.0));
    let result = engine.run(&bars, &provider, 0.0).unwrap();

    assert!(!result.trades.is_empty());
    for trade in &result.trades {
        assert_eq!(
            trade.profit_pct,
            (trade.exit_price - trade.entry_price) / trade.entry_price
        );
    }

    // Compounding realized returns reproduces the final equity
    let compounded = result
        .trades
        .iter()
        .fold(1000.0, |equity, t| equity * (1.0 + t.profit_pct));
    assert_relative_eq!(result.final_equity(), compounded, max_relative = 1e-9);
}

#[test]
fn test_literal_scenario() {
    let closes = [100.0, 105.0, 110.0, 108.0, 120.0];
    let bars: Vec<PriceBar> = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PriceBar::from_close(1_704_067_200_000 + i as i64 * 86_400_000, c))
        .collect();
    let provider = ScriptedProvider::from_names(&["buy", "hold", "sell", "buy", "sell"]).unwrap();

    let result = BacktestEngine::new(BacktestConfig::frictionless(1000.0))
        .run(&bars, &provider, 0.0)
        .unwrap();

    assert_eq!(result.total_trades(), 2);
    assert_eq!(result.trades[0].entry_price, 100.0);
    assert_eq!(result.trades[0].exit_price, 110.0);
    assert_relative_eq!(result.trades[0].profit_pct, 0.10, epsilon = 1e-12);
    assert!(result.total_return != 0.0);
    assert_eq!(result.win_rate, 1.0);
}

#[test]
fn test_rsi_strategy_run_is_reproducible() {
    let bars = wave_bars(300);
    let strategy = RsiSentimentStrategy::new(StrategyConfig::default()).unwrap();
    let engine = BacktestEngine::default();

    let first = engine.run(&bars, &strategy, 85.0).unwrap();
    let second = engine.run(&bars, &strategy, 85.0).unwrap();

    assert!(!first.trades.is_empty());
    assert_eq!(first.trades, second.trades);
    assert_eq!(first.equity_curve, second.equity_curve);
    // First RSI value needs period + 1 closes, so no entry before that
    assert!(first.trades[0].entry_time >= bars[14].ts_ms);
}

#[test]
fn test_low_sentiment_never_buys() {
    let bars = wave_bars(300);
    let strategy = RsiSentimentStrategy::new(StrategyConfig::default()).unwrap();
    let result = BacktestEngine::default().run(&bars, &strategy, 10.0).unwrap();

    assert!(result.trades.is_empty());
    assert_eq!(result.final_equity(), 1000.0);
}

#[test]
fn test_result_serializes() {
    let bars = wave_bars(40);
    let provider = ScriptedProvider::new(action_script(bars.len(), 3));
    let result = BacktestEngine::default().run(&bars, &provider, 0.0).unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert!(json["trades"].is_array());
    assert_eq!(json["equity_curve"].as_array().unwrap().len(), bars.len());
}

#[test]
fn test_infinite_calmar_round_trips() {
    let bars: Vec<PriceBar> = [100.0, 110.0, 120.0]
        .iter()
        .enumerate()
        .map(|(i, &c)| PriceBar::from_close(1_704_067_200_000 + i as i64 * HOUR_MS, c))
        .collect();
    let provider = ScriptedProvider::new(vec![Action::Buy, Action::Hold, Action::Sell]);
    let result = BacktestEngine::new(BacktestConfig::frictionless(1000.0))
        .run(&bars, &provider, 0.0)
        .unwrap();
    assert_eq!(result.calmar_ratio, f64::INFINITY);

    let json = serde_json::to_string(&result).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["calmar_ratio"], "inf");

    let back: galaxy_backtest::BacktestResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back.calmar_ratio, f64::INFINITY);
    assert_eq!(back.trades, result.trades);
    assert_eq!(back.metrics().calmar_ratio, f64::INFINITY);

    let metrics: galaxy_backtest::PerformanceMetrics =
        serde_json::from_str(&serde_json::to_string(&result.metrics()).unwrap()).unwrap();
    assert_eq!(metrics.calmar_ratio, f64::INFINITY);
    assert_relative_eq!(metrics.total_return, 0.2, epsilon = 1e-12);
}
