use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use galaxy_backtest::sweep::{grid, run_sweep};
use galaxy_backtest::{BacktestConfig, BacktestEngine, SweepOutcome, TracingObserver};
use galaxy_core::{Config, PriceBar, SignalProvider, TimestampMs};
use galaxy_ingestion::{base_asset, DataCollector, HistoricalDataManager, OhlcvRequest, Timeframe, WhitebitClient};
use galaxy_strategy::{RiskManager, RsiSentimentStrategy};
use serde_json::json;
use tracing::{info, warn};

/// Market data selection shared by every subcommand. Unset values fall
/// back to the `[data]` config section.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct DataArgs {
    /// Market symbol, e.g. BTC_USDT.
    #[arg(long)]
    pub symbol: Option<String>,
    /// Bar timeframe, e.g. 1h.
    #[arg(long)]
    pub timeframe: Option<String>,
    /// Range start (RFC 3339 or YYYY-MM-DD).
    #[arg(long)]
    pub start: Option<String>,
    /// Range end (RFC 3339 or YYYY-MM-DD); defaults to now.
    #[arg(long)]
    pub end: Option<String>,
    /// Maximum bars per API request.
    #[arg(long)]
    pub limit: Option<u32>,
    /// Cache directory.
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

pub enum Command {
    Fetch {
        data: DataArgs,
    },
    Backtest {
        data: DataArgs,
        sentiment: Option<f64>,
        out: Option<PathBuf>,
        trace: bool,
    },
    Sweep {
        data: DataArgs,
        sentiment: Option<f64>,
        rsi_periods: Vec<usize>,
        thresholds: Vec<f64>,
    },
    Signal {
        data: DataArgs,
        sentiment: Option<f64>,
        balance: f64,
    },
}

pub async fn run(command: Command, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    match command {
        Command::Fetch { data } => run_fetch(&config, &data).await,
        Command::Backtest {
            data,
            sentiment,
            out,
            trace,
        } => run_backtest(&config, &data, sentiment, out, trace).await,
        Command::Sweep {
            data,
            sentiment,
            rsi_periods,
            thresholds,
        } => run_sweep_command(&config, &data, sentiment, &rsi_periods, &thresholds).await,
        Command::Signal {
            data,
            sentiment,
            balance,
        } => run_signal(&config, &data, sentiment, balance).await,
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(Config::default()),
    }
}

async fn run_fetch(config: &Config, data: &DataArgs) -> Result<()> {
    let request = build_request(config, data)?;
    let bars = load_bars(&request).await?;

    match (bars.first(), bars.last()) {
        (Some(first), Some(last)) => println!(
            "{} {}: {} bars from {} to {}",
            request.symbol,
            request.timeframe,
            bars.len(),
            format_ts(first.ts_ms),
            format_ts(last.ts_ms)
        ),
        _ => println!("{} {}: no bars", request.symbol, request.timeframe),
    }
    Ok(())
}

async fn run_backtest(
    config: &Config,
    data: &DataArgs,
    sentiment: Option<f64>,
    out: Option<PathBuf>,
    trace: bool,
) -> Result<()> {
    let request = build_request(config, data)?;
    let bars = require_bars(&request).await?;
    let sentiment = resolve_sentiment(config, &request.symbol, sentiment).await?;

    let strategy = RsiSentimentStrategy::new(config.strategies.clone())?;
    let engine = BacktestEngine::new(BacktestConfig::from(&config.backtest));
    let result = if trace {
        engine.run_with_observer(&bars, &strategy, sentiment, &mut TracingObserver)?
    } else {
        engine.run(&bars, &strategy, sentiment)?
    };

    info!(
        symbol = %request.symbol,
        trades = result.total_trades(),
        total_return = result.total_return,
        sharpe = result.sharpe,
        "backtest complete"
    );

    let body = serde_json::to_string_pretty(&result)?;
    match out {
        Some(path) => {
            std::fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;
            println!("wrote backtest result to {}", path.display());
        }
        None => println!("{body}"),
    }
    Ok(())
}

async fn run_sweep_command(
    config: &Config,
    data: &DataArgs,
    sentiment: Option<f64>,
    rsi_periods: &[usize],
    thresholds: &[f64],
) -> Result<()> {
    let request = build_request(config, data)?;
    let bars = require_bars(&request).await?;
    let sentiment = resolve_sentiment(config, &request.symbol, sentiment).await?;

    let rsi_periods = if rsi_periods.is_empty() {
        vec![config.strategies.rsi_period]
    } else {
        rsi_periods.to_vec()
    };
    let thresholds = if thresholds.is_empty() {
        vec![config.strategies.galaxy_score_threshold]
    } else {
        thresholds.to_vec()
    };

    let configs = grid(&config.strategies, &rsi_periods, &thresholds);
    let engine = BacktestEngine::new(BacktestConfig::from(&config.backtest));

    // CPU-bound; keep it off the async workers
    let outcomes = tokio::task::spawn_blocking(move || run_sweep(&engine, &bars, sentiment, &configs))
        .await
        .context("sweep worker panicked")??;

    for outcome in outcomes {
        let line = sweep_line(&outcome)?;
        println!("{line}");
    }
    Ok(())
}

/// One JSON object per sweep run: parameters, trade count and the metrics.
fn sweep_line(outcome: &SweepOutcome) -> Result<serde_json::Value> {
    let mut line = serde_json::to_value(outcome.result.metrics())?;
    line["rsi_period"] = json!(outcome.config.rsi_period);
    line["galaxy_score_threshold"] = json!(outcome.config.galaxy_score_threshold);
    line["trades"] = json!(outcome.result.total_trades());
    Ok(line)
}

async fn run_signal(config: &Config, data: &DataArgs, sentiment: Option<f64>, balance: f64) -> Result<()> {
    let request = build_request(config, data)?;
    let bars = require_bars(&request).await?;
    let sentiment = resolve_sentiment(config, &request.symbol, sentiment).await?;

    let strategy = RsiSentimentStrategy::new(config.strategies.clone())?;
    let signal = strategy.generate(&bars, sentiment)?;
    let Some(last) = bars.last() else {
        bail!("no bars for {}", request.symbol);
    };

    let risk = RiskManager::new(config.risk.clone());
    let plan = risk.plan(balance, last.close)?;

    let report = json!({
        "symbol": request.symbol,
        "timeframe": request.timeframe.as_str(),
        "time": format_ts(last.ts_ms),
        "close": last.close,
        "action": signal.action,
        "rsi": signal.indicator,
        "sentiment": sentiment,
        "plan": plan,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn build_request(config: &Config, data: &DataArgs) -> Result<OhlcvRequest> {
    let mut request = OhlcvRequest::from_config(&config.data)?;
    if let Some(symbol) = &data.symbol {
        request.symbol = symbol.clone();
    }
    if let Some(timeframe) = &data.timeframe {
        request.timeframe = Timeframe::parse(timeframe)?;
    }
    if let Some(limit) = data.limit {
        request.limit = limit;
    }
    if let Some(cache_dir) = &data.cache_dir {
        request.cache_dir = cache_dir.clone();
    }
    let start = data.start.as_deref().map(parse_time).transpose()?;
    let end = data.end.as_deref().map(parse_time).transpose()?;
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            bail!("--start must not be after --end");
        }
    }
    Ok(request.with_range(start, end))
}

async fn load_bars(request: &OhlcvRequest) -> Result<Vec<PriceBar>> {
    let manager = HistoricalDataManager::new(WhitebitClient::new());
    manager
        .fetch_ohlcv(request)
        .await
        .with_context(|| format!("failed to load bars for {}", request.symbol))
}

async fn require_bars(request: &OhlcvRequest) -> Result<Vec<PriceBar>> {
    let bars = load_bars(request).await?;
    if bars.is_empty() {
        bail!("no bars available for {} {}", request.symbol, request.timeframe);
    }
    Ok(bars)
}

/// Use the explicit score, else the LunarCrush galaxy score (0 on failure).
async fn resolve_sentiment(config: &Config, symbol: &str, explicit: Option<f64>) -> Result<f64> {
    if let Some(score) = explicit {
        return Ok(score);
    }
    if config.lunarcrush.api_key.is_empty() {
        warn!("no --sentiment given and no LunarCrush API key configured; using 0");
        return Ok(0.0);
    }
    let collector = DataCollector::new()?;
    let snapshot = collector
        .collect(base_asset(symbol), &config.lunarcrush.api_key)
        .await;
    let score = snapshot.galaxy_score();
    info!(symbol, galaxy_score = score, "fetched sentiment");
    Ok(score)
}

/// Parse RFC 3339 or a bare date (midnight UTC) into milliseconds.
fn parse_time(value: &str) -> Result<TimestampMs> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.timestamp_millis());
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("invalid time {value:?} (expected RFC 3339 or YYYY-MM-DD)"))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .with_context(|| format!("invalid date {value}"))?;
    Ok(midnight.and_utc().timestamp_millis())
}

fn format_ts(ts_ms: TimestampMs) -> String {
    DateTime::<Utc>::from_timestamp_millis(ts_ms)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts_ms.to_string())
}
