//! Historical OHLCV download with a local cache.
//!
//! A fetch loads the cached table, downloads the missing tail, merges and
//! persists the result, then returns the requested window.

use std::path::PathBuf;

use chrono::Utc;
use galaxy_core::config::DataConfig;
use galaxy_core::{PriceBar, Result, TimestampMs};
use tracing::{debug, info, warn};

use crate::cache::{merge_bars, BarCache};
use crate::timeframe::Timeframe;
use crate::whitebit::KlineSource;

/// Parameters for one OHLCV fetch.
#[derive(Debug, Clone)]
pub struct OhlcvRequest {
    /// Market symbol (e.g., "BTC_USDT").
    pub symbol: String,
    /// Bar timeframe.
    pub timeframe: Timeframe,
    /// Inclusive lower bound; `None` returns everything cached up to `end`.
    pub start: Option<TimestampMs>,
    /// Inclusive upper bound; `None` means now.
    pub end: Option<TimestampMs>,
    /// Maximum bars per API request.
    pub limit: u32,
    /// Directory holding cache files.
    pub cache_dir: PathBuf,
}

impl OhlcvRequest {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        let defaults = DataConfig::default();
        Self {
            symbol: symbol.into(),
            timeframe,
            start: None,
            end: None,
            limit: defaults.limit,
            cache_dir: defaults.cache_dir,
        }
    }

    /// Build a request from the `[data]` config section.
    pub fn from_config(config: &DataConfig) -> Result<Self> {
        Ok(Self {
            symbol: config.symbol.clone(),
            timeframe: Timeframe::parse(&config.timeframe)?,
            start: None,
            end: None,
            limit: config.limit,
            cache_dir: config.cache_dir.clone(),
        })
    }

    pub fn with_range(mut self, start: Option<TimestampMs>, end: Option<TimestampMs>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    pub fn cache(&self) -> BarCache {
        BarCache::new(&self.cache_dir, &self.symbol, self.timeframe)
    }
}

/// Downloads and caches OHLCV bars.
pub struct HistoricalDataManager<S> {
    source: S,
}

impl<S: KlineSource> HistoricalDataManager<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Load bars for the request, using the cache when possible.
    ///
    /// A failed download is logged and treated as no new data.
    pub async fn fetch_ohlcv(&self, request: &OhlcvRequest) -> Result<Vec<PriceBar>> {
        let cache = request.cache();
        let cached = cache.load()?;
        let cached_last = cached.last().map(|b| b.ts_ms);

        let end = request.end.unwrap_or_else(|| Utc::now().timestamp_millis());
        let fetch_start = request
            .start
            .or(cached_last)
            .unwrap_or_else(|| end - i64::from(request.limit) * request.timeframe.step_ms());

        let needs_fetch = cached_last.map_or(true, |last| last < end);
        let merged = if needs_fetch {
            let fresh = match self
                .source
                .fetch_klines(
                    &request.symbol,
                    request.timeframe,
                    fetch_start.div_euclid(1000),
                    end.div_euclid(1000),
                    request.limit,
                )
                .await
            {
                Ok(bars) => bars,
                Err(e) => {
                    warn!(symbol = %request.symbol, error = %e, "failed to fetch OHLCV chunk");
                    Vec::new()
                }
            };
            if fresh.is_empty() {
                warn!(symbol = %request.symbol, "empty OHLCV response");
            }
            let merged = merge_bars(&cached, &fresh);
            if !merged.is_empty() {
                cache.store(&merged)?;
            }
            merged
        } else {
            debug!(symbol = %request.symbol, "cache covers requested range");
            cached
        };

        let bars: Vec<PriceBar> = merged
            .into_iter()
            .filter(|b| request.start.map_or(true, |start| b.ts_ms >= start) && b.ts_ms <= end)
            .collect();

        info!(
            symbol = %request.symbol,
            timeframe = %request.timeframe,
            bars = bars.len(),
            "loaded OHLCV"
        );
        Ok(bars)
    }
}
