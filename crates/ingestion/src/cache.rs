//! On-disk bar cache.
//!
//! One SQLite file per (symbol, timeframe) pair holding the merged bar
//! table, keyed by timestamp.

use std::path::{Path, PathBuf};

use galaxy_core::{Error, PriceBar, Result};
use rusqlite::{params, Connection};
use tracing::debug;

use crate::timeframe::Timeframe;

/// Bar table for one symbol and timeframe.
#[derive(Debug, Clone)]
pub struct BarCache {
    path: PathBuf,
}

impl BarCache {
    /// Cache file `{cache_dir}/{symbol}_{timeframe}.sqlite`.
    pub fn new(cache_dir: impl AsRef<Path>, symbol: &str, timeframe: Timeframe) -> Self {
        let path = cache_dir
            .as_ref()
            .join(format!("{}_{}.sqlite", symbol, timeframe.as_str()));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load all cached bars in timestamp order. Empty if no file exists.
    pub fn load(&self) -> Result<Vec<PriceBar>> {
        if !self.exists() {
            return Ok(Vec::new());
        }
        debug!(path = %self.path.display(), "loading OHLCV from cache");

        let conn = self.open()?;
        let mut stmt = conn
            .prepare("SELECT ts_ms, open, high, low, close, volume FROM bars ORDER BY ts_ms")
            .map_err(cache_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(PriceBar::new(
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            })
            .map_err(cache_err)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(cache_err)
    }

    /// Replace the cached table with `bars`.
    pub fn store(&self, bars: &[PriceBar]) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let mut conn = self.open()?;
        let tx = conn.transaction().map_err(cache_err)?;
        tx.execute("DELETE FROM bars", []).map_err(cache_err)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO bars (ts_ms, open, high, low, close, volume)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )
                .map_err(cache_err)?;
            for bar in bars {
                stmt.execute(params![bar.ts_ms, bar.open, bar.high, bar.low, bar.close, bar.volume])
                    .map_err(cache_err)?;
            }
        }
        tx.commit().map_err(cache_err)?;

        debug!(path = %self.path.display(), bars = bars.len(), "stored OHLCV cache");
        Ok(())
    }

    fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path).map_err(cache_err)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS bars (
                ts_ms  INTEGER PRIMARY KEY,
                open   REAL NOT NULL,
                high   REAL NOT NULL,
                low    REAL NOT NULL,
                close  REAL NOT NULL,
                volume REAL NOT NULL
            );",
        )
        .map_err(cache_err)?;
        Ok(conn)
    }
}

fn cache_err(e: rusqlite::Error) -> Error {
    Error::cache(e.to_string())
}

/// Merge two bar tables: concatenate, sort by timestamp, keep the last
/// bar for each duplicate timestamp.
pub fn merge_bars(existing: &[PriceBar], fresh: &[PriceBar]) -> Vec<PriceBar> {
    let mut merged: Vec<PriceBar> = existing.iter().chain(fresh).copied().collect();
    // Stable sort keeps insertion order within equal timestamps
    merged.sort_by_key(|b| b.ts_ms);

    let mut out: Vec<PriceBar> = Vec::with_capacity(merged.len());
    for bar in merged {
        match out.last_mut() {
            Some(last) if last.ts_ms == bar.ts_ms => *last = bar,
            _ => out.push(bar),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(ts_ms: i64, close: f64) -> PriceBar {
        PriceBar::new(ts_ms, close, close + 1.0, close - 1.0, close, 5.0)
    }

    #[test]
    fn test_merge_sorts_and_dedupes_keeping_last() {
        let existing = vec![bar(1000, 1.0), bar(3000, 3.0), bar(2000, 2.0)];
        let fresh = vec![bar(3000, 30.0), bar(4000, 4.0)];

        let merged = merge_bars(&existing, &fresh);

        let ts: Vec<i64> = merged.iter().map(|b| b.ts_ms).collect();
        assert_eq!(ts, vec![1000, 2000, 3000, 4000]);
        assert_eq!(merged[2].close, 30.0);
    }

    #[test]
    fn test_merge_empty() {
        assert!(merge_bars(&[], &[]).is_empty());
        assert_eq!(merge_bars(&[bar(1, 1.0)], &[]).len(), 1);
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = BarCache::new(dir.path(), "BTC_USDT", Timeframe::H1);
        assert!(!cache.exists());
        assert!(cache.load().unwrap().is_empty());
    }

    #[test]
    fn test_store_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = BarCache::new(dir.path().join("nested"), "ETH_USDT", Timeframe::D1);
        assert!(cache.path().ends_with("ETH_USDT_1d.sqlite"));

        let bars = vec![bar(2000, 2.5), bar(1000, 1.5)];
        cache.store(&bars).unwrap();

        let loaded = cache.load().unwrap();
        assert_eq!(loaded, vec![bar(1000, 1.5), bar(2000, 2.5)]);

        // Store replaces rather than appends
        cache.store(&[bar(5000, 5.0)]).unwrap();
        assert_eq!(cache.load().unwrap(), vec![bar(5000, 5.0)]);
    }
}
