//! Concurrent market and sentiment snapshot collection.

use std::time::Duration;

use galaxy_core::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::whitebit::{get_json, WhitebitClient, WHITEBIT_BASE_URL};

pub const LUNARCRUSH_BASE_URL: &str = "https://api.lunarcrush.com/v2";

/// Result of one collection round. A side that failed is `None`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MarketSnapshot {
    pub markets: Option<Value>,
    pub lunarcrush: Option<Value>,
}

impl MarketSnapshot {
    /// Galaxy score of the first LunarCrush asset, 0 when unavailable.
    pub fn galaxy_score(&self) -> f64 {
        self.lunarcrush
            .as_ref()
            .and_then(|v| v.pointer("/data/0/galaxy_score"))
            .and_then(|v| match v {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            })
            .unwrap_or(0.0)
    }
}

/// Fetches WhiteBIT markets and LunarCrush asset data.
#[derive(Debug, Clone)]
pub struct DataCollector {
    client: reqwest::Client,
    whitebit: WhitebitClient,
    lunarcrush_url: String,
}

impl DataCollector {
    pub fn new() -> Result<Self> {
        Self::with_base_urls(WHITEBIT_BASE_URL, LUNARCRUSH_BASE_URL)
    }

    /// Create a collector against custom endpoints.
    pub fn with_base_urls(whitebit_url: &str, lunarcrush_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::http(e.to_string()))?;
        Ok(Self {
            whitebit: WhitebitClient::with_client(whitebit_url, client.clone()),
            client,
            lunarcrush_url: lunarcrush_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn fetch_whitebit_markets(&self) -> Result<Value> {
        self.whitebit.fetch_markets().await
    }

    pub async fn fetch_lunarcrush_data(&self, symbol: &str, api_key: &str) -> Result<Value> {
        debug!(symbol, "fetching LunarCrush data");
        let url = format!("{}/assets", self.lunarcrush_url);
        let query = [("symbol", symbol.to_string()), ("key", api_key.to_string())];
        get_json(&self.client, &url, &query).await
    }

    /// Fetch both sources concurrently; each failure is logged and isolated.
    pub async fn collect(&self, symbol: &str, api_key: &str) -> MarketSnapshot {
        let (markets, lunarcrush) = tokio::join!(
            self.fetch_whitebit_markets(),
            self.fetch_lunarcrush_data(symbol, api_key)
        );

        MarketSnapshot {
            markets: markets
                .map_err(|e| warn!(error = %e, "WhiteBIT markets unavailable"))
                .ok(),
            lunarcrush: lunarcrush
                .map_err(|e| warn!(symbol, error = %e, "LunarCrush data unavailable"))
                .ok(),
        }
    }
}

/// Base asset of a market symbol ("BTC_USDT" -> "BTC").
pub fn base_asset(symbol: &str) -> &str {
    symbol.split(['_', '/', '-']).next().unwrap_or(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_galaxy_score() {
        let snapshot = MarketSnapshot {
            markets: None,
            lunarcrush: Some(json!({"data": [{"symbol": "BTC", "galaxy_score": 72.5}]})),
        };
        assert_eq!(snapshot.galaxy_score(), 72.5);
    }

    #[test]
    fn test_galaxy_score_missing() {
        assert_eq!(MarketSnapshot::default().galaxy_score(), 0.0);
        let empty = MarketSnapshot {
            markets: None,
            lunarcrush: Some(json!({"data": []})),
        };
        assert_eq!(empty.galaxy_score(), 0.0);
    }

    #[test]
    fn test_base_asset() {
        assert_eq!(base_asset("BTC_USDT"), "BTC");
        assert_eq!(base_asset("ETH/USDT"), "ETH");
        assert_eq!(base_asset("SOL"), "SOL");
    }

    #[tokio::test]
    async fn test_collect_isolates_failures() {
        // Nothing listens on the discard port
        let collector = DataCollector::with_base_urls("http://127.0.0.1:9", "http://127.0.0.1:9").unwrap();
        let snapshot = collector.collect("BTC", "key").await;

        assert!(snapshot.markets.is_none());
        assert!(snapshot.lunarcrush.is_none());
        assert_eq!(snapshot.galaxy_score(), 0.0);
    }
}
