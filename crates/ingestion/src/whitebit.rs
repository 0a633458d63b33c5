//! WhiteBIT public API client.

use async_trait::async_trait;
use galaxy_core::{Error, PriceBar, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::timeframe::Timeframe;

pub const WHITEBIT_BASE_URL: &str = "https://whitebit.com";

/// Source of OHLCV bars for a time range.
#[async_trait]
pub trait KlineSource: Send + Sync {
    /// Fetch bars for `symbol` between `start_s` and `end_s` (Unix seconds).
    async fn fetch_klines(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start_s: i64,
        end_s: i64,
        limit: u32,
    ) -> Result<Vec<PriceBar>>;
}

/// WhiteBIT public API client.
#[derive(Debug, Clone)]
pub struct WhitebitClient {
    base_url: String,
    client: reqwest::Client,
}

impl WhitebitClient {
    pub fn new() -> Self {
        Self::with_base_url(WHITEBIT_BASE_URL)
    }

    /// Create a client with a custom base URL.
    pub fn with_base_url(base_url: &str) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a client sharing an existing connection pool.
    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Fetch the list of markets.
    pub async fn fetch_markets(&self) -> Result<Value> {
        let url = format!("{}/api/v4/public/markets", self.base_url);
        debug!(%url, "fetching WhiteBIT markets");
        get_json(&self.client, &url, &[]).await
    }
}

impl Default for WhitebitClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KlineSource for WhitebitClient {
    async fn fetch_klines(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start_s: i64,
        end_s: i64,
        limit: u32,
    ) -> Result<Vec<PriceBar>> {
        let url = format!("{}/api/v4/public/kline", self.base_url);
        debug!(symbol, %timeframe, start_s, end_s, limit, "fetching OHLCV chunk");

        let query = [
            ("market", symbol.to_string()),
            ("interval", timeframe.as_str().to_string()),
            ("start", start_s.to_string()),
            ("end", end_s.to_string()),
            ("limit", limit.to_string()),
        ];
        let body = get_json(&self.client, &url, &query).await?;
        parse_kline_rows(&body)
    }
}

/// GET `url` and decode the JSON body, failing on non-2xx statuses.
pub(crate) async fn get_json(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<Value> {
    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| Error::http(e.to_string()))?
        .error_for_status()
        .map_err(|e| Error::http(e.to_string()))?;

    response
        .json::<Value>()
        .await
        .map_err(|e| Error::http(format!("invalid JSON from {url}: {e}")))
}

/// Decode a kline response body.
///
/// Accepts a bare array or an object with a `result` array. Each row is
/// `[timestamp_s, open, high, low, close, volume, ...]` with numbers or
/// numeric strings; short or unparseable rows are dropped.
pub fn parse_kline_rows(body: &Value) -> Result<Vec<PriceBar>> {
    let rows = match body {
        Value::Array(rows) => rows,
        Value::Object(map) => match map.get("result") {
            Some(Value::Array(rows)) => rows,
            _ => return Err(Error::data("kline response has no result array")),
        },
        _ => return Err(Error::data("kline response is not an array")),
    };

    let bars: Vec<PriceBar> = rows.iter().filter_map(parse_row).collect();
    if bars.len() < rows.len() {
        warn!(dropped = rows.len() - bars.len(), "dropped malformed kline rows");
    }
    Ok(bars)
}

fn parse_row(row: &Value) -> Option<PriceBar> {
    let cols = row.as_array()?;
    if cols.len() < 6 {
        return None;
    }
    let ts_s = as_f64(&cols[0])?;
    let bar = PriceBar::new(
        (ts_s * 1000.0) as i64,
        as_f64(&cols[1])?,
        as_f64(&cols[2])?,
        as_f64(&cols[3])?,
        as_f64(&cols[4])?,
        as_f64(&cols[5])?,
    );
    bar.is_finite().then_some(bar)
}

fn as_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_bare_array() {
        let body = json!([
            [1_704_067_200, "42000.5", "42100", "41900", "42050.25", "12.5"],
            [1_704_070_800, 42050.25, 42200.0, 42000.0, 42150.0, 8.0, "quote volume"],
        ]);
        let bars = parse_kline_rows(&body).unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].ts_ms, 1_704_067_200_000);
        assert_eq!(bars[0].open, 42000.5);
        assert_eq!(bars[0].close, 42050.25);
        assert_eq!(bars[1].volume, 8.0);
    }

    #[test]
    fn test_parse_result_wrapper() {
        let body = json!({"success": true, "result": [[1_704_067_200, "1", "2", "0.5", "1.5", "100"]]});
        let bars = parse_kline_rows(&body).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].high, 2.0);
    }

    #[test]
    fn test_malformed_rows_dropped() {
        let body = json!([
            [1_704_067_200, "1", "2", "0.5", "1.5"],
            [1_704_070_800, "1", "abc", "0.5", "1.5", "100"],
            [1_704_074_400, "1", "2", "0.5", "1.5", "100"],
            "not a row",
        ]);
        let bars = parse_kline_rows(&body).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].ts_ms, 1_704_074_400_000);
    }

    #[test]
    fn test_invalid_body() {
        assert!(matches!(parse_kline_rows(&json!("oops")), Err(Error::Data(_))));
        assert!(matches!(
            parse_kline_rows(&json!({"message": "rate limited"})),
            Err(Error::Data(_))
        ));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = WhitebitClient::with_base_url("http://localhost:8080/");
        assert_eq!(client.base_url, "http://localhost:8080");
    }
}
