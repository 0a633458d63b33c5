//! Market data ingestion for the galaxy-trader system.
//!
//! This crate handles:
//! - Timeframe parsing
//! - WhiteBIT kline and market downloads
//! - LunarCrush sentiment snapshots
//! - The per-symbol SQLite bar cache and cache-merge fetches

pub mod cache;
pub mod collector;
pub mod history;
pub mod timeframe;
pub mod whitebit;

pub use cache::{merge_bars, BarCache};
pub use collector::{base_asset, DataCollector, MarketSnapshot};
pub use history::{HistoricalDataManager, OhlcvRequest};
pub use timeframe::Timeframe;
pub use whitebit::{parse_kline_rows, KlineSource, WhitebitClient};
