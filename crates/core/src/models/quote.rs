use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One ticker search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerMatch {
    pub symbol: String,
    pub name: String,
    /// Provider-specific instrument type, e.g. "EQUITY" or "ETF".
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Latest quote for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerQuote {
    pub name: String,
    pub price: f64,
}

/// Result of refreshing prices for all held tickers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceRefresh {
    /// Number of holdings whose price was updated.
    pub updated: usize,
    /// Tickers no provider could quote.
    pub failed: Vec<String>,
    /// `true` when the holdings changed while quotes were in flight and
    /// nothing was applied.
    pub discarded: bool,
    pub refreshed_at: Option<DateTime<Utc>>,
    /// Set when the prices were applied in memory but could not be written
    /// to the durable store. The counts above still describe what changed.
    pub persistence_error: Option<String>,
}
