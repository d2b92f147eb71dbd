use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::quote::{TickerMatch, TickerQuote};
use super::traits::QuoteProvider;

const PROVIDER: &str = "Yahoo Finance";

/// Yahoo Finance quote provider.
///
/// - **Free**: No API key required.
/// - **Coverage**: Global equities, ETFs, indices, mutual funds, crypto pairs.
///
/// Uses the `yahoo_finance_api` crate. Registered after the backend so it
/// serves as the fallback when the backend is down.
///
/// **Note**: Not WASM-compatible (uses native reqwest/tokio).
pub struct YahooFinanceProvider {
    connector: yahoo_finance_api::YahooConnector,
}

impl YahooFinanceProvider {
    pub fn new() -> Result<Self, CoreError> {
        let connector = yahoo_finance_api::YahooConnector::new()
            .map_err(|e| CoreError::unavailable(PROVIDER, format!("Failed to create connector: {e}")))?;
        Ok(Self { connector })
    }

    fn display_name(long_name: &str, short_name: &str, symbol: &str) -> String {
        [long_name, short_name]
            .into_iter()
            .map(str::trim)
            .find(|n| !n.is_empty())
            .unwrap_or(symbol)
            .to_string()
    }
}

#[async_trait]
impl QuoteProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn search(&self, query: &str) -> Result<Vec<TickerMatch>, CoreError> {
        let result = self
            .connector
            .search_ticker(query)
            .await
            .map_err(|e| CoreError::unavailable(PROVIDER, format!("Search for '{query}' failed: {e}")))?;

        Ok(result
            .quotes
            .iter()
            .map(|item| TickerMatch {
                symbol: item.symbol.clone(),
                name: Self::display_name(&item.long_name, &item.short_name, &item.symbol),
                kind: item.quote_type.clone(),
            })
            .collect())
    }

    async fn quote(&self, symbol: &str) -> Result<TickerQuote, CoreError> {
        let resp = self
            .connector
            .get_latest_quotes(symbol, "1d")
            .await
            .map_err(|e| {
                CoreError::unavailable(PROVIDER, format!("Failed to fetch latest quote for {symbol}: {e}"))
            })?;

        let quote = resp.last_quote().map_err(|e| {
            CoreError::unavailable(PROVIDER, format!("No quote data for {symbol}: {e}"))
        })?;

        // The chart endpoint carries no display name; best-effort lookup via search.
        let name = match self.connector.search_ticker(symbol).await {
            Ok(found) => found
                .quotes
                .iter()
                .find(|q| q.symbol.eq_ignore_ascii_case(symbol))
                .map(|q| Self::display_name(&q.long_name, &q.short_name, &q.symbol)),
            Err(_) => None,
        };

        Ok(TickerQuote {
            name: name.unwrap_or_else(|| symbol.to_uppercase()),
            price: quote.close,
        })
    }
}
