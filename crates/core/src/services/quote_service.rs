use chrono::Utc;
use log::{debug, warn};
use std::collections::BTreeMap;

use crate::errors::CoreError;
use crate::models::quote::{PriceRefresh, TickerMatch, TickerQuote};
use crate::providers::registry::QuoteProviderRegistry;
use crate::services::repository::InvestmentRepository;

/// Ticker search and price refresh with automatic provider fallback.
///
/// Providers are tried in registration order. If one fails (service down,
/// rate limited, etc.) the next one is asked.
pub struct QuoteService {
    registry: QuoteProviderRegistry,
}

impl QuoteService {
    pub fn new(registry: QuoteProviderRegistry) -> Self {
        Self { registry }
    }

    /// Names of the registered providers, in priority order.
    pub fn provider_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Symbols matching `query`. A blank query returns nothing without calling out.
    pub async fn search(&self, query: &str) -> Result<Vec<TickerMatch>, CoreError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        if self.registry.is_empty() {
            return Err(CoreError::NoProvider("ticker search".into()));
        }

        let mut last_error = None;
        for provider in self.registry.providers() {
            match provider.search(query).await {
                Ok(results) => return Ok(results),
                Err(e) => {
                    warn!("Ticker search via {} failed: {e}", provider.name());
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| CoreError::NoProvider("ticker search".into())))
    }

    /// Latest quote for `symbol`. Rejects non-finite or negative prices and
    /// moves on to the next provider.
    pub async fn quote(&self, symbol: &str) -> Result<TickerQuote, CoreError> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(CoreError::Validation("Cannot quote an empty symbol".into()));
        }
        if self.registry.is_empty() {
            return Err(CoreError::NoProvider("quotes".into()));
        }

        let mut last_error = None;
        for provider in self.registry.providers() {
            match provider.quote(&symbol).await {
                Ok(quote) if quote.price.is_finite() && quote.price >= 0.0 => return Ok(quote),
                Ok(quote) => {
                    last_error = Some(CoreError::unavailable(
                        provider.name(),
                        format!(
                            "Invalid price returned for {symbol}: {} (must be finite and non-negative)",
                            quote.price
                        ),
                    ));
                }
                Err(e) => {
                    warn!("Quote for {symbol} via {} failed: {e}", provider.name());
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| CoreError::NoProvider("quotes".into())))
    }

    /// Quote every distinct ticker in the repository and apply all prices in
    /// one atomic step.
    ///
    /// The repository revision is captured before the first request; if the
    /// holdings changed by the time all quotes are in, nothing is applied and
    /// the result is marked `discarded`. Tickers that fail to quote are
    /// listed in `failed` and keep their old price. A failed write-through
    /// does not lose the report: it is carried in `persistence_error`.
    pub async fn refresh_prices(
        &self,
        repository: &InvestmentRepository,
    ) -> Result<PriceRefresh, CoreError> {
        let (holdings, revision) = repository.snapshot_with_revision();

        let mut ids_by_ticker: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for inv in holdings.investments.iter().filter(|i| !i.ticker.is_empty()) {
            ids_by_ticker
                .entry(inv.ticker.clone())
                .or_default()
                .push(inv.id.clone());
        }
        if ids_by_ticker.is_empty() {
            return Ok(PriceRefresh::default());
        }

        let mut prices = Vec::new();
        let mut failed = Vec::new();
        for (ticker, ids) in &ids_by_ticker {
            match self.quote(ticker).await {
                Ok(quote) => prices.extend(ids.iter().map(|id| (id.clone(), quote.price))),
                Err(e) => {
                    debug!("No price for {ticker}: {e}");
                    failed.push(ticker.clone());
                }
            }
        }

        let refreshed_at = Utc::now();
        let outcome = repository.apply_prices(revision, &prices, refreshed_at)?;
        let applied = outcome.applied;
        Ok(PriceRefresh {
            updated: if applied { prices.len() } else { 0 },
            failed,
            discarded: !applied,
            refreshed_at: applied.then_some(refreshed_at),
            persistence_error: outcome.persistence_error.map(|e| e.to_string()),
        })
    }
}
