use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::projection::{
    InvestmentProjection, InvestmentProjectionRequest, PortfolioProjection,
    PortfolioProjectionRequest,
};
use crate::models::quote::{TickerMatch, TickerQuote};

/// Remote calculator that simulates compounding growth year by year.
///
/// The engine never runs the simulation itself; it only builds requests
/// from holdings and interprets the results.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait GrowthProjector: Send + Sync {
    /// Human-readable name of this projector (for logs/errors).
    fn name(&self) -> &str;

    /// Project a single holding.
    async fn project_investment(
        &self,
        request: &InvestmentProjectionRequest,
    ) -> Result<InvestmentProjection, CoreError>;

    /// Project several holdings together, with per-name balances for every year.
    async fn project_portfolio(
        &self,
        request: &PortfolioProjectionRequest,
    ) -> Result<PortfolioProjection, CoreError>;
}

/// Ticker search and latest-quote lookups.
///
/// Several implementations can be registered; the quote service tries them
/// in registration order.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait QuoteProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Symbols matching a free-text query.
    async fn search(&self, query: &str) -> Result<Vec<TickerMatch>, CoreError>;

    /// Latest quote for `symbol`.
    async fn quote(&self, symbol: &str) -> Result<TickerQuote, CoreError>;
}
