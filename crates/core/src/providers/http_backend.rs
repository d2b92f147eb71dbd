use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::projection::{
    InvestmentProjection, InvestmentProjectionRequest, PortfolioProjection,
    PortfolioProjectionRequest,
};
use crate::models::quote::{TickerMatch, TickerQuote};
use crate::models::settings::Settings;
use super::traits::{GrowthProjector, QuoteProvider};

const SERVICE: &str = "FI/RE backend";

/// Client for the dashboard backend.
///
/// - `POST /project-investment`, `POST /project-portfolio`: growth projections.
/// - `GET /search-ticker?q=`: ticker autocomplete, `{results: [...]}`.
/// - `GET /stock-quote/{symbol}`: latest `{name, price}`.
///
/// Any transport failure, non-2xx status or undecodable body surfaces as
/// `CoreError::CollaboratorUnavailable`.
#[derive(Clone)]
pub struct HttpBackendClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<TickerMatch>,
}

impl HttpBackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, 30)
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_timeout(settings.api_base_url.clone(), settings.request_timeout_secs)
    }

    #[allow(unused_variables)]
    fn with_timeout(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(timeout_secs));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build `{base_url}/{segments...}` with each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, CoreError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| CoreError::unavailable(SERVICE, format!("Invalid base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| CoreError::unavailable(SERVICE, "Base URL cannot take a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn post_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T, CoreError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(&[endpoint])?;
        let resp = self.client.post(url).json(body).send().await?;
        Self::decode(endpoint, resp).await
    }

    async fn decode<T: DeserializeOwned>(endpoint: &str, resp: reqwest::Response) -> Result<T, CoreError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::unavailable(
                SERVICE,
                format!("{endpoint} returned HTTP {status}"),
            ));
        }
        resp.json().await.map_err(|e| {
            CoreError::unavailable(SERVICE, format!("Failed to decode {endpoint} response: {e}"))
        })
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl GrowthProjector for HttpBackendClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn project_investment(
        &self,
        request: &InvestmentProjectionRequest,
    ) -> Result<InvestmentProjection, CoreError> {
        self.post_json("project-investment", request).await
    }

    async fn project_portfolio(
        &self,
        request: &PortfolioProjectionRequest,
    ) -> Result<PortfolioProjection, CoreError> {
        self.post_json("project-portfolio", request).await
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl QuoteProvider for HttpBackendClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn search(&self, query: &str) -> Result<Vec<TickerMatch>, CoreError> {
        let url = self.url(&["search-ticker"])?;
        let resp = self.client.get(url).query(&[("q", query)]).send().await?;
        let body: SearchResponse = Self::decode("search-ticker", resp).await?;
        Ok(body.results)
    }

    async fn quote(&self, symbol: &str) -> Result<TickerQuote, CoreError> {
        let url = self.url(&["stock-quote", symbol])?;
        let resp = self.client.get(url).send().await?;
        Self::decode("stock-quote", resp).await
    }
}
