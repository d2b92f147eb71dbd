pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use log::{debug, warn};
use std::sync::Arc;

use errors::CoreError;
use models::{
    goal::{CrossingEstimate, GoalProgress, GoalSnapshot, Milestone},
    investment::{Investment, InvestmentPatch, InvestmentType, NewInvestment},
    projection::{InvestmentProjection, PortfolioProjection},
    query::InvestmentQuery,
    quote::{PriceRefresh, TickerMatch, TickerQuote},
    settings::Settings,
    summary::PortfolioSummary,
};
use providers::{
    http_backend::HttpBackendClient, registry::QuoteProviderRegistry, traits::GrowthProjector,
};
use services::{
    aggregator::PortfolioAggregator,
    goal_tracker::GoalTracker,
    projection_service::{ProjectionOutcome, ProjectionService},
    quote_service::QuoteService,
    repository::InvestmentRepository,
};
use storage::store::KeyValueStore;

/// Main entry point for the FI/RE portfolio core library.
///
/// Owns the investment repository and all services that read from it. Every
/// method takes `&self`, so a host can share one instance (e.g. behind an
/// `Arc`) between UI actions and in-flight collaborator calls.
#[must_use]
pub struct FirePortfolio {
    settings: Settings,
    store: Arc<dyn KeyValueStore>,
    repository: InvestmentRepository,
    aggregator: PortfolioAggregator,
    goal_tracker: GoalTracker,
    projection_service: ProjectionService,
    quote_service: QuoteService,
}

impl std::fmt::Debug for FirePortfolio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirePortfolio")
            .field("repository", &self.repository)
            .field("projection_years", &self.projection_service.horizon_years())
            .field("quote_providers", &self.quote_service.provider_names())
            .finish()
    }
}

impl FirePortfolio {
    /// Open the portfolio stored in `store`, talking to the backend named in
    /// `settings` for projections and quotes.
    pub fn open(settings: Settings, store: Arc<dyn KeyValueStore>) -> Result<Self, CoreError> {
        let projector: Arc<dyn GrowthProjector> = Arc::new(HttpBackendClient::from_settings(&settings));
        let quotes = QuoteProviderRegistry::new_with_defaults(&settings);
        Self::with_collaborators(settings, store, projector, quotes)
    }

    /// Open a file-backed portfolio under `settings.data_dir` (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn open_in_data_dir(settings: Settings) -> Result<Self, CoreError> {
        let dir = settings.data_dir.clone().ok_or_else(|| {
            CoreError::Validation("data_dir must be set to use the file store".into())
        })?;
        let store = Arc::new(storage::file_store::FileStore::open(dir)?);
        Self::open(settings, store)
    }

    /// Open with explicit collaborators (custom projector or quote providers, tests).
    pub fn with_collaborators(
        settings: Settings,
        store: Arc<dyn KeyValueStore>,
        projector: Arc<dyn GrowthProjector>,
        quotes: QuoteProviderRegistry,
    ) -> Result<Self, CoreError> {
        settings.validate()?;
        let repository = InvestmentRepository::init(store.clone(), settings.holdings_key.clone())?;
        let projection_service = ProjectionService::new(projector, settings.default_projection_years);

        Ok(Self {
            settings,
            store,
            repository,
            aggregator: PortfolioAggregator::new(),
            goal_tracker: GoalTracker::new(),
            projection_service,
            quote_service: QuoteService::new(quotes),
        })
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Direct access to the repository, for hosts that need its full surface.
    #[must_use]
    pub fn repository(&self) -> &InvestmentRepository {
        &self.repository
    }

    // ── Investment Management ───────────────────────────────────────

    pub fn add_investment(&self, input: NewInvestment) -> Result<Investment, CoreError> {
        self.repository.add(input)
    }

    pub fn update_investment(&self, id: &str, patch: InvestmentPatch) -> Result<Investment, CoreError> {
        self.repository.update(id, patch)
    }

    /// Returns `false` if there was nothing to delete.
    pub fn delete_investment(&self, id: &str) -> Result<bool, CoreError> {
        self.repository.delete(id)
    }

    #[must_use]
    pub fn get_investment(&self, id: &str) -> Option<Investment> {
        self.repository.get(id)
    }

    #[must_use]
    pub fn investments(&self) -> Vec<Investment> {
        self.repository.list()
    }

    /// Investments carrying `tag` (normalized before matching).
    #[must_use]
    pub fn investments_with_tag(&self, tag: &str) -> Vec<Investment> {
        let Some(tag) = models::investment::normalize_tag(tag) else {
            return Vec::new();
        };
        self.repository
            .list()
            .into_iter()
            .filter(|inv| inv.has_tag(&tag))
            .collect()
    }

    // ── Search & Sorting ────────────────────────────────────────────

    /// Holdings filtered by type and search text, sorted by `query.sort`.
    /// Runs over a single snapshot of the repository.
    #[must_use]
    pub fn query_investments(&self, query: &InvestmentQuery) -> Vec<Investment> {
        query.apply(&self.repository.snapshot().investments)
    }

    /// Distinct investment types currently held, in first-seen order.
    #[must_use]
    pub fn held_types(&self) -> Vec<InvestmentType> {
        models::query::held_types(&self.repository.snapshot().investments)
    }

    // ── Tags ────────────────────────────────────────────────────────

    pub fn add_tag(&self, raw: &str) -> Result<bool, CoreError> {
        self.repository.add_tag(raw)
    }

    /// Remove a tag everywhere: from the registry and from every investment.
    pub fn remove_tag(&self, tag: &str) -> Result<bool, CoreError> {
        self.repository.remove_tag(tag)
    }

    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        self.repository.tags()
    }

    // ── Import / Export / Persistence ───────────────────────────────

    /// Replace all holdings and tags from a JSON snapshot (all-or-nothing).
    pub fn import_snapshot(&self, json: &str) -> Result<usize, CoreError> {
        self.repository.import_snapshot(json)
    }

    pub fn export_snapshot(&self) -> Result<String, CoreError> {
        self.repository.export_snapshot()
    }

    /// Retry writing the current state after a persistence failure.
    pub fn flush(&self) -> Result<(), CoreError> {
        self.repository.flush()
    }

    /// Returns `true` if some change has not reached the durable store.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.repository.is_dirty()
    }

    // ── Analytics ───────────────────────────────────────────────────

    /// Portfolio statistics over one consistent snapshot of the holdings.
    #[must_use]
    pub fn summary(&self) -> PortfolioSummary {
        let holdings = self.repository.snapshot();
        self.aggregator.summarize(&holdings.investments)
    }

    // ── FI/RE Goal ──────────────────────────────────────────────────

    /// Read the goal snapshot left by the goal calculator.
    ///
    /// Missing → `None`. An unreadable payload is logged and also treated as
    /// "no goal yet", so the rest of the dashboard keeps working.
    pub fn load_goal(&self) -> Result<Option<GoalSnapshot>, CoreError> {
        let Some(raw) = self.store.get(&self.settings.goal_key)? else {
            debug!("No goal snapshot under '{}'", self.settings.goal_key);
            return Ok(None);
        };
        match serde_json::from_str::<GoalSnapshot>(&raw) {
            Ok(goal) => Ok(Some(goal)),
            Err(e) => {
                warn!("Ignoring unreadable goal snapshot under '{}': {e}", self.settings.goal_key);
                Ok(None)
            }
        }
    }

    /// Progress toward the stored goal, `None` if no goal has been computed.
    pub fn goal_progress(&self) -> Result<Option<GoalProgress>, CoreError> {
        let summary = self.summary();
        Ok(self
            .load_goal()?
            .map(|goal| self.goal_tracker.progress(&summary, &goal)))
    }

    /// 25/50/75/100% milestones of the stored goal.
    pub fn goal_milestones(&self) -> Result<Option<Vec<Milestone>>, CoreError> {
        let summary = self.summary();
        Ok(self
            .load_goal()?
            .map(|goal| self.goal_tracker.milestones(&summary, &goal)))
    }

    /// Estimate the year the portfolio crosses the stored goal, projecting
    /// `goal_projection_years` ahead. `Skipped` when there is no goal yet.
    pub async fn estimate_goal_crossing(&self) -> Result<ProjectionOutcome<CrossingEstimate>, CoreError> {
        let Some(goal) = self.load_goal()? else {
            return Ok(ProjectionOutcome::Skipped);
        };
        self.projection_service
            .estimate_goal_crossing(&self.repository, &goal, self.settings.goal_projection_years)
            .await
    }

    // ── Projections ─────────────────────────────────────────────────

    #[must_use]
    pub fn projection_years(&self) -> u32 {
        self.projection_service.horizon_years()
    }

    /// Change the projection horizon; in-flight projections become stale.
    pub fn set_projection_years(&self, years: u32) -> Result<(), CoreError> {
        self.projection_service.set_horizon_years(years)
    }

    pub async fn project_investment(
        &self,
        id: &str,
    ) -> Result<ProjectionOutcome<InvestmentProjection>, CoreError> {
        self.projection_service.project_investment(&self.repository, id).await
    }

    pub async fn project_portfolio(&self) -> Result<ProjectionOutcome<PortfolioProjection>, CoreError> {
        self.projection_service.project_portfolio(&self.repository).await
    }

    // ── Quotes ──────────────────────────────────────────────────────

    pub async fn search_tickers(&self, query: &str) -> Result<Vec<TickerMatch>, CoreError> {
        self.quote_service.search(query).await
    }

    pub async fn quote(&self, symbol: &str) -> Result<TickerQuote, CoreError> {
        self.quote_service.quote(symbol).await
    }

    /// Refresh the price of every held ticker from the quote providers.
    pub async fn refresh_prices(&self) -> Result<PriceRefresh, CoreError> {
        self.quote_service.refresh_prices(&self.repository).await
    }
}
