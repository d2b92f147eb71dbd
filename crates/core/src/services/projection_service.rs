use log::debug;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::goal::{CrossingEstimate, GoalSnapshot};
use crate::models::projection::{
    InvestmentProjection, InvestmentProjectionRequest, PortfolioProjection,
    PortfolioProjectionRequest,
};
use crate::providers::traits::GrowthProjector;
use crate::services::aggregator::PortfolioAggregator;
use crate::services::goal_tracker::GoalTracker;
use crate::services::repository::InvestmentRepository;

/// Generation captured when a projection request is sent.
///
/// A result is only applied if, when it arrives, the holdings are still at
/// `revision` and the horizon has not been changed since `horizon_epoch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionToken {
    pub revision: u64,
    pub horizon_epoch: u64,
}

/// What became of an asynchronous projection.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionOutcome<T> {
    /// The inputs were unchanged when the response arrived.
    Applied(T),
    /// Holdings or horizon changed while the request was in flight; the result was dropped.
    Stale,
    /// Nothing to project (no holdings, no goal, or nothing invested yet).
    Skipped,
}

impl<T> ProjectionOutcome<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            ProjectionOutcome::Applied(value) => Some(value),
            ProjectionOutcome::Stale | ProjectionOutcome::Skipped => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, ProjectionOutcome::Stale)
    }
}

/// Requests growth projections from the external projector and suppresses
/// results that arrive after their inputs changed.
///
/// The request itself is never aborted; only the apply step checks the
/// generation token.
pub struct ProjectionService {
    projector: Arc<dyn GrowthProjector>,
    horizon_years: AtomicU32,
    horizon_epoch: AtomicU64,
    aggregator: PortfolioAggregator,
    goal_tracker: GoalTracker,
}

impl ProjectionService {
    pub fn new(projector: Arc<dyn GrowthProjector>, horizon_years: u32) -> Self {
        Self {
            projector,
            horizon_years: AtomicU32::new(horizon_years),
            horizon_epoch: AtomicU64::new(0),
            aggregator: PortfolioAggregator::new(),
            goal_tracker: GoalTracker::new(),
        }
    }

    /// Current horizon for investment and portfolio projections.
    pub fn horizon_years(&self) -> u32 {
        self.horizon_years.load(Ordering::SeqCst)
    }

    /// Change the horizon. Any projection in flight becomes stale.
    pub fn set_horizon_years(&self, years: u32) -> Result<(), CoreError> {
        if years == 0 {
            return Err(CoreError::Validation(
                "Projection horizon must be at least one year".into(),
            ));
        }
        if self.horizon_years.swap(years, Ordering::SeqCst) != years {
            self.horizon_epoch.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    /// Generation of the inputs right now.
    pub fn token(&self, repository: &InvestmentRepository) -> ProjectionToken {
        ProjectionToken {
            revision: repository.revision(),
            horizon_epoch: self.horizon_epoch.load(Ordering::SeqCst),
        }
    }

    pub fn is_current(&self, token: ProjectionToken, repository: &InvestmentRepository) -> bool {
        self.token(repository) == token
    }

    /// Project a single holding over the current horizon.
    pub async fn project_investment(
        &self,
        repository: &InvestmentRepository,
        id: &str,
    ) -> Result<ProjectionOutcome<InvestmentProjection>, CoreError> {
        let token = self.token(repository);
        let investment = repository
            .get(id)
            .ok_or_else(|| CoreError::InvestmentNotFound(id.to_string()))?;
        let request = InvestmentProjectionRequest::for_investment(&investment, self.horizon_years());

        let projection = self.projector.project_investment(&request).await?;
        Ok(self.settle(token, repository, projection, "investment"))
    }

    /// Project every holding together over the current horizon.
    pub async fn project_portfolio(
        &self,
        repository: &InvestmentRepository,
    ) -> Result<ProjectionOutcome<PortfolioProjection>, CoreError> {
        let (holdings, revision) = repository.snapshot_with_revision();
        if holdings.investments.is_empty() {
            return Ok(ProjectionOutcome::Skipped);
        }
        let token = ProjectionToken {
            revision,
            horizon_epoch: self.horizon_epoch.load(Ordering::SeqCst),
        };
        let request =
            PortfolioProjectionRequest::for_investments(&holdings.investments, self.horizon_years());

        let projection = self.projector.project_portfolio(&request).await?;
        Ok(self.settle(token, repository, projection, "portfolio"))
    }

    /// Estimate the year the projected portfolio first meets `goal`, looking
    /// `horizon_years` ahead (independent of the chart horizon).
    ///
    /// Skipped when there are no holdings or nothing is invested yet; a goal
    /// already met answers without calling the projector.
    pub async fn estimate_goal_crossing(
        &self,
        repository: &InvestmentRepository,
        goal: &GoalSnapshot,
        horizon_years: u32,
    ) -> Result<ProjectionOutcome<CrossingEstimate>, CoreError> {
        let (holdings, revision) = repository.snapshot_with_revision();
        let summary = self.aggregator.summarize(&holdings.investments);
        if holdings.investments.is_empty() || summary.total_value <= 0.0 {
            return Ok(ProjectionOutcome::Skipped);
        }
        if self.goal_tracker.progress(&summary, goal).goal_reached {
            return Ok(ProjectionOutcome::Applied(CrossingEstimate::AlreadyReached));
        }

        // The goal horizon is fixed per call, so only the holdings revision matters.
        let request = PortfolioProjectionRequest::for_investments(&holdings.investments, horizon_years);
        let projection = self.projector.project_portfolio(&request).await?;

        if repository.revision() != revision {
            debug!(
                "Discarding goal crossing projection from {}: holdings changed (revision {revision})",
                self.projector.name()
            );
            return Ok(ProjectionOutcome::Stale);
        }
        let balances = projection.yearly_balances();
        Ok(ProjectionOutcome::Applied(
            self.goal_tracker.crossing_estimate(&summary, goal, &balances),
        ))
    }

    fn settle<T>(
        &self,
        token: ProjectionToken,
        repository: &InvestmentRepository,
        result: T,
        what: &str,
    ) -> ProjectionOutcome<T> {
        if self.is_current(token, repository) {
            ProjectionOutcome::Applied(result)
        } else {
            debug!(
                "Discarding stale {what} projection from {} (requested at revision {})",
                self.projector.name(),
                token.revision
            );
            ProjectionOutcome::Stale
        }
    }
}
