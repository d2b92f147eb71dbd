// ═══════════════════════════════════════════════════════════════════
// Integration Tests: FirePortfolio facade end to end
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use fire_portfolio_core::errors::CoreError;
use fire_portfolio_core::models::goal::CrossingEstimate;
use fire_portfolio_core::models::investment::{InvestmentPatch, InvestmentType, NewInvestment};
use fire_portfolio_core::models::projection::{
    InvestmentProjection, InvestmentProjectionRequest, PortfolioProjection,
    PortfolioProjectionRequest, PortfolioYearlyProjection, YearlyProjection,
};
use fire_portfolio_core::models::query::{InvestmentQuery, InvestmentSort};
use fire_portfolio_core::models::quote::{TickerMatch, TickerQuote};
use fire_portfolio_core::models::settings::Settings;
use fire_portfolio_core::providers::registry::QuoteProviderRegistry;
use fire_portfolio_core::providers::traits::{GrowthProjector, QuoteProvider};
use fire_portfolio_core::services::projection_service::ProjectionOutcome;
use fire_portfolio_core::storage::memory_store::MemoryStore;
use fire_portfolio_core::storage::store::KeyValueStore;
use fire_portfolio_core::FirePortfolio;

// ═══════════════════════════════════════════════════════════════════
// Collaborator stubs
// ═══════════════════════════════════════════════════════════════════

/// Adds 10% of the starting value per year, linearly.
struct LinearProjector;

#[async_trait]
impl GrowthProjector for LinearProjector {
    fn name(&self) -> &str {
        "LinearProjector"
    }

    async fn project_investment(
        &self,
        request: &InvestmentProjectionRequest,
    ) -> Result<InvestmentProjection, CoreError> {
        let step = request.current_value * 0.1;
        let yearly_projections: Vec<YearlyProjection> = (1..=request.projection_years)
            .map(|year| YearlyProjection {
                year,
                contributions_cumulative: 0.0,
                growth_cumulative: step * f64::from(year),
                balance: request.current_value + step * f64::from(year),
            })
            .collect();
        let final_value = request.current_value + step * f64::from(request.projection_years);
        Ok(InvestmentProjection {
            yearly_projections,
            final_value,
            total_contributions: 0.0,
            total_growth: final_value - request.current_value,
            cagr: 0.0,
        })
    }

    async fn project_portfolio(
        &self,
        request: &PortfolioProjectionRequest,
    ) -> Result<PortfolioProjection, CoreError> {
        let start: f64 = request.investments.iter().map(|i| i.current_value).sum();
        let step = start * 0.1;
        let yearly_projections: Vec<PortfolioYearlyProjection> = (1..=request.projection_years)
            .map(|year| PortfolioYearlyProjection {
                year,
                total_balance: start + step * f64::from(year),
                balances: Default::default(),
            })
            .collect();
        let final_total_value = start + step * f64::from(request.projection_years);
        Ok(PortfolioProjection {
            yearly_projections,
            per_investment: Vec::new(),
            final_total_value,
            total_growth: final_total_value - start,
            portfolio_cagr: 0.0,
        })
    }
}

struct FixedQuotes;

#[async_trait]
impl QuoteProvider for FixedQuotes {
    fn name(&self) -> &str {
        "FixedQuotes"
    }

    async fn search(&self, query: &str) -> Result<Vec<TickerMatch>, CoreError> {
        Ok(vec![TickerMatch {
            symbol: query.to_uppercase(),
            name: "Match".into(),
            kind: "ETF".into(),
        }])
    }

    async fn quote(&self, symbol: &str) -> Result<TickerQuote, CoreError> {
        match symbol {
            "VTI" => Ok(TickerQuote {
                name: "Vanguard Total Stock Market ETF".into(),
                price: 300.0,
            }),
            _ => Err(CoreError::unavailable("FixedQuotes", format!("no quote for {symbol}"))),
        }
    }
}

fn open_with(store: Arc<MemoryStore>) -> FirePortfolio {
    let mut quotes = QuoteProviderRegistry::new();
    quotes.register(Box::new(FixedQuotes));
    FirePortfolio::with_collaborators(Settings::default(), store, Arc::new(LinearProjector), quotes)
        .unwrap()
}

fn store_with_goal(fire_number: f64) -> Arc<MemoryStore> {
    let goal = json!({
        "fire_number": fire_number,
        "inputs": {"annual_expenses": fire_number / 25.0, "withdrawal_rate": 4.0},
        "calculatedAt": "2025-02-01T00:00:00Z",
        "yearly_projections": []
    });
    Arc::new(MemoryStore::with_value("fire-calculator-results", goal.to_string()))
}

fn vti() -> NewInvestment {
    NewInvestment::new("VTI", "Vanguard Total Stock Market", InvestmentType::Etf)
        .with_position(100.0, 200.0, 250.0)
        .with_monthly_contribution(1_000.0)
        .with_tags(["core"])
}

fn bnd() -> NewInvestment {
    NewInvestment::new("BND", "Vanguard Total Bond", InvestmentType::Bond)
        .with_position(100.0, 80.0, 75.0)
        .with_tags(["core", "income"])
}

// ═══════════════════════════════════════════════════════════════════
// Lifecycle
// ═══════════════════════════════════════════════════════════════════

mod lifecycle {
    use super::*;

    #[test]
    fn opens_empty() {
        let portfolio = open_with(Arc::new(MemoryStore::new()));
        assert!(portfolio.investments().is_empty());
        assert!(portfolio.tags().is_empty());
        assert_eq!(portfolio.projection_years(), 30);
        assert!(!portfolio.has_unsaved_changes());
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let settings = Settings {
            goal_projection_years: 0,
            ..Settings::default()
        };
        let result = FirePortfolio::with_collaborators(
            settings,
            Arc::new(MemoryStore::new()),
            Arc::new(LinearProjector),
            QuoteProviderRegistry::new(),
        );
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn reopening_restores_holdings() {
        let store = Arc::new(MemoryStore::new());
        let id = {
            let portfolio = open_with(store.clone());
            portfolio.add_investment(vti()).unwrap().id
        };
        let reopened = open_with(store);
        assert_eq!(reopened.investments().len(), 1);
        assert!(reopened.get_investment(&id).is_some());
        assert_eq!(reopened.tags(), vec!["core"]);
    }

    #[test]
    fn file_backed_portfolio() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = Settings {
            data_dir: Some(tmp.path().to_path_buf()),
            ..Settings::default()
        };
        {
            let portfolio = FirePortfolio::open_in_data_dir(settings.clone()).unwrap();
            portfolio.add_investment(vti()).unwrap();
        }
        assert!(tmp.path().join("fire-investments.json").exists());
        let reopened = FirePortfolio::open_in_data_dir(settings).unwrap();
        assert_eq!(reopened.investments().len(), 1);
    }

    #[test]
    fn file_backed_portfolio_needs_data_dir() {
        let result = FirePortfolio::open_in_data_dir(Settings::default());
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn debug_output() {
        let portfolio = open_with(Arc::new(MemoryStore::new()));
        let debug = format!("{portfolio:?}");
        assert!(debug.contains("FirePortfolio"));
        assert!(debug.contains("FixedQuotes"));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Holdings and analytics
// ═══════════════════════════════════════════════════════════════════

mod holdings_and_summary {
    use super::*;

    #[test]
    fn summary_tracks_mutations() {
        let portfolio = open_with(Arc::new(MemoryStore::new()));
        let v = portfolio.add_investment(vti()).unwrap();
        portfolio.add_investment(bnd()).unwrap();

        let summary = portfolio.summary();
        assert_eq!(summary.total_value, 25_000.0 + 7_500.0);
        assert_eq!(summary.investment_count, 2);
        assert_eq!(summary.allocation_by_tag["core"].value, 32_500.0);
        assert_eq!(summary.allocation_by_tag["income"].value, 7_500.0);

        portfolio
            .update_investment(
                &v.id,
                InvestmentPatch {
                    current_shares: Some(0.0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(portfolio.summary().total_value, 7_500.0);

        assert!(portfolio.delete_investment(&v.id).unwrap());
        assert!(!portfolio.delete_investment(&v.id).unwrap());
        assert_eq!(portfolio.summary().investment_count, 1);
    }

    #[test]
    fn tag_filter_and_removal() {
        let portfolio = open_with(Arc::new(MemoryStore::new()));
        portfolio.add_investment(vti()).unwrap();
        portfolio.add_investment(bnd()).unwrap();
        portfolio.add_tag("Watchlist").unwrap();

        assert_eq!(portfolio.investments_with_tag(" CORE ").len(), 2);
        assert_eq!(portfolio.investments_with_tag("income").len(), 1);
        assert!(portfolio.investments_with_tag("").is_empty());

        assert!(portfolio.remove_tag("core").unwrap());
        assert!(portfolio.investments_with_tag("core").is_empty());
        assert_eq!(portfolio.tags(), vec!["income", "watchlist"]);
        assert!(portfolio.summary().allocation_by_tag.get("core").is_none());
    }

    #[test]
    fn query_filters_and_sorts_holdings() {
        let portfolio = open_with(Arc::new(MemoryStore::new()));
        let v = portfolio.add_investment(vti()).unwrap();
        let b = portfolio.add_investment(bnd()).unwrap();

        let by_value = portfolio.query_investments(&InvestmentQuery::new());
        assert_eq!(by_value.iter().map(|i| i.id.clone()).collect::<Vec<_>>(), vec![v.id.clone(), b.id.clone()]);

        let by_gain = portfolio.query_investments(&InvestmentQuery::new().sorted_by(InvestmentSort::GainAsc));
        assert_eq!(by_gain[0].id, b.id);

        let income = portfolio.query_investments(&InvestmentQuery::new().with_search("Income"));
        assert_eq!(income.len(), 1);
        assert_eq!(income[0].id, b.id);

        assert_eq!(portfolio.held_types(), vec![InvestmentType::Etf, InvestmentType::Bond]);
    }

    #[test]
    fn export_then_import_into_fresh_portfolio() {
        let source = open_with(Arc::new(MemoryStore::new()));
        source.add_investment(vti()).unwrap();
        source.add_investment(bnd()).unwrap();
        let snapshot = source.export_snapshot().unwrap();

        let target = open_with(Arc::new(MemoryStore::new()));
        assert_eq!(target.import_snapshot(&snapshot).unwrap(), 2);
        assert_eq!(target.investments(), source.investments());
        assert_eq!(target.summary(), source.summary());
    }

    #[test]
    fn persistence_failure_is_reported_and_recoverable() {
        let store = Arc::new(MemoryStore::new());
        let portfolio = open_with(store.clone());
        store.set_fail_writes(true);

        assert!(matches!(portfolio.add_investment(vti()), Err(CoreError::Persistence(_))));
        assert_eq!(portfolio.investments().len(), 1);
        assert!(portfolio.has_unsaved_changes());

        store.set_fail_writes(false);
        portfolio.flush().unwrap();
        assert!(!portfolio.has_unsaved_changes());
        assert!(store.get("fire-investments").unwrap().is_some());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Goal
// ═══════════════════════════════════════════════════════════════════

mod goal {
    use super::*;

    #[test]
    fn no_goal_yet() {
        let portfolio = open_with(Arc::new(MemoryStore::new()));
        assert!(portfolio.load_goal().unwrap().is_none());
        assert!(portfolio.goal_progress().unwrap().is_none());
        assert!(portfolio.goal_milestones().unwrap().is_none());
    }

    #[test]
    fn unreadable_goal_counts_as_missing() {
        let store = Arc::new(MemoryStore::with_value("fire-calculator-results", "{oops"));
        let portfolio = open_with(store);
        assert!(portfolio.load_goal().unwrap().is_none());
    }

    #[test]
    fn progress_and_milestones() {
        let portfolio = open_with(store_with_goal(100_000.0));
        portfolio.add_investment(vti()).unwrap();
        portfolio.add_investment(bnd()).unwrap();

        let goal = portfolio.load_goal().unwrap().unwrap();
        assert_eq!(goal.annual_expenses(), Some(4_000.0));

        let progress = portfolio.goal_progress().unwrap().unwrap();
        assert!((progress.pct - 32.5).abs() < 1e-9);
        assert_eq!(progress.remaining, 67_500.0);
        assert_eq!(progress.monthly_contribution, 1_000.0);

        let reached: Vec<bool> = portfolio
            .goal_milestones()
            .unwrap()
            .unwrap()
            .iter()
            .map(|m| m.reached)
            .collect();
        assert_eq!(reached, vec![true, false, false, false]);
    }

    #[test]
    fn goal_is_never_written() {
        let store = store_with_goal(100_000.0);
        let before = store.get("fire-calculator-results").unwrap();
        let portfolio = open_with(store.clone());
        portfolio.add_investment(vti()).unwrap();
        let _ = portfolio.goal_progress().unwrap();
        assert_eq!(store.get("fire-calculator-results").unwrap(), before);
    }

    #[tokio::test]
    async fn crossing_estimate_uses_goal_horizon() {
        let portfolio = open_with(store_with_goal(100_000.0));
        portfolio.add_investment(vti()).unwrap();

        // 25k growing by 2.5k a year reaches 100k in year 30.
        let outcome = portfolio.estimate_goal_crossing().await.unwrap();
        assert_eq!(outcome, ProjectionOutcome::Applied(CrossingEstimate::Projected(30)));
    }

    #[tokio::test]
    async fn crossing_estimate_without_goal_is_skipped() {
        let portfolio = open_with(Arc::new(MemoryStore::new()));
        portfolio.add_investment(vti()).unwrap();
        assert_eq!(
            portfolio.estimate_goal_crossing().await.unwrap(),
            ProjectionOutcome::Skipped
        );
    }

    #[tokio::test]
    async fn crossing_estimate_when_goal_met() {
        let portfolio = open_with(store_with_goal(20_000.0));
        portfolio.add_investment(vti()).unwrap();
        assert_eq!(
            portfolio.estimate_goal_crossing().await.unwrap(),
            ProjectionOutcome::Applied(CrossingEstimate::AlreadyReached)
        );
    }
}

// ═══════════════════════════════════════════════════════════════════
// Projections and quotes
// ═══════════════════════════════════════════════════════════════════

mod collaborators {
    use super::*;

    #[tokio::test]
    async fn projections_follow_horizon() {
        let portfolio = open_with(Arc::new(MemoryStore::new()));
        let inv = portfolio.add_investment(vti()).unwrap();

        let single = portfolio.project_investment(&inv.id).await.unwrap().applied().unwrap();
        assert_eq!(single.yearly_projections.len(), 30);

        portfolio.set_projection_years(5).unwrap();
        let whole = portfolio.project_portfolio().await.unwrap().applied().unwrap();
        assert_eq!(whole.yearly_projections.len(), 5);
        assert_eq!(whole.final_total_value, 25_000.0 + 2_500.0 * 5.0);

        assert!(matches!(portfolio.set_projection_years(0), Err(CoreError::Validation(_))));
        assert_eq!(portfolio.projection_years(), 5);
    }

    #[tokio::test]
    async fn empty_portfolio_projection_is_skipped() {
        let portfolio = open_with(Arc::new(MemoryStore::new()));
        assert_eq!(portfolio.project_portfolio().await.unwrap(), ProjectionOutcome::Skipped);
    }

    #[tokio::test]
    async fn search_and_quote() {
        let portfolio = open_with(Arc::new(MemoryStore::new()));
        let matches = portfolio.search_tickers("vt").await.unwrap();
        assert_eq!(matches[0].symbol, "VT");
        assert_eq!(portfolio.quote("vti").await.unwrap().price, 300.0);
        assert!(portfolio.quote("XYZ").await.is_err());
    }

    #[tokio::test]
    async fn refresh_prices_updates_holdings() {
        let store = Arc::new(MemoryStore::new());
        let portfolio = open_with(store.clone());
        let v = portfolio.add_investment(vti()).unwrap();
        portfolio.add_investment(bnd()).unwrap();

        let refresh = portfolio.refresh_prices().await.unwrap();

        assert_eq!(refresh.updated, 1);
        assert_eq!(refresh.failed, vec!["BND"]);
        assert_eq!(portfolio.get_investment(&v.id).unwrap().current_price_per_share, 300.0);
        assert_eq!(portfolio.summary().total_value, 30_000.0 + 7_500.0);

        let reopened = open_with(store);
        assert_eq!(reopened.get_investment(&v.id).unwrap().current_price_per_share, 300.0);
    }
}
