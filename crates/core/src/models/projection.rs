use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::goal::YearlyBalance;
use super::investment::Investment;

// ── Single investment ───────────────────────────────────────────────

/// Request body for the single-investment growth projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentProjectionRequest {
    pub current_value: f64,
    pub monthly_contribution: f64,
    /// Percent per year.
    pub expected_annual_return: f64,
    pub projection_years: u32,
}

impl InvestmentProjectionRequest {
    pub fn for_investment(investment: &Investment, projection_years: u32) -> Self {
        Self {
            current_value: investment.current_value(),
            monthly_contribution: investment.monthly_contribution,
            expected_annual_return: investment.expected_annual_return,
            projection_years,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyProjection {
    pub year: u32,
    pub contributions_cumulative: f64,
    pub growth_cumulative: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentProjection {
    pub yearly_projections: Vec<YearlyProjection>,
    pub final_value: f64,
    pub total_contributions: f64,
    pub total_growth: f64,
    pub cagr: f64,
}

// ── Portfolio ───────────────────────────────────────────────────────

/// One holding inside a portfolio projection request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionInput {
    pub current_value: f64,
    pub monthly_contribution: f64,
    pub expected_annual_return: f64,
    /// Key under which this holding's balance appears in each projected year.
    pub name: String,
}

impl From<&Investment> for ProjectionInput {
    fn from(investment: &Investment) -> Self {
        Self {
            current_value: investment.current_value(),
            monthly_contribution: investment.monthly_contribution,
            expected_annual_return: investment.expected_annual_return,
            name: investment.display_name().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioProjectionRequest {
    pub investments: Vec<ProjectionInput>,
    pub projection_years: u32,
}

impl PortfolioProjectionRequest {
    pub fn for_investments(investments: &[Investment], projection_years: u32) -> Self {
        Self {
            investments: investments.iter().map(ProjectionInput::from).collect(),
            projection_years,
        }
    }
}

/// A projected year: the portfolio total plus each holding's balance keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioYearlyProjection {
    pub year: u32,
    pub total_balance: f64,
    #[serde(flatten)]
    pub balances: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentGrowthSummary {
    pub name: String,
    pub final_value: f64,
    pub total_growth: f64,
    pub cagr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioProjection {
    pub yearly_projections: Vec<PortfolioYearlyProjection>,
    #[serde(default)]
    pub per_investment: Vec<InvestmentGrowthSummary>,
    pub final_total_value: f64,
    pub total_growth: f64,
    pub portfolio_cagr: f64,
}

impl PortfolioProjection {
    /// The `(year, total_balance)` sequence, in the order the projector returned it.
    pub fn yearly_balances(&self) -> Vec<YearlyBalance> {
        self.yearly_projections
            .iter()
            .map(|y| YearlyBalance::new(y.year, y.total_balance))
            .collect()
    }
}
