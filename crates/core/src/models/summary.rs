use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::investment::InvestmentType;

/// One allocation bucket: absolute value and its share of total portfolio value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub value: f64,
    /// `value / total_value × 100`, or 0 when the portfolio is worth nothing.
    pub pct: f64,
}

/// Share of portfolio value per risk tier, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

/// Derived statistics over all holdings. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_value: f64,
    pub total_cost_basis: f64,
    pub total_monthly_contribution: f64,
    pub total_unrealized_gain: f64,
    pub total_unrealized_gain_pct: f64,

    /// Each holding contributes its whole value to exactly one type bucket.
    pub allocation_by_type: BTreeMap<InvestmentType, Allocation>,

    /// Each holding contributes its whole value to every tag it carries, so
    /// bucket values can sum to more than `total_value`.
    pub allocation_by_tag: BTreeMap<String, Allocation>,

    pub risk_profile: RiskProfile,

    /// 0 (concentrated) ..= 100 (equal-weighted).
    pub diversification_score: u8,

    pub investment_count: usize,
}
