use std::collections::BTreeMap;

use crate::models::investment::{Investment, RiskTier};
use crate::models::summary::{Allocation, PortfolioSummary, RiskProfile};

/// HHI of a single holding owning 100% of the portfolio.
const MAX_HHI: f64 = 10_000.0;

/// Turns holdings into portfolio statistics: totals, allocation, risk mix,
/// diversification.
///
/// Pure business logic with no I/O and no state. Feed it a snapshot taken from the
/// repository in one read.
pub struct PortfolioAggregator;

impl PortfolioAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Compute the summary for `investments`.
    ///
    /// Every percentage is `bucket / total_value × 100`, or 0 when the
    /// portfolio is worth nothing.
    #[must_use]
    pub fn summarize(&self, investments: &[Investment]) -> PortfolioSummary {
        if investments.is_empty() {
            return PortfolioSummary::default();
        }

        let mut total_value = 0.0;
        let mut total_cost_basis = 0.0;
        let mut total_monthly_contribution = 0.0;
        let mut by_type = BTreeMap::new();
        let mut by_tag: BTreeMap<String, f64> = BTreeMap::new();
        let (mut low, mut medium, mut high) = (0.0, 0.0, 0.0);

        for inv in investments {
            let value = inv.current_value();
            total_value += value;
            total_cost_basis += inv.cost_basis();
            total_monthly_contribution += inv.monthly_contribution;

            *by_type.entry(inv.investment_type).or_insert(0.0) += value;

            // Tags are non-exclusive: the full value lands in every tag bucket.
            for tag in &inv.tags {
                *by_tag.entry(tag.clone()).or_insert(0.0) += value;
            }

            match inv.risk_tier() {
                RiskTier::Low => low += value,
                RiskTier::Medium => medium += value,
                RiskTier::High => high += value,
            }
        }

        let total_unrealized_gain = total_value - total_cost_basis;
        let total_unrealized_gain_pct = if total_cost_basis > 0.0 {
            (total_unrealized_gain / total_cost_basis) * 100.0
        } else {
            0.0
        };

        let values: Vec<f64> = investments.iter().map(Investment::current_value).collect();

        PortfolioSummary {
            total_value,
            total_cost_basis,
            total_monthly_contribution,
            total_unrealized_gain,
            total_unrealized_gain_pct,
            allocation_by_type: to_allocations(by_type, total_value),
            allocation_by_tag: to_allocations(by_tag, total_value),
            risk_profile: RiskProfile {
                low: share_pct(low, total_value),
                medium: share_pct(medium, total_value),
                high: share_pct(high, total_value),
            },
            diversification_score: diversification_score(&values),
            investment_count: investments.len(),
        }
    }
}

impl Default for PortfolioAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Herfindahl–Hirschman based diversification score in `0..=100`.
///
/// Shares are per holding, not per group. With N holdings the HHI ranges
/// from `10000 / N` (equal weights, score 100) to `10000` (one holding owns
/// everything, score 0). N ≤ 1 always scores 0.
#[must_use]
pub fn diversification_score(values: &[f64]) -> u8 {
    let n = values.len();
    if n <= 1 {
        return 0;
    }

    let total: f64 = values.iter().sum();
    let hhi: f64 = values
        .iter()
        .map(|v| {
            let pct = share_pct(*v, total);
            pct * pct
        })
        .sum();
    let min_hhi = MAX_HHI / n as f64;

    let score = ((MAX_HHI - hhi) / (MAX_HHI - min_hhi) * 100.0).round();
    score.clamp(0.0, 100.0) as u8
}

fn share_pct(value: f64, total: f64) -> f64 {
    if total > 0.0 {
        (value / total) * 100.0
    } else {
        0.0
    }
}

fn to_allocations<K: Ord>(buckets: BTreeMap<K, f64>, total_value: f64) -> BTreeMap<K, Allocation> {
    buckets
        .into_iter()
        .map(|(key, value)| {
            let pct = share_pct(value, total_value);
            (key, Allocation { value, pct })
        })
        .collect()
}
