use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::investment::{Investment, InvestmentType};

/// Sort order for a holdings listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentSort {
    #[default]
    ValueDesc,
    ValueAsc,
    /// By unrealized gain %, highest first.
    GainDesc,
    GainAsc,
    /// By display name (ticker, else name), case-insensitive.
    NameAsc,
    ContributionDesc,
}

impl InvestmentSort {
    pub const ALL: [InvestmentSort; 6] = [
        InvestmentSort::ValueDesc,
        InvestmentSort::ValueAsc,
        InvestmentSort::GainDesc,
        InvestmentSort::GainAsc,
        InvestmentSort::NameAsc,
        InvestmentSort::ContributionDesc,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            InvestmentSort::ValueDesc => "Value (High to Low)",
            InvestmentSort::ValueAsc => "Value (Low to High)",
            InvestmentSort::GainDesc => "Gain % (High to Low)",
            InvestmentSort::GainAsc => "Gain % (Low to High)",
            InvestmentSort::NameAsc => "Name (A-Z)",
            InvestmentSort::ContributionDesc => "Monthly Contribution (High to Low)",
        }
    }

    fn compare(&self, a: &Investment, b: &Investment) -> Ordering {
        match self {
            InvestmentSort::ValueDesc => b.current_value().total_cmp(&a.current_value()),
            InvestmentSort::ValueAsc => a.current_value().total_cmp(&b.current_value()),
            InvestmentSort::GainDesc => b.unrealized_gain_pct().total_cmp(&a.unrealized_gain_pct()),
            InvestmentSort::GainAsc => a.unrealized_gain_pct().total_cmp(&b.unrealized_gain_pct()),
            InvestmentSort::NameAsc => {
                let (left, right) = (a.display_name(), b.display_name());
                left.to_lowercase()
                    .cmp(&right.to_lowercase())
                    .then_with(|| left.cmp(right))
            }
            InvestmentSort::ContributionDesc => {
                b.monthly_contribution.total_cmp(&a.monthly_contribution)
            }
        }
    }
}

/// Filter and sort options for listing holdings.
///
/// `investment_type: None` means all types. `search` matches
/// case-insensitively against ticker, name and tags; a blank search matches
/// everything. Ties keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestmentQuery {
    #[serde(default, rename = "type")]
    pub investment_type: Option<InvestmentType>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: InvestmentSort,
}

impl InvestmentQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, investment_type: InvestmentType) -> Self {
        self.investment_type = Some(investment_type);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn sorted_by(mut self, sort: InvestmentSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn matches(&self, inv: &Investment) -> bool {
        if self.investment_type.is_some_and(|ty| ty != inv.investment_type) {
            return false;
        }
        let needle = self
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_default();
        needle.is_empty()
            || inv.ticker.to_lowercase().contains(&needle)
            || inv.name.to_lowercase().contains(&needle)
            || inv.tags.iter().any(|t| t.contains(&needle))
    }

    /// The matching holdings from `investments`, in the requested order.
    pub fn apply(&self, investments: &[Investment]) -> Vec<Investment> {
        let mut out: Vec<Investment> = investments
            .iter()
            .filter(|inv| self.matches(inv))
            .cloned()
            .collect();
        out.sort_by(|a, b| self.sort.compare(a, b));
        out
    }
}

/// Distinct investment types present in `investments`, in first-seen order.
pub fn held_types(investments: &[Investment]) -> Vec<InvestmentType> {
    let mut types = Vec::new();
    for inv in investments {
        if !types.contains(&inv.investment_type) {
            types.push(inv.investment_type);
        }
    }
    types
}
