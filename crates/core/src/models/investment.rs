use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Expected annual return (%) assumed when a stored record carries none.
pub const DEFAULT_EXPECTED_RETURN: f64 = 7.0;

/// The category of a holding. Closed set: every lookup table below is an
/// exhaustive `match`, so a new variant cannot be left unmapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentType {
    Stock,
    Etf,
    IndexFund,
    MutualFund,
    Bond,
    Crypto,
    RealEstate,
    Other,
}

impl InvestmentType {
    pub const ALL: [InvestmentType; 8] = [
        InvestmentType::Stock,
        InvestmentType::Etf,
        InvestmentType::IndexFund,
        InvestmentType::MutualFund,
        InvestmentType::Bond,
        InvestmentType::Crypto,
        InvestmentType::RealEstate,
        InvestmentType::Other,
    ];

    /// Wire identifier, as stored in the holdings payload.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestmentType::Stock => "stock",
            InvestmentType::Etf => "etf",
            InvestmentType::IndexFund => "index_fund",
            InvestmentType::MutualFund => "mutual_fund",
            InvestmentType::Bond => "bond",
            InvestmentType::Crypto => "crypto",
            InvestmentType::RealEstate => "real_estate",
            InvestmentType::Other => "other",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            InvestmentType::Stock => "Individual Stock",
            InvestmentType::Etf => "ETF",
            InvestmentType::IndexFund => "Index Fund",
            InvestmentType::MutualFund => "Mutual Fund",
            InvestmentType::Bond => "Bond / Fixed Income",
            InvestmentType::Crypto => "Cryptocurrency",
            InvestmentType::RealEstate => "Real Estate / REIT",
            InvestmentType::Other => "Other",
        }
    }

    pub fn risk_tier(&self) -> RiskTier {
        match self {
            InvestmentType::Stock | InvestmentType::Crypto => RiskTier::High,
            InvestmentType::Bond => RiskTier::Low,
            InvestmentType::Etf
            | InvestmentType::IndexFund
            | InvestmentType::MutualFund
            | InvestmentType::RealEstate
            | InvestmentType::Other => RiskTier::Medium,
        }
    }

    /// Expected annual return (%) pre-filled for a new holding of this type.
    pub fn default_annual_return(&self) -> f64 {
        match self {
            InvestmentType::Stock => 10.0,
            InvestmentType::Etf => 8.0,
            InvestmentType::IndexFund => 8.0,
            InvestmentType::MutualFund => 7.0,
            InvestmentType::Bond => 4.0,
            InvestmentType::Crypto => 15.0,
            InvestmentType::RealEstate => 8.0,
            InvestmentType::Other => 7.0,
        }
    }
}

impl std::fmt::Display for InvestmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse risk classification of an investment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low Risk",
            RiskTier::Medium => "Medium Risk",
            RiskTier::High => "High Risk",
        }
    }
}

/// A single holding, owned by the `InvestmentRepository`.
///
/// Field names follow the persisted holdings layout (camelCase), so exported
/// snapshots stay readable by older tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    /// Opaque unique identifier, assigned by the repository.
    pub id: String,

    /// Upper-cased ticker symbol, or empty.
    #[serde(default)]
    pub ticker: String,

    /// Display name. At least one of `ticker` / `name` is non-empty.
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type")]
    pub investment_type: InvestmentType,

    pub current_shares: f64,
    pub cost_basis_per_share: f64,
    pub current_price_per_share: f64,

    #[serde(default)]
    pub monthly_contribution: f64,

    /// Expected annual return in percent. May be negative.
    #[serde(default = "default_expected_return")]
    pub expected_annual_return: f64,

    /// Normalized (trimmed, lower-cased), deduplicated tags.
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    pub last_price_update: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_expected_return() -> f64 {
    DEFAULT_EXPECTED_RETURN
}

impl Investment {
    /// `current_shares × current_price_per_share`
    pub fn current_value(&self) -> f64 {
        self.current_shares * self.current_price_per_share
    }

    /// `current_shares × cost_basis_per_share`
    pub fn cost_basis(&self) -> f64 {
        self.current_shares * self.cost_basis_per_share
    }

    pub fn unrealized_gain(&self) -> f64 {
        self.current_value() - self.cost_basis()
    }

    /// Gain as a percentage of cost basis; 0 when there is no cost basis.
    pub fn unrealized_gain_pct(&self) -> f64 {
        let cost = self.cost_basis();
        if cost > 0.0 {
            (self.unrealized_gain() / cost) * 100.0
        } else {
            0.0
        }
    }

    /// Ticker if present, otherwise the name.
    pub fn display_name(&self) -> &str {
        if self.ticker.is_empty() {
            &self.name
        } else {
            &self.ticker
        }
    }

    pub fn risk_tier(&self) -> RiskTier {
        self.investment_type.risk_tier()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Input for `InvestmentRepository::add`. The repository assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvestment {
    #[serde(default)]
    pub ticker: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub investment_type: InvestmentType,
    #[serde(default)]
    pub current_shares: f64,
    #[serde(default)]
    pub cost_basis_per_share: f64,
    #[serde(default)]
    pub current_price_per_share: f64,
    #[serde(default)]
    pub monthly_contribution: f64,
    /// `None` → the type's default return.
    #[serde(default)]
    pub expected_annual_return: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewInvestment {
    pub fn new(
        ticker: impl Into<String>,
        name: impl Into<String>,
        investment_type: InvestmentType,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            name: name.into(),
            investment_type,
            current_shares: 0.0,
            cost_basis_per_share: 0.0,
            current_price_per_share: 0.0,
            monthly_contribution: 0.0,
            expected_annual_return: None,
            tags: Vec::new(),
            notes: None,
        }
    }

    /// Set shares, cost basis per share and current price per share.
    pub fn with_position(mut self, shares: f64, cost_basis: f64, price: f64) -> Self {
        self.current_shares = shares;
        self.cost_basis_per_share = cost_basis;
        self.current_price_per_share = price;
        self
    }

    pub fn with_monthly_contribution(mut self, amount: f64) -> Self {
        self.monthly_contribution = amount;
        self
    }

    pub fn with_expected_return(mut self, pct: f64) -> Self {
        self.expected_annual_return = Some(pct);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Partial update for `InvestmentRepository::update`. `None` leaves a field as is.
///
/// `notes` and `last_price_update` are doubly optional: `Some(None)` clears them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvestmentPatch {
    pub ticker: Option<String>,
    pub name: Option<String>,
    pub investment_type: Option<InvestmentType>,
    pub current_shares: Option<f64>,
    pub cost_basis_per_share: Option<f64>,
    pub current_price_per_share: Option<f64>,
    pub monthly_contribution: Option<f64>,
    pub expected_annual_return: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub notes: Option<Option<String>>,
    pub last_price_update: Option<Option<DateTime<Utc>>>,
}

impl InvestmentPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Normalize a raw tag: trim and lower-case. Returns `None` when nothing is left.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Normalize a list of tags, dropping empties and duplicates while keeping first-seen order.
pub fn normalize_tags<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for tag in raw.iter().filter_map(|t| normalize_tag(t.as_ref())) {
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}
