use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The FI/RE goal as last computed by the goal calculator.
///
/// Read-only here: it is loaded from the goal key and never written back.
/// Keys this crate does not model are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalSnapshot {
    /// Portfolio value considered sufficient for financial independence.
    pub fire_number: f64,

    #[serde(default)]
    pub inputs: Option<GoalInputs>,

    #[serde(rename = "calculatedAt", default)]
    pub calculated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub yearly_projections: Vec<GoalYearlyProjection>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GoalSnapshot {
    /// A bare goal with just a target, as used by hosts that compute it themselves.
    pub fn with_fire_number(fire_number: f64) -> Self {
        Self {
            fire_number,
            inputs: None,
            calculated_at: None,
            yearly_projections: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Annual expenses the goal was derived from, if the calculator recorded them.
    pub fn annual_expenses(&self) -> Option<f64> {
        self.inputs.as_ref().and_then(|i| i.annual_expenses)
    }
}

/// Calculator inputs that produced the goal. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalInputs {
    #[serde(default)]
    pub current_age: Option<u32>,
    #[serde(default)]
    pub retirement_age: Option<u32>,
    #[serde(default)]
    pub current_savings: Option<f64>,
    #[serde(default)]
    pub annual_income: Option<f64>,
    #[serde(default)]
    pub annual_expenses: Option<f64>,
    /// Percent of income saved.
    #[serde(default)]
    pub savings_rate: Option<f64>,
    /// Percent per year.
    #[serde(default)]
    pub expected_return: Option<f64>,
    /// Percent per year, typically 4.
    #[serde(default)]
    pub withdrawal_rate: Option<f64>,
}

/// One row of the calculator's own year-by-year path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalYearlyProjection {
    pub year: u32,
    #[serde(default)]
    pub age: Option<u32>,
    pub balance: f64,
    #[serde(default)]
    pub contributions: f64,
    #[serde(default)]
    pub investment_growth: f64,
}

/// A projected total portfolio balance at the end of `year`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearlyBalance {
    pub year: u32,
    pub total_balance: f64,
}

impl YearlyBalance {
    pub fn new(year: u32, total_balance: f64) -> Self {
        Self { year, total_balance }
    }
}

/// How far the current portfolio is from the goal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub total_value: f64,
    pub fire_number: f64,
    /// Capped at 100.
    pub pct: f64,
    /// Never negative.
    pub remaining: f64,
    pub monthly_contribution: f64,
    pub goal_reached: bool,
}

/// A fixed fraction of the goal and whether the portfolio has reached it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    /// 25, 50, 75 or 100.
    pub pct: u8,
    pub target_value: f64,
    pub reached: bool,
}

/// Outcome of looking for the year the projected portfolio crosses the goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrossingEstimate {
    /// First projected year with a balance at or above the goal.
    Projected(u32),
    /// Today's value already meets the goal.
    AlreadyReached,
    /// No projected year qualifies within the supplied horizon.
    BeyondHorizon,
}
