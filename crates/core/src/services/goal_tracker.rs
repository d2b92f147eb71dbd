use crate::models::goal::{CrossingEstimate, GoalProgress, GoalSnapshot, Milestone, YearlyBalance};
use crate::models::summary::PortfolioSummary;

/// Goal fractions reported as milestones, in percent.
pub const MILESTONE_PCTS: [u8; 4] = [25, 50, 75, 100];

/// Reconciles the current portfolio against a FI/RE goal.
///
/// Synchronous and deterministic: projections are fetched elsewhere and
/// handed in as `(year, total_balance)` pairs.
pub struct GoalTracker;

impl GoalTracker {
    pub fn new() -> Self {
        Self
    }

    /// Percentage of the goal reached (capped at 100) and amount remaining.
    #[must_use]
    pub fn progress(&self, summary: &PortfolioSummary, goal: &GoalSnapshot) -> GoalProgress {
        let fire_number = goal.fire_number;
        let total_value = summary.total_value;
        let pct = if fire_number > 0.0 {
            ((total_value / fire_number) * 100.0).min(100.0)
        } else {
            0.0
        };

        GoalProgress {
            total_value,
            fire_number,
            pct,
            remaining: (fire_number - total_value).max(0.0),
            monthly_contribution: summary.total_monthly_contribution,
            goal_reached: fire_number > 0.0 && total_value >= fire_number,
        }
    }

    /// First year whose projected balance meets the goal, if any within the
    /// supplied horizon. `None` means "beyond the projection window", not
    /// "unreachable". Balances must be ordered by ascending year.
    #[must_use]
    pub fn find_crossing_year(&self, balances: &[YearlyBalance], goal: &GoalSnapshot) -> Option<u32> {
        balances
            .iter()
            .find(|b| b.total_balance >= goal.fire_number)
            .map(|b| b.year)
    }

    /// Whether the portfolio has reached 25/50/75/100% of the goal.
    #[must_use]
    pub fn milestones(&self, summary: &PortfolioSummary, goal: &GoalSnapshot) -> Vec<Milestone> {
        MILESTONE_PCTS
            .iter()
            .map(|&pct| {
                let target_value = goal.fire_number * (f64::from(pct) / 100.0);
                Milestone {
                    pct,
                    target_value,
                    reached: summary.total_value >= target_value,
                }
            })
            .collect()
    }

    /// Crossing year, short-circuiting when today's value already meets the goal.
    #[must_use]
    pub fn crossing_estimate(
        &self,
        summary: &PortfolioSummary,
        goal: &GoalSnapshot,
        balances: &[YearlyBalance],
    ) -> CrossingEstimate {
        if self.progress(summary, goal).goal_reached {
            return CrossingEstimate::AlreadyReached;
        }
        match self.find_crossing_year(balances, goal) {
            Some(year) => CrossingEstimate::Projected(year),
            None => CrossingEstimate::BeyondHorizon,
        }
    }
}

impl Default for GoalTracker {
    fn default() -> Self {
        Self::new()
    }
}
