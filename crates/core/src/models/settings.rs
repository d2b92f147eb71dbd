use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::CoreError;

/// Runtime configuration for the engine and its collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the backend serving projections, ticker search and quotes.
    pub api_base_url: String,

    /// Horizon for per-investment and comparison projections.
    pub default_projection_years: u32,

    /// Horizon used when estimating the year the goal is crossed.
    pub goal_projection_years: u32,

    /// Durable-store key holding `{investments, tags}`.
    pub holdings_key: String,

    /// Durable-store key holding the goal snapshot (read-only here).
    pub goal_key: String,

    pub request_timeout_secs: u64,

    /// Directory for the file-backed store. `None` means the host supplies a store.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            default_projection_years: 30,
            goal_projection_years: 60,
            holdings_key: "fire-investments".to_string(),
            goal_key: "fire-calculator-results".to_string(),
            request_timeout_secs: 30,
            data_dir: None,
        }
    }
}

impl Settings {
    /// Defaults overridden by `FIRE_API_BASE_URL`, `FIRE_PROJECTION_YEARS`,
    /// `FIRE_GOAL_PROJECTION_YEARS` and `FIRE_DATA_DIR`. Unparseable numbers
    /// keep the default.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Ok(url) = std::env::var("FIRE_API_BASE_URL") {
            settings.api_base_url = url;
        }
        if let Some(years) = env_u32("FIRE_PROJECTION_YEARS") {
            settings.default_projection_years = years;
        }
        if let Some(years) = env_u32("FIRE_GOAL_PROJECTION_YEARS") {
            settings.goal_projection_years = years;
        }
        if let Ok(dir) = std::env::var("FIRE_DATA_DIR") {
            settings.data_dir = Some(PathBuf::from(dir));
        }
        settings
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.api_base_url.trim().is_empty() {
            return Err(CoreError::Validation("api_base_url must not be empty".into()));
        }
        if self.default_projection_years == 0 || self.goal_projection_years == 0 {
            return Err(CoreError::Validation(
                "projection horizons must be at least one year".into(),
            ));
        }
        if self.holdings_key.is_empty() || self.goal_key.is_empty() {
            return Err(CoreError::Validation("storage keys must not be empty".into()));
        }
        if self.holdings_key == self.goal_key {
            return Err(CoreError::Validation(
                "holdings and goal must use different storage keys".into(),
            ));
        }
        Ok(())
    }
}

fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
