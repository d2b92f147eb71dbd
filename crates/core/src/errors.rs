use thiserror::Error;

/// Unified error type for the entire fire-portfolio-core library.
/// Every public fallible function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Business Logic ──────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Investment not found: {0}")]
    InvestmentNotFound(String),

    // ── Storage ─────────────────────────────────────────────────────
    /// The in-memory mutation succeeded but could not be written through.
    /// The repository stays dirty until a later `flush` succeeds.
    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("File I/O error: {0}")]
    FileIO(String),

    // ── Collaborators ───────────────────────────────────────────────
    #[error("{service} unavailable: {message}")]
    CollaboratorUnavailable { service: String, message: String },

    #[error("No quote provider available: {0}")]
    NoProvider(String),
}

impl CoreError {
    /// Shorthand for a `CollaboratorUnavailable` error.
    pub fn unavailable(service: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::CollaboratorUnavailable {
            service: service.into(),
            message: message.into(),
        }
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Strip query parameters: search terms and keys travel in the URL.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::unavailable("HTTP backend", sanitized)
    }
}
