use thiserror::Error;

/// Main error type for the ranking engine
#[derive(Error, Debug)]
pub enum LaurelError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Data source errors (fatal to a run, retried by the scheduler)
    #[error("Data source unavailable: {store} - {reason}")]
    DataSourceUnavailable { store: String, reason: String },

    #[error("Data source timed out: {store} after {elapsed_ms}ms")]
    DataSourceTimeout { store: String, elapsed_ms: u64 },

    // Domain errors
    #[error("Unknown position code: {0}")]
    UnknownPosition(String),

    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Notification dispatch failed: {0}")]
    Dispatch(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl LaurelError {
    /// Wrap a store failure so the run aborts before any write
    pub fn unavailable(store: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        LaurelError::DataSourceUnavailable {
            store: store.into(),
            reason: reason.to_string(),
        }
    }

    /// True for errors that abort a run and should be retried wholesale
    pub fn is_source_failure(&self) -> bool {
        matches!(
            self,
            LaurelError::DataSourceUnavailable { .. }
                | LaurelError::DataSourceTimeout { .. }
                | LaurelError::Database(_)
        )
    }
}

/// Result type alias for LaurelError
pub type Result<T> = std::result::Result<T, LaurelError>;

/// A match fact lacks a field required to score it.
///
/// Zero is a valid score, so an unscoreable fact must never be scored as zero.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Missing match data for player {player_id} in match {match_id}: {}", .missing.join(", "))]
pub struct MissingMatchDataError {
    pub player_id: String,
    pub match_id: String,
    pub missing: Vec<&'static str>,
}

impl From<MissingMatchDataError> for LaurelError {
    fn from(err: MissingMatchDataError) -> Self {
        LaurelError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_match_data_message() {
        let err = MissingMatchDataError {
            player_id: "p1".to_string(),
            match_id: "m1".to_string(),
            missing: vec!["minutes_played", "result"],
        };
        assert_eq!(
            err.to_string(),
            "Missing match data for player p1 in match m1: minutes_played, result"
        );
    }

    #[test]
    fn test_source_failure_classification() {
        assert!(LaurelError::unavailable("warehouse", "connection reset").is_source_failure());
        assert!(LaurelError::DataSourceTimeout {
            store: "warehouse".to_string(),
            elapsed_ms: 30_000
        }
        .is_source_failure());
        assert!(!LaurelError::Validation("bad".to_string()).is_source_failure());
    }

    #[test]
    fn test_invalid_config_lists_every_violation() {
        let err = LaurelError::InvalidConfig(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "Invalid configuration: a; b");
    }
}
