use crate::domain::RoleCategory;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    /// Analytical warehouse; omitted means operational store only
    #[serde(default)]
    pub warehouse: Option<WarehouseConfig>,
    #[serde(default)]
    pub scoring: ScoringWeights,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseConfig {
    /// Connection URL of the warehouse (Postgres wire protocol)
    pub url: String,
    #[serde(default = "default_warehouse_connections")]
    pub max_connections: u32,
}

fn default_warehouse_connections() -> u32 {
    2
}

/// Named weights of the match score formula
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoringWeights {
    pub goal: f64,
    pub assist: f64,
    pub minute: f64,
    pub win: f64,
    pub draw: f64,
    pub loss: f64,
    pub red_card: f64,
    pub yellow_card: f64,
    pub goal_for: f64,
    pub goal_against: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            goal: 10.0,
            assist: 6.0,
            minute: 0.1,
            win: 30.0,
            draw: 0.0,
            loss: -20.0,
            red_card: -10.0,
            yellow_card: -3.0,
            goal_for: 1.0,
            goal_against: -1.0,
        }
    }
}

impl ScoringWeights {
    fn validate(&self, errors: &mut Vec<String>) {
        let all = [
            self.goal,
            self.assist,
            self.minute,
            self.win,
            self.draw,
            self.loss,
            self.red_card,
            self.yellow_card,
            self.goal_for,
            self.goal_against,
        ];
        if all.iter().any(|w| !w.is_finite()) {
            errors.push("scoring weights must be finite".to_string());
        }
        if !(self.win >= self.draw && self.draw >= self.loss) {
            errors.push("scoring.win >= scoring.draw >= scoring.loss must hold".to_string());
        }
        if self.red_card > 0.0 || self.yellow_card > 0.0 {
            errors.push("card weights must be penalties (<= 0)".to_string());
        }
        if self.goal_for < 0.0 || self.goal_against > 0.0 {
            errors.push("goal_for must be >= 0 and goal_against <= 0".to_string());
        }
    }
}

/// Per-category roster sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CategoryQuotas {
    pub defenders: usize,
    pub midfielders: usize,
    pub forwards: usize,
    pub goalkeeper: usize,
}

impl Default for CategoryQuotas {
    fn default() -> Self {
        Self {
            defenders: 4,
            midfielders: 3,
            forwards: 3,
            goalkeeper: 1,
        }
    }
}

impl CategoryQuotas {
    pub fn for_category(&self, category: RoleCategory) -> usize {
        match category {
            RoleCategory::Defenders => self.defenders,
            RoleCategory::Midfielders => self.midfielders,
            RoleCategory::Forwards => self.forwards,
            RoleCategory::Goalkeeper => self.goalkeeper,
        }
    }

    pub fn total(&self) -> usize {
        self.defenders + self.midfielders + self.forwards + self.goalkeeper
    }
}

/// How aggregated entries are partitioned into teams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    #[default]
    Global,
    Country,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectionConfig {
    #[serde(default)]
    pub quotas: CategoryQuotas,
    /// Minimum distinct players in a group before a team is selected
    #[serde(default = "default_min_candidates")]
    pub min_candidates: usize,
    /// Bonus per "most valuable teammate" vote
    #[serde(default = "default_vote_weight")]
    pub vote_weight: f64,
    #[serde(default)]
    pub grouping: Grouping,
}

fn default_min_candidates() -> usize {
    20
}

fn default_vote_weight() -> f64 {
    5.0
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            quotas: CategoryQuotas::default(),
            min_candidates: default_min_candidates(),
            vote_weight: default_vote_weight(),
            grouping: Grouping::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Push gateway webhook; unset disables delivery (sends are logged only)
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Maximum sends per recipient per category per day
    #[serde(default = "default_daily_cap")]
    pub daily_cap: u32,
    /// Concurrent dispatches during fan-out
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_daily_cap() -> u32 {
    3
}

fn default_max_concurrent() -> usize {
    8
}

fn default_request_timeout_ms() -> u64 {
    5000
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            daily_cap: default_daily_cap(),
            max_concurrent: default_max_concurrent(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    /// Timeout for each fact query, operational and warehouse alike
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
    /// Persist aggregated entries as an audit snapshot
    #[serde(default)]
    pub persist_snapshots: bool,
}

fn default_query_timeout() -> u64 {
    30
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            query_timeout_secs: default_query_timeout(),
            persist_snapshots: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("database.max_connections", 5)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Environment-specific file (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("LAUREL_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // LAUREL_DATABASE__URL, LAUREL_SELECTION__MIN_CANDIDATES, ...
            .add_source(
                Environment::with_prefix("LAUREL")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Configuration for local runs against a single database
    pub fn default_config(database_url: &str) -> Self {
        Self {
            database: DatabaseConfig {
                url: database_url.to_string(),
                max_connections: default_max_connections(),
            },
            warehouse: None,
            scoring: ScoringWeights::default(),
            selection: SelectionConfig::default(),
            notifications: NotificationConfig::default(),
            sources: SourcesConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration values, reporting every violation
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        self.scoring.validate(&mut errors);

        if self.selection.quotas.total() == 0 {
            errors.push("selection.quotas must select at least one player".to_string());
        }
        if !self.selection.vote_weight.is_finite() || self.selection.vote_weight < 0.0 {
            errors.push("selection.vote_weight must be a non-negative number".to_string());
        }

        if self.notifications.max_concurrent == 0 {
            errors.push("notifications.max_concurrent must be positive".to_string());
        }

        if self.sources.query_timeout_secs == 0 {
            errors.push("sources.query_timeout_secs must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default_config("postgres://localhost/laurel");
        assert!(config.validate().is_ok());
        assert_eq!(config.selection.quotas.total(), 11);
    }

    #[test]
    fn test_rejects_inverted_result_bonus() {
        let mut config = AppConfig::default_config("postgres://localhost/laurel");
        config.scoring.loss = 40.0;
        config.scoring.yellow_card = 1.0;
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("win"));
    }

    #[test]
    fn test_quota_lookup() {
        let quotas = CategoryQuotas::default();
        assert_eq!(quotas.for_category(RoleCategory::Defenders), 4);
        assert_eq!(quotas.for_category(RoleCategory::Goalkeeper), 1);
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = std::env::temp_dir().join(format!("laurel-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("default.toml"),
            r#"
            [database]
            url = "postgres://db/laurel"

            [selection]
            min_candidates = 5
            grouping = "country"

            [selection.quotas]
            defenders = 2
            midfielders = 2
            forwards = 1
            goalkeeper = 1
            "#,
        )
        .unwrap();

        let config = AppConfig::load_from(&dir).unwrap();
        assert_eq!(config.database.url, "postgres://db/laurel");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.selection.min_candidates, 5);
        assert_eq!(config.selection.grouping, Grouping::Country);
        assert_eq!(config.selection.quotas.total(), 6);
        assert_eq!(config.scoring, ScoringWeights::default());
        assert!(config.warehouse.is_none());

        std::fs::remove_dir_all(&dir).ok();
    }
}
