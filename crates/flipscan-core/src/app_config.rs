use std::path::PathBuf;

use crate::criteria::FilterCriteria;
use crate::fees::{load_fee_schedule, FeeSchedule};
use crate::products::FulfillmentMethod;
use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    /// Only needed by commands that touch the store.
    pub database_url: Option<String>,
    pub env: Environment,
    pub log_level: String,
    /// YAML fee schedule; built-in defaults when unset.
    pub fees_path: Option<PathBuf>,
    pub fulfillment: FulfillmentMethod,
    pub min_roi: Option<f64>,
    pub min_profit: Option<f64>,
    pub max_reviews: Option<u32>,
    pub sales_rank_percentile: Option<f64>,
    pub top_n: usize,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl AppConfig {
    /// Filter thresholds seeded from the environment. CLI flags override
    /// individual fields afterwards.
    #[must_use]
    pub fn filter_criteria(&self) -> FilterCriteria {
        FilterCriteria {
            min_roi: self.min_roi,
            min_profit: self.min_profit,
            max_reviews: self.max_reviews,
            sales_rank_percentile: self.sales_rank_percentile,
            ..FilterCriteria::default()
        }
    }

    /// Load the configured fee schedule, or the built-in one when no path is set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configured file cannot be read, parsed, or
    /// fails validation.
    pub fn fee_schedule(&self) -> Result<FeeSchedule, ConfigError> {
        match &self.fees_path {
            Some(path) => load_fee_schedule(path),
            None => Ok(FeeSchedule::default()),
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if `DATABASE_URL` is unset.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("fees_path", &self.fees_path)
            .field("fulfillment", &self.fulfillment)
            .field("min_roi", &self.min_roi)
            .field("min_profit", &self.min_profit)
            .field("max_reviews", &self.max_reviews)
            .field("sales_rank_percentile", &self.sales_rank_percentile)
            .field("top_n", &self.top_n)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
