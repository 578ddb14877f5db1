pub mod app_config;
pub mod config;
pub mod criteria;
pub mod fees;
pub mod products;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use criteria::{parse_percentile, parse_threshold, FilterCriteria};
pub use fees::{
    load_fee_schedule, parse_fee_schedule, FeeSchedule, SizeTier, TierFees, WeightSchedule,
    WeightStep,
};
pub use products::{
    normalize_category, Dimensions, FulfillmentMethod, MarketplaceProduct, SourceProduct,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read fee schedule at {path}: {source}")]
    FeeFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse fee schedule: {0}")]
    FeeFileParse(#[source] serde_yaml::Error),

    #[error("fee schedule validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid fulfillment method: {0}")]
    InvalidFulfillmentMethod(String),
}
