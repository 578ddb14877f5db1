use thiserror::Error;

use flipscan_core::ConfigError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid input {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("cannot pair source {source_id} with listing {marketplace_id}: {reason}")]
    IncompatibleProducts {
        source_id: String,
        marketplace_id: String,
        reason: String,
    },

    #[error("fee configuration error: {0}")]
    Configuration(String),
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        EngineError::Configuration(err.to_string())
    }
}
