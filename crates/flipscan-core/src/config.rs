use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::{AppConfig, Environment};
use crate::criteria::{parse_percentile, parse_threshold};
use crate::products::FulfillmentMethod;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    // Thresholds accept "off" to disable the check entirely.
    let threshold = |var: &str, default: Option<&str>| -> Result<Option<f64>, ConfigError> {
        let raw = match lookup(var) {
            Ok(v) => v,
            Err(_) => match default {
                Some(d) => d.to_string(),
                None => return Ok(None),
            },
        };
        if raw.trim().eq_ignore_ascii_case("off") {
            return Ok(None);
        }
        parse_threshold(&raw).map(Some).map_err(|reason| invalid(var, reason))
    };

    let database_url = lookup("DATABASE_URL").ok().filter(|s| !s.is_empty());

    let env = parse_environment(&or_default("FLIPSCAN_ENV", "development"))?;
    let log_level = or_default("FLIPSCAN_LOG_LEVEL", "info");
    let fees_path = lookup("FLIPSCAN_FEES_PATH")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from);

    let fulfillment = FulfillmentMethod::from_str(&or_default("FLIPSCAN_FULFILLMENT", "fba"))
        .map_err(|e| invalid("FLIPSCAN_FULFILLMENT", e.to_string()))?;

    let min_roi = threshold("FLIPSCAN_MIN_ROI", Some("40"))?;
    let min_profit = threshold("FLIPSCAN_MIN_PROFIT", None)?;
    let sales_rank_percentile = match or_default("FLIPSCAN_SALES_RANK_PERCENTILE", "5") {
        raw if raw.trim().eq_ignore_ascii_case("off") => None,
        raw => Some(
            parse_percentile(&raw)
                .map_err(|reason| invalid("FLIPSCAN_SALES_RANK_PERCENTILE", reason))?,
        ),
    };

    let max_reviews = {
        let raw = or_default("FLIPSCAN_MAX_REVIEWS", "20");
        if raw.trim().eq_ignore_ascii_case("off") {
            None
        } else {
            Some(
                raw.trim()
                    .parse::<u32>()
                    .map_err(|e| invalid("FLIPSCAN_MAX_REVIEWS", e.to_string()))?,
            )
        }
    };

    let top_n = parse_usize("FLIPSCAN_TOP_N", "25")?;

    let db_max_connections = parse_u32("FLIPSCAN_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("FLIPSCAN_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("FLIPSCAN_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        fees_path,
        fulfillment,
        min_roi,
        min_profit,
        max_reviews,
        sales_rank_percentile,
        top_n,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "FLIPSCAN_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
