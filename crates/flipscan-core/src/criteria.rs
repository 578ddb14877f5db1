use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::products::normalize_category;

/// Thresholds an opportunity must meet to be surfaced.
///
/// Every threshold is optional; `None` disables that check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    /// Minimum ROI, in percent.
    pub min_roi: Option<f64>,
    /// Minimum profit per unit, in dollars.
    pub min_profit: Option<f64>,
    /// Maximum marketplace review count. Few reviews means little
    /// entrenched competition on the listing.
    pub max_reviews: Option<u32>,
    /// Let listings without a review count through the review check.
    pub allow_missing_reviews: bool,
    /// Sales-rank percentile a listing must fall within, e.g. `5.0` keeps the
    /// best-selling 5% of its category.
    pub sales_rank_percentile: Option<f64>,
    /// Per-category override of `sales_rank_percentile`.
    pub category_percentiles: BTreeMap<String, f64>,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            min_roi: Some(40.0),
            min_profit: None,
            max_reviews: Some(20),
            allow_missing_reviews: false,
            sales_rank_percentile: Some(5.0),
            category_percentiles: BTreeMap::new(),
        }
    }
}

impl FilterCriteria {
    /// Criteria with every check disabled.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            min_roi: None,
            min_profit: None,
            max_reviews: None,
            allow_missing_reviews: true,
            sales_rank_percentile: None,
            category_percentiles: BTreeMap::new(),
        }
    }

    /// Percentile that applies to `category`: its override if one exists,
    /// otherwise the global `sales_rank_percentile`.
    #[must_use]
    pub fn percentile_for(&self, category: &str) -> Option<f64> {
        let wanted = normalize_category(category);
        self.category_percentiles
            .iter()
            .find(|(name, _)| normalize_category(name) == wanted)
            .map(|(_, p)| *p)
            .or(self.sales_rank_percentile)
    }

    /// `true` if any sales-rank check is configured.
    #[must_use]
    pub fn uses_sales_rank(&self) -> bool {
        self.sales_rank_percentile.is_some() || !self.category_percentiles.is_empty()
    }
}

/// Parse a threshold such as a minimum ROI or profit. Must be finite and
/// non-negative.
///
/// # Errors
///
/// Returns a message describing why `raw` was rejected.
pub fn parse_threshold(raw: &str) -> Result<f64, String> {
    let value = raw.trim().parse::<f64>().map_err(|e| e.to_string())?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("must be a non-negative number, got {}", raw.trim()));
    }
    Ok(value)
}

/// Parse a sales-rank percentile in `0..=100`.
///
/// # Errors
///
/// Returns a message describing why `raw` was rejected.
pub fn parse_percentile(raw: &str) -> Result<f64, String> {
    let value = parse_threshold(raw)?;
    if value > 100.0 {
        return Err(format!("must be at most 100, got {value}"));
    }
    Ok(value)
}
