//! Marketplace fee schedule: referral rates, fulfillment fee tables, and the
//! defaults applied when a product carries no weight or dimensions.
//!
//! [`FeeSchedule::default`] carries the rates the tool has always used; a YAML
//! file loaded with [`load_fee_schedule`] overrides any subset of them.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::products::{normalize_category, Dimensions};
use crate::ConfigError;

/// Marketplace-fulfillment size tier, smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeTier {
    SmallStandard,
    LargeStandard,
    SmallOversize,
    MediumOversize,
    LargeOversize,
    SpecialOversize,
}

impl std::fmt::Display for SizeTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizeTier::SmallStandard => write!(f, "small_standard"),
            SizeTier::LargeStandard => write!(f, "large_standard"),
            SizeTier::SmallOversize => write!(f, "small_oversize"),
            SizeTier::MediumOversize => write!(f, "medium_oversize"),
            SizeTier::LargeOversize => write!(f, "large_oversize"),
            SizeTier::SpecialOversize => write!(f, "special_oversize"),
        }
    }
}

/// One row of a weight table: any weight up to `max_weight_lb` costs `fee`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightStep {
    pub max_weight_lb: f64,
    pub fee: f64,
}

/// Weight-banded fee: the first step whose ceiling covers the weight wins;
/// heavier items pay `overflow_base` plus `overflow_per_lb` for every pound
/// above `overflow_threshold_lb`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSchedule {
    pub steps: Vec<WeightStep>,
    pub overflow_base: f64,
    pub overflow_threshold_lb: f64,
    pub overflow_per_lb: f64,
}

impl WeightSchedule {
    #[must_use]
    pub fn fee_for(&self, weight_lb: f64) -> f64 {
        if let Some(step) = self.steps.iter().find(|s| weight_lb <= s.max_weight_lb) {
            return step.fee;
        }
        let over = (weight_lb - self.overflow_threshold_lb).max(0.0);
        self.overflow_base + over * self.overflow_per_lb
    }

    fn flat(max_weight_lb: f64, fee: f64, per_lb: f64) -> Self {
        Self {
            steps: vec![WeightStep { max_weight_lb, fee }],
            overflow_base: fee,
            overflow_threshold_lb: max_weight_lb,
            overflow_per_lb: per_lb,
        }
    }
}

/// Marketplace fulfillment fees for one size tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierFees {
    pub tier: SizeTier,
    pub weight_handling: WeightSchedule,
    pub pick_pack: f64,
    /// Monthly storage charge per cubic foot.
    pub storage_per_cubic_foot: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    /// Referral fee percentage applied when a category has no entry in
    /// `category_rates`. `None` makes an unmapped category a configuration
    /// error.
    pub default_referral_rate: Option<f64>,
    /// Referral fee percentage by category name (matched case-insensitively).
    pub category_rates: BTreeMap<String, f64>,
    /// Seller-paid shipping per order for self-fulfilled items.
    pub self_fulfilled: WeightSchedule,
    pub marketplace_tiers: Vec<TierFees>,
    /// Inbound freight to the fulfillment center, per pound.
    pub shipping_to_center_per_lb: f64,
    /// Packaging and labels, as a percentage of the buy price.
    pub other_costs_rate: f64,
    pub default_weight_lb: f64,
    pub default_dimensions: Dimensions,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            default_referral_rate: Some(15.0),
            category_rates: BTreeMap::new(),
            self_fulfilled: WeightSchedule {
                steps: vec![
                    WeightStep { max_weight_lb: 1.0, fee: 3.99 },
                    WeightStep { max_weight_lb: 2.0, fee: 5.99 },
                    WeightStep { max_weight_lb: 5.0, fee: 8.99 },
                    WeightStep { max_weight_lb: 10.0, fee: 12.99 },
                ],
                overflow_base: 12.99,
                overflow_threshold_lb: 10.0,
                overflow_per_lb: 0.50,
            },
            marketplace_tiers: default_marketplace_tiers(),
            shipping_to_center_per_lb: 0.50,
            other_costs_rate: 2.0,
            default_weight_lb: 1.0,
            default_dimensions: Dimensions::new(8.0, 6.0, 2.0),
        }
    }
}

fn default_marketplace_tiers() -> Vec<TierFees> {
    vec![
        TierFees {
            tier: SizeTier::SmallStandard,
            weight_handling: WeightSchedule {
                steps: vec![WeightStep { max_weight_lb: 0.5, fee: 2.16 }],
                overflow_base: 2.48,
                overflow_threshold_lb: 0.5,
                overflow_per_lb: 0.0,
            },
            pick_pack: 0.99,
            storage_per_cubic_foot: 0.75,
        },
        TierFees {
            tier: SizeTier::LargeStandard,
            weight_handling: WeightSchedule {
                steps: vec![
                    WeightStep { max_weight_lb: 1.0, fee: 2.73 },
                    WeightStep { max_weight_lb: 2.0, fee: 3.47 },
                ],
                overflow_base: 4.21,
                overflow_threshold_lb: 2.0,
                overflow_per_lb: 0.38,
            },
            pick_pack: 1.20,
            storage_per_cubic_foot: 0.75,
        },
        TierFees {
            tier: SizeTier::SmallOversize,
            weight_handling: WeightSchedule::flat(20.0, 8.26, 0.38),
            pick_pack: 4.72,
            storage_per_cubic_foot: 0.48,
        },
        TierFees {
            tier: SizeTier::MediumOversize,
            weight_handling: WeightSchedule::flat(40.0, 11.37, 0.39),
            pick_pack: 5.42,
            storage_per_cubic_foot: 0.48,
        },
        TierFees {
            tier: SizeTier::LargeOversize,
            weight_handling: WeightSchedule::flat(90.0, 76.57, 0.79),
            pick_pack: 10.53,
            storage_per_cubic_foot: 0.48,
        },
        TierFees {
            tier: SizeTier::SpecialOversize,
            weight_handling: WeightSchedule::flat(90.0, 137.32, 0.91),
            pick_pack: 13.34,
            storage_per_cubic_foot: 0.48,
        },
    ]
}

impl FeeSchedule {
    /// Referral percentage for `category`, falling back to
    /// `default_referral_rate` when the category is missing or unmapped.
    #[must_use]
    pub fn referral_rate(&self, category: Option<&str>) -> Option<f64> {
        let mapped = category.and_then(|c| {
            let wanted = normalize_category(c);
            self.category_rates
                .iter()
                .find(|(name, _)| normalize_category(name) == wanted)
                .map(|(_, rate)| *rate)
        });
        mapped.or(self.default_referral_rate)
    }

    #[must_use]
    pub fn tier_fees(&self, tier: SizeTier) -> Option<&TierFees> {
        self.marketplace_tiers.iter().find(|t| t.tier == tier)
    }

    /// Check the schedule for values no fee computation can use.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(rate) = self.default_referral_rate {
            check_rate("default_referral_rate", rate)?;
        }

        let mut seen_categories = HashSet::new();
        for (name, rate) in &self.category_rates {
            if name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "category name must be non-empty".to_string(),
                ));
            }
            if !seen_categories.insert(normalize_category(name)) {
                return Err(ConfigError::Validation(format!(
                    "duplicate category rate: '{name}'"
                )));
            }
            check_rate(&format!("category_rates.{name}"), *rate)?;
        }

        check_weight_schedule("self_fulfilled", &self.self_fulfilled)?;

        let mut seen_tiers = HashSet::new();
        for tier in &self.marketplace_tiers {
            if !seen_tiers.insert(tier.tier) {
                return Err(ConfigError::Validation(format!(
                    "duplicate marketplace tier: {}",
                    tier.tier
                )));
            }
            let label = format!("marketplace_tiers.{}", tier.tier);
            check_weight_schedule(&label, &tier.weight_handling)?;
            check_amount(&format!("{label}.pick_pack"), tier.pick_pack)?;
            check_amount(
                &format!("{label}.storage_per_cubic_foot"),
                tier.storage_per_cubic_foot,
            )?;
        }

        check_amount("shipping_to_center_per_lb", self.shipping_to_center_per_lb)?;
        check_rate("other_costs_rate", self.other_costs_rate)?;
        check_amount("default_weight_lb", self.default_weight_lb)?;
        let dims = self.default_dimensions;
        for (field, value) in [
            ("default_dimensions.length_in", dims.length_in),
            ("default_dimensions.width_in", dims.width_in),
            ("default_dimensions.height_in", dims.height_in),
        ] {
            check_amount(field, value)?;
        }

        Ok(())
    }
}

fn check_amount(field: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{field} must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}

fn check_rate(field: &str, value: f64) -> Result<(), ConfigError> {
    check_amount(field, value)?;
    if value > 100.0 {
        return Err(ConfigError::Validation(format!(
            "{field} is a percentage and must not exceed 100, got {value}"
        )));
    }
    Ok(())
}

fn check_weight_schedule(label: &str, schedule: &WeightSchedule) -> Result<(), ConfigError> {
    let mut previous = 0.0_f64;
    for step in &schedule.steps {
        check_amount(&format!("{label}.steps.max_weight_lb"), step.max_weight_lb)?;
        check_amount(&format!("{label}.steps.fee"), step.fee)?;
        if step.max_weight_lb < previous {
            return Err(ConfigError::Validation(format!(
                "{label}.steps must be sorted by max_weight_lb"
            )));
        }
        previous = step.max_weight_lb;
    }
    check_amount(&format!("{label}.overflow_base"), schedule.overflow_base)?;
    check_amount(
        &format!("{label}.overflow_threshold_lb"),
        schedule.overflow_threshold_lb,
    )?;
    check_amount(&format!("{label}.overflow_per_lb"), schedule.overflow_per_lb)
}

/// Load and validate a fee schedule from a YAML file.
///
/// Keys absent from the file keep their [`FeeSchedule::default`] values.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_fee_schedule(path: &Path) -> Result<FeeSchedule, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FeeFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_fee_schedule(&content)
}

/// Parse and validate a fee schedule from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the text cannot be parsed or fails validation.
pub fn parse_fee_schedule(content: &str) -> Result<FeeSchedule, ConfigError> {
    let schedule: FeeSchedule =
        serde_yaml::from_str(content).map_err(ConfigError::FeeFileParse)?;

    schedule.validate()?;

    Ok(schedule)
}

#[cfg(test)]
#[path = "fees_test.rs"]
mod tests;
