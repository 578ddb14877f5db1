//! Cost model: marketplace referral fees, fulfillment, inbound shipping,
//! and incidental costs for one unit.
//!
//! Everything here is a pure function of its inputs and the [`FeeSchedule`].

use flipscan_core::{Dimensions, FeeSchedule, FulfillmentMethod, SizeTier};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Inputs to [`compute_costs`]. Missing weight and dimensions fall back to the
/// schedule defaults.
#[derive(Debug, Clone, Copy)]
pub struct CostInputs<'a> {
    pub buy_price: f64,
    pub sell_price: f64,
    pub category: Option<&'a str>,
    pub weight_lb: Option<f64>,
    pub dimensions: Option<Dimensions>,
    pub method: FulfillmentMethod,
}

/// Per-unit cost of buying at retail and selling on the marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub buy_price: f64,
    /// Referral fee charged on the sell price.
    pub marketplace_fees: f64,
    /// Seller shipping (self-fulfilled) or pick, pack, weight handling and
    /// storage (marketplace-fulfilled).
    pub fulfillment_cost: f64,
    /// Inbound freight to the fulfillment center. Zero when self-fulfilled.
    pub shipping_to_center: f64,
    /// Packaging, labels, and similar incidentals.
    pub other_costs: f64,
    /// Referral percentage that produced `marketplace_fees`.
    pub referral_rate: f64,
    /// Size tier used for marketplace-fulfilled fees.
    pub size_tier: Option<SizeTier>,
}

impl CostBreakdown {
    /// Every cost on top of the buy price.
    #[must_use]
    pub fn fees_total(&self) -> f64 {
        self.marketplace_fees + self.fulfillment_cost + self.shipping_to_center + self.other_costs
    }

    /// Buy price plus [`fees_total`](Self::fees_total).
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.buy_price + self.fees_total()
    }
}

/// Classify a package into a marketplace size tier.
///
/// Oversize tiers beyond "small" are separated by length plus girth: up to
/// 130 in is medium, up to 165 in is large, anything bigger or heavier than
/// 150 lb is special.
#[must_use]
pub fn classify_size_tier(weight_lb: f64, dims: &Dimensions) -> SizeTier {
    let longest = dims.longest();
    let shortest = dims.shortest();

    if longest <= 15.0 && shortest <= 0.75 && weight_lb <= 0.5 {
        SizeTier::SmallStandard
    } else if longest <= 18.0 && shortest <= 8.0 && weight_lb <= 20.0 {
        SizeTier::LargeStandard
    } else if longest <= 60.0 && shortest <= 30.0 && weight_lb <= 70.0 {
        SizeTier::SmallOversize
    } else if longest <= 108.0 && weight_lb <= 150.0 && dims.length_plus_girth() <= 130.0 {
        SizeTier::MediumOversize
    } else if longest <= 108.0 && weight_lb <= 150.0 && dims.length_plus_girth() <= 165.0 {
        SizeTier::LargeOversize
    } else {
        SizeTier::SpecialOversize
    }
}

/// Compute the full cost breakdown for one unit.
///
/// # Errors
///
/// Returns [`EngineError::InvalidInput`] for a negative or non-finite price,
/// weight, or dimension, and [`EngineError::Configuration`] when the schedule
/// has no referral rate for the category or no fee row for the size tier.
pub fn compute_costs(
    schedule: &FeeSchedule,
    inputs: &CostInputs<'_>,
) -> Result<CostBreakdown, EngineError> {
    check_amount("buy_price", inputs.buy_price)?;
    check_amount("sell_price", inputs.sell_price)?;

    let weight_lb = inputs.weight_lb.unwrap_or(schedule.default_weight_lb);
    check_amount("weight_lb", weight_lb)?;
    let dims = inputs.dimensions.unwrap_or(schedule.default_dimensions);
    check_amount("dimensions.length_in", dims.length_in)?;
    check_amount("dimensions.width_in", dims.width_in)?;
    check_amount("dimensions.height_in", dims.height_in)?;

    let referral_rate = schedule.referral_rate(inputs.category).ok_or_else(|| {
        EngineError::Configuration(format!(
            "no referral rate for category '{}' and no default rate configured",
            inputs.category.unwrap_or("<none>")
        ))
    })?;
    let marketplace_fees = inputs.sell_price * referral_rate / 100.0;

    let (fulfillment_cost, shipping_to_center, size_tier) = match inputs.method {
        FulfillmentMethod::SelfFulfilled => (schedule.self_fulfilled.fee_for(weight_lb), 0.0, None),
        FulfillmentMethod::Marketplace => {
            let tier = classify_size_tier(weight_lb, &dims);
            let fees = schedule.tier_fees(tier).ok_or_else(|| {
                EngineError::Configuration(format!("fee table has no row for size tier {tier}"))
            })?;
            let handling = fees.weight_handling.fee_for(weight_lb);
            let storage = fees.storage_per_cubic_foot * dims.cubic_feet();
            (
                handling + fees.pick_pack + storage,
                weight_lb * schedule.shipping_to_center_per_lb,
                Some(tier),
            )
        }
    };

    let other_costs = inputs.buy_price * schedule.other_costs_rate / 100.0;

    Ok(CostBreakdown {
        buy_price: inputs.buy_price,
        marketplace_fees,
        fulfillment_cost,
        shipping_to_center,
        other_costs,
        referral_rate,
        size_tier,
    })
}

fn check_amount(field: &'static str, value: f64) -> Result<(), EngineError> {
    if !value.is_finite() {
        return Err(EngineError::InvalidInput {
            field,
            reason: format!("must be a finite number, got {value}"),
        });
    }
    if value < 0.0 {
        return Err(EngineError::InvalidInput {
            field,
            reason: format!("must not be negative, got {value}"),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "costs_test.rs"]
mod tests;
