//! Opportunity calculator: one source product paired with one marketplace
//! listing, priced through the cost model.

use flipscan_core::{FeeSchedule, FulfillmentMethod, MarketplaceProduct, SourceProduct};
use serde::Serialize;

use crate::costs::{compute_costs, CostBreakdown, CostInputs};
use crate::error::EngineError;

/// A priced buy-here, sell-there pairing.
///
/// Fields are read-only; a changed price means calculating a new
/// `Opportunity`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opportunity {
    id: String,
    source: SourceProduct,
    marketplace: MarketplaceProduct,
    method: FulfillmentMethod,
    costs: CostBreakdown,
    profit: f64,
    roi: Option<f64>,
}

impl Opportunity {
    /// Deterministic key `store:source_id:marketplace_id:method`.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn source(&self) -> &SourceProduct {
        &self.source
    }

    #[must_use]
    pub fn marketplace(&self) -> &MarketplaceProduct {
        &self.marketplace
    }

    #[must_use]
    pub fn method(&self) -> FulfillmentMethod {
        self.method
    }

    #[must_use]
    pub fn costs(&self) -> &CostBreakdown {
        &self.costs
    }

    /// Marketplace price minus total cost.
    #[must_use]
    pub fn profit(&self) -> f64 {
        self.profit
    }

    /// Return on the buy price, in percent. `None` when the item was free.
    #[must_use]
    pub fn roi(&self) -> Option<f64> {
        self.roi
    }

    /// ROI rounded to one decimal place for display.
    #[must_use]
    pub fn roi_display(&self) -> Option<f64> {
        self.roi.map(|r| (r * 10.0).round() / 10.0)
    }

    #[must_use]
    pub fn is_profitable(&self) -> bool {
        self.profit > 0.0
    }

    /// Price the listing sells at. Always positive.
    #[must_use]
    pub fn sell_price(&self) -> f64 {
        self.marketplace.price.unwrap_or_default()
    }

    /// Category used for fee lookup: the retailer's, else the listing's.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.source
            .category
            .as_deref()
            .or(self.marketplace.category.as_deref())
    }
}

/// Price `source` against `marketplace` under `method`.
///
/// # Errors
///
/// - [`EngineError::IncompatibleProducts`] if the listing has no positive
///   price or the source price is missing or negative.
/// - [`EngineError::InvalidInput`] for a bad weight or dimension.
/// - [`EngineError::Configuration`] if the schedule cannot price the item.
pub fn calculate_opportunity(
    schedule: &FeeSchedule,
    source: &SourceProduct,
    marketplace: &MarketplaceProduct,
    method: FulfillmentMethod,
) -> Result<Opportunity, EngineError> {
    let incompatible = |reason: String| EngineError::IncompatibleProducts {
        source_id: source.id.clone(),
        marketplace_id: marketplace.id.clone(),
        reason,
    };

    let sell_price = match marketplace.price {
        Some(p) if p.is_finite() && p > 0.0 => p,
        Some(p) => return Err(incompatible(format!("marketplace price {p} is not positive"))),
        None => return Err(incompatible("marketplace price is missing".to_string())),
    };
    let buy_price = match source.price {
        Some(p) if p.is_finite() && p >= 0.0 => p,
        Some(p) => return Err(incompatible(format!("source price {p} is negative"))),
        None => return Err(incompatible("source price is missing".to_string())),
    };

    let category = source
        .category
        .as_deref()
        .or(marketplace.category.as_deref());

    let costs = compute_costs(
        schedule,
        &CostInputs {
            buy_price,
            sell_price,
            category,
            weight_lb: source.weight_lb,
            dimensions: source.dimensions,
            method,
        },
    )?;

    let profit = sell_price - (buy_price + costs.fees_total());
    let roi = (buy_price > 0.0).then(|| profit / buy_price * 100.0);

    Ok(Opportunity {
        id: opportunity_id(source, marketplace, method),
        source: source.clone(),
        marketplace: marketplace.clone(),
        method,
        costs,
        profit,
        roi,
    })
}

fn opportunity_id(
    source: &SourceProduct,
    marketplace: &MarketplaceProduct,
    method: FulfillmentMethod,
) -> String {
    format!(
        "{}:{}:{}:{}",
        source.store,
        source.id,
        marketplace.id,
        method.code()
    )
}
