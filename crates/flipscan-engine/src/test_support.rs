use flipscan_core::{
    FeeSchedule, FulfillmentMethod, MarketplaceProduct, SourceProduct, WeightSchedule, WeightStep,
};

use crate::calculator::{calculate_opportunity, Opportunity};

/// Schedule with every fee at zero, so profit is exactly sell minus buy.
pub(crate) fn zero_fee_schedule() -> FeeSchedule {
    FeeSchedule {
        default_referral_rate: Some(0.0),
        self_fulfilled: WeightSchedule {
            steps: vec![WeightStep {
                max_weight_lb: 1_000.0,
                fee: 0.0,
            }],
            overflow_base: 0.0,
            overflow_threshold_lb: 1_000.0,
            overflow_per_lb: 0.0,
        },
        other_costs_rate: 0.0,
        ..FeeSchedule::default()
    }
}

pub(crate) fn source(store: &str, id: &str, price: f64) -> SourceProduct {
    SourceProduct {
        id: id.to_string(),
        title: format!("Item {id}"),
        store: store.to_string(),
        category: None,
        price: Some(price),
        original_price: None,
        upc: None,
        sku: None,
        brand: None,
        url: format!("https://{store}.example/p/{id}"),
        image_url: None,
        weight_lb: None,
        dimensions: None,
    }
}

pub(crate) fn listing(
    id: &str,
    price: f64,
    category: Option<&str>,
    sales_rank: Option<u64>,
    review_count: Option<u32>,
) -> MarketplaceProduct {
    MarketplaceProduct {
        id: id.to_string(),
        title: format!("Listing {id}"),
        category: category.map(str::to_string),
        price: Some(price),
        sales_rank,
        review_count,
        rating: None,
        features: vec![],
        url: format!("https://marketplace.example/dp/{id}"),
    }
}

/// Zero-fee opportunity with the given prices and listing attributes.
pub(crate) fn opportunity(
    id: &str,
    buy: f64,
    sell: f64,
    category: Option<&str>,
    sales_rank: Option<u64>,
    review_count: Option<u32>,
) -> Opportunity {
    calculate_opportunity(
        &zero_fee_schedule(),
        &source("walmart", id, buy),
        &listing(&format!("L-{id}"), sell, category, sales_rank, review_count),
        FulfillmentMethod::SelfFulfilled,
    )
    .expect("zero-fee opportunity")
}
