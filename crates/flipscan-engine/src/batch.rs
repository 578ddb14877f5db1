//! Batch driver: match scanned source products to marketplace listings and
//! price every matched pair.

use std::collections::HashMap;

use flipscan_core::{FeeSchedule, FulfillmentMethod, MarketplaceProduct, SourceProduct};
use serde::Serialize;

use crate::calculator::{calculate_opportunity, Opportunity};
use crate::error::EngineError;

/// A source/listing pair that could not be priced.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedPair {
    pub source_id: String,
    pub marketplace_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub opportunities: Vec<Opportunity>,
    pub skipped: Vec<SkippedPair>,
    /// Source products with no listing under any of their match keys.
    pub unmatched: usize,
}

/// Listing for `source`, looked up by UPC, then SKU, then source id.
#[must_use]
pub fn match_listing<'a>(
    source: &SourceProduct,
    listings: &'a HashMap<String, MarketplaceProduct>,
) -> Option<&'a MarketplaceProduct> {
    [source.upc.as_deref(), source.sku.as_deref(), Some(source.id.as_str())]
        .into_iter()
        .flatten()
        .filter(|key| !key.trim().is_empty())
        .find_map(|key| listings.get(key.trim()))
}

/// Price every source product that has a matching listing.
///
/// Per-pair failures are logged and recorded in [`BatchOutcome::skipped`];
/// the batch carries on.
///
/// # Errors
///
/// Returns [`EngineError::Configuration`] before pricing anything if the
/// schedule fails validation or has no fulfillment tiers for a
/// marketplace-fulfilled batch.
pub fn calculate_batch(
    schedule: &FeeSchedule,
    sources: &[SourceProduct],
    listings: &HashMap<String, MarketplaceProduct>,
    method: FulfillmentMethod,
) -> Result<BatchOutcome, EngineError> {
    schedule.validate()?;
    if method == FulfillmentMethod::Marketplace && schedule.marketplace_tiers.is_empty() {
        return Err(EngineError::Configuration(
            "fee table has no marketplace fulfillment tiers".to_string(),
        ));
    }

    let mut outcome = BatchOutcome::default();

    for source in sources {
        let Some(listing) = match_listing(source, listings) else {
            tracing::debug!(source_id = %source.id, store = %source.store, "no matching listing");
            outcome.unmatched += 1;
            continue;
        };

        match calculate_opportunity(schedule, source, listing, method) {
            Ok(opp) => outcome.opportunities.push(opp),
            Err(e) => {
                tracing::warn!(
                    source_id = %source.id,
                    marketplace_id = %listing.id,
                    error = %e,
                    "skipping pair"
                );
                outcome.skipped.push(SkippedPair {
                    source_id: source.id.clone(),
                    marketplace_id: listing.id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        sources = sources.len(),
        priced = outcome.opportunities.len(),
        skipped = outcome.skipped.len(),
        unmatched = outcome.unmatched,
        method = %method,
        "batch priced"
    );

    Ok(outcome)
}
