//! Opportunity filters.
//!
//! Each [`Filter`] is an independent predicate. A [`FilterPipeline`] ANDs
//! them together, so the surviving set does not depend on stage order;
//! [`FilterPipeline::from_criteria`] still runs the O(1) checks before the
//! sales-rank check.

use std::collections::HashMap;

use flipscan_core::{normalize_category, FilterCriteria};

use crate::calculator::Opportunity;
use crate::percentile::{CategorySizes, RankDistribution};

/// One predicate over an [`Opportunity`].
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// ROI (percent) at or above the floor. Items without an ROI fail.
    MinRoi(f64),
    /// Profit at or above the floor.
    MinProfit(f64),
    /// Review count at or below the ceiling.
    MaxReviews { max: u32, allow_missing: bool },
    SalesRank(SalesRankCheck),
}

impl Filter {
    #[must_use]
    pub fn matches(&self, opp: &Opportunity) -> bool {
        match self {
            Filter::MinRoi(min) => opp.roi().is_some_and(|roi| roi >= *min),
            Filter::MinProfit(min) => opp.profit() >= *min,
            Filter::MaxReviews { max, allow_missing } => match opp.marketplace().review_count {
                Some(count) => count <= *max,
                None => *allow_missing,
            },
            Filter::SalesRank(check) => check.matches(opp),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Filter::MinRoi(_) => "min_roi",
            Filter::MinProfit(_) => "min_profit",
            Filter::MaxReviews { .. } => "max_reviews",
            Filter::SalesRank(_) => "sales_rank",
        }
    }
}

/// Sales-rank check with boundaries resolved up front for every category the
/// distribution knows.
///
/// A listing passes when its rank is at or below the boundary for its
/// marketplace category. Listings in a category no percentile applies to
/// pass untouched. Otherwise a missing rank, missing category, or category
/// with no boundary fails.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SalesRankCheck {
    boundaries: HashMap<String, u64>,
    percentile: Option<f64>,
    overrides: HashMap<String, f64>,
    /// Sizes for categories first seen at check time.
    sizes: CategorySizes,
}

impl SalesRankCheck {
    fn applies_to(&self, key: Option<&str>) -> bool {
        self.percentile.is_some() || key.is_some_and(|k| self.overrides.contains_key(k))
    }

    #[must_use]
    pub fn matches(&self, opp: &Opportunity) -> bool {
        let listing = opp.marketplace();
        let key = listing.category.as_deref().map(normalize_category);
        if !self.applies_to(key.as_deref()) {
            return true;
        }
        let (Some(key), Some(rank)) = (key, listing.sales_rank) else {
            return false;
        };
        self.boundary(&key).is_some_and(|boundary| rank <= boundary)
    }

    /// Boundary in effect for `category`, if one resolves.
    #[must_use]
    pub fn boundary(&self, category: &str) -> Option<u64> {
        let key = normalize_category(category);
        if let Some(boundary) = self.boundaries.get(&key) {
            return Some(*boundary);
        }
        let p = self.overrides.get(&key).copied().or(self.percentile)?;
        self.sizes.boundary(&key, p)
    }
}

#[must_use]
pub fn roi_filter(min_roi: f64) -> Filter {
    Filter::MinRoi(min_roi)
}

#[must_use]
pub fn profit_filter(min_profit: f64) -> Filter {
    Filter::MinProfit(min_profit)
}

#[must_use]
pub fn review_filter(max_reviews: u32, allow_missing: bool) -> Filter {
    Filter::MaxReviews {
        max: max_reviews,
        allow_missing,
    }
}

/// Build the sales-rank filter for `criteria`'s percentiles against
/// `distribution`. Boundaries are computed once per known category.
#[must_use]
pub fn sales_rank_filter(criteria: &FilterCriteria, distribution: &RankDistribution) -> Filter {
    let mut boundaries = HashMap::new();
    for category in distribution.categories() {
        if let Some(boundary) = criteria
            .percentile_for(category)
            .and_then(|p| distribution.boundary(category, p))
        {
            boundaries.insert(category.to_string(), boundary);
        }
    }

    Filter::SalesRank(SalesRankCheck {
        boundaries,
        percentile: criteria.sales_rank_percentile,
        overrides: criteria
            .category_percentiles
            .iter()
            .map(|(c, p)| (normalize_category(c), *p))
            .collect(),
        sizes: distribution.sizes().clone(),
    })
}

/// Ordered list of filters, ANDed together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPipeline {
    stages: Vec<Filter>,
}

impl FilterPipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    #[must_use]
    pub fn with(mut self, filter: Filter) -> Self {
        self.stages.push(filter);
        self
    }

    /// Pipeline for every threshold set in `criteria`: ROI, profit, and
    /// reviews first, then sales rank.
    #[must_use]
    pub fn from_criteria(criteria: &FilterCriteria, distribution: &RankDistribution) -> Self {
        let mut pipeline = Self::new();
        if let Some(min) = criteria.min_roi {
            pipeline = pipeline.with(roi_filter(min));
        }
        if let Some(min) = criteria.min_profit {
            pipeline = pipeline.with(profit_filter(min));
        }
        if let Some(max) = criteria.max_reviews {
            pipeline = pipeline.with(review_filter(max, criteria.allow_missing_reviews));
        }
        if criteria.uses_sales_rank() {
            pipeline = pipeline.with(sales_rank_filter(criteria, distribution));
        }
        pipeline
    }

    #[must_use]
    pub fn stages(&self) -> &[Filter] {
        &self.stages
    }

    #[must_use]
    pub fn matches(&self, opp: &Opportunity) -> bool {
        self.stages.iter().all(|f| f.matches(opp))
    }

    /// Keep the opportunities that pass every stage, in input order.
    #[must_use]
    pub fn apply(&self, mut opportunities: Vec<Opportunity>) -> Vec<Opportunity> {
        for stage in &self.stages {
            let before = opportunities.len();
            opportunities.retain(|opp| stage.matches(opp));
            tracing::debug!(
                stage = stage.name(),
                before,
                after = opportunities.len(),
                "filter stage applied"
            );
        }
        opportunities
    }
}

/// Filter `opportunities` by `criteria`, resolving sales-rank percentiles
/// against `distribution`.
#[must_use]
pub fn apply_filters(
    opportunities: Vec<Opportunity>,
    criteria: &FilterCriteria,
    distribution: &RankDistribution,
) -> Vec<Opportunity> {
    FilterPipeline::from_criteria(criteria, distribution).apply(opportunities)
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod tests;
