//! Profit and ROI engine for retail arbitrage.
//!
//! Leaf-first: [`costs`] prices fees for one unit, [`calculator`] turns a
//! source/listing pair into an [`Opportunity`], [`filter`] and [`rank`]
//! narrow and order the results, and [`batch`] drives a whole scan.

pub mod batch;
pub mod calculator;
pub mod costs;
pub mod error;
pub mod filter;
pub mod percentile;
pub mod rank;

#[cfg(test)]
mod test_support;

pub use batch::{calculate_batch, match_listing, BatchOutcome, SkippedPair};
pub use calculator::{calculate_opportunity, Opportunity};
pub use costs::{classify_size_tier, compute_costs, CostBreakdown, CostInputs};
pub use error::EngineError;
pub use filter::{
    apply_filters, profit_filter, review_filter, roi_filter, sales_rank_filter, Filter,
    FilterPipeline, SalesRankCheck,
};
pub use percentile::{
    CategorySizes, RankDistribution, DEFAULT_CATEGORY_SIZES, DEFAULT_UNMAPPED_CATEGORY_SIZE,
};
pub use rank::{rank, summarize, OpportunitySummary, RankKey, StoreSummary};
