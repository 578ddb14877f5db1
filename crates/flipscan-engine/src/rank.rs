//! Ranking and aggregate summaries of opportunities.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::calculator::Opportunity;
use crate::error::EngineError;

/// Sort key for [`rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankKey {
    Profit,
    Roi,
}

impl FromStr for RankKey {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "profit" => Ok(RankKey::Profit),
            "roi" => Ok(RankKey::Roi),
            other => Err(EngineError::InvalidInput {
                field: "sort",
                reason: format!("expected profit or roi, got '{other}'"),
            }),
        }
    }
}

/// Sort `opportunities` best-first by `key` and keep the first `top_n`.
///
/// The sort is stable. Ties fall back to profit descending, then id
/// ascending, so the output is fully determined by the input set. Under
/// [`RankKey::Roi`], opportunities without an ROI come last.
#[must_use]
pub fn rank(
    mut opportunities: Vec<Opportunity>,
    key: RankKey,
    top_n: Option<usize>,
) -> Vec<Opportunity> {
    opportunities.sort_by(|a, b| compare(a, b, key));
    if let Some(n) = top_n {
        opportunities.truncate(n);
    }
    opportunities
}

fn compare(a: &Opportunity, b: &Opportunity, key: RankKey) -> Ordering {
    let primary = match key {
        RankKey::Profit => Ordering::Equal,
        RankKey::Roi => match (a.roi(), b.roi()) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    };
    primary
        .then_with(|| b.profit().total_cmp(&a.profit()))
        .then_with(|| a.id().cmp(b.id()))
}

/// Count and profit for one retailer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreSummary {
    pub count: usize,
    pub total_profit: f64,
}

/// Aggregates over a set of opportunities.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OpportunitySummary {
    pub count: usize,
    pub total_profit: f64,
    /// `None` for an empty set.
    pub average_profit: Option<f64>,
    /// Mean over opportunities that have an ROI.
    pub average_roi: Option<f64>,
    pub by_store: BTreeMap<String, StoreSummary>,
    /// Keyed by fee category; `"uncategorized"` when neither side has one.
    pub by_category: BTreeMap<String, usize>,
}

/// Summarize `opportunities` in a single pass.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize(opportunities: &[Opportunity]) -> OpportunitySummary {
    let mut summary = OpportunitySummary::default();
    let mut roi_sum = 0.0;
    let mut roi_count = 0_usize;

    for opp in opportunities {
        summary.count += 1;
        summary.total_profit += opp.profit();

        if let Some(roi) = opp.roi() {
            roi_sum += roi;
            roi_count += 1;
        }

        let store = summary
            .by_store
            .entry(opp.source().store.clone())
            .or_default();
        store.count += 1;
        store.total_profit += opp.profit();

        let category = opp.category().unwrap_or("uncategorized").to_string();
        *summary.by_category.entry(category).or_default() += 1;
    }

    if summary.count > 0 {
        summary.average_profit = Some(summary.total_profit / summary.count as f64);
    }
    if roi_count > 0 {
        summary.average_roi = Some(roi_sum / roi_count as f64);
    }
    summary
}
