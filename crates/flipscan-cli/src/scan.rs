//! `flipscan scan`: price scanner output against marketplace listings.
//!
//! Reads a JSON array of source products and a JSON object of listings keyed
//! by UPC, SKU, or source id. Pairs that cannot be priced are logged and
//! skipped; the scan only fails on unreadable input, a bad fee schedule, or
//! a storage error when `--persist` is set.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, ValueEnum};
use flipscan_core::{
    parse_percentile, parse_threshold, AppConfig, FilterCriteria, FulfillmentMethod,
    MarketplaceProduct, SourceProduct,
};
use flipscan_engine::{
    apply_filters, calculate_batch, rank, summarize, BatchOutcome, Opportunity,
    OpportunitySummary, RankDistribution, RankKey, DEFAULT_CATEGORY_SIZES,
    DEFAULT_UNMAPPED_CATEGORY_SIZE,
};

use crate::fail_run_best_effort;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// JSON array of scanned source products
    #[arg(long)]
    pub sources: PathBuf,
    /// JSON object mapping UPC, SKU, or source id to a marketplace listing
    #[arg(long)]
    pub listings: PathBuf,
    /// Fulfillment method: fba or fbm (defaults to FLIPSCAN_FULFILLMENT)
    #[arg(long)]
    pub fulfillment: Option<FulfillmentMethod>,
    /// Minimum ROI in percent
    #[arg(long, value_parser = parse_threshold)]
    pub min_roi: Option<f64>,
    /// Maximum marketplace review count
    #[arg(long)]
    pub max_reviews: Option<u32>,
    /// Minimum profit per unit in dollars
    #[arg(long, value_parser = parse_threshold)]
    pub min_profit: Option<f64>,
    /// Sales-rank percentile a listing must fall within
    #[arg(long, value_parser = parse_percentile)]
    pub percentile: Option<f64>,
    /// Let listings without a review count pass the review check
    #[arg(long)]
    pub allow_missing_reviews: bool,
    /// Sort key: profit or roi
    #[arg(long, default_value = "profit")]
    pub sort: RankKey,
    /// Number of opportunities to show (defaults to FLIPSCAN_TOP_N)
    #[arg(long)]
    pub top: Option<usize>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
    /// Store the filtered opportunities as a scan run
    #[arg(long)]
    pub persist: bool,
}

/// Environment thresholds with any command-line overrides applied.
pub(crate) fn build_criteria(config: &AppConfig, args: &ScanArgs) -> FilterCriteria {
    let mut criteria = config.filter_criteria();
    if args.min_roi.is_some() {
        criteria.min_roi = args.min_roi;
    }
    if args.max_reviews.is_some() {
        criteria.max_reviews = args.max_reviews;
    }
    if args.min_profit.is_some() {
        criteria.min_profit = args.min_profit;
    }
    if args.percentile.is_some() {
        criteria.sales_rank_percentile = args.percentile;
    }
    criteria.allow_missing_reviews = args.allow_missing_reviews;
    criteria
}

pub(crate) fn load_sources(path: &Path) -> anyhow::Result<Vec<SourceProduct>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read sources file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse sources file {}", path.display()))
}

pub(crate) fn load_listings(path: &Path) -> anyhow::Result<HashMap<String, MarketplaceProduct>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read listings file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse listings file {}", path.display()))
}

/// Rank distribution from every listing in the scan. Categories with too few
/// listings to place a percentile fall back to approximate category sizes.
pub(crate) fn rank_distribution(
    listings: &HashMap<String, MarketplaceProduct>,
) -> RankDistribution {
    RankDistribution::from_observations(listings.values().filter_map(|listing| {
        Some((listing.category.as_deref()?, listing.sales_rank?))
    }))
    .with_category_sizes(DEFAULT_CATEGORY_SIZES.iter().copied())
    .with_unmapped_size(DEFAULT_UNMAPPED_CATEGORY_SIZE)
}

/// Run a scan end to end.
///
/// # Errors
///
/// Returns an error if an input file cannot be read or parsed, the fee
/// schedule is invalid, or persistence fails.
pub(crate) async fn run_scan(config: &AppConfig, args: &ScanArgs) -> anyhow::Result<()> {
    let schedule = config.fee_schedule()?;
    let sources = load_sources(&args.sources)?;
    let listings = load_listings(&args.listings)?;
    let method = args.fulfillment.unwrap_or(config.fulfillment);
    let criteria = build_criteria(config, args);

    tracing::info!(
        sources = sources.len(),
        listings = listings.len(),
        method = %method,
        "starting scan"
    );

    let BatchOutcome {
        opportunities,
        skipped,
        unmatched,
    } = calculate_batch(&schedule, &sources, &listings, method)?;

    let priced = opportunities.len();
    let distribution = rank_distribution(&listings);
    let filtered = apply_filters(opportunities, &criteria, &distribution);
    tracing::info!(priced, kept = filtered.len(), "filters applied");

    let summary = summarize(&filtered);
    let top_n = args.top.unwrap_or(config.top_n);
    let shown = rank(filtered.clone(), args.sort, Some(top_n));

    match args.format {
        OutputFormat::Table => {
            print!("{}", render_table(&shown));
            println!(
                "{} priced, {} passed filters, {} skipped, {} unmatched",
                priced,
                summary.count,
                skipped.len(),
                unmatched
            );
            print!("{}", render_summary(&summary));
        }
        OutputFormat::Json => {
            let body = serde_json::json!({
                "opportunities": shown,
                "summary": summary,
                "skipped": skipped,
                "unmatched": unmatched,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    if args.persist {
        persist(config, method, &filtered).await?;
    }

    Ok(())
}

async fn persist(
    config: &AppConfig,
    method: FulfillmentMethod,
    opportunities: &[Opportunity],
) -> anyhow::Result<()> {
    let pool = flipscan_db::connect_pool_from_config(config).await?;

    let run = flipscan_db::create_scan_run(&pool, method, "cli").await?;
    if let Err(e) = flipscan_db::start_scan_run(&pool, run.id).await {
        fail_run_best_effort(&pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }

    let inserted = match flipscan_db::insert_opportunities(&pool, run.id, opportunities).await {
        Ok(n) => n,
        Err(e) => {
            fail_run_best_effort(&pool, run.id, format!("{e:#}")).await;
            return Err(e.into());
        }
    };

    let records = i32::try_from(inserted).unwrap_or(i32::MAX);
    if let Err(e) = flipscan_db::complete_scan_run(&pool, run.id, records).await {
        fail_run_best_effort(&pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }

    tracing::info!(run_id = run.id, inserted, "scan run stored");
    println!("stored {inserted} opportunities as scan run {}", run.public_id);
    Ok(())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('\u{2026}');
    out
}

fn fmt_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "\u{2014}".to_string(), |v| v.to_string())
}

pub(crate) fn render_table(opportunities: &[Opportunity]) -> String {
    let mut out = String::new();
    if opportunities.is_empty() {
        out.push_str("no opportunities passed the filters\n");
        return out;
    }

    let _ = writeln!(
        out,
        "{:<10} {:<40} {:>9} {:>9} {:>9} {:>8} {:>9} {:>7}",
        "STORE", "TITLE", "BUY", "SELL", "PROFIT", "ROI%", "RANK", "REVIEWS"
    );
    for opp in opportunities {
        let roi = opp
            .roi_display()
            .map_or_else(|| "\u{2014}".to_string(), |r| format!("{r:.1}"));
        let _ = writeln!(
            out,
            "{:<10} {:<40} {:>9.2} {:>9.2} {:>9.2} {:>8} {:>9} {:>7}",
            truncate(&opp.source().store, 10),
            truncate(&opp.source().title, 40),
            opp.costs().buy_price,
            opp.sell_price(),
            opp.profit(),
            roi,
            fmt_opt(opp.marketplace().sales_rank),
            fmt_opt(opp.marketplace().review_count),
        );
    }
    out
}

pub(crate) fn render_summary(summary: &OpportunitySummary) -> String {
    let mut out = String::new();
    if summary.count == 0 {
        return out;
    }
    let _ = writeln!(
        out,
        "total profit {:.2}, average profit {:.2}, average ROI {}",
        summary.total_profit,
        summary.average_profit.unwrap_or_default(),
        summary
            .average_roi
            .map_or_else(|| "\u{2014}".to_string(), |r| format!("{r:.1}%")),
    );
    for (store, stats) in &summary.by_store {
        let _ = writeln!(
            out,
            "  {store}: {} opportunities, {:.2} profit",
            stats.count, stats.total_profit
        );
    }
    out
}
