//! Database operations for `opportunities`.
//!
//! The engine works in `f64`; amounts become `NUMERIC` here, rounded to
//! cents (money) or hundredths of a percent (ROI).

use chrono::{DateTime, Utc};
use flipscan_engine::Opportunity;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `opportunities` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OpportunityRow {
    pub id: i64,
    pub scan_run_id: i64,
    /// `store:source_id:marketplace_id:method`.
    pub opportunity_key: String,
    pub store: String,
    pub source_product_id: String,
    pub source_title: String,
    pub source_url: String,
    pub marketplace_id: String,
    pub marketplace_title: String,
    pub marketplace_url: String,
    pub category: Option<String>,
    pub fulfillment: String,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub marketplace_fees: Decimal,
    pub fulfillment_cost: Decimal,
    pub shipping_to_center: Decimal,
    pub other_costs: Decimal,
    pub profit: Decimal,
    /// `NULL` when the item was free at the source.
    pub roi: Option<Decimal>,
    pub sales_rank: Option<i64>,
    pub review_count: Option<i32>,
    pub created_at: DateTime<Utc>,
}

const OPPORTUNITY_COLUMNS: &str = "id, scan_run_id, opportunity_key, store, source_product_id, \
     source_title, source_url, marketplace_id, marketplace_title, marketplace_url, category, \
     fulfillment, buy_price, sell_price, marketplace_fees, fulfillment_cost, shipping_to_center, \
     other_costs, profit, roi, sales_rank, review_count, created_at";

/// Convert a dollar amount to a `NUMERIC` rounded to cents.
///
/// # Errors
///
/// Returns [`DbError::UnrepresentableAmount`] for NaN or infinite values.
pub fn to_money(field: &'static str, value: f64) -> Result<Decimal, DbError> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(2))
        .ok_or(DbError::UnrepresentableAmount { field, value })
}

/// Convert an ROI percentage to a `NUMERIC` with two decimal places.
///
/// # Errors
///
/// Returns [`DbError::UnrepresentableAmount`] for NaN or infinite values.
pub fn to_percent(value: f64) -> Result<Decimal, DbError> {
    to_money("roi", value)
}

/// Insert every opportunity for a scan run in one transaction.
///
/// Rows already stored for the same run and key are left alone. Returns the
/// number of rows inserted.
///
/// # Errors
///
/// Returns [`DbError::UnrepresentableAmount`] if an amount cannot be
/// converted, or [`DbError::Sqlx`] if any insert fails; either way nothing is
/// committed.
pub async fn insert_opportunities(
    pool: &PgPool,
    scan_run_id: i64,
    opportunities: &[Opportunity],
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0usize;

    for opp in opportunities {
        let costs = opp.costs();
        let source = opp.source();
        let listing = opp.marketplace();
        let roi = opp.roi().map(to_percent).transpose()?;
        let sales_rank = listing.sales_rank.and_then(|r| i64::try_from(r).ok());
        let review_count = listing.review_count.and_then(|c| i32::try_from(c).ok());

        let result = sqlx::query(
            "INSERT INTO opportunities \
                 (scan_run_id, opportunity_key, store, source_product_id, source_title, \
                  source_url, marketplace_id, marketplace_title, marketplace_url, category, \
                  fulfillment, buy_price, sell_price, marketplace_fees, fulfillment_cost, \
                  shipping_to_center, other_costs, profit, roi, sales_rank, review_count) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, \
                     $12, $13, $14, $15, $16, $17, $18, $19, $20, $21) \
             ON CONFLICT (scan_run_id, opportunity_key) DO NOTHING",
        )
        .bind(scan_run_id)
        .bind(opp.id())
        .bind(&source.store)
        .bind(&source.id)
        .bind(&source.title)
        .bind(&source.url)
        .bind(&listing.id)
        .bind(&listing.title)
        .bind(&listing.url)
        .bind(opp.category())
        .bind(opp.method().code())
        .bind(to_money("buy_price", costs.buy_price)?)
        .bind(to_money("sell_price", opp.sell_price())?)
        .bind(to_money("marketplace_fees", costs.marketplace_fees)?)
        .bind(to_money("fulfillment_cost", costs.fulfillment_cost)?)
        .bind(to_money("shipping_to_center", costs.shipping_to_center)?)
        .bind(to_money("other_costs", costs.other_costs)?)
        .bind(to_money("profit", opp.profit())?)
        .bind(roi)
        .bind(sales_rank)
        .bind(review_count)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(key = opp.id(), scan_run_id, "opportunity already stored");
        }
        inserted += usize::try_from(result.rows_affected()).unwrap_or(0);
    }

    tx.commit().await?;
    Ok(inserted)
}

/// Opportunities with ROI at or above `min_roi` (every row when `None`),
/// best ROI first.
///
/// Rows without an ROI only appear when `min_roi` is `None`, after every row
/// that has one.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_opportunities(
    pool: &PgPool,
    min_roi: Option<Decimal>,
    limit: i64,
) -> Result<Vec<OpportunityRow>, DbError> {
    let rows = sqlx::query_as::<_, OpportunityRow>(&format!(
        "SELECT {OPPORTUNITY_COLUMNS} FROM opportunities \
         WHERE $1::numeric IS NULL OR roi >= $1 \
         ORDER BY roi DESC NULLS LAST, profit DESC, id ASC \
         LIMIT $2"
    ))
    .bind(min_roi)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Every opportunity stored by one scan run, in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_opportunities_for_run(
    pool: &PgPool,
    scan_run_id: i64,
) -> Result<Vec<OpportunityRow>, DbError> {
    let rows = sqlx::query_as::<_, OpportunityRow>(&format!(
        "SELECT {OPPORTUNITY_COLUMNS} FROM opportunities \
         WHERE scan_run_id = $1 \
         ORDER BY id ASC"
    ))
    .bind(scan_run_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
