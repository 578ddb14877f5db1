//! Database operations for `scan_runs`.
//!
//! One row per persisted `flipscan scan`. The run records the fulfillment
//! method every opportunity in it was priced with and what triggered it
//! (`"cli"` today). `records_processed` is the number of opportunity rows
//! the run actually inserted. A failed run keeps the storage error in
//! `error_message` and none of its opportunities, since they are written in
//! one transaction.
//!
//! A run moves `queued -> running -> succeeded | failed`. Each transition is
//! a guarded `UPDATE`; touching a run in the wrong state is an error rather
//! than a silent no-op.

use chrono::{DateTime, Utc};
use flipscan_core::FulfillmentMethod;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `scan_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScanRunRow {
    pub id: i64,
    pub public_id: Uuid,
    /// `"fba"` or `"fbm"`.
    pub fulfillment: String,
    pub trigger_source: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Opportunities stored by the run.
    pub records_processed: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

const SCAN_RUN_COLUMNS: &str = "id, public_id, fulfillment, trigger_source, status, \
     started_at, completed_at, records_processed, error_message, created_at";

/// Creates a new scan run in `queued` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_scan_run(
    pool: &PgPool,
    fulfillment: FulfillmentMethod,
    trigger_source: &str,
) -> Result<ScanRunRow, DbError> {
    let row = sqlx::query_as::<_, ScanRunRow>(&format!(
        "INSERT INTO scan_runs (public_id, fulfillment, trigger_source, status) \
         VALUES ($1, $2, $3, 'queued') \
         RETURNING {SCAN_RUN_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(fulfillment.code())
    .bind(trigger_source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a queued run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidScanRunTransition`] if the run is not queued, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn start_scan_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scan_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScanRunTransition {
            id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Marks a running run as `succeeded` with its stored-opportunity count.
///
/// # Errors
///
/// Returns [`DbError::InvalidScanRunTransition`] if the run is not running,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn complete_scan_run(
    pool: &PgPool,
    id: i64,
    records_processed: i32,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scan_runs \
         SET status = 'succeeded', completed_at = NOW(), records_processed = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(records_processed)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScanRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a running run as `failed` and records the error.
///
/// # Errors
///
/// Returns [`DbError::InvalidScanRunTransition`] if the run is not running,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn fail_scan_run(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scan_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScanRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no run has this `id`, or [`DbError::Sqlx`]
/// if the query fails.
pub async fn get_scan_run(pool: &PgPool, id: i64) -> Result<ScanRunRow, DbError> {
    sqlx::query_as::<_, ScanRunRow>(&format!(
        "SELECT {SCAN_RUN_COLUMNS} FROM scan_runs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scan_runs(pool: &PgPool, limit: i64) -> Result<Vec<ScanRunRow>, DbError> {
    let rows = sqlx::query_as::<_, ScanRunRow>(&format!(
        "SELECT {SCAN_RUN_COLUMNS} FROM scan_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
