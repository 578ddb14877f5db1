//! `flipscan report`: read stored opportunities back out.

use flipscan_db::OpportunityRow;

/// Print stored opportunities with ROI at or above `min_roi`.
///
/// # Errors
///
/// Returns an error if `min_roi` is not a finite number or the query fails.
pub(crate) async fn run_report(
    pool: &sqlx::PgPool,
    min_roi: Option<f64>,
    limit: i64,
) -> anyhow::Result<()> {
    let min_roi = min_roi.map(flipscan_db::to_percent).transpose()?;
    let rows = flipscan_db::list_opportunities(pool, min_roi, limit).await?;

    if rows.is_empty() {
        println!("no stored opportunities match");
        return Ok(());
    }

    print!("{}", render_rows(&rows));
    Ok(())
}

pub(crate) fn render_rows(rows: &[OpportunityRow]) -> String {
    let mut out = format!(
        "{:<10} {:<10} {:<14} {:<12} {:>9} {:>9} {:>8} {:>5}\n",
        "DATE", "STORE", "SOURCE", "LISTING", "BUY", "PROFIT", "ROI%", "VIA"
    );
    for row in rows {
        let roi = row
            .roi
            .map_or_else(|| "\u{2014}".to_string(), |r| r.to_string());
        out.push_str(&format!(
            "{:<10} {:<10} {:<14} {:<12} {:>9} {:>9} {:>8} {:>5}\n",
            row.created_at.format("%Y-%m-%d").to_string(),
            row.store,
            row.source_product_id,
            row.marketplace_id,
            row.buy_price.to_string(),
            row.profit.to_string(),
            roi,
            row.fulfillment,
        ));
    }
    out
}
