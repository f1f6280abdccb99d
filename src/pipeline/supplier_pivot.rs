//! `supplier_metrics_pivot_by_quarter`: one row per (supplier, brand,
//! family) with sales volume spread over four quarter columns.
//!
//! Only full-key rows (`rollup_level = 0`) feed the pivot. Rollup rows carry
//! NULL brand/family and would otherwise surface as extra groups whose
//! totals overlap the real ones.

use crate::engine::MetricsStore;
use crate::error::Result;
use crate::schema::Table;

use super::supplier_metrics::FULL_KEY;
use super::{check_inputs, Stage, StageReport};

fn pivot_sql() -> String {
    let quarter_columns: Vec<String> = (1..=4)
        .map(|q| {
            format!("SUM(CASE WHEN quarter = {q} THEN sales_volume ELSE 0 END) AS q{q}_sales_volume")
        })
        .collect();
    format!(
        "SELECT supplier, brand, family, {columns} \
         FROM supplier_metrics \
         WHERE rollup_level = {FULL_KEY} \
         GROUP BY supplier, brand, family \
         ORDER BY supplier, brand, family",
        columns = quarter_columns.join(", ")
    )
}

/// Replaces the quarter pivot. Without `supplier_metrics` this is a
/// warning-only no-op.
pub fn pivot_supplier_metrics_by_quarter(store: &mut MetricsStore) -> Result<StageReport> {
    let stage = Stage::SupplierPivot;
    if let Some(skipped) = check_inputs(store, stage)? {
        return Ok(skipped);
    }

    let rows = store.replace_table(Table::SupplierMetricsPivot.name(), &pivot_sql())?;
    log::info!("'{}' table created successfully ({rows} rows)", Table::SupplierMetricsPivot);
    Ok(StageReport::created(stage, rows))
}
