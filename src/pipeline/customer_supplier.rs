//! `customer_supplier_metrics`: product × sales × customer summed per
//! (supplier, customer_type). Single granularity, no rollups.

use crate::engine::MetricsStore;
use crate::error::Result;
use crate::schema::Table;

use super::{check_inputs, orphan_sales, Stage, StageReport};

const CUSTOMER_SUPPLIER_METRICS_SQL: &str = r#"
    SELECT
        p.supplier          AS supplier,
        c.customer_type     AS customer_type,
        SUM(s.sales_volume) AS sales_volume,
        SUM(s.price)        AS price,
        SUM(s.cost)         AS cost
    FROM product p
    JOIN sales s
        ON p.product_id = s.product_id
    JOIN customer c
        ON c.customer_id = s.customer_id
    GROUP BY p.supplier, c.customer_type
    ORDER BY supplier, customer_type
"#;

pub fn create_customer_supplier_metrics(store: &mut MetricsStore) -> Result<StageReport> {
    let stage = Stage::CustomerSupplierMetrics;
    if let Some(skipped) = check_inputs(store, stage)? {
        return Ok(skipped);
    }

    let dropped = orphan_sales(store, true)?;
    if dropped > 0 {
        log::warn!(
            "{dropped} sales row(s) reference no product or customer and are left out of '{}'",
            Table::CustomerSupplierMetrics
        );
    }

    let rows = store.replace_table(
        Table::CustomerSupplierMetrics.name(),
        CUSTOMER_SUPPLIER_METRICS_SQL,
    )?;
    log::info!("'{}' table created successfully ({rows} rows)", Table::CustomerSupplierMetrics);

    Ok(StageReport {
        dropped_sales: Some(dropped),
        ..StageReport::created(stage, rows)
    })
}
