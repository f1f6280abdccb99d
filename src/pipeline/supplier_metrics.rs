//! `supplier_metrics`: product × sales summed at four rollup levels.
//!
//! | grouping set                        | rollup_level |
//! |-------------------------------------|--------------|
//! | (supplier, brand, family, quarter)  | 0            |
//! | (supplier, brand, quarter)          | 1            |
//! | (supplier, quarter)                 | 3            |
//! | (quarter)                           | 7            |
//!
//! Rolled-up dimensions are NULL. `rollup_level` is
//! `GROUPING(supplier, brand, family)`, so a rollup row is never mistaken for
//! a row whose dimension value is legitimately NULL.

use crate::engine::MetricsStore;
use crate::error::Result;
use crate::schema::Table;

use super::{check_inputs, orphan_sales, Stage, StageReport};

pub const FULL_KEY: i32 = 0;
pub const FAMILY_ROLLED_UP: i32 = 1;
pub const BRAND_ROLLED_UP: i32 = 3;
pub const QUARTER_ONLY: i32 = 7;

// Quarter comes from the month digits of the YYYYMM code. An invalid month
// yields a meaningless quarter; dates are validated at generation.
const SUPPLIER_METRICS_SQL: &str = r#"
    SELECT
        supplier,
        brand,
        family,
        quarter,
        SUM(sales_volume) AS sales_volume,
        SUM(price)        AS price,
        SUM(cost)         AS cost,
        CAST(GROUPING(supplier, brand, family) AS INTEGER) AS rollup_level
    FROM (
        SELECT
            p.supplier,
            p.brand,
            p.family,
            CAST(((s.sold_on_date % 100) - 1) // 3 + 1 AS INTEGER) AS quarter,
            s.sales_volume,
            s.price,
            s.cost
        FROM product p
        JOIN sales s
            ON p.product_id = s.product_id
    ) joined
    GROUP BY GROUPING SETS (
        (supplier, brand, family, quarter),
        (supplier, brand, quarter),
        (supplier, quarter),
        (quarter)
    )
    ORDER BY rollup_level, supplier NULLS LAST, brand NULLS LAST, family NULLS LAST, quarter
"#;

/// Replaces `supplier_metrics` from `product` and `sales`.
pub fn create_supplier_metrics(store: &mut MetricsStore) -> Result<StageReport> {
    let stage = Stage::SupplierMetrics;
    if let Some(skipped) = check_inputs(store, stage)? {
        return Ok(skipped);
    }

    let dropped = orphan_sales(store, false)?;
    if dropped > 0 {
        log::warn!("{dropped} sales row(s) reference no product and are left out of '{}'", Table::SupplierMetrics);
    }

    let rows = store.replace_table(Table::SupplierMetrics.name(), SUPPLIER_METRICS_SQL)?;
    log::info!("'{}' table created successfully ({rows} rows)", Table::SupplierMetrics);

    Ok(StageReport {
        dropped_sales: Some(dropped),
        ..StageReport::created(stage, rows)
    })
}
