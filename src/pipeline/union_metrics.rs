//! `union_metrics`: supplier and customer-supplier metrics combined by
//! column name and rolled up again.
//!
//! The supplier side contributes its full-key rows only, so each rollup
//! counts every sale once. Columns a side lacks are NULL-filled by the
//! union; after the second grouping pass every NULL key becomes a sentinel
//! and a NULL quarter becomes 0 ("all quarters").

use crate::engine::MetricsStore;
use crate::error::Result;
use crate::schema::Table;

use super::supplier_metrics::FULL_KEY;
use super::{check_inputs, Stage, StageReport};

pub const ALL_SUPPLIERS: &str = "ALL SUPPLIERS";
pub const ALL_BRANDS: &str = "ALL BRANDS";
pub const ALL_FAMILIES: &str = "ALL FAMILIES";
pub const ALL_CUSTOMER_TYPES: &str = "ALL CUST TYPES";
pub const ALL_QUARTERS: i32 = 0;

fn union_sql() -> String {
    format!(
        r#"
    WITH union_cte AS (
        SELECT
            supplier,
            brand,
            family,
            quarter,
            CAST(NULL AS VARCHAR) AS customer_type,
            sales_volume,
            price,
            cost
        FROM supplier_metrics
        WHERE rollup_level = {FULL_KEY}

        UNION ALL BY NAME

        SELECT
            supplier,
            CAST(NULL AS VARCHAR) AS brand,
            CAST(NULL AS VARCHAR) AS family,
            CAST(NULL AS INTEGER) AS quarter,
            customer_type,
            sales_volume,
            price,
            cost
        FROM customer_supplier_metrics
    ),
    rolled AS (
        SELECT DISTINCT
            COALESCE(supplier, '{ALL_SUPPLIERS}')           AS supplier,
            COALESCE(brand, '{ALL_BRANDS}')                 AS brand,
            COALESCE(family, '{ALL_FAMILIES}')              AS family,
            COALESCE(customer_type, '{ALL_CUSTOMER_TYPES}') AS customer_type,
            COALESCE(quarter, {ALL_QUARTERS})               AS quarter,
            SUM(sales_volume) AS sales_volume,
            SUM(price)        AS price,
            SUM(cost)         AS cost
        FROM union_cte
        GROUP BY GROUPING SETS (
            (supplier, brand, family, customer_type, quarter),
            (supplier, brand, family, quarter),
            (supplier, brand, quarter),
            (supplier, quarter),
            (quarter)
        )
    )
    SELECT * FROM rolled
    ORDER BY supplier, brand, family, customer_type, quarter
"#
    )
}

pub fn create_union_metrics(store: &mut MetricsStore) -> Result<StageReport> {
    let stage = Stage::UnionMetrics;
    if let Some(skipped) = check_inputs(store, stage)? {
        return Ok(skipped);
    }

    let rows = store.replace_table(Table::UnionMetrics.name(), &union_sql())?;
    log::info!(
        "'{}' table created successfully with grouping sets including quarter ({rows} rows)",
        Table::UnionMetrics
    );
    Ok(StageReport::created(stage, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::customer_supplier::create_customer_supplier_metrics;
    use crate::pipeline::fixtures::{seeded_store, FULLY_JOINED_VOLUME, PRODUCT_JOINED_VOLUME};
    use crate::pipeline::supplier_metrics::create_supplier_metrics;
    use crate::pipeline::StageStatus;
    use pretty_assertions::assert_eq;

    fn built_store() -> MetricsStore {
        let mut store = seeded_store();
        create_supplier_metrics(&mut store).unwrap();
        create_customer_supplier_metrics(&mut store).unwrap();
        let report = create_union_metrics(&mut store).unwrap();
        assert_eq!(report.status, StageStatus::Created { rows: 25 });
        store
    }

    fn volume(store: &MetricsStore, filter: &str) -> Option<f64> {
        store
            .query_f64(&format!(
                "SELECT SUM(sales_volume) FROM union_metrics WHERE {filter}"
            ))
            .unwrap()
    }

    #[test]
    fn test_no_null_keys() {
        let store = built_store();
        let nulls = store
            .query_count(
                "SELECT COUNT(*) FROM union_metrics WHERE supplier IS NULL OR brand IS NULL \
                 OR family IS NULL OR customer_type IS NULL OR quarter IS NULL",
            )
            .unwrap();
        assert_eq!(nulls, 0);
    }

    #[test]
    fn test_keys_are_unique() {
        let store = built_store();
        let distinct_keys = store
            .query_count(
                "SELECT COUNT(*) FROM (SELECT DISTINCT supplier, brand, family, customer_type, quarter \
                 FROM union_metrics)",
            )
            .unwrap();
        assert_eq!(distinct_keys, store.row_count("union_metrics").unwrap());
    }

    #[test]
    fn test_grand_total() {
        let store = built_store();
        assert_eq!(
            volume(
                &store,
                "supplier = 'ALL SUPPLIERS' AND brand = 'ALL BRANDS' AND family = 'ALL FAMILIES' \
                 AND customer_type = 'ALL CUST TYPES' AND quarter = 0"
            ),
            Some(FULLY_JOINED_VOLUME)
        );
        assert_eq!(
            volume(&store, "supplier = 'ALL SUPPLIERS' AND quarter BETWEEN 1 AND 4"),
            Some(PRODUCT_JOINED_VOLUME)
        );
    }

    #[test]
    fn test_rollup_rows() {
        let store = built_store();
        let cases = [
            ("supplier = 'Acme Inc' AND brand = 'ALL BRANDS' AND customer_type = 'ALL CUST TYPES' AND quarter = 0", 10.5),
            ("supplier = 'Nestle' AND brand = 'ALL BRANDS' AND customer_type = 'ALL CUST TYPES' AND quarter = 0", 5.5),
            ("supplier = 'Acme Inc' AND brand = 'ALL BRANDS' AND customer_type = 'Store' AND quarter = 0", 3.5),
            ("supplier = 'Acme Inc' AND brand = 'Now' AND family = 'Pop' AND customer_type = 'ALL CUST TYPES' AND quarter = 1", 6.0),
            ("supplier = 'Acme Inc' AND brand = 'Now' AND family = 'ALL FAMILIES' AND quarter = 2", 1.5),
            ("supplier = 'Acme Inc' AND brand = 'ALL BRANDS' AND quarter = 2", 5.5),
        ];
        for (filter, expected) in cases {
            assert_eq!(volume(&store, filter), Some(expected), "{filter}");
        }
    }

    #[test]
    fn test_idempotent() {
        let mut store = built_store();
        let first = store.query("SELECT * FROM union_metrics").unwrap();
        create_union_metrics(&mut store).unwrap();
        let second = store.query("SELECT * FROM union_metrics").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_requires_both_inputs() {
        let mut store = seeded_store();
        create_supplier_metrics(&mut store).unwrap();
        let report = create_union_metrics(&mut store).unwrap();
        assert_eq!(
            report.status,
            StageStatus::Skipped {
                missing: vec!["customer_supplier_metrics".to_string()]
            }
        );
        assert!(!store.table_exists("union_metrics").unwrap());
    }
}
