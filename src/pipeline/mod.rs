//! The aggregation stages that derive reporting tables from the base tables.
//!
//! Every stage replaces exactly one table. Stages check their input tables
//! first and skip with a warning when one is missing; query failures are
//! contained by [`run_stage`] so later stages still get their turn.

pub mod customer_supplier;
pub mod plan;
pub mod supplier_metrics;
pub mod supplier_pivot;
pub mod union_metrics;

use std::fmt;

use serde::Serialize;

use crate::engine::MetricsStore;
use crate::error::Result;
use crate::schema::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    SupplierMetrics,
    SupplierPivot,
    CustomerSupplierMetrics,
    UnionMetrics,
}

impl Stage {
    /// Declared order; [`plan::stage_order`] keeps it wherever dependencies allow.
    pub const ALL: [Stage; 4] = [
        Stage::SupplierMetrics,
        Stage::SupplierPivot,
        Stage::CustomerSupplierMetrics,
        Stage::UnionMetrics,
    ];

    pub fn output(&self) -> Table {
        match self {
            Stage::SupplierMetrics => Table::SupplierMetrics,
            Stage::SupplierPivot => Table::SupplierMetricsPivot,
            Stage::CustomerSupplierMetrics => Table::CustomerSupplierMetrics,
            Stage::UnionMetrics => Table::UnionMetrics,
        }
    }

    pub fn requires(&self) -> &'static [Table] {
        match self {
            Stage::SupplierMetrics => &[Table::Product, Table::Sales],
            Stage::SupplierPivot => &[Table::SupplierMetrics],
            Stage::CustomerSupplierMetrics => &[Table::Product, Table::Sales, Table::Customer],
            Stage::UnionMetrics => &[Table::SupplierMetrics, Table::CustomerSupplierMetrics],
        }
    }

    pub fn run(&self, store: &mut MetricsStore) -> Result<StageReport> {
        match self {
            Stage::SupplierMetrics => supplier_metrics::create_supplier_metrics(store),
            Stage::SupplierPivot => supplier_pivot::pivot_supplier_metrics_by_quarter(store),
            Stage::CustomerSupplierMetrics => {
                customer_supplier::create_customer_supplier_metrics(store)
            }
            Stage::UnionMetrics => union_metrics::create_union_metrics(store),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.output().name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageStatus {
    Created { rows: u64 },
    Skipped { missing: Vec<String> },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub table: &'static str,
    #[serde(flatten)]
    pub status: StageStatus,
    /// Sales rows that found no join partner and were left out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dropped_sales: Option<u64>,
}

impl StageReport {
    pub fn created(stage: Stage, rows: u64) -> Self {
        StageReport {
            stage,
            table: stage.output().name(),
            status: StageStatus::Created { rows },
            dropped_sales: None,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self.status, StageStatus::Created { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, StageStatus::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, StageStatus::Failed { .. })
    }
}

/// Returns a skip report when any input table of `stage` is absent.
pub(crate) fn check_inputs(store: &MetricsStore, stage: Stage) -> Result<Option<StageReport>> {
    let required: Vec<&str> = stage.requires().iter().map(|t| t.name()).collect();
    let missing = store.missing_tables(&required)?;
    if missing.is_empty() {
        return Ok(None);
    }
    log::warn!(
        "missing table(s) {}; skipping '{}'",
        missing.join(", "),
        stage.output()
    );
    Ok(Some(StageReport {
        stage,
        table: stage.output().name(),
        status: StageStatus::Skipped { missing },
        dropped_sales: None,
    }))
}

/// Counts sales rows with no matching product (and, with `need_customer`,
/// no matching customer either) that an inner join silently drops.
pub(crate) fn orphan_sales(store: &MetricsStore, need_customer: bool) -> Result<u64> {
    let customer_clause = if need_customer {
        " OR NOT EXISTS (SELECT 1 FROM customer c WHERE c.customer_id = s.customer_id)"
    } else {
        ""
    };
    store.query_count(&format!(
        "SELECT COUNT(*) FROM sales s \
         WHERE NOT EXISTS (SELECT 1 FROM product p WHERE p.product_id = s.product_id){customer_clause}"
    ))
}

/// Runs one stage, turning any error into a `Failed` report.
pub fn run_stage(store: &mut MetricsStore, stage: Stage) -> StageReport {
    match stage.run(store) {
        Ok(report) => report,
        Err(e) => {
            log::error!("failed to create '{}': {e}", stage.output());
            StageReport {
                stage,
                table: stage.output().name(),
                status: StageStatus::Failed {
                    error: e.to_string(),
                },
                dropped_sales: None,
            }
        }
    }
}

/// Runs every stage in dependency order against one exclusive handle.
pub fn run_all(store: &mut MetricsStore) -> Result<Vec<StageReport>> {
    let order = plan::stage_order(&Stage::ALL)?;
    Ok(order
        .into_iter()
        .map(|stage| run_stage(store, stage))
        .collect())
}


#[cfg(test)]
mod tests {
    use super::fixtures::seeded_store;
    use super::*;

    #[test]
    fn test_orphan_sales() {
        let store = seeded_store();
        assert_eq!(orphan_sales(&store, false).unwrap(), 1);
        assert_eq!(orphan_sales(&store, true).unwrap(), 2);
    }

    #[test]
    fn test_run_all_creates_every_table() {
        let mut store = seeded_store();
        let reports = run_all(&mut store).unwrap();
        let stages: Vec<Stage> = reports.iter().map(|r| r.stage).collect();
        assert_eq!(stages, Stage::ALL.to_vec());
        assert!(reports.iter().all(|r| r.is_created()), "{reports:?}");
        for stage in Stage::ALL {
            assert!(store.row_count(stage.output().name()).unwrap() > 0);
        }
    }

    #[test]
    fn test_run_stage_contains_failure() {
        let mut store = seeded_store();
        // A supplier_metrics without rollup_level makes the pivot query fail.
        store
            .execute("CREATE TABLE supplier_metrics AS SELECT 1 AS quarter")
            .unwrap();
        let report = run_stage(&mut store, Stage::SupplierPivot);
        assert!(report.is_failed());
        assert!(!store
            .table_exists(Table::SupplierMetricsPivot.name())
            .unwrap());
    }

    #[test]
    fn test_missing_inputs_cascade_to_skips() {
        let mut store = MetricsStore::open_in_memory().unwrap();
        let reports = run_all(&mut store).unwrap();
        assert!(reports.iter().all(|r| r.is_skipped()), "{reports:?}");
        assert!(store.table_names().unwrap().is_empty());
    }

    #[test]
    fn test_report_serializes_flat() {
        let report = StageReport::created(Stage::SupplierPivot, 4);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["stage"], "supplier_pivot");
        assert_eq!(json["table"], "supplier_metrics_pivot_by_quarter");
        assert_eq!(json["status"], "created");
        assert_eq!(json["rows"], 4);
        assert!(json.get("dropped_sales").is_none());
    }
}
