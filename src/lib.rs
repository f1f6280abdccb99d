//! Synthetic beverage sales data and the grouping-set reports derived from
//! it, kept in an embedded DuckDB file.
//!
//! A run populates `product`, `customer` and `sales`, then replaces four
//! derived tables in dependency order:
//!
//! 1. `supplier_metrics`: rollups over supplier, brand, family and quarter
//! 2. `supplier_metrics_pivot_by_quarter`: quarter volumes as columns
//! 3. `customer_supplier_metrics`: totals per supplier and customer type
//! 4. `union_metrics`: both metric tables unioned by name and rolled up again
//!
//! and finally exports all seven tables to a workbook or to CSV files.

pub mod appender;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod generator;
pub mod pipeline;
pub mod result;
pub mod runner;
pub mod schema;

pub use config::{OutputMode, PipelineConfig};
pub use engine::{MetricsStore, StoreMode};
pub use error::{PipelineError, Result};
pub use pipeline::{Stage, StageReport, StageStatus};
pub use runner::{run, RunOptions, RunReport};
pub use schema::Table;

pub fn escape_sql_ident(s: &str) -> String {
    s.replace('"', "\"\"")
}

pub fn escape_sql_str(s: &str) -> String {
    s.replace('\'', "''")
}
