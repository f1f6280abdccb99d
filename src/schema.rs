//! Table catalogue and base-table DDL.

use std::fmt;

use crate::engine::MetricsStore;
use crate::error::Result;

/// Every table the pipeline reads or writes, in export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Product,
    Customer,
    Sales,
    SupplierMetrics,
    SupplierMetricsPivot,
    CustomerSupplierMetrics,
    UnionMetrics,
}

impl Table {
    pub const ALL: [Table; 7] = [
        Table::Product,
        Table::Customer,
        Table::Sales,
        Table::SupplierMetrics,
        Table::SupplierMetricsPivot,
        Table::CustomerSupplierMetrics,
        Table::UnionMetrics,
    ];

    pub const BASE: [Table; 3] = [Table::Product, Table::Customer, Table::Sales];

    /// Name of the table in the backing store.
    pub fn name(&self) -> &'static str {
        match self {
            Table::Product => "product",
            Table::Customer => "customer",
            Table::Sales => "sales",
            Table::SupplierMetrics => "supplier_metrics",
            Table::SupplierMetricsPivot => "supplier_metrics_pivot_by_quarter",
            Table::CustomerSupplierMetrics => "customer_supplier_metrics",
            Table::UnionMetrics => "union_metrics",
        }
    }

    /// Human-readable title, used as the workbook sheet name.
    pub fn title(&self) -> &'static str {
        match self {
            Table::Product => "Product",
            Table::Customer => "Customer",
            Table::Sales => "Sales",
            Table::SupplierMetrics => "Supplier Metrics",
            Table::SupplierMetricsPivot => "Supplier Metrics Pivot",
            Table::CustomerSupplierMetrics => "Customer Supplier Metrics",
            Table::UnionMetrics => "Union Metrics",
        }
    }

    /// File name used by the CSV export, e.g. `supplier_metrics_pivot.csv`.
    pub fn csv_file_name(&self) -> String {
        format!("{}.csv", self.title().replace(' ', "_").to_lowercase())
    }

    pub fn is_base(&self) -> bool {
        Table::BASE.contains(self)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

const PRODUCT_DDL: &str = r#"
    CREATE OR REPLACE TABLE product (
        product_id  INTEGER,
        supplier    VARCHAR,
        brand       VARCHAR,
        family      VARCHAR,
        color       VARCHAR,
        name        VARCHAR
    );
"#;

const CUSTOMER_DDL: &str = r#"
    CREATE OR REPLACE TABLE customer (
        customer_id    INTEGER,
        region         VARCHAR,
        customer_type  VARCHAR,
        name           VARCHAR,
        genre          VARCHAR
    );
"#;

// customer_id is BIGINT here while customer.customer_id is INTEGER; the join
// widens implicitly.
const SALES_DDL: &str = r#"
    CREATE OR REPLACE TABLE sales (
        product_id     INTEGER,
        customer_id    BIGINT,
        sold_on_date   INTEGER,
        sales_volume   DOUBLE,
        price          DOUBLE,
        cost           DOUBLE
    );
"#;

/// Creates (or empties, by replacing) the three base tables.
pub fn create_base_tables(store: &MetricsStore) -> Result<()> {
    store.execute(PRODUCT_DDL)?;
    store.execute(CUSTOMER_DDL)?;
    store.execute(SALES_DDL)?;
    log::info!("tables 'product', 'customer' and 'sales' created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_file_names() {
        assert_eq!(Table::Product.csv_file_name(), "product.csv");
        assert_eq!(
            Table::SupplierMetricsPivot.csv_file_name(),
            "supplier_metrics_pivot.csv"
        );
        assert_eq!(
            Table::CustomerSupplierMetrics.csv_file_name(),
            "customer_supplier_metrics.csv"
        );
    }

    #[test]
    fn test_sheet_titles_fit_workbook_limit() {
        for table in Table::ALL {
            assert!(table.title().len() <= 31, "{table} title too long");
        }
    }

    #[test]
    fn test_create_base_tables_replaces() {
        let store = MetricsStore::open_in_memory().unwrap();
        create_base_tables(&store).unwrap();
        store
            .execute("INSERT INTO product VALUES (1, 'a', 'b', 'c', 'd', 'e')")
            .unwrap();
        create_base_tables(&store).unwrap();

        assert_eq!(
            store.table_names().unwrap(),
            vec!["customer".to_string(), "product".to_string(), "sales".to_string()]
        );
        assert_eq!(store.row_count("product").unwrap(), 0);
    }
}
