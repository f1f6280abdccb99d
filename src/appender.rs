use duckdb::{params, Appender};

use crate::engine::MetricsStore;
use crate::error::Result;
use crate::generator::records::{CustomerRecord, ProductRecord, SalesRecord};
use crate::schema::Table;

/// A record that can be bulk-loaded into its base table.
pub trait AppendRow {
    const TABLE: Table;

    fn append_to(&self, app: &mut Appender<'_>) -> duckdb::Result<()>;
}

impl AppendRow for ProductRecord {
    const TABLE: Table = Table::Product;

    fn append_to(&self, app: &mut Appender<'_>) -> duckdb::Result<()> {
        app.append_row(params![
            self.product_id,
            self.supplier,
            self.brand,
            self.family,
            self.color,
            self.name
        ])
    }
}

impl AppendRow for CustomerRecord {
    const TABLE: Table = Table::Customer;

    fn append_to(&self, app: &mut Appender<'_>) -> duckdb::Result<()> {
        app.append_row(params![
            self.customer_id,
            self.region,
            self.customer_type,
            self.name,
            self.genre
        ])
    }
}

impl AppendRow for SalesRecord {
    const TABLE: Table = Table::Sales;

    fn append_to(&self, app: &mut Appender<'_>) -> duckdb::Result<()> {
        app.append_row(params![
            self.product_id,
            self.customer_id,
            self.sold_on_date,
            self.sales_volume,
            self.price,
            self.cost
        ])
    }
}

/// Appends `records` to their table through a DuckDB appender and flushes.
/// Returns the number of rows written.
pub fn append_records<R: AppendRow>(store: &MetricsStore, records: &[R]) -> Result<u64> {
    let mut app = store.appender(R::TABLE.name())?;
    for record in records {
        record.append_to(&mut app)?;
    }
    app.flush()?;
    Ok(records.len() as u64)
}
