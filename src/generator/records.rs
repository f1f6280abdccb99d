use serde::Serialize;

/// A single `product` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub product_id: i32,
    pub supplier: String,
    pub brand: String,
    pub family: String,
    pub color: String,
    pub name: String,
}

/// A single `customer` row. `genre` holds comma-joined tags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerRecord {
    pub customer_id: i32,
    pub region: String,
    pub customer_type: String,
    pub name: String,
    pub genre: String,
}

impl CustomerRecord {
    pub fn genres(&self) -> impl Iterator<Item = &str> {
        self.genre.split(',').filter(|g| !g.is_empty())
    }
}

/// A single `sales` row. `sold_on_date` is encoded as YYYYMM.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRecord {
    pub product_id: i32,
    pub customer_id: i64,
    pub sold_on_date: i32,
    pub sales_volume: f64,
    pub price: f64,
    pub cost: f64,
}

impl SalesRecord {
    pub fn month(&self) -> i32 {
        self.sold_on_date % 100
    }

    /// Calendar quarter of the sale, same arithmetic as the aggregation SQL.
    pub fn quarter(&self) -> i32 {
        (self.month() - 1) / 3 + 1
    }
}
