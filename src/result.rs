use duckdb::types::Value;
use duckdb::Connection;

use crate::error::Result;

/// A fully materialized query result.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    column_names: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl TableSnapshot {
    /// Execute a query and materialize all rows into memory.
    pub fn from_query(conn: &Connection, sql: &str) -> Result<Self> {
        let mut stmt = conn.prepare(sql)?;
        let mut rows_iter = stmt.query([])?;

        // Column info is only available once the statement has executed
        let (column_count, column_names): (usize, Vec<String>) = rows_iter
            .as_ref()
            .map(|s| (s.column_count(), s.column_names()))
            .unwrap_or_default();

        let mut rows = Vec::new();
        while let Some(row) = rows_iter.next()? {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                let val = row
                    .get_ref(i)
                    .map(|v| v.to_owned())
                    .unwrap_or(Value::Null);
                values.push(val);
            }
            rows.push(values);
        }

        Ok(TableSnapshot { column_names, rows })
    }

    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|c| c == name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value at `row` in the named column, if both exist.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn get_string(&self, row: usize, column: &str) -> Option<String> {
        match self.get(row, column)? {
            Value::Null => None,
            v => Some(value_to_string(v)),
        }
    }

    pub fn get_double(&self, row: usize, column: &str) -> Option<f64> {
        self.get(row, column).and_then(value_to_double)
    }

    pub fn get_long(&self, row: usize, column: &str) -> Option<i64> {
        self.get(row, column).and_then(value_to_long)
    }
}

pub fn value_to_string(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::Boolean(b) => b.to_string(),
        Value::TinyInt(i) => i.to_string(),
        Value::SmallInt(i) => i.to_string(),
        Value::Int(i) => i.to_string(),
        Value::BigInt(i) => i.to_string(),
        Value::HugeInt(i) => i.to_string(),
        Value::UTinyInt(i) => i.to_string(),
        Value::USmallInt(i) => i.to_string(),
        Value::UInt(i) => i.to_string(),
        Value::UBigInt(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Double(f) => f.to_string(),
        Value::Decimal(d) => format!("{d}"),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => hex::encode(b),
        Value::Timestamp(_, us) => format!("{us}"),
        Value::Date32(d) => d.to_string(),
        Value::Time64(_, t) => t.to_string(),
        _ => format!("{v:?}"),
    }
}

pub fn value_to_long(v: &Value) -> Option<i64> {
    match v {
        Value::Boolean(b) => Some(*b as i64),
        Value::TinyInt(i) => Some(*i as i64),
        Value::SmallInt(i) => Some(*i as i64),
        Value::Int(i) => Some(*i as i64),
        Value::BigInt(i) => Some(*i),
        Value::HugeInt(i) => Some(*i as i64),
        Value::UTinyInt(i) => Some(*i as i64),
        Value::USmallInt(i) => Some(*i as i64),
        Value::UInt(i) => Some(*i as i64),
        Value::UBigInt(i) => Some(*i as i64),
        Value::Float(f) => Some(*f as i64),
        Value::Double(f) => Some(*f as i64),
        _ => None,
    }
}

/// Numeric cells as `f64`; `None` for NULL and non-numeric values.
pub fn value_to_double(v: &Value) -> Option<f64> {
    match v {
        Value::TinyInt(i) => Some(*i as f64),
        Value::SmallInt(i) => Some(*i as f64),
        Value::Int(i) => Some(*i as f64),
        Value::BigInt(i) => Some(*i as f64),
        Value::HugeInt(i) => Some(*i as f64),
        Value::UTinyInt(i) => Some(*i as f64),
        Value::USmallInt(i) => Some(*i as f64),
        Value::UInt(i) => Some(*i as f64),
        Value::UBigInt(i) => Some(*i as f64),
        Value::Float(f) => Some(*f as f64),
        Value::Double(f) => Some(*f),
        _ => None,
    }
}
