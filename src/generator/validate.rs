//! Per-entity record validation.
//!
//! Generation runs every synthesized row through a [`RecordValidator`];
//! rows that fail are dropped with a warning and generation carries on.
//! Closures of the form `Fn(&R) -> Result<(), ValidationError>` are
//! validators too, so callers can plug in their own rules.

use std::fmt;

use thiserror::Error;

use super::records::{CustomerRecord, ProductRecord, SalesRecord};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("{field} must be a positive id, got {value}")]
    InvalidId { field: &'static str, value: i64 },

    #[error("{field} must be finite and non-negative, got {value}")]
    InvalidAmount { field: &'static str, value: f64 },

    #[error("sold_on_date {0} does not encode a YYYYMM month")]
    InvalidDate(i32),

    #[error("{0}")]
    Rejected(String),
}

pub trait RecordValidator<R> {
    fn validate(&self, record: &R) -> Result<(), ValidationError>;
}

impl<R, F> RecordValidator<R> for F
where
    F: Fn(&R) -> Result<(), ValidationError>,
{
    fn validate(&self, record: &R) -> Result<(), ValidationError> {
        self(record)
    }
}

/// Checks the column types and ranges of the base schema.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaValidator;

fn non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(())
}

fn positive_id(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value < 1 {
        return Err(ValidationError::InvalidId { field, value });
    }
    Ok(())
}

fn amount(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidAmount { field, value });
    }
    Ok(())
}

impl RecordValidator<ProductRecord> for SchemaValidator {
    fn validate(&self, r: &ProductRecord) -> Result<(), ValidationError> {
        positive_id("product_id", r.product_id as i64)?;
        non_empty("supplier", &r.supplier)?;
        non_empty("brand", &r.brand)?;
        non_empty("family", &r.family)?;
        non_empty("color", &r.color)?;
        non_empty("name", &r.name)
    }
}

impl RecordValidator<CustomerRecord> for SchemaValidator {
    fn validate(&self, r: &CustomerRecord) -> Result<(), ValidationError> {
        positive_id("customer_id", r.customer_id as i64)?;
        non_empty("region", &r.region)?;
        non_empty("customer_type", &r.customer_type)?;
        non_empty("name", &r.name)?;
        non_empty("genre", &r.genre)
    }
}

impl RecordValidator<SalesRecord> for SchemaValidator {
    fn validate(&self, r: &SalesRecord) -> Result<(), ValidationError> {
        positive_id("product_id", r.product_id as i64)?;
        positive_id("customer_id", r.customer_id)?;
        if r.sold_on_date < 100 || !(1..=12).contains(&r.month()) {
            return Err(ValidationError::InvalidDate(r.sold_on_date));
        }
        amount("sales_volume", r.sales_volume)?;
        amount("price", r.price)?;
        amount("cost", r.cost)
    }
}

/// Keeps the records that pass `validator`, logging each rejection.
/// Returns the kept records and the number dropped.
pub fn retain_valid<R, V>(entity: &str, records: Vec<R>, validator: &V) -> (Vec<R>, usize)
where
    R: fmt::Debug,
    V: RecordValidator<R> + ?Sized,
{
    let total = records.len();
    let kept: Vec<R> = records
        .into_iter()
        .filter(|r| match validator.validate(r) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("invalid {entity} record dropped: {e} ({r:?})");
                false
            }
        })
        .collect();
    let dropped = total - kept.len();
    (kept, dropped)
}
