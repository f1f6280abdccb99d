//! Synthetic base data: products, customers and sales.

pub mod records;
pub mod validate;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::appender::append_records;
use crate::config::GeneratorConfig;
use crate::engine::MetricsStore;
use crate::error::Result;
use crate::schema::create_base_tables;

use records::{CustomerRecord, ProductRecord, SalesRecord};
use validate::{retain_valid, RecordValidator};

const SUPPLIERS: &[&str] = &["Acme Inc", "PepsiCo", "CocaCola", "DrPepper", "Nestle"];
const BRANDS: &[&str] = &["Now", "Classic", "HealthPlus", "Spark", "Retro"];
const FAMILIES: &[&str] = &["Wine", "Spirits", "Beer", "Kombucha", "Pop", "Elixir"];
const COLORS: &[&str] = &["Red", "Green", "Blue Sky", "Teal", "Baby Pink", "Yellow"];

const REGIONS: &[&str] = &[
    "California",
    "NewYork",
    "Ontario",
    "Quebec",
    "Texas",
    "Alberta",
    "BritishColumbia",
    "Illinois",
    "Florida",
    "Washington",
];

const CUSTOMER_TYPES: &[&str] = &[
    "Store",
    "Grocery",
    "Box",
    "Restaurant",
    "PopUp",
    "Food Truck",
    "Transportation",
];

const GENRES: &[&str] = &[
    "Italian",
    "Indian",
    "Indonesian",
    "Ethiopian",
    "French",
    "Japanese",
    "American",
    "Spanish",
    "Mediterranean",
    "Chinese",
    "Eastern European",
    "North European",
    "Persian",
];

const SURNAMES: &[&str] = &[
    "Harper", "Nguyen", "Okafor", "Lindqvist", "Moreau", "Castillo", "Brennan", "Takahashi",
    "Schmidt", "Delgado", "Whitfield", "Rossi", "Patel", "Kowalski", "Haddad", "Foster",
];

const COMPANY_SUFFIXES: &[&str] = &["LLC", "Inc", "Group", "Ltd", "and Sons", "PLC"];

const SALE_DATES: &[i32] = &[202401, 202402, 202403, 202404, 202405];

fn pick(rng: &mut StdRng, pool: &[&str]) -> String {
    pool.choose(rng).copied().unwrap_or_default().to_string()
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Random row source. A fixed seed yields the same rows on every run.
pub struct DataGenerator {
    rng: StdRng,
}

impl DataGenerator {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        DataGenerator { rng }
    }

    pub fn products(&mut self, count: usize) -> Vec<ProductRecord> {
        (0..count)
            .map(|i| {
                let supplier = pick(&mut self.rng, SUPPLIERS);
                let brand = pick(&mut self.rng, BRANDS);
                let family = pick(&mut self.rng, FAMILIES);
                let color = pick(&mut self.rng, COLORS);
                let name = format!("{supplier} {brand} {family} {color}");
                ProductRecord {
                    product_id: i as i32 + 1,
                    supplier,
                    brand,
                    family,
                    color,
                    name,
                }
            })
            .collect()
    }

    pub fn customers(&mut self, count: usize) -> Vec<CustomerRecord> {
        (0..count)
            .map(|i| {
                let region = pick(&mut self.rng, REGIONS);
                let customer_type = pick(&mut self.rng, CUSTOMER_TYPES);
                let name = self.company_name();
                let num_genres = self.rng.gen_range(1..=3);
                let genre = GENRES
                    .choose_multiple(&mut self.rng, num_genres)
                    .copied()
                    .collect::<Vec<_>>()
                    .join(",");
                CustomerRecord {
                    customer_id: i as i32 + 1,
                    region,
                    customer_type,
                    name,
                    genre,
                }
            })
            .collect()
    }

    /// Sales reference product ids in `1..=max_product_id` and customer ids
    /// in `1..=max_customer_id`.
    pub fn sales(
        &mut self,
        count: usize,
        max_product_id: usize,
        max_customer_id: usize,
    ) -> Vec<SalesRecord> {
        let max_product_id = max_product_id.max(1) as i32;
        let max_customer_id = max_customer_id.max(1) as i64;
        (0..count)
            .map(|_| {
                let sales_volume = round2(self.rng.gen_range(0.5..20.0));
                let price = round2(sales_volume * self.rng.gen_range(1.5..3.5));
                let cost = round2(price * self.rng.gen_range(0.4..0.7));
                SalesRecord {
                    product_id: self.rng.gen_range(1..=max_product_id),
                    customer_id: self.rng.gen_range(1..=max_customer_id),
                    sold_on_date: SALE_DATES.choose(&mut self.rng).copied().unwrap_or(202401),
                    sales_volume,
                    price,
                    cost,
                }
            })
            .collect()
    }

    fn company_name(&mut self) -> String {
        let a = pick(&mut self.rng, SURNAMES);
        let b = pick(&mut self.rng, SURNAMES);
        match self.rng.gen_range(0..3) {
            0 => format!("{a} {}", pick(&mut self.rng, COMPANY_SUFFIXES)),
            1 => format!("{a}-{b}"),
            _ => format!("{a}, {b} and {}", pick(&mut self.rng, SURNAMES)),
        }
    }
}

/// Row counts written by [`populate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationSummary {
    pub products: u64,
    pub customers: u64,
    pub sales: u64,
    /// Rows rejected by validation across all three entities.
    pub dropped: usize,
}

/// Replaces the base tables and fills them with validated synthetic rows.
pub fn populate<V>(
    store: &MetricsStore,
    config: &GeneratorConfig,
    validator: &V,
) -> Result<GenerationSummary>
where
    V: RecordValidator<ProductRecord>
        + RecordValidator<CustomerRecord>
        + RecordValidator<SalesRecord>,
{
    let mut gen = DataGenerator::new(config.seed);
    let products = gen.products(config.num_products);
    let customers = gen.customers(config.num_customers);
    let sales = gen.sales(config.num_sales, config.num_products, config.num_customers);

    let (products, dropped_products) = retain_valid("product", products, validator);
    let (customers, dropped_customers) = retain_valid("customer", customers, validator);
    let (sales, dropped_sales) = retain_valid("sales", sales, validator);

    create_base_tables(store)?;
    let summary = GenerationSummary {
        products: append_records(store, &products)?,
        customers: append_records(store, &customers)?,
        sales: append_records(store, &sales)?,
        dropped: dropped_products + dropped_customers + dropped_sales,
    };

    log::info!(
        "data insertion complete for 'product' ({}), 'customer' ({}), 'sales' ({}) in '{}'",
        summary.products,
        summary.customers,
        summary.sales,
        store.path()
    );
    if summary.dropped > 0 {
        log::warn!("{} generated record(s) failed validation", summary.dropped);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::validate::{SchemaValidator, ValidationError};
    use crate::schema::Table;

    fn small_config() -> GeneratorConfig {
        GeneratorConfig {
            num_products: 5,
            num_customers: 5,
            num_sales: 10,
            seed: Some(42),
        }
    }

    #[test]
    fn test_seed_is_deterministic() {
        let a = DataGenerator::new(Some(7)).sales(20, 5, 5);
        let b = DataGenerator::new(Some(7)).sales(20, 5, 5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_generated_rows_are_valid() {
        let mut gen = DataGenerator::new(Some(1));
        for p in gen.products(50) {
            assert_eq!(SchemaValidator.validate(&p), Ok(()));
            assert_eq!(p.name, format!("{} {} {} {}", p.supplier, p.brand, p.family, p.color));
        }
        for c in gen.customers(50) {
            assert_eq!(SchemaValidator.validate(&c), Ok(()));
            let n = c.genres().count();
            assert!((1..=3).contains(&n));
        }
        for s in gen.sales(200, 30, 20) {
            assert_eq!(SchemaValidator.validate(&s), Ok(()));
            assert!((1..=30).contains(&s.product_id));
            assert!((1..=20).contains(&s.customer_id));
            assert!((0.5..=20.0).contains(&s.sales_volume));
            assert!(s.cost <= s.price);
        }
    }

    #[test]
    fn test_populate_counts() {
        let store = MetricsStore::open_in_memory().unwrap();
        let summary = populate(&store, &small_config(), &SchemaValidator).unwrap();
        assert_eq!(summary.products, 5);
        assert_eq!(summary.customers, 5);
        assert_eq!(summary.sales, 10);
        assert_eq!(summary.dropped, 0);
        for table in Table::BASE {
            assert!(store.table_exists(table.name()).unwrap());
        }
        assert_eq!(store.row_count("sales").unwrap(), 10);
    }

    #[test]
    fn test_populate_drops_invalid_rows() {
        struct NoNestle;
        impl RecordValidator<ProductRecord> for NoNestle {
            fn validate(&self, r: &ProductRecord) -> std::result::Result<(), ValidationError> {
                if r.supplier == "Nestle" {
                    return Err(ValidationError::Rejected("nestle".into()));
                }
                Ok(())
            }
        }
        impl RecordValidator<CustomerRecord> for NoNestle {
            fn validate(&self, _: &CustomerRecord) -> std::result::Result<(), ValidationError> {
                Ok(())
            }
        }
        impl RecordValidator<SalesRecord> for NoNestle {
            fn validate(&self, _: &SalesRecord) -> std::result::Result<(), ValidationError> {
                Ok(())
            }
        }

        let config = GeneratorConfig {
            num_products: 40,
            ..small_config()
        };
        let store = MetricsStore::open_in_memory().unwrap();
        let summary = populate(&store, &config, &NoNestle).unwrap();
        let nestle = store
            .query_count("SELECT COUNT(*) FROM product WHERE supplier = 'Nestle'")
            .unwrap();
        assert_eq!(nestle, 0);
        assert_eq!(summary.products as usize + summary.dropped, 40);
    }
}
