//! Reference dataset generation.

use crate::dialect::CATEGORIES;
use rand::RngExt;
use rust_decimal::Decimal;

/// How many reference rows to generate and load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSpec {
    pub rows: u32,
}

impl SeedSpec {
    pub fn new(rows: u32) -> Self {
        Self { rows }
    }
}

impl Default for SeedSpec {
    fn default() -> Self {
        Self { rows: 50_000 }
    }
}

/// One generated reference row, before the backend assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSeed {
    pub name: String,
    pub category: &'static str,
    pub price: Decimal,
}

/// Generate the synthetic reference rows: uniform-random category, price
/// uniform in [10.00, 500.00] with two decimals.
pub fn generate_products(spec: &SeedSpec) -> Vec<ProductSeed> {
    let mut rng = rand::rng();
    (1..=spec.rows)
        .map(|n| {
            let category = CATEGORIES[rng.random_range(0..CATEGORIES.len())];
            let cents: i64 = rng.random_range(1_000..=50_000);
            ProductSeed {
                name: format!("product-{:06}", n),
                category,
                price: Decimal::new(cents, 2),
            }
        })
        .collect()
}
