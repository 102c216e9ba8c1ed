//! Product generation.

use anyhow::bail;
use batch_seed::record::record_id;
use batch_seed::{RecordId, SeedRecord};
use fake::{Fake, faker::lorem::en::Paragraph, faker::lorem::en::Words};
use rand::Rng;
use rand_distr::{Distribution, LogNormal, Poisson};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use super::category::{CategoryRef, capitalize};

/// Generated product ready for seeding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedProduct {
    pub id: RecordId,
    pub category_id: RecordId,
    pub sku: String,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub stock: u32,
    /// Relative path of the product picture.
    pub image_path: String,
    pub created_at: OffsetDateTime,
}

impl SeedRecord for GeneratedProduct {
    const KIND: &'static str = "product";

    fn id(&self) -> RecordId {
        self.id
    }

    fn validate(&self) -> Result<(), String> {
        if self.price_cents <= 0 {
            return Err(format!("non-positive price {}", self.price_cents));
        }
        if self.sku.is_empty() {
            return Err("sku is empty".to_string());
        }
        Ok(())
    }
}

/// Configuration for product generation.
#[derive(Debug, Clone)]
pub struct ProductGenConfig {
    /// Median price, in cents.
    pub median_price_cents: f64,
    /// Spread of the log-normal price distribution.
    pub price_sigma: f64,
    /// Average stock level.
    pub avg_stock: f64,
    /// Probability that a product is out of stock.
    pub out_of_stock_rate: f64,
    /// Directory product images live in.
    pub image_dir: String,
    /// Products are created over this many days before the base time.
    pub catalog_age_days: i64,
}

impl Default for ProductGenConfig {
    fn default() -> Self {
        Self {
            median_price_cents: 2_500.0,
            price_sigma: 0.9,
            avg_stock: 40.0,
            out_of_stock_rate: 0.08,
            image_dir: "images/products".to_string(),
            catalog_age_days: 365,
        }
    }
}

/// Generates catalog products.
pub struct ProductGenerator {
    config: ProductGenConfig,
}

impl ProductGenerator {
    /// Creates a new product generator with default configuration.
    pub fn new() -> Self {
        Self {
            config: ProductGenConfig::default(),
        }
    }

    /// Creates a generator with custom configuration.
    pub fn with_config(config: ProductGenConfig) -> Self {
        Self { config }
    }

    /// Generates the product with 1-based `index` in a random category.
    ///
    /// Fails when `categories` is empty.
    pub fn generate(
        &self,
        index: u64,
        categories: &[CategoryRef],
        base_time: OffsetDateTime,
        rng: &mut impl Rng,
    ) -> anyhow::Result<GeneratedProduct> {
        if categories.is_empty() {
            bail!("product {index} needs at least one category");
        }

        let id = record_id(rng);
        let category = &categories[rng.gen_range(0..categories.len())];

        let words: Vec<String> = Words(2..4).fake_with_rng(rng);
        let name = words
            .iter()
            .map(|w| capitalize(w))
            .collect::<Vec<_>>()
            .join(" ");
        let description: String = Paragraph(2..4).fake_with_rng(rng);

        let sku = format!("{}-{index:07}", sku_prefix(&category.slug));
        let price_cents = self.generate_price(rng)?;
        let stock = self.generate_stock(rng)?;
        let created_at =
            base_time - Duration::days(rng.gen_range(0..self.config.catalog_age_days.max(1)));

        Ok(GeneratedProduct {
            id,
            category_id: category.id,
            sku,
            name,
            description,
            price_cents,
            stock,
            image_path: format!("{}/{index}.jpg", self.config.image_dir),
            created_at,
        })
    }

    /// Log-normal price: many cheap products, a long tail of expensive ones.
    fn generate_price(&self, rng: &mut impl Rng) -> anyhow::Result<i64> {
        let log_normal = LogNormal::new(self.config.median_price_cents.ln(), self.config.price_sigma)?;
        let cents = log_normal.sample(rng).round() as i64;
        // Round to x.99 pricing
        Ok((cents / 100).max(0) * 100 + 99)
    }

    fn generate_stock(&self, rng: &mut impl Rng) -> anyhow::Result<u32> {
        if rng.r#gen::<f64>() < self.config.out_of_stock_rate {
            return Ok(0);
        }
        let poisson = Poisson::new(self.config.avg_stock)?;
        let stock: f64 = poisson.sample(rng);
        Ok(stock as u32)
    }
}

impl Default for ProductGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// First three letters of a category slug, uppercased.
fn sku_prefix(slug: &str) -> String {
    slug.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .collect::<String>()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use uuid::Uuid;

    fn categories() -> Vec<CategoryRef> {
        vec![
            CategoryRef {
                id: Uuid::from_u128(1),
                slug: "books-1".to_string(),
            },
            CategoryRef {
                id: Uuid::from_u128(2),
                slug: "garden-2".to_string(),
            },
        ]
    }

    #[test]
    fn test_generate_product() {
        let product_gen = ProductGenerator::new();
        let mut rng = StdRng::seed_from_u64(12345);
        let cats = categories();

        let product = product_gen
            .generate(17, &cats, OffsetDateTime::now_utc(), &mut rng)
            .unwrap();

        assert!(cats.iter().any(|c| c.id == product.category_id));
        assert!(product.sku.ends_with("-0000017"));
        assert!(product.sku.starts_with("BOO") || product.sku.starts_with("GAR"));
        assert_eq!(product.image_path, "images/products/17.jpg");
        assert_eq!(product.price_cents % 100, 99);
        assert!(product.validate().is_ok());
    }

    #[test]
    fn test_requires_categories() {
        let product_gen = ProductGenerator::new();
        let mut rng = StdRng::seed_from_u64(1);

        let result = product_gen.generate(1, &[], OffsetDateTime::now_utc(), &mut rng);
        assert!(result.is_err());
    }

    #[test]
    fn test_out_of_stock_rate() {
        let product_gen = ProductGenerator::with_config(ProductGenConfig {
            out_of_stock_rate: 1.0,
            ..Default::default()
        });
        let mut rng = StdRng::seed_from_u64(1);

        let product = product_gen
            .generate(1, &categories(), OffsetDateTime::now_utc(), &mut rng)
            .unwrap();
        assert_eq!(product.stock, 0);
    }

    #[test]
    fn test_prices_are_spread() {
        let product_gen = ProductGenerator::new();
        let mut rng = StdRng::seed_from_u64(7);
        let cats = categories();
        let now = OffsetDateTime::now_utc();

        let prices: Vec<i64> = (1..=200)
            .map(|i| product_gen.generate(i, &cats, now, &mut rng).unwrap().price_cents)
            .collect();

        let min = prices.iter().min().unwrap();
        let max = prices.iter().max().unwrap();
        assert!(*min > 0);
        assert!(max > min, "Expected varied prices, got {min}..{max}");
    }
}
