use std::cmp::Ordering;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};

use super::errors::DomainError;
use super::pagination::PageRequest;

pub const LOW_INVENTORY_THRESHOLD: i32 = 10;
const MAX_TITLE_LEN: usize = 255;

/// Tax multiplier applied for display prices (10%).
pub fn tax_rate() -> BigDecimal {
    BigDecimal::new(11.into(), 1)
}

#[derive(Debug, Clone)]
pub struct CollectionView {
    pub id: i64,
    pub title: String,
    pub featured_product_id: Option<i64>,
    pub product_count: i64,
}

#[derive(Debug, Clone)]
pub struct CollectionInput {
    pub title: String,
    pub featured_product_id: Option<i64>,
}

impl CollectionInput {
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_title(&self.title)
    }
}

#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub unit_price: BigDecimal,
    pub inventory: i32,
    pub collection_id: i64,
    pub last_update: DateTime<Utc>,
    pub promotion_ids: Vec<i64>,
}

impl ProductView {
    pub fn price_with_tax(&self) -> BigDecimal {
        (&self.unit_price * tax_rate()).round(2)
    }

    pub fn inventory_status(&self) -> &'static str {
        if self.inventory < LOW_INVENTORY_THRESHOLD {
            "Low"
        } else {
            "OK"
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProductInput {
    pub title: String,
    pub slug: Option<String>,
    pub description: String,
    pub unit_price: BigDecimal,
    pub inventory: i32,
    pub collection_id: i64,
    pub promotion_ids: Vec<i64>,
}

impl ProductInput {
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_title(&self.title)?;
        if self.unit_price < BigDecimal::from(1) {
            return Err(DomainError::validation("unit_price must be at least 1"));
        }
        if self.unit_price >= BigDecimal::from(10_000) || self.unit_price.round(2) != self.unit_price
        {
            return Err(DomainError::validation(
                "unit_price must have at most 4 integer digits and 2 decimal places",
            ));
        }
        if self.inventory < 0 {
            return Err(DomainError::validation("inventory cannot be negative"));
        }
        Ok(())
    }

    /// Explicit slug if given, otherwise derived from the title.
    pub fn resolved_slug(&self) -> String {
        match &self.slug {
            Some(slug) if !slug.trim().is_empty() => slug.trim().to_string(),
            _ => slugify(&self.title),
        }
    }
}

pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn validate_title(title: &str) -> Result<(), DomainError> {
    if title.trim().is_empty() {
        return Err(DomainError::validation("title may not be blank"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(DomainError::validation("title is longer than 255 characters"));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductOrdering {
    #[default]
    LastUpdateDesc,
    LastUpdate,
    UnitPrice,
    UnitPriceDesc,
    Title,
    TitleDesc,
}

impl ProductOrdering {
    /// Total order used by the in-memory store; ties break on id.
    pub fn compare(&self, a: &ProductView, b: &ProductView) -> Ordering {
        let primary = match self {
            ProductOrdering::LastUpdateDesc => b.last_update.cmp(&a.last_update),
            ProductOrdering::LastUpdate => a.last_update.cmp(&b.last_update),
            ProductOrdering::UnitPrice => a.unit_price.cmp(&b.unit_price),
            ProductOrdering::UnitPriceDesc => b.unit_price.cmp(&a.unit_price),
            ProductOrdering::Title => a.title.cmp(&b.title),
            ProductOrdering::TitleDesc => b.title.cmp(&a.title),
        };
        primary.then(a.id.cmp(&b.id))
    }
}

impl FromStr for ProductOrdering {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last_update" => Ok(ProductOrdering::LastUpdate),
            "-last_update" => Ok(ProductOrdering::LastUpdateDesc),
            "unit_price" => Ok(ProductOrdering::UnitPrice),
            "-unit_price" => Ok(ProductOrdering::UnitPriceDesc),
            "title" => Ok(ProductOrdering::Title),
            "-title" => Ok(ProductOrdering::TitleDesc),
            other => Err(DomainError::validation(format!(
                "unknown ordering '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub collection_id: Option<i64>,
    pub min_price: Option<BigDecimal>,
    pub max_price: Option<BigDecimal>,
    pub search: Option<String>,
    pub ordering: ProductOrdering,
    pub page: PageRequest,
}

impl ProductFilter {
    pub fn matches(&self, product: &ProductView) -> bool {
        if self.collection_id.is_some_and(|id| id != product.collection_id) {
            return false;
        }
        if self.min_price.as_ref().is_some_and(|min| product.unit_price < *min) {
            return false;
        }
        if self.max_price.as_ref().is_some_and(|max| product.unit_price > *max) {
            return false;
        }
        match &self.search {
            Some(term) => {
                let term = term.to_lowercase();
                product.title.to_lowercase().contains(&term)
                    || product.description.to_lowercase().contains(&term)
            }
            None => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PromotionView {
    pub id: i64,
    pub description: String,
    pub discount: f64,
}

#[derive(Debug, Clone)]
pub struct PromotionInput {
    pub description: String,
    pub discount: f64,
}

impl PromotionInput {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.description.trim().is_empty() {
            return Err(DomainError::validation("description may not be blank"));
        }
        if !self.discount.is_finite() || self.discount < 0.0 {
            return Err(DomainError::validation("discount must be a non-negative number"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ReviewView {
    pub id: i64,
    pub product_id: i64,
    pub name: String,
    pub description: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct ReviewInput {
    pub name: String,
    pub description: String,
}

impl ReviewInput {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name may not be blank"));
        }
        if self.description.trim().is_empty() {
            return Err(DomainError::validation("description may not be blank"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, title: &str, price: &str) -> ProductView {
        ProductView {
            id,
            title: title.to_string(),
            slug: slugify(title),
            description: String::new(),
            unit_price: BigDecimal::from_str(price).unwrap(),
            inventory: 5,
            collection_id: 1,
            last_update: Utc::now(),
            promotion_ids: vec![],
        }
    }

    fn input(price: &str, inventory: i32) -> ProductInput {
        ProductInput {
            title: "Coffee Mug".to_string(),
            slug: None,
            description: String::new(),
            unit_price: BigDecimal::from_str(price).unwrap(),
            inventory,
            collection_id: 1,
            promotion_ids: vec![],
        }
    }

    #[test]
    fn price_with_tax_adds_ten_percent() {
        let p = product(1, "Mug", "10.00");
        assert_eq!(p.price_with_tax(), BigDecimal::from_str("11.00").unwrap());
    }

    #[test]
    fn inventory_below_ten_is_low() {
        let mut p = product(1, "Mug", "1");
        p.inventory = 9;
        assert_eq!(p.inventory_status(), "Low");
        p.inventory = 10;
        assert_eq!(p.inventory_status(), "OK");
    }

    #[test]
    fn product_input_rejects_price_below_one() {
        assert!(input("0.99", 1).validate().is_err());
        assert!(input("1", 1).validate().is_ok());
    }

    #[test]
    fn product_input_rejects_too_many_decimals() {
        assert!(input("1.999", 1).validate().is_err());
    }

    #[test]
    fn product_input_rejects_negative_inventory() {
        assert!(input("5", -1).validate().is_err());
    }

    #[test]
    fn blank_collection_title_is_invalid() {
        let c = CollectionInput {
            title: "  ".to_string(),
            featured_product_id: None,
        };
        assert!(matches!(c.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Coffee -- Mug, Large "), "coffee-mug-large");
    }

    #[test]
    fn ordering_parses_descending_prefix() {
        assert_eq!(
            "-unit_price".parse::<ProductOrdering>().unwrap(),
            ProductOrdering::UnitPriceDesc
        );
        assert!("price".parse::<ProductOrdering>().is_err());
    }

    #[test]
    fn filter_search_is_case_insensitive() {
        let filter = ProductFilter {
            search: Some("MUG".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&product(1, "Coffee mug", "3")));
        assert!(!filter.matches(&product(2, "Teapot", "3")));
    }

    #[test]
    fn filter_price_range_is_inclusive() {
        let filter = ProductFilter {
            min_price: Some(BigDecimal::from(3)),
            max_price: Some(BigDecimal::from(5)),
            ..Default::default()
        };
        assert!(filter.matches(&product(1, "a", "3")));
        assert!(filter.matches(&product(2, "b", "5")));
        assert!(!filter.matches(&product(3, "c", "5.01")));
    }
}
