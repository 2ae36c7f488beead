//! Product catalog types and the catalog import format.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::Money;

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "product_id")]
    pub id: ProductId,
    pub image_url: String,
    pub brand: String,
    pub title: String,
    pub colour: Option<String>,
    #[serde(with = "crate::value_objects::rupees")]
    pub discounted_price: Money,
    #[serde(with = "crate::value_objects::rupees")]
    pub price: Money,
    pub percentage_discount: i32,
    pub sizes: Vec<String>,
    pub stock: i32,
    pub top_level_category: String,
    pub second_level_category: Option<String>,
    pub third_level_category: Option<String>,
    pub description: Option<String>,
    pub slug: String,
}

impl Product {
    /// Joins the available sizes for display, if there are any.
    pub fn size_label(&self) -> Option<String> {
        (!self.sizes.is_empty()).then(|| self.sizes.join(", "))
    }
}

/// A product ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub image_url: String,
    pub brand: String,
    pub title: String,
    pub colour: Option<String>,
    pub discounted_price: Money,
    pub price: Money,
    pub percentage_discount: i32,
    pub sizes: Vec<String>,
    pub stock: i32,
    pub top_level_category: String,
    pub second_level_category: Option<String>,
    pub third_level_category: Option<String>,
    pub description: Option<String>,
    pub slug: String,
}

impl NewProduct {
    /// Attaches the identifier assigned by the store.
    pub fn with_id(self, id: ProductId) -> Product {
        Product {
            id,
            image_url: self.image_url,
            brand: self.brand,
            title: self.title,
            colour: self.colour,
            discounted_price: self.discounted_price,
            price: self.price,
            percentage_discount: self.percentage_discount,
            sizes: self.sizes,
            stock: self.stock,
            top_level_category: self.top_level_category,
            second_level_category: self.second_level_category,
            third_level_category: self.third_level_category,
            description: self.description,
            slug: self.slug,
        }
    }
}

/// Catalog listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    /// Top-level category, compared case-insensitively.
    pub category: Option<String>,
    /// Product to leave out (e.g. the one currently being viewed).
    pub exclude: Option<ProductId>,
}

impl ProductQuery {
    /// Returns true if the product passes this filter.
    pub fn matches(&self, product: &Product) -> bool {
        let category_ok = self
            .category
            .as_deref()
            .is_none_or(|c| product.top_level_category.eq_ignore_ascii_case(c));
        let not_excluded = self.exclude != Some(product.id);
        category_ok && not_excluded
    }
}

/// Sizes in catalog files are either a single string or a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SizeField {
    One(String),
    Many(Vec<String>),
}

impl SizeField {
    fn into_vec(self) -> Vec<String> {
        match self {
            SizeField::One(s) if s.trim().is_empty() => Vec::new(),
            SizeField::One(s) => vec![s],
            SizeField::Many(v) => v,
        }
    }
}

/// One product as written in catalog data files.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub image_url: String,
    pub brand: String,
    pub title: String,
    #[serde(default)]
    pub colour: Option<String>,
    pub discounted_price: String,
    pub price: String,
    #[serde(default)]
    pub percentage: Option<String>,
    #[serde(default)]
    pub size: Option<SizeField>,
    #[serde(default)]
    pub quantity: i32,
    pub top_level_category: String,
    #[serde(default)]
    pub second_level_category: Option<String>,
    #[serde(default)]
    pub third_level_category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CatalogEntry {
    /// Converts the loosely formatted catalog entry into an insertable product.
    pub fn into_new_product(self) -> Result<NewProduct, DomainError> {
        let discounted_price = Money::parse(&self.discounted_price)?;
        let price = Money::parse(&self.price)?;
        let percentage_discount = match self.percentage.as_deref() {
            Some(raw) => parse_percentage(raw)?,
            None => 0,
        };
        let slug = slugify(&self.title);

        Ok(NewProduct {
            image_url: self.image_url,
            brand: self.brand,
            title: self.title,
            colour: self.colour,
            discounted_price,
            price,
            percentage_discount,
            sizes: self.size.map(SizeField::into_vec).unwrap_or_default(),
            stock: self.quantity,
            top_level_category: self.top_level_category,
            second_level_category: self.second_level_category,
            third_level_category: self.third_level_category,
            description: self.description,
            slug,
        })
    }
}

/// Reads the leading number of a discount string such as `"55% off"`.
pub fn parse_percentage(raw: &str) -> Result<i32, DomainError> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits
        .parse::<i32>()
        .ok()
        .filter(|p| *p <= 100)
        .ok_or_else(|| DomainError::InvalidPercentage(raw.to_string()))
}

/// Lower-cases a title and joins its words with dashes.
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry() -> serde_json::Value {
        serde_json::json!({
            "imageUrl": "/images/tee-black.png",
            "brand": "KraftKart",
            "title": "Classic  Black Tee",
            "colour": "Black",
            "discountedPrice": "₹499",
            "price": "₹999",
            "percentage": "50% off",
            "size": ["S", "M", "L"],
            "quantity": 40,
            "topLevelCategory": "Tees",
            "secondLevelCategory": "Men",
            "description": "Soft cotton tee"
        })
    }

    #[test]
    fn catalog_entry_converts_prices_and_slug() {
        let entry: CatalogEntry = serde_json::from_value(sample_entry()).unwrap();
        let product = entry.into_new_product().unwrap();

        assert_eq!(product.discounted_price.paise(), 49_900);
        assert_eq!(product.price.paise(), 99_900);
        assert_eq!(product.percentage_discount, 50);
        assert_eq!(product.sizes, vec!["S", "M", "L"]);
        assert_eq!(product.stock, 40);
        assert_eq!(product.slug, "classic-black-tee");
        assert_eq!(product.third_level_category, None);
    }

    #[test]
    fn catalog_entry_accepts_single_size() {
        let mut raw = sample_entry();
        raw["size"] = serde_json::json!("Free Size");
        let entry: CatalogEntry = serde_json::from_value(raw).unwrap();
        assert_eq!(entry.into_new_product().unwrap().sizes, vec!["Free Size"]);
    }

    #[test]
    fn catalog_entry_rejects_bad_price() {
        let mut raw = sample_entry();
        raw["discountedPrice"] = serde_json::json!("call us");
        let entry: CatalogEntry = serde_json::from_value(raw).unwrap();
        assert!(matches!(
            entry.into_new_product(),
            Err(DomainError::InvalidPrice(_))
        ));
    }

    #[test]
    fn percentage_parsing() {
        assert_eq!(parse_percentage("55%").unwrap(), 55);
        assert_eq!(parse_percentage(" 10% off").unwrap(), 10);
        assert!(parse_percentage("off").is_err());
        assert!(parse_percentage("150%").is_err());
    }

    #[test]
    fn query_matches_category_case_insensitively() {
        let product = serde_json::from_value::<CatalogEntry>(sample_entry())
            .unwrap()
            .into_new_product()
            .unwrap()
            .with_id(ProductId::new(1));

        let by_category = ProductQuery {
            category: Some("tees".into()),
            exclude: None,
        };
        assert!(by_category.matches(&product));

        let other_category = ProductQuery {
            category: Some("mugs".into()),
            exclude: None,
        };
        assert!(!other_category.matches(&product));

        let excluded = ProductQuery {
            category: None,
            exclude: Some(ProductId::new(1)),
        };
        assert!(!excluded.matches(&product));
        assert!(ProductQuery::default().matches(&product));
    }

    #[test]
    fn size_label_joins_sizes() {
        let mut product = serde_json::from_value::<CatalogEntry>(sample_entry())
            .unwrap()
            .into_new_product()
            .unwrap()
            .with_id(ProductId::new(2));
        assert_eq!(product.size_label().as_deref(), Some("S, M, L"));
        product.sizes.clear();
        assert_eq!(product.size_label(), None);
    }
}
