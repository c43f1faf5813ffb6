//! # Catalog
//!
//! Product create/update rules and the global menu discount formula.
//!
//! ## Global Discount
//! ```text
//! original_price_cents   price_cents
//!        NULL               14000        no discount active
//!
//! apply 20%  ──►          14000         11200   (original remembered once)
//! apply 30%  ──►          14000          9800   (always from the original)
//! reset      ──►           NULL         14000
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Percent};
use crate::types::{Product, ProductCategory};
use crate::validation::{
    validate_description, validate_price_cents, validate_product_name, validate_rating,
};

/// Price of a product while a global discount of `pct` is active.
///
/// ```rust
/// use menu_core::catalog::discounted_price;
/// use menu_core::{Money, Percent};
///
/// let price = discounted_price(Money::from_cents(9_500), Percent::from_whole(15));
/// assert_eq!(price.cents(), 8_075);
/// ```
pub fn discounted_price(original: Money, pct: Percent) -> Money {
    pct.complement().of(original)
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price_cents: i64,
    pub category: ProductCategory,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl ProductDraft {
    pub fn into_product(self, id: String, now: DateTime<Utc>) -> CoreResult<Product> {
        let mut errors = Vec::new();
        if let Err(e) = validate_product_name(&self.name) {
            errors.push(e);
        }
        if let Err(e) = validate_description(&self.description) {
            errors.push(e);
        }
        if let Err(e) = validate_price_cents(self.price_cents) {
            errors.push(e);
        }
        if let Some(rating) = self.rating {
            if let Err(e) = validate_rating(rating) {
                errors.push(e);
            }
        }
        CoreError::from_field_errors(errors)?;

        Ok(Product {
            id,
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            price_cents: self.price_cents,
            original_price_cents: None,
            category: self.category,
            image: self.image.filter(|i| !i.trim().is_empty()),
            rating: self.rating,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial product update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub category: Option<ProductCategory>,
    pub image: Option<String>,
    pub rating: Option<f64>,
}

impl ProductPatch {
    /// Applies the patch.
    ///
    /// An explicit price overrides any active global discount: the
    /// remembered original price is dropped so a later reset does not
    /// undo the edit.
    pub fn apply_to(self, current: &Product, now: DateTime<Utc>) -> CoreResult<Product> {
        let mut next = current.clone();
        let mut errors = Vec::new();

        if let Some(name) = self.name {
            match validate_product_name(&name) {
                Ok(()) => next.name = name.trim().to_string(),
                Err(e) => errors.push(e),
            }
        }
        if let Some(description) = self.description {
            match validate_description(&description) {
                Ok(()) => next.description = description.trim().to_string(),
                Err(e) => errors.push(e),
            }
        }
        if let Some(price) = self.price_cents {
            match validate_price_cents(price) {
                Ok(()) => {
                    next.price_cents = price;
                    next.original_price_cents = None;
                }
                Err(e) => errors.push(e),
            }
        }
        if let Some(category) = self.category {
            next.category = category;
        }
        if let Some(image) = self.image {
            next.image = Some(image).filter(|i| !i.trim().is_empty());
        }
        if let Some(rating) = self.rating {
            match validate_rating(rating) {
                Ok(()) => next.rating = Some(rating),
                Err(e) => errors.push(e),
            }
        }

        CoreError::from_field_errors(errors)?;
        next.updated_at = now;
        Ok(next)
    }
}

/// The menu a fresh install starts with.
pub fn default_menu(now: DateTime<Utc>) -> Vec<Product> {
    const PIZZA_DESC: &str = "Pepperoni with mozzarella and tomato sauce, authentic Italian pizza";

    let item = |id: &str,
                name: &str,
                description: &str,
                price_cents: i64,
                category: ProductCategory,
                image: &str,
                rating: f64| Product {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        price_cents,
        original_price_cents: None,
        category,
        image: Some(format!(
            "https://images.unsplash.com/{image}?auto=format&fit=crop&w=800&q=80"
        )),
        rating: Some(rating),
        created_at: now,
        updated_at: now,
    };

    vec![
        item(
            "pizza1",
            "Pepperoni Pizza",
            PIZZA_DESC,
            14_000,
            ProductCategory::Pizza,
            "photo-1593560708920-61dd98c46a4e",
            4.8,
        ),
        item(
            "pizza2",
            "Pepperoni Pizza",
            PIZZA_DESC,
            14_000,
            ProductCategory::Pizza,
            "photo-1513104890138-7c749659a591",
            4.8,
        ),
        item(
            "burger1",
            "Angus Beef Burger",
            "Angus beef burger with cheddar and house sauce",
            12_000,
            ProductCategory::Burger,
            "photo-1571091718767-18b5b1457add",
            4.9,
        ),
        item(
            "burger2",
            "Crispy Chicken Burger",
            "Crispy fried chicken burger with garlic sauce and lettuce",
            9_500,
            ProductCategory::Burger,
            "photo-1568901346375-23c9450c58cd",
            4.6,
        ),
        item(
            "sandwich1",
            "Shawarma Sandwich",
            "Chicken shawarma with tahini and mixed vegetables",
            6_500,
            ProductCategory::Sandwich,
            "photo-1485451456034-3f9391c6f769",
            4.7,
        ),
        item(
            "drink1",
            "Fresh Fruit Juice",
            "A refreshing blend of fresh fruit",
            3_500,
            ProductCategory::Drink,
            "photo-1513558161293-cdaf765ed2fd",
            4.5,
        ),
    ]
}
