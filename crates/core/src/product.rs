//! Catalog product records.
//!
//! Field names follow the catalog service's JSON so a product can be
//! deserialized straight from `GET /products` and `GET /products/{id}`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CurrencyCode, Price, ProductId};

/// A product offered by the catalog service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    /// Unit price in the store currency.
    pub price: Decimal,
    pub description: String,
    pub category: String,
    /// Absolute URL of the product image.
    pub image: String,
    #[serde(default)]
    pub rating: Rating,
}

impl Product {
    /// The unit price tagged with a display currency.
    #[must_use]
    pub const fn unit_price(&self, currency: CurrencyCode) -> Price {
        Price::new(self.price, currency)
    }
}

/// Average review score and number of reviews.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rating {
    /// Average score, 0 to 5.
    pub rate: f64,
    pub count: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_catalog_json() {
        let json = serde_json::json!({
            "id": 1,
            "title": "Fjallraven - Foldsack No. 1 Backpack",
            "price": 109.95,
            "description": "Your perfect pack for everyday use",
            "category": "men's clothing",
            "image": "https://fakestoreapi.com/img/81fPKd-2AYL._AC_SL1500_.jpg",
            "rating": { "rate": 3.9, "count": 120 }
        });

        let product: Product = serde_json::from_value(json).unwrap();
        assert_eq!(product.id, ProductId::new(1));
        assert_eq!(product.price, Decimal::new(10995, 2));
        assert_eq!(product.rating.count, 120);
    }

    #[test]
    fn test_missing_rating_defaults() {
        let json = serde_json::json!({
            "id": 2,
            "title": "Mug",
            "price": 10,
            "description": "",
            "category": "kitchen",
            "image": ""
        });

        let product: Product = serde_json::from_value(json).unwrap();
        assert_eq!(product.rating, Rating::default());
        assert_eq!(product.unit_price(CurrencyCode::BRL).display(), "R$ 10,00");
    }
}
