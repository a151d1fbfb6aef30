//! Product domain entity

use serde::{Deserialize, Serialize};

/// A catalog product.
///
/// `available = false` marks a soft-deleted product. The row is kept for
/// audit but no longer resolves through the read paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub price: f64,
    pub available: bool,
}

/// Data required to create a product
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }
}

/// Partial update. The id is immutable and has no place here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none()
    }

    /// Apply the patch onto an existing product in place.
    pub fn apply_to(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> Product {
        Product {
            id: 1,
            name: "Widget".into(),
            price: 9.99,
            available: true,
        }
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(ProductPatch::default().is_empty());
        assert!(!ProductPatch {
            price: Some(1.0),
            ..Default::default()
        }
        .is_empty());
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut product = widget();
        ProductPatch {
            name: Some("Gadget".into()),
            price: None,
        }
        .apply_to(&mut product);

        assert_eq!(product.name, "Gadget");
        assert_eq!(product.price, 9.99);
        assert_eq!(product.id, 1);
        assert!(product.available);
    }

    #[test]
    fn serializes_flat_record() {
        let json = serde_json::to_value(widget()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 1, "name": "Widget", "price": 9.99, "available": true})
        );
    }
}
