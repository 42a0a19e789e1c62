use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone)]
pub struct CartProduct {
    pub id: i64,
    pub title: String,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct CartItemView {
    pub id: i64,
    pub product: CartProduct,
    pub quantity: i32,
}

impl CartItemView {
    pub fn total_price(&self) -> BigDecimal {
        &self.product.unit_price * BigDecimal::from(self.quantity)
    }
}

#[derive(Debug, Clone)]
pub struct CartView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub items: Vec<CartItemView>,
}

impl CartView {
    pub fn total_price(&self) -> BigDecimal {
        self.items
            .iter()
            .map(CartItemView::total_price)
            .fold(BigDecimal::from(0), |acc, p| acc + p)
    }
}

/// Cart item quantities are always at least one.
pub fn validate_quantity(quantity: i32) -> Result<(), DomainError> {
    if quantity < 1 {
        return Err(DomainError::validation("quantity must be at least 1"));
    }
    Ok(())
}

/// Quantity of a cart line after adding `added` more of the same product.
pub fn combined_quantity(existing: i32, added: i32) -> Result<i32, DomainError> {
    existing
        .checked_add(added)
        .ok_or_else(|| DomainError::validation(format!("quantity may not exceed {}", i32::MAX)))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn item(id: i64, price: &str, quantity: i32) -> CartItemView {
        CartItemView {
            id,
            product: CartProduct {
                id,
                title: format!("product {id}"),
                unit_price: BigDecimal::from_str(price).unwrap(),
            },
            quantity,
        }
    }

    #[test]
    fn empty_cart_totals_zero() {
        let cart = CartView {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            items: vec![],
        };
        assert_eq!(cart.total_price(), BigDecimal::from(0));
    }

    #[test]
    fn cart_total_sums_item_totals() {
        let cart = CartView {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            items: vec![item(1, "2.50", 2), item(2, "10", 3)],
        };
        assert_eq!(cart.items[0].total_price(), BigDecimal::from(5));
        assert_eq!(cart.total_price(), BigDecimal::from(35));
    }

    #[test]
    fn quantity_must_be_positive() {
        assert!(validate_quantity(1).is_ok());
        assert!(matches!(validate_quantity(0), Err(DomainError::Validation(_))));
        assert!(validate_quantity(-3).is_err());
    }
}
