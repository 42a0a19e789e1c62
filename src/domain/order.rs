use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Complete,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Complete => "COMPLETE",
            OrderStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(OrderStatus::Pending),
            "COMPLETE" => Ok(OrderStatus::Complete),
            "FAILED" => Ok(OrderStatus::Failed),
            _ => Err(DomainError::validation(format!("unknown order status '{s}'"))),
        }
    }
}

/// A cart item joined with its product's price at the moment of reading.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub product_id: i64,
    pub quantity: i32,
    pub current_unit_price: BigDecimal,
}

/// What an order item is created from. The price is a copy, never a reference.
#[derive(Debug, Clone)]
pub struct OrderLineInput {
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: i64,
    pub customer_id: i64,
    pub status: OrderStatus,
    pub placed_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

impl OrderView {
    pub fn total_price(&self) -> BigDecimal {
        self.items
            .iter()
            .map(|i| &i.unit_price * BigDecimal::from(i.quantity))
            .fold(BigDecimal::from(0), |acc, p| acc + p)
    }
}

/// Freezes the current cart contents into order lines.
///
/// An empty cart cannot become an order.
pub fn snapshot_lines(lines: Vec<CartLine>) -> Result<Vec<OrderLineInput>, DomainError> {
    if lines.is_empty() {
        return Err(DomainError::validation("The cart is empty"));
    }
    Ok(lines
        .into_iter()
        .map(|l| OrderLineInput {
            product_id: l.product_id,
            quantity: l.quantity,
            unit_price: l.current_unit_price,
        })
        .collect())
}

/// Payload of the `OrderPlaced` outbox event.
pub fn order_placed_payload(order: &OrderView, cart_id: Uuid) -> Value {
    let items: Vec<Value> = order
        .items
        .iter()
        .map(|i| {
            json!({
                "product_id": i.product_id,
                "quantity": i.quantity,
                "unit_price": i.unit_price.to_string()
            })
        })
        .collect();

    json!({
        "order_id": order.id,
        "customer_id": order.customer_id,
        "cart_id": cart_id,
        "status": order.status.as_str(),
        "total_price": order.total_price().to_string(),
        "items": items
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: i64, quantity: i32, price: &str) -> CartLine {
        CartLine {
            product_id,
            quantity,
            current_unit_price: BigDecimal::from_str(price).unwrap(),
        }
    }

    #[test]
    fn snapshot_of_empty_cart_is_validation_error() {
        let err = snapshot_lines(vec![]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn snapshot_copies_quantity_and_price() {
        let lines = snapshot_lines(vec![line(1, 2, "9.99"), line(2, 1, "5")]).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].product_id, 1);
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].unit_price, BigDecimal::from_str("9.99").unwrap());
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("complete".parse::<OrderStatus>().unwrap(), OrderStatus::Complete);
        assert_eq!(OrderStatus::Failed.to_string(), "FAILED");
        assert!("SHIPPED".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn placed_payload_lists_items_and_total() {
        let order = OrderView {
            id: 5,
            customer_id: 9,
            status: OrderStatus::Pending,
            placed_at: Utc::now(),
            items: vec![OrderItemView {
                id: 1,
                product_id: 3,
                quantity: 2,
                unit_price: BigDecimal::from_str("4.50").unwrap(),
            }],
        };
        let payload = order_placed_payload(&order, Uuid::nil());
        assert_eq!(payload["order_id"], 5);
        assert_eq!(payload["status"], "PENDING");
        assert_eq!(payload["total_price"], "9.00");
        assert_eq!(payload["items"][0]["unit_price"], "4.50");
    }
}
