use std::sync::Arc;

use uuid::Uuid;

use crate::domain::cart::{validate_quantity, CartItemView, CartView};
use crate::domain::errors::DomainError;
use crate::domain::ports::CartRepository;

/// Carts are anonymous: the cart token is the only credential needed.
#[derive(Clone)]
pub struct CartService {
    repo: Arc<dyn CartRepository>,
}

impl CartService {
    pub fn new(repo: Arc<dyn CartRepository>) -> Self {
        Self { repo }
    }

    pub fn create_cart(&self) -> Result<CartView, DomainError> {
        let cart = self.repo.create()?;
        log::debug!("Created cart {}", cart.id);
        Ok(cart)
    }

    pub fn get_cart(&self, id: Uuid) -> Result<CartView, DomainError> {
        self.repo
            .find(id)?
            .ok_or_else(|| DomainError::not_found(format!("Cart {id}")))
    }

    pub fn delete_cart(&self, id: Uuid) -> Result<(), DomainError> {
        if !self.repo.delete(id)? {
            return Err(DomainError::not_found(format!("Cart {id}")));
        }
        Ok(())
    }

    pub fn list_items(&self, cart_id: Uuid) -> Result<Vec<CartItemView>, DomainError> {
        Ok(self.get_cart(cart_id)?.items)
    }

    pub fn get_item(&self, cart_id: Uuid, item_id: i64) -> Result<CartItemView, DomainError> {
        self.get_cart(cart_id)?
            .items
            .into_iter()
            .find(|i| i.id == item_id)
            .ok_or_else(|| DomainError::not_found(format!("Cart item {item_id}")))
    }

    /// Adds `quantity` of a product, merging with an existing line for the
    /// same product. Inventory is not consulted.
    pub fn add_item(
        &self,
        cart_id: Uuid,
        product_id: i64,
        quantity: i32,
    ) -> Result<CartItemView, DomainError> {
        validate_quantity(quantity)?;
        self.repo.add_item(cart_id, product_id, quantity)
    }

    pub fn update_item(
        &self,
        cart_id: Uuid,
        item_id: i64,
        quantity: i32,
    ) -> Result<CartItemView, DomainError> {
        validate_quantity(quantity)?;
        self.repo
            .update_item(cart_id, item_id, quantity)?
            .ok_or_else(|| DomainError::not_found(format!("Cart item {item_id}")))
    }

    /// Idempotent; the cart itself is kept even when it becomes empty.
    pub fn remove_item(&self, cart_id: Uuid, item_id: i64) -> Result<(), DomainError> {
        self.repo.remove_item(cart_id, item_id)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::*;
    use crate::infrastructure::memory::MemoryStore;

    fn setup() -> (CartService, i64) {
        let store = Arc::new(MemoryStore::new());
        let product_id = store.seed_product("Tea", BigDecimal::from_str("3.50").unwrap());
        (CartService::new(store), product_id)
    }

    #[test]
    fn adding_same_product_twice_increments_one_item() {
        let (service, product_id) = setup();
        let cart = service.create_cart().unwrap();

        service.add_item(cart.id, product_id, 1).unwrap();
        let item = service.add_item(cart.id, product_id, 2).unwrap();

        assert_eq!(item.quantity, 3);
        let cart = service.get_cart(cart.id).unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.total_price(), BigDecimal::from_str("10.50").unwrap());
    }

    #[test]
    fn adding_past_i32_max_is_validation_error() {
        let (service, product_id) = setup();
        let cart = service.create_cart().unwrap();
        service.add_item(cart.id, product_id, i32::MAX).unwrap();

        let err = service.add_item(cart.id, product_id, 1).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        // the store is still usable and the line is unchanged
        let cart = service.get_cart(cart.id).unwrap();
        assert_eq!(cart.items[0].quantity, i32::MAX);
    }

    #[test]
    fn adding_unknown_product_is_not_found() {
        let (service, _) = setup();
        let cart = service.create_cart().unwrap();
        let err = service.add_item(cart.id, 999, 1).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn adding_to_unknown_cart_is_not_found() {
        let (service, product_id) = setup();
        let err = service.add_item(Uuid::new_v4(), product_id, 1).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn update_below_one_is_validation_error() {
        let (service, product_id) = setup();
        let cart = service.create_cart().unwrap();
        let item = service.add_item(cart.id, product_id, 1).unwrap();

        let err = service.update_item(cart.id, item.id, 0).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(service.get_item(cart.id, item.id).unwrap().quantity, 1);
    }

    #[test]
    fn update_sets_quantity() {
        let (service, product_id) = setup();
        let cart = service.create_cart().unwrap();
        let item = service.add_item(cart.id, product_id, 1).unwrap();

        let updated = service.update_item(cart.id, item.id, 5).unwrap();
        assert_eq!(updated.quantity, 5);
    }

    #[test]
    fn remove_is_idempotent_and_keeps_cart() {
        let (service, product_id) = setup();
        let cart = service.create_cart().unwrap();
        let item = service.add_item(cart.id, product_id, 1).unwrap();

        service.remove_item(cart.id, item.id).unwrap();
        service.remove_item(cart.id, item.id).unwrap();

        let cart = service.get_cart(cart.id).unwrap();
        assert!(cart.items.is_empty());
    }

    #[test]
    fn item_of_another_cart_is_not_visible() {
        let (service, product_id) = setup();
        let a = service.create_cart().unwrap();
        let b = service.create_cart().unwrap();
        let item = service.add_item(a.id, product_id, 1).unwrap();

        assert!(service.get_item(b.id, item.id).is_err());
        assert!(service.update_item(b.id, item.id, 2).is_err());
    }

    #[test]
    fn deleted_cart_is_gone() {
        let (service, _) = setup();
        let cart = service.create_cart().unwrap();
        service.delete_cart(cart.id).unwrap();
        assert!(matches!(
            service.delete_cart(cart.id),
            Err(DomainError::NotFound(_))
        ));
    }
}
