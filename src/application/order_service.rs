use std::sync::Arc;

use uuid::Uuid;

use crate::domain::access::{OrderScope, Principal};
use crate::domain::errors::DomainError;
use crate::domain::order::{OrderStatus, OrderView};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::ports::{CustomerRepository, OrderRepository};

#[derive(Clone)]
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    customers: Arc<dyn CustomerRepository>,
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrderRepository>, customers: Arc<dyn CustomerRepository>) -> Self {
        Self { repo, customers }
    }

    /// Turns the cart into a pending order for the calling user.
    ///
    /// Either the order and all of its items exist and the cart is gone, or
    /// nothing changed.
    pub fn place_order(&self, principal: &Principal, cart_id: Uuid) -> Result<OrderView, DomainError> {
        let user_id = principal.require_user()?;
        match self.repo.place_from_cart(user_id, cart_id) {
            Ok(order) => {
                log::info!(
                    "Placed order {} for customer {} from cart {cart_id} ({} items)",
                    order.id,
                    order.customer_id,
                    order.items.len()
                );
                Ok(order)
            }
            Err(e) => {
                log::warn!("Could not place order from cart {cart_id}: {e}");
                Err(e)
            }
        }
    }

    pub fn list_orders(
        &self,
        principal: &Principal,
        page: PageRequest,
    ) -> Result<Page<OrderView>, DomainError> {
        let scope = self.scope_for(principal)?;
        if scope == OrderScope::Nothing {
            return Ok(Page::empty());
        }
        self.repo.list(scope, page)
    }

    /// Orders outside the caller's scope are reported as missing.
    pub fn get_order(&self, principal: &Principal, id: i64) -> Result<OrderView, DomainError> {
        let scope = self.scope_for(principal)?;
        self.repo
            .find_by_id(id)?
            .filter(|o| scope.permits(o.customer_id))
            .ok_or_else(|| DomainError::not_found(format!("Order {id}")))
    }

    pub fn update_status(
        &self,
        principal: &Principal,
        id: i64,
        status: OrderStatus,
    ) -> Result<OrderView, DomainError> {
        principal.require_staff()?;
        let order = self
            .repo
            .update_status(id, status)?
            .ok_or_else(|| DomainError::not_found(format!("Order {id}")))?;
        log::info!("Order {id} is now {status}");
        Ok(order)
    }

    pub fn delete_order(&self, principal: &Principal, id: i64) -> Result<(), DomainError> {
        principal.require_staff()?;
        if !self.repo.delete(id)? {
            return Err(DomainError::not_found(format!("Order {id}")));
        }
        log::info!("Deleted order {id}");
        Ok(())
    }

    fn scope_for(&self, principal: &Principal) -> Result<OrderScope, DomainError> {
        let user_id = principal.require_user()?;
        let customer_id = if principal.is_staff {
            None
        } else {
            self.customers.find_by_user(user_id)?.map(|c| c.id)
        };
        OrderScope::for_principal(principal, customer_id)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::*;
    use crate::application::cart_service::CartService;
    use crate::domain::catalog::ProductInput;
    use crate::domain::ports::{CartRepository, CatalogRepository};
    use crate::infrastructure::memory::MemoryStore;

    struct Fixture {
        store: Arc<MemoryStore>,
        carts: CartService,
        orders: OrderService,
        tea: i64,
        cake: i64,
    }

    fn setup() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let tea = store.seed_product("Tea", BigDecimal::from_str("3.50").unwrap());
        let cake = store.seed_product("Cake", BigDecimal::from_str("12.00").unwrap());
        Fixture {
            carts: CartService::new(store.clone()),
            orders: OrderService::new(store.clone(), store.clone()),
            store,
            tea,
            cake,
        }
    }

    fn filled_cart(f: &Fixture) -> Uuid {
        let cart = f.carts.create_cart().unwrap();
        f.carts.add_item(cart.id, f.tea, 2).unwrap();
        f.carts.add_item(cart.id, f.cake, 1).unwrap();
        cart.id
    }

    #[test]
    fn placing_order_copies_quantities_and_removes_cart() {
        let f = setup();
        let cart_id = filled_cart(&f);
        let cart_quantity: i32 = f.carts.list_items(cart_id).unwrap().iter().map(|i| i.quantity).sum();

        let order = f.orders.place_order(&Principal::user(7), cart_id).unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 2);
        let order_quantity: i32 = order.items.iter().map(|i| i.quantity).sum();
        assert_eq!(order_quantity, cart_quantity);
        assert!(matches!(
            f.carts.get_cart(cart_id),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn placing_order_from_empty_cart_fails_without_creating_order() {
        let f = setup();
        let cart = f.carts.create_cart().unwrap();
        let user = Principal::user(7);

        let err = f.orders.place_order(&user, cart.id).unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(f.orders.list_orders(&Principal::staff(1), PageRequest::default()).unwrap().total, 0);
        assert!(f.carts.get_cart(cart.id).is_ok());
    }

    #[test]
    fn placing_order_from_missing_cart_is_not_found() {
        let f = setup();
        let err = f.orders.place_order(&Principal::user(7), Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn anonymous_cannot_place_order() {
        let f = setup();
        let cart_id = filled_cart(&f);
        let err = f.orders.place_order(&Principal::anonymous(), cart_id).unwrap_err();
        assert!(matches!(err, DomainError::AuthenticationRequired));
        assert!(f.carts.get_cart(cart_id).is_ok());
    }

    #[test]
    fn converting_the_same_cart_twice_fails_the_second_time() {
        let f = setup();
        let cart_id = filled_cart(&f);
        f.orders.place_order(&Principal::user(7), cart_id).unwrap();
        let err = f.orders.place_order(&Principal::user(7), cart_id).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn later_price_change_does_not_touch_order_items() {
        let f = setup();
        let cart_id = filled_cart(&f);
        let user = Principal::user(7);
        let order = f.orders.place_order(&user, cart_id).unwrap();

        let tea = f.store.find_product(f.tea).unwrap().unwrap();
        f.store
            .update_product(
                f.tea,
                ProductInput {
                    title: tea.title,
                    slug: Some(tea.slug),
                    description: tea.description,
                    unit_price: BigDecimal::from(99),
                    inventory: tea.inventory,
                    collection_id: tea.collection_id,
                    promotion_ids: vec![],
                },
            )
            .unwrap();

        let reloaded = f.orders.get_order(&user, order.id).unwrap();
        let tea_line = reloaded.items.iter().find(|i| i.product_id == f.tea).unwrap();
        assert_eq!(tea_line.unit_price, BigDecimal::from_str("3.50").unwrap());
    }

    #[test]
    fn placing_order_records_outbox_event() {
        let f = setup();
        let cart_id = filled_cart(&f);
        let order = f.orders.place_order(&Principal::user(7), cart_id).unwrap();

        let events = f.store.outbox_events();
        assert_eq!(events.len(), 1, "exactly one outbox event per order");
        assert_eq!(events[0].event_type, "OrderPlaced");
        assert_eq!(events[0].aggregate_id, order.id.to_string());
    }

    #[test]
    fn customers_only_see_their_own_orders() {
        let f = setup();
        let alice = Principal::user(1);
        let bob = Principal::user(2);
        let order = f.orders.place_order(&alice, filled_cart(&f)).unwrap();
        f.orders.place_order(&bob, filled_cart(&f)).unwrap();

        assert_eq!(f.orders.list_orders(&alice, PageRequest::default()).unwrap().total, 1);
        assert_eq!(f.orders.list_orders(&Principal::staff(9), PageRequest::default()).unwrap().total, 2);
        assert!(matches!(
            f.orders.get_order(&bob, order.id),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn user_without_profile_has_no_orders() {
        let f = setup();
        let page = f.orders.list_orders(&Principal::user(3), PageRequest::default()).unwrap();
        assert_eq!(page.total, 0);
    }

    #[test]
    fn only_staff_can_change_status() {
        let f = setup();
        let user = Principal::user(1);
        let order = f.orders.place_order(&user, filled_cart(&f)).unwrap();

        let err = f.orders.update_status(&user, order.id, OrderStatus::Complete).unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied));

        let updated = f
            .orders
            .update_status(&Principal::staff(9), order.id, OrderStatus::Complete)
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Complete);
        assert_eq!(updated.items.len(), order.items.len());
    }

    #[test]
    fn staff_can_delete_orders() {
        let f = setup();
        let order = f.orders.place_order(&Principal::user(1), filled_cart(&f)).unwrap();
        let staff = Principal::staff(9);

        assert!(matches!(
            f.orders.delete_order(&Principal::user(1), order.id),
            Err(DomainError::PermissionDenied)
        ));
        f.orders.delete_order(&staff, order.id).unwrap();
        assert!(f.orders.get_order(&staff, order.id).is_err());
    }

    #[test]
    fn removed_cart_item_does_not_end_up_in_order() {
        let f = setup();
        let cart_id = filled_cart(&f);
        let cake_item = f
            .carts
            .list_items(cart_id)
            .unwrap()
            .into_iter()
            .find(|i| i.product.id == f.cake)
            .unwrap();
        f.store.remove_item(cart_id, cake_item.id).unwrap();

        let order = f.orders.place_order(&Principal::user(1), cart_id).unwrap();
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].product_id, f.tea);
    }
}
