use std::collections::HashMap;

use bigdecimal::BigDecimal;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::access::OrderScope;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    order_placed_payload, snapshot_lines, CartLine, OrderItemView, OrderStatus, OrderView,
};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::ports::OrderRepository;
use crate::schema::{cart_items, carts, order_items, orders, products, store_outbox};

use super::customer_repo::get_or_create_customer;
use super::models::{NewOrderItemRow, NewOrderRow, NewOutboxEventRow, OrderItemRow, OrderRow};

fn order_view(row: OrderRow, items: Vec<OrderItemRow>) -> Result<OrderView, DomainError> {
    Ok(OrderView {
        id: row.id,
        customer_id: row.customer_id,
        status: row.status.parse()?,
        placed_at: row.placed_at,
        items: items
            .into_iter()
            .map(|i| OrderItemView {
                id: i.id,
                product_id: i.product_id,
                quantity: i.quantity,
                unit_price: i.unit_price,
            })
            .collect(),
    })
}

fn load_items(
    conn: &mut PgConnection,
    order_ids: Vec<i64>,
) -> QueryResult<HashMap<i64, Vec<OrderItemRow>>> {
    let rows = order_items::table
        .filter(order_items::order_id.eq_any(order_ids))
        .select(OrderItemRow::as_select())
        .order(order_items::id.asc())
        .load(conn)?;
    let mut by_order: HashMap<i64, Vec<OrderItemRow>> = HashMap::new();
    for row in rows {
        by_order.entry(row.order_id).or_default().push(row);
    }
    Ok(by_order)
}

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderRepository for DieselOrderRepository {
    fn place_from_cart(&self, user_id: i64, cart_id: Uuid) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Lock the cart so a concurrent conversion waits and then finds it gone.
            let cart = carts::table
                .find(cart_id)
                .select(carts::id)
                .for_update()
                .first::<Uuid>(conn)
                .optional()?;
            if cart.is_none() {
                return Err(DomainError::not_found(format!("Cart {cart_id}")));
            }

            // 2. Snapshot the current prices of everything in the cart.
            let rows: Vec<(i64, i32, BigDecimal)> = cart_items::table
                .inner_join(products::table)
                .filter(cart_items::cart_id.eq(cart_id))
                .select((cart_items::product_id, cart_items::quantity, products::unit_price))
                .order(cart_items::id.asc())
                .load(conn)?;
            let lines = snapshot_lines(
                rows.into_iter()
                    .map(|(product_id, quantity, current_unit_price)| CartLine {
                        product_id,
                        quantity,
                        current_unit_price,
                    })
                    .collect(),
            )?;

            // 3. Insert the order and its items.
            let customer = get_or_create_customer(conn, user_id)?;
            let order = diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    customer_id: customer.id,
                    status: OrderStatus::Pending.as_str().to_string(),
                })
                .returning(OrderRow::as_returning())
                .get_result(conn)?;

            let new_items: Vec<NewOrderItemRow> = lines
                .into_iter()
                .map(|l| NewOrderItemRow {
                    order_id: order.id,
                    product_id: l.product_id,
                    quantity: l.quantity,
                    unit_price: l.unit_price,
                })
                .collect();
            let items = diesel::insert_into(order_items::table)
                .values(&new_items)
                .returning(OrderItemRow::as_returning())
                .get_results(conn)?;
            let view = order_view(order, items)?;

            // 4. Outbox event in the same transaction.
            diesel::insert_into(store_outbox::table)
                .values(&NewOutboxEventRow {
                    id: Uuid::new_v4(),
                    aggregate_type: "Order".to_string(),
                    aggregate_id: view.id.to_string(),
                    event_type: "OrderPlaced".to_string(),
                    payload: order_placed_payload(&view, cart_id),
                })
                .execute(conn)?;

            // 5. The cart is consumed.
            diesel::delete(carts::table.find(cart_id)).execute(conn)?;

            Ok(view)
        })
    }

    fn find_by_id(&self, id: i64) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .find(id)
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let items = order_items::table
            .filter(order_items::order_id.eq(order.id))
            .select(OrderItemRow::as_select())
            .order(order_items::id.asc())
            .load(&mut conn)?;

        order_view(order, items).map(Some)
    }

    fn list(&self, scope: OrderScope, page: PageRequest) -> Result<Page<OrderView>, DomainError> {
        let customer_filter = match scope {
            OrderScope::All => None,
            OrderScope::Customer(id) => Some(id),
            OrderScope::Nothing => return Ok(Page::empty()),
        };
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let mut count_query = orders::table.into_boxed();
            let mut rows_query = orders::table.into_boxed();
            if let Some(customer_id) = customer_filter {
                count_query = count_query.filter(orders::customer_id.eq(customer_id));
                rows_query = rows_query.filter(orders::customer_id.eq(customer_id));
            }

            let total: i64 = count_query.count().get_result(conn)?;
            let rows: Vec<OrderRow> = rows_query
                .order((orders::placed_at.desc(), orders::id.desc()))
                .limit(page.limit)
                .offset(page.offset())
                .load(conn)?;

            let mut items = load_items(conn, rows.iter().map(|o| o.id).collect())?;
            let orders = rows
                .into_iter()
                .map(|o| {
                    let lines = items.remove(&o.id).unwrap_or_default();
                    order_view(o, lines)
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Page {
                items: orders,
                total,
            })
        })
    }

    fn update_status(
        &self,
        id: i64,
        status: OrderStatus,
    ) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order = diesel::update(orders::table.find(id))
                .set(orders::status.eq(status.as_str()))
                .returning(OrderRow::as_returning())
                .get_result(conn)
                .optional()?;
            let Some(order) = order else {
                return Ok(None);
            };
            let mut items = load_items(conn, vec![order.id])?;
            let lines = items.remove(&order.id).unwrap_or_default();
            order_view(order, lines).map(Some)
        })
    }

    fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            diesel::delete(order_items::table.filter(order_items::order_id.eq(id))).execute(conn)?;
            let deleted = diesel::delete(orders::table.find(id)).execute(conn)?;
            Ok(deleted > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use diesel::prelude::*;
    use uuid::Uuid;

    use super::DieselOrderRepository;
    use crate::db::DbPool;
    use crate::domain::access::OrderScope;
    use crate::domain::catalog::{CollectionInput, ProductInput};
    use crate::domain::errors::DomainError;
    use crate::domain::pagination::PageRequest;
    use crate::domain::ports::{CartRepository, CatalogRepository, OrderRepository};
    use crate::infrastructure::cart_repo::DieselCartRepository;
    use crate::infrastructure::catalog_repo::DieselCatalogRepository;
    use crate::infrastructure::models::OutboxEventRow;
    use crate::infrastructure::testing::setup_db;
    use crate::schema::store_outbox;

    struct Seeded {
        catalog: DieselCatalogRepository,
        carts: DieselCartRepository,
        product_id: i64,
    }

    fn seed(pool: &DbPool) -> Seeded {
        let catalog = DieselCatalogRepository::new(pool.clone());
        let c = catalog
            .create_collection(CollectionInput {
                title: "General".to_string(),
                featured_product_id: None,
            })
            .expect("create failed");
        let product_id = catalog
            .create_product(product_input(c.id, "9.99"))
            .expect("create failed")
            .id;
        Seeded {
            catalog,
            carts: DieselCartRepository::new(pool.clone()),
            product_id,
        }
    }

    fn product_input(collection_id: i64, price: &str) -> ProductInput {
        ProductInput {
            title: "Teapot".to_string(),
            slug: None,
            description: String::new(),
            unit_price: BigDecimal::from_str(price).expect("valid decimal"),
            inventory: 3,
            collection_id,
            promotion_ids: vec![],
        }
    }

    fn filled_cart(seeded: &Seeded) -> Uuid {
        let cart = seeded.carts.create().expect("create failed");
        seeded
            .carts
            .add_item(cart.id, seeded.product_id, 2)
            .expect("add failed");
        cart.id
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn place_and_find_by_id_roundtrip() {
        let (_container, pool) = setup_db().await;
        let seeded = seed(&pool);
        let repo = DieselOrderRepository::new(pool);
        let cart_id = filled_cart(&seeded);

        let placed = repo.place_from_cart(42, cart_id).expect("place failed");
        let order = repo
            .find_by_id(placed.id)
            .expect("find failed")
            .expect("order should exist");

        assert_eq!(order.status.as_str(), "PENDING");
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 2);
        assert!(seeded.carts.find(cart_id).expect("find failed").is_none());
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn place_writes_outbox_event_in_same_transaction() {
        let (_container, pool) = setup_db().await;
        let seeded = seed(&pool);
        let repo = DieselOrderRepository::new(pool.clone());

        let order = repo
            .place_from_cart(42, filled_cart(&seeded))
            .expect("place failed");

        let mut conn = pool.get().expect("Failed to get connection");
        let events: Vec<OutboxEventRow> = store_outbox::table
            .filter(store_outbox::aggregate_id.eq(order.id.to_string()))
            .select(OutboxEventRow::as_select())
            .load(&mut conn)
            .expect("query failed");

        assert_eq!(events.len(), 1, "exactly one outbox event per order");
        assert_eq!(events[0].aggregate_type, "Order");
        assert_eq!(events[0].event_type, "OrderPlaced");
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn empty_cart_rolls_back_without_order() {
        let (_container, pool) = setup_db().await;
        let seeded = seed(&pool);
        let repo = DieselOrderRepository::new(pool);
        let cart = seeded.carts.create().expect("create failed");

        let err = repo.place_from_cart(42, cart.id).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let page = repo
            .list(OrderScope::All, PageRequest::default())
            .expect("list failed");
        assert_eq!(page.total, 0);
        assert!(seeded.carts.find(cart.id).expect("find failed").is_some());
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn price_change_leaves_order_items_untouched() {
        let (_container, pool) = setup_db().await;
        let seeded = seed(&pool);
        let repo = DieselOrderRepository::new(pool);
        let order = repo
            .place_from_cart(42, filled_cart(&seeded))
            .expect("place failed");

        let product = seeded
            .catalog
            .find_product(seeded.product_id)
            .expect("find failed")
            .expect("product should exist");
        seeded
            .catalog
            .update_product(
                seeded.product_id,
                product_input(product.collection_id, "19.99"),
            )
            .expect("update failed");

        let order = repo
            .find_by_id(order.id)
            .expect("find failed")
            .expect("order should exist");
        assert_eq!(
            order.items[0].unit_price,
            BigDecimal::from_str("9.99").unwrap()
        );
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn ordered_product_delete_is_rejected_by_database() {
        let (_container, pool) = setup_db().await;
        let seeded = seed(&pool);
        let repo = DieselOrderRepository::new(pool);
        repo.place_from_cart(42, filled_cart(&seeded))
            .expect("place failed");

        assert!(seeded
            .catalog
            .product_is_ordered(seeded.product_id)
            .expect("query failed"));
        let err = seeded.catalog.delete_product(seeded.product_id).unwrap_err();
        assert!(matches!(err, DomainError::Protected(_)));
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn list_filters_by_customer_and_paginates() {
        let (_container, pool) = setup_db().await;
        let seeded = seed(&pool);
        let repo = DieselOrderRepository::new(pool);

        let mut customer_id = 0;
        for _ in 0..3 {
            customer_id = repo
                .place_from_cart(1, filled_cart(&seeded))
                .expect("place failed")
                .customer_id;
        }
        repo.place_from_cart(2, filled_cart(&seeded))
            .expect("place failed");

        let page1 = repo
            .list(OrderScope::Customer(customer_id), PageRequest::new(1, 2))
            .expect("list failed");
        assert_eq!(page1.total, 3);
        assert_eq!(page1.items.len(), 2);
        assert_eq!(page1.items[0].items.len(), 1);

        let all = repo
            .list(OrderScope::All, PageRequest::default())
            .expect("list failed");
        assert_eq!(all.total, 4);
    }
}
