use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::upsert::excluded;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::cart::{combined_quantity, CartItemView, CartProduct, CartView};
use crate::domain::errors::DomainError;
use crate::domain::ports::CartRepository;
use crate::schema::{cart_items, carts, products};

use super::models::{CartRow, NewCartItemRow};

type CartItemTuple = (i64, i32, i64, String, BigDecimal);

fn cart_item_view((id, quantity, product_id, title, unit_price): CartItemTuple) -> CartItemView {
    CartItemView {
        id,
        product: CartProduct {
            id: product_id,
            title,
            unit_price,
        },
        quantity,
    }
}

fn load_items(
    conn: &mut PgConnection,
    cart_id: Uuid,
    item_id: Option<i64>,
) -> QueryResult<Vec<CartItemView>> {
    let mut query = cart_items::table
        .inner_join(products::table)
        .filter(cart_items::cart_id.eq(cart_id))
        .select((
            cart_items::id,
            cart_items::quantity,
            products::id,
            products::title,
            products::unit_price,
        ))
        .order(cart_items::id.asc())
        .into_boxed();
    if let Some(item_id) = item_id {
        query = query.filter(cart_items::id.eq(item_id));
    }
    let rows: Vec<CartItemTuple> = query.load(conn)?;
    Ok(rows.into_iter().map(cart_item_view).collect())
}

fn load_item(
    conn: &mut PgConnection,
    cart_id: Uuid,
    item_id: i64,
) -> QueryResult<Option<CartItemView>> {
    Ok(load_items(conn, cart_id, Some(item_id))?.into_iter().next())
}

pub struct DieselCartRepository {
    pool: DbPool,
}

impl DieselCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CartRepository for DieselCartRepository {
    fn create(&self) -> Result<CartView, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::insert_into(carts::table)
            .values(&CartRow {
                id: Uuid::new_v4(),
                created_at: Utc::now(),
            })
            .returning(CartRow::as_returning())
            .get_result(&mut conn)?;
        Ok(CartView {
            id: row.id,
            created_at: row.created_at,
            items: vec![],
        })
    }

    fn find(&self, id: Uuid) -> Result<Option<CartView>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let cart = carts::table
                .find(id)
                .select(CartRow::as_select())
                .first(conn)
                .optional()?;
            let Some(cart) = cart else {
                return Ok(None);
            };
            Ok(Some(CartView {
                id: cart.id,
                created_at: cart.created_at,
                items: load_items(conn, id, None)?,
            }))
        })
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        // cart_items cascade
        let deleted = diesel::delete(carts::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn add_item(
        &self,
        cart_id: Uuid,
        product_id: i64,
        quantity: i32,
    ) -> Result<CartItemView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let cart_exists = carts::table
                .find(cart_id)
                .select(carts::id)
                .first::<Uuid>(conn)
                .optional()?
                .is_some();
            if !cart_exists {
                return Err(DomainError::not_found(format!("Cart {cart_id}")));
            }
            let product_exists = products::table
                .find(product_id)
                .select(products::id)
                .first::<i64>(conn)
                .optional()?
                .is_some();
            if !product_exists {
                return Err(DomainError::not_found(format!("Product {product_id}")));
            }

            let current = cart_items::table
                .filter(cart_items::cart_id.eq(cart_id))
                .filter(cart_items::product_id.eq(product_id))
                .select(cart_items::quantity)
                .for_update()
                .first::<i32>(conn)
                .optional()?;
            if let Some(current) = current {
                combined_quantity(current, quantity)?;
            }

            let item_id: i64 = diesel::insert_into(cart_items::table)
                .values(&NewCartItemRow {
                    cart_id,
                    product_id,
                    quantity,
                })
                .on_conflict((cart_items::cart_id, cart_items::product_id))
                .do_update()
                .set(cart_items::quantity.eq(cart_items::quantity + excluded(cart_items::quantity)))
                .returning(cart_items::id)
                .get_result(conn)?;

            load_item(conn, cart_id, item_id)?
                .ok_or_else(|| DomainError::Internal(format!("cart item {item_id} vanished")))
        })
    }

    fn update_item(
        &self,
        cart_id: Uuid,
        item_id: i64,
        quantity: i32,
    ) -> Result<Option<CartItemView>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let updated = diesel::update(
                cart_items::table
                    .filter(cart_items::id.eq(item_id))
                    .filter(cart_items::cart_id.eq(cart_id)),
            )
            .set(cart_items::quantity.eq(quantity))
            .execute(conn)?;
            if updated == 0 {
                return Ok(None);
            }
            Ok(load_item(conn, cart_id, item_id)?)
        })
    }

    fn remove_item(&self, cart_id: Uuid, item_id: i64) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        diesel::delete(
            cart_items::table
                .filter(cart_items::id.eq(item_id))
                .filter(cart_items::cart_id.eq(cart_id)),
        )
        .execute(&mut conn)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::domain::catalog::{CollectionInput, ProductInput};
    use crate::domain::ports::CatalogRepository;
    use crate::infrastructure::catalog_repo::DieselCatalogRepository;
    use crate::infrastructure::testing::setup_db;

    fn seed_product(pool: &DbPool, price: &str) -> i64 {
        let catalog = DieselCatalogRepository::new(pool.clone());
        let c = catalog
            .create_collection(CollectionInput {
                title: "General".to_string(),
                featured_product_id: None,
            })
            .expect("create failed");
        catalog
            .create_product(ProductInput {
                title: "Tea".to_string(),
                slug: None,
                description: String::new(),
                unit_price: BigDecimal::from_str(price).expect("valid decimal"),
                inventory: 5,
                collection_id: c.id,
                promotion_ids: vec![],
            })
            .expect("create failed")
            .id
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn add_item_upserts_quantity() {
        let (_container, pool) = setup_db().await;
        let product_id = seed_product(&pool, "3.50");
        let repo = DieselCartRepository::new(pool);

        let cart = repo.create().expect("create failed");
        repo.add_item(cart.id, product_id, 1).expect("add failed");
        let item = repo.add_item(cart.id, product_id, 2).expect("add failed");
        assert_eq!(item.quantity, 3);

        let cart = repo
            .find(cart.id)
            .expect("find failed")
            .expect("cart should exist");
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.total_price(), BigDecimal::from_str("10.50").unwrap());
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn add_item_past_i32_max_is_validation_error() {
        let (_container, pool) = setup_db().await;
        let product_id = seed_product(&pool, "3.50");
        let repo = DieselCartRepository::new(pool);

        let cart = repo.create().expect("create failed");
        repo.add_item(cart.id, product_id, i32::MAX).expect("add failed");
        let err = repo.add_item(cart.id, product_id, 1).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let cart = repo
            .find(cart.id)
            .expect("find failed")
            .expect("cart should exist");
        assert_eq!(cart.items[0].quantity, i32::MAX);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn add_item_to_missing_cart_is_not_found() {
        let (_container, pool) = setup_db().await;
        let product_id = seed_product(&pool, "3.50");
        let repo = DieselCartRepository::new(pool);

        let err = repo.add_item(Uuid::new_v4(), product_id, 1).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn removing_last_item_keeps_cart() {
        let (_container, pool) = setup_db().await;
        let product_id = seed_product(&pool, "3.50");
        let repo = DieselCartRepository::new(pool);

        let cart = repo.create().expect("create failed");
        let item = repo.add_item(cart.id, product_id, 1).expect("add failed");
        repo.remove_item(cart.id, item.id).expect("remove failed");
        repo.remove_item(cart.id, item.id).expect("second remove failed");

        let cart = repo
            .find(cart.id)
            .expect("find failed")
            .expect("cart should still exist");
        assert!(cart.items.is_empty());
    }
}
