//! Process-local store used when no database is configured, and by tests.
//!
//! Every operation runs under one mutex, so multi-step operations such as
//! placing an order are atomic with respect to each other.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::access::OrderScope;
use crate::domain::cart::{combined_quantity, CartItemView, CartProduct, CartView};
use crate::domain::catalog::{
    CollectionInput, CollectionView, ProductFilter, ProductInput, ProductView, PromotionInput,
    PromotionView, ReviewInput, ReviewView,
};
use crate::domain::customer::{CustomerUpdate, CustomerView, Membership};
use crate::domain::errors::DomainError;
use crate::domain::order::{
    order_placed_payload, snapshot_lines, CartLine, OrderItemView, OrderStatus, OrderView,
};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::ports::{
    CartRepository, CatalogRepository, CustomerRepository, LikeRepository, OrderRepository,
    TagRepository,
};
use crate::domain::tagging::{LikeView, TagView, TaggedEntity};

/// An outbox row as the in-memory store records it.
#[derive(Debug, Clone)]
pub struct RecordedEvent {
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
}

#[derive(Debug, Clone)]
struct CollectionRecord {
    title: String,
    featured_product_id: Option<i64>,
}

#[derive(Debug, Clone)]
struct CartItemRecord {
    cart_id: Uuid,
    product_id: i64,
    quantity: i32,
}

#[derive(Debug, Clone)]
struct OrderRecord {
    customer_id: i64,
    status: OrderStatus,
    placed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct OrderItemRecord {
    order_id: i64,
    product_id: i64,
    quantity: i32,
    unit_price: BigDecimal,
}

#[derive(Default)]
struct State {
    last_id: i64,
    collections: BTreeMap<i64, CollectionRecord>,
    products: BTreeMap<i64, ProductView>,
    promotions: BTreeMap<i64, PromotionView>,
    reviews: BTreeMap<i64, ReviewView>,
    carts: HashMap<Uuid, DateTime<Utc>>,
    cart_items: BTreeMap<i64, CartItemRecord>,
    customers: BTreeMap<i64, CustomerView>,
    orders: BTreeMap<i64, OrderRecord>,
    order_items: BTreeMap<i64, OrderItemRecord>,
    tags: BTreeMap<i64, String>,
    tagged_items: Vec<(i64, TaggedEntity)>,
    likes: BTreeMap<i64, LikeView>,
    outbox: Vec<RecordedEvent>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn collection_view(&self, id: i64, record: &CollectionRecord) -> CollectionView {
        CollectionView {
            id,
            title: record.title.clone(),
            featured_product_id: record.featured_product_id,
            product_count: self
                .products
                .values()
                .filter(|p| p.collection_id == id)
                .count() as i64,
        }
    }

    fn check_promotions(&self, ids: &[i64]) -> Result<(), DomainError> {
        match ids.iter().find(|id| !self.promotions.contains_key(id)) {
            Some(id) => Err(DomainError::validation(format!("promotion {id} does not exist"))),
            None => Ok(()),
        }
    }

    fn cart_item_view(&self, id: i64, item: &CartItemRecord) -> Option<CartItemView> {
        let product = self.products.get(&item.product_id)?;
        Some(CartItemView {
            id,
            product: CartProduct {
                id: product.id,
                title: product.title.clone(),
                unit_price: product.unit_price.clone(),
            },
            quantity: item.quantity,
        })
    }

    fn order_view(&self, id: i64, order: &OrderRecord) -> OrderView {
        OrderView {
            id,
            customer_id: order.customer_id,
            status: order.status,
            placed_at: order.placed_at,
            items: self
                .order_items
                .iter()
                .filter(|(_, i)| i.order_id == id)
                .map(|(item_id, i)| OrderItemView {
                    id: *item_id,
                    product_id: i.product_id,
                    quantity: i.quantity,
                    unit_price: i.unit_price.clone(),
                })
                .collect(),
        }
    }

    fn customer_for_user(&mut self, user_id: i64) -> CustomerView {
        if let Some(existing) = self.customers.values().find(|c| c.user_id == user_id) {
            return existing.clone();
        }
        let id = self.next_id();
        let customer = CustomerView {
            id,
            user_id,
            phone: String::new(),
            birth_date: None,
            membership: Membership::default(),
            address: None,
        };
        self.customers.insert(id, customer.clone());
        customer
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, DomainError> {
        self.state
            .lock()
            .map_err(|_| DomainError::Internal("memory store lock poisoned".to_string()))
    }

    /// Outbox events recorded so far, oldest first.
    pub fn outbox_events(&self) -> Vec<RecordedEvent> {
        self.lock().map(|s| s.outbox.clone()).unwrap_or_default()
    }

    /// Inserts a product into a default collection, for fixtures and demos.
    pub fn seed_product(&self, title: &str, unit_price: BigDecimal) -> i64 {
        let collection_id = match self.lock() {
            Ok(state) => state.collections.keys().next().copied(),
            Err(_) => None,
        };
        let collection_id = match collection_id {
            Some(id) => id,
            None => self
                .create_collection(CollectionInput {
                    title: "General".to_string(),
                    featured_product_id: None,
                })
                .map(|c| c.id)
                .unwrap_or_default(),
        };
        self.create_product(ProductInput {
            title: title.to_string(),
            slug: None,
            description: String::new(),
            unit_price,
            inventory: 100,
            collection_id,
            promotion_ids: vec![],
        })
        .map(|p| p.id)
        .unwrap_or_default()
    }
}

impl CatalogRepository for MemoryStore {
    fn list_collections(&self, page: PageRequest) -> Result<Page<CollectionView>, DomainError> {
        let s = self.lock()?;
        let all: Vec<CollectionView> = s
            .collections
            .iter()
            .map(|(id, c)| s.collection_view(*id, c))
            .collect();
        Ok(Page {
            items: page.slice(&all),
            total: all.len() as i64,
        })
    }

    fn find_collection(&self, id: i64) -> Result<Option<CollectionView>, DomainError> {
        let s = self.lock()?;
        Ok(s.collections.get(&id).map(|c| s.collection_view(id, c)))
    }

    fn create_collection(&self, input: CollectionInput) -> Result<CollectionView, DomainError> {
        let mut s = self.lock()?;
        let id = s.next_id();
        let record = CollectionRecord {
            title: input.title,
            featured_product_id: input.featured_product_id,
        };
        let view = s.collection_view(id, &record);
        s.collections.insert(id, record);
        Ok(view)
    }

    fn update_collection(
        &self,
        id: i64,
        input: CollectionInput,
    ) -> Result<Option<CollectionView>, DomainError> {
        let mut s = self.lock()?;
        let Some(record) = s.collections.get_mut(&id) else {
            return Ok(None);
        };
        record.title = input.title;
        record.featured_product_id = input.featured_product_id;
        let record = record.clone();
        Ok(Some(s.collection_view(id, &record)))
    }

    fn delete_collection(&self, id: i64) -> Result<bool, DomainError> {
        let mut s = self.lock()?;
        if s.products.values().any(|p| p.collection_id == id) {
            return Err(DomainError::Conflict(format!(
                "collection {id} still has products"
            )));
        }
        Ok(s.collections.remove(&id).is_some())
    }

    fn list_products(&self, filter: &ProductFilter) -> Result<Page<ProductView>, DomainError> {
        let s = self.lock()?;
        let mut matching: Vec<ProductView> = s
            .products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        matching.sort_by(|a, b| filter.ordering.compare(a, b));
        Ok(Page {
            items: filter.page.slice(&matching),
            total: matching.len() as i64,
        })
    }

    fn find_product(&self, id: i64) -> Result<Option<ProductView>, DomainError> {
        Ok(self.lock()?.products.get(&id).cloned())
    }

    fn create_product(&self, input: ProductInput) -> Result<ProductView, DomainError> {
        let mut s = self.lock()?;
        if !s.collections.contains_key(&input.collection_id) {
            return Err(DomainError::Conflict(format!(
                "collection {} does not exist",
                input.collection_id
            )));
        }
        s.check_promotions(&input.promotion_ids)?;
        let id = s.next_id();
        let product = ProductView {
            id,
            slug: input.resolved_slug(),
            title: input.title,
            description: input.description,
            unit_price: input.unit_price,
            inventory: input.inventory,
            collection_id: input.collection_id,
            last_update: Utc::now(),
            promotion_ids: input.promotion_ids,
        };
        s.products.insert(id, product.clone());
        Ok(product)
    }

    fn update_product(
        &self,
        id: i64,
        input: ProductInput,
    ) -> Result<Option<ProductView>, DomainError> {
        let mut s = self.lock()?;
        s.check_promotions(&input.promotion_ids)?;
        let Some(product) = s.products.get_mut(&id) else {
            return Ok(None);
        };
        product.slug = input.resolved_slug();
        product.title = input.title;
        product.description = input.description;
        product.unit_price = input.unit_price;
        product.inventory = input.inventory;
        product.collection_id = input.collection_id;
        product.promotion_ids = input.promotion_ids;
        product.last_update = Utc::now();
        Ok(Some(product.clone()))
    }

    fn delete_product(&self, id: i64) -> Result<bool, DomainError> {
        let mut s = self.lock()?;
        if s.order_items.values().any(|i| i.product_id == id) {
            return Err(DomainError::Protected(format!(
                "product {id} is referenced by order items"
            )));
        }
        if s.products.remove(&id).is_none() {
            return Ok(false);
        }
        for collection in s.collections.values_mut() {
            if collection.featured_product_id == Some(id) {
                collection.featured_product_id = None;
            }
        }
        s.cart_items.retain(|_, i| i.product_id != id);
        s.reviews.retain(|_, r| r.product_id != id);
        Ok(true)
    }

    fn product_is_ordered(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self.lock()?.order_items.values().any(|i| i.product_id == id))
    }

    fn list_promotions(&self) -> Result<Vec<PromotionView>, DomainError> {
        Ok(self.lock()?.promotions.values().cloned().collect())
    }

    fn create_promotion(&self, input: PromotionInput) -> Result<PromotionView, DomainError> {
        let mut s = self.lock()?;
        let id = s.next_id();
        let promotion = PromotionView {
            id,
            description: input.description,
            discount: input.discount,
        };
        s.promotions.insert(id, promotion.clone());
        Ok(promotion)
    }

    fn list_reviews(&self, product_id: i64) -> Result<Vec<ReviewView>, DomainError> {
        Ok(self
            .lock()?
            .reviews
            .values()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect())
    }

    fn create_review(
        &self,
        product_id: i64,
        input: ReviewInput,
    ) -> Result<ReviewView, DomainError> {
        let mut s = self.lock()?;
        if !s.products.contains_key(&product_id) {
            return Err(DomainError::not_found(format!("Product {product_id}")));
        }
        let id = s.next_id();
        let review = ReviewView {
            id,
            product_id,
            name: input.name,
            description: input.description,
            date: Utc::now().date_naive(),
        };
        s.reviews.insert(id, review.clone());
        Ok(review)
    }

    fn delete_review(&self, product_id: i64, review_id: i64) -> Result<bool, DomainError> {
        let mut s = self.lock()?;
        match s.reviews.get(&review_id) {
            Some(r) if r.product_id == product_id => {
                s.reviews.remove(&review_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl CartRepository for MemoryStore {
    fn create(&self) -> Result<CartView, DomainError> {
        let mut s = self.lock()?;
        let id = Uuid::new_v4();
        let created_at = Utc::now();
        s.carts.insert(id, created_at);
        Ok(CartView {
            id,
            created_at,
            items: vec![],
        })
    }

    fn find(&self, id: Uuid) -> Result<Option<CartView>, DomainError> {
        let s = self.lock()?;
        let Some(created_at) = s.carts.get(&id) else {
            return Ok(None);
        };
        let items = s
            .cart_items
            .iter()
            .filter(|(_, i)| i.cart_id == id)
            .filter_map(|(item_id, i)| s.cart_item_view(*item_id, i))
            .collect();
        Ok(Some(CartView {
            id,
            created_at: *created_at,
            items,
        }))
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut s = self.lock()?;
        if s.carts.remove(&id).is_none() {
            return Ok(false);
        }
        s.cart_items.retain(|_, i| i.cart_id != id);
        Ok(true)
    }

    fn add_item(
        &self,
        cart_id: Uuid,
        product_id: i64,
        quantity: i32,
    ) -> Result<CartItemView, DomainError> {
        let mut s = self.lock()?;
        if !s.carts.contains_key(&cart_id) {
            return Err(DomainError::not_found(format!("Cart {cart_id}")));
        }
        if !s.products.contains_key(&product_id) {
            return Err(DomainError::not_found(format!("Product {product_id}")));
        }
        let existing = s
            .cart_items
            .iter()
            .find(|(_, i)| i.cart_id == cart_id && i.product_id == product_id)
            .map(|(id, _)| *id);
        let item_id = match existing {
            Some(id) => id,
            None => {
                let id = s.next_id();
                s.cart_items.insert(
                    id,
                    CartItemRecord {
                        cart_id,
                        product_id,
                        quantity: 0,
                    },
                );
                id
            }
        };
        let item = s
            .cart_items
            .get_mut(&item_id)
            .ok_or_else(|| DomainError::Internal("cart item vanished".to_string()))?;
        item.quantity = combined_quantity(item.quantity, quantity)?;
        let item = item.clone();
        s.cart_item_view(item_id, &item)
            .ok_or_else(|| DomainError::not_found(format!("Product {product_id}")))
    }

    fn update_item(
        &self,
        cart_id: Uuid,
        item_id: i64,
        quantity: i32,
    ) -> Result<Option<CartItemView>, DomainError> {
        let mut s = self.lock()?;
        let Some(item) = s.cart_items.get_mut(&item_id).filter(|i| i.cart_id == cart_id) else {
            return Ok(None);
        };
        item.quantity = quantity;
        let item = item.clone();
        Ok(s.cart_item_view(item_id, &item))
    }

    fn remove_item(&self, cart_id: Uuid, item_id: i64) -> Result<(), DomainError> {
        let mut s = self.lock()?;
        if s.cart_items.get(&item_id).is_some_and(|i| i.cart_id == cart_id) {
            s.cart_items.remove(&item_id);
        }
        Ok(())
    }
}

impl OrderRepository for MemoryStore {
    fn place_from_cart(&self, user_id: i64, cart_id: Uuid) -> Result<OrderView, DomainError> {
        let mut s = self.lock()?;
        if !s.carts.contains_key(&cart_id) {
            return Err(DomainError::not_found(format!("Cart {cart_id}")));
        }

        let lines: Vec<CartLine> = s
            .cart_items
            .values()
            .filter(|i| i.cart_id == cart_id)
            .filter_map(|i| {
                s.products.get(&i.product_id).map(|p| CartLine {
                    product_id: i.product_id,
                    quantity: i.quantity,
                    current_unit_price: p.unit_price.clone(),
                })
            })
            .collect();
        let lines = snapshot_lines(lines)?;

        let customer = s.customer_for_user(user_id);
        let order_id = s.next_id();
        let order = OrderRecord {
            customer_id: customer.id,
            status: OrderStatus::Pending,
            placed_at: Utc::now(),
        };
        s.orders.insert(order_id, order.clone());
        for line in lines {
            let item_id = s.next_id();
            s.order_items.insert(
                item_id,
                OrderItemRecord {
                    order_id,
                    product_id: line.product_id,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                },
            );
        }

        let view = s.order_view(order_id, &order);
        s.outbox.push(RecordedEvent {
            aggregate_type: "Order".to_string(),
            aggregate_id: order_id.to_string(),
            event_type: "OrderPlaced".to_string(),
            payload: order_placed_payload(&view, cart_id),
        });

        s.carts.remove(&cart_id);
        s.cart_items.retain(|_, i| i.cart_id != cart_id);
        Ok(view)
    }

    fn find_by_id(&self, id: i64) -> Result<Option<OrderView>, DomainError> {
        let s = self.lock()?;
        Ok(s.orders.get(&id).map(|o| s.order_view(id, o)))
    }

    fn list(&self, scope: OrderScope, page: PageRequest) -> Result<Page<OrderView>, DomainError> {
        let s = self.lock()?;
        let mut visible: Vec<(i64, &OrderRecord)> = s
            .orders
            .iter()
            .filter(|(_, o)| scope.permits(o.customer_id))
            .map(|(id, o)| (*id, o))
            .collect();
        visible.sort_by(|a, b| b.1.placed_at.cmp(&a.1.placed_at).then(b.0.cmp(&a.0)));
        let total = visible.len() as i64;
        let window = page.slice(&visible);
        Ok(Page {
            items: window.into_iter().map(|(id, o)| s.order_view(id, o)).collect(),
            total,
        })
    }

    fn update_status(
        &self,
        id: i64,
        status: OrderStatus,
    ) -> Result<Option<OrderView>, DomainError> {
        let mut s = self.lock()?;
        let Some(order) = s.orders.get_mut(&id) else {
            return Ok(None);
        };
        order.status = status;
        let order = order.clone();
        Ok(Some(s.order_view(id, &order)))
    }

    fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let mut s = self.lock()?;
        if s.orders.remove(&id).is_none() {
            return Ok(false);
        }
        s.order_items.retain(|_, i| i.order_id != id);
        Ok(true)
    }
}

impl CustomerRepository for MemoryStore {
    fn find_by_user(&self, user_id: i64) -> Result<Option<CustomerView>, DomainError> {
        Ok(self
            .lock()?
            .customers
            .values()
            .find(|c| c.user_id == user_id)
            .cloned())
    }

    fn get_or_create(&self, user_id: i64) -> Result<CustomerView, DomainError> {
        Ok(self.lock()?.customer_for_user(user_id))
    }

    fn update(&self, user_id: i64, update: CustomerUpdate) -> Result<CustomerView, DomainError> {
        let mut s = self.lock()?;
        let id = s.customer_for_user(user_id).id;
        let customer = s
            .customers
            .get_mut(&id)
            .ok_or_else(|| DomainError::Internal("customer vanished".to_string()))?;
        customer.phone = update.phone;
        customer.birth_date = update.birth_date;
        customer.membership = update.membership;
        customer.address = update.address;
        Ok(customer.clone())
    }

    fn find_by_id(&self, id: i64) -> Result<Option<CustomerView>, DomainError> {
        Ok(self.lock()?.customers.get(&id).cloned())
    }

    fn list(&self, page: PageRequest) -> Result<Page<CustomerView>, DomainError> {
        let s = self.lock()?;
        let all: Vec<CustomerView> = s.customers.values().cloned().collect();
        Ok(Page {
            items: page.slice(&all),
            total: all.len() as i64,
        })
    }
}

impl TagRepository for MemoryStore {
    fn list_tags(&self) -> Result<Vec<TagView>, DomainError> {
        Ok(self
            .lock()?
            .tags
            .iter()
            .map(|(id, label)| TagView {
                id: *id,
                label: label.clone(),
            })
            .collect())
    }

    fn create_tag(&self, label: String) -> Result<TagView, DomainError> {
        let mut s = self.lock()?;
        let id = s.next_id();
        s.tags.insert(id, label.clone());
        Ok(TagView { id, label })
    }

    fn delete_tag(&self, id: i64) -> Result<bool, DomainError> {
        let mut s = self.lock()?;
        if s.tags.remove(&id).is_none() {
            return Ok(false);
        }
        s.tagged_items.retain(|(tag_id, _)| *tag_id != id);
        Ok(true)
    }

    fn tag(&self, tag_id: i64, entity: TaggedEntity) -> Result<bool, DomainError> {
        let mut s = self.lock()?;
        if !s.tags.contains_key(&tag_id) {
            return Ok(false);
        }
        if !s.tagged_items.contains(&(tag_id, entity)) {
            s.tagged_items.push((tag_id, entity));
        }
        Ok(true)
    }

    fn untag(&self, tag_id: i64, entity: TaggedEntity) -> Result<(), DomainError> {
        self.lock()?
            .tagged_items
            .retain(|item| *item != (tag_id, entity));
        Ok(())
    }

    fn tags_for(&self, entity: TaggedEntity) -> Result<Vec<TagView>, DomainError> {
        let s = self.lock()?;
        Ok(s.tagged_items
            .iter()
            .filter(|(_, e)| *e == entity)
            .filter_map(|(tag_id, _)| {
                s.tags.get(tag_id).map(|label| TagView {
                    id: *tag_id,
                    label: label.clone(),
                })
            })
            .collect())
    }
}

impl LikeRepository for MemoryStore {
    fn like(&self, user_id: i64, entity: TaggedEntity) -> Result<LikeView, DomainError> {
        let mut s = self.lock()?;
        if let Some(existing) = s
            .likes
            .values()
            .find(|l| l.user_id == user_id && l.entity == entity)
        {
            return Ok(existing.clone());
        }
        let id = s.next_id();
        let like = LikeView {
            id,
            user_id,
            entity,
        };
        s.likes.insert(id, like.clone());
        Ok(like)
    }

    fn unlike(&self, user_id: i64, entity: TaggedEntity) -> Result<(), DomainError> {
        self.lock()?
            .likes
            .retain(|_, l| !(l.user_id == user_id && l.entity == entity));
        Ok(())
    }

    fn likes_for_user(&self, user_id: i64) -> Result<Vec<LikeView>, DomainError> {
        Ok(self
            .lock()?
            .likes
            .values()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect())
    }

    fn count_for(&self, entity: TaggedEntity) -> Result<i64, DomainError> {
        Ok(self
            .lock()?
            .likes
            .values()
            .filter(|l| l.entity == entity)
            .count() as i64)
    }
}
