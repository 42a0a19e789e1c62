use uuid::Uuid;

use super::access::OrderScope;
use super::cart::{CartItemView, CartView};
use super::catalog::{
    CollectionInput, CollectionView, ProductFilter, ProductInput, ProductView, PromotionInput,
    PromotionView, ReviewInput, ReviewView,
};
use super::customer::{CustomerUpdate, CustomerView};
use super::errors::DomainError;
use super::order::{OrderStatus, OrderView};
use super::pagination::{Page, PageRequest};
use super::tagging::{LikeView, TagView, TaggedEntity};

pub trait CatalogRepository: Send + Sync + 'static {
    fn list_collections(&self, page: PageRequest) -> Result<Page<CollectionView>, DomainError>;
    fn find_collection(&self, id: i64) -> Result<Option<CollectionView>, DomainError>;
    fn create_collection(&self, input: CollectionInput) -> Result<CollectionView, DomainError>;
    fn update_collection(
        &self,
        id: i64,
        input: CollectionInput,
    ) -> Result<Option<CollectionView>, DomainError>;
    fn delete_collection(&self, id: i64) -> Result<bool, DomainError>;

    fn list_products(&self, filter: &ProductFilter) -> Result<Page<ProductView>, DomainError>;
    fn find_product(&self, id: i64) -> Result<Option<ProductView>, DomainError>;
    fn create_product(&self, input: ProductInput) -> Result<ProductView, DomainError>;
    fn update_product(
        &self,
        id: i64,
        input: ProductInput,
    ) -> Result<Option<ProductView>, DomainError>;
    fn delete_product(&self, id: i64) -> Result<bool, DomainError>;
    /// Whether any order item references the product.
    fn product_is_ordered(&self, id: i64) -> Result<bool, DomainError>;

    fn list_promotions(&self) -> Result<Vec<PromotionView>, DomainError>;
    fn create_promotion(&self, input: PromotionInput) -> Result<PromotionView, DomainError>;

    fn list_reviews(&self, product_id: i64) -> Result<Vec<ReviewView>, DomainError>;
    fn create_review(&self, product_id: i64, input: ReviewInput)
        -> Result<ReviewView, DomainError>;
    fn delete_review(&self, product_id: i64, review_id: i64) -> Result<bool, DomainError>;
}

pub trait CartRepository: Send + Sync + 'static {
    fn create(&self) -> Result<CartView, DomainError>;
    fn find(&self, id: Uuid) -> Result<Option<CartView>, DomainError>;
    fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
    /// Inserts the item or adds `quantity` to the existing one for that product.
    fn add_item(
        &self,
        cart_id: Uuid,
        product_id: i64,
        quantity: i32,
    ) -> Result<CartItemView, DomainError>;
    fn update_item(
        &self,
        cart_id: Uuid,
        item_id: i64,
        quantity: i32,
    ) -> Result<Option<CartItemView>, DomainError>;
    fn remove_item(&self, cart_id: Uuid, item_id: i64) -> Result<(), DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Converts the cart into an order for the user's customer profile and
    /// deletes the cart, all in one transaction.
    fn place_from_cart(&self, user_id: i64, cart_id: Uuid) -> Result<OrderView, DomainError>;
    fn find_by_id(&self, id: i64) -> Result<Option<OrderView>, DomainError>;
    fn list(&self, scope: OrderScope, page: PageRequest) -> Result<Page<OrderView>, DomainError>;
    fn update_status(&self, id: i64, status: OrderStatus)
        -> Result<Option<OrderView>, DomainError>;
    fn delete(&self, id: i64) -> Result<bool, DomainError>;
}

pub trait CustomerRepository: Send + Sync + 'static {
    fn find_by_user(&self, user_id: i64) -> Result<Option<CustomerView>, DomainError>;
    fn get_or_create(&self, user_id: i64) -> Result<CustomerView, DomainError>;
    fn update(&self, user_id: i64, update: CustomerUpdate) -> Result<CustomerView, DomainError>;
    fn find_by_id(&self, id: i64) -> Result<Option<CustomerView>, DomainError>;
    fn list(&self, page: PageRequest) -> Result<Page<CustomerView>, DomainError>;
}

pub trait TagRepository: Send + Sync + 'static {
    fn list_tags(&self) -> Result<Vec<TagView>, DomainError>;
    fn create_tag(&self, label: String) -> Result<TagView, DomainError>;
    /// Deletes the tag together with everything it was attached to.
    fn delete_tag(&self, id: i64) -> Result<bool, DomainError>;
    /// Attaches the tag; attaching twice is a no-op. Returns false if the tag
    /// does not exist.
    fn tag(&self, tag_id: i64, entity: TaggedEntity) -> Result<bool, DomainError>;
    fn untag(&self, tag_id: i64, entity: TaggedEntity) -> Result<(), DomainError>;
    fn tags_for(&self, entity: TaggedEntity) -> Result<Vec<TagView>, DomainError>;
}

pub trait LikeRepository: Send + Sync + 'static {
    fn like(&self, user_id: i64, entity: TaggedEntity) -> Result<LikeView, DomainError>;
    fn unlike(&self, user_id: i64, entity: TaggedEntity) -> Result<(), DomainError>;
    fn likes_for_user(&self, user_id: i64) -> Result<Vec<LikeView>, DomainError>;
    fn count_for(&self, entity: TaggedEntity) -> Result<i64, DomainError>;
}
