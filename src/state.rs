use std::sync::Arc;

use crate::application::cart_service::CartService;
use crate::application::catalog_service::CatalogService;
use crate::application::customer_service::CustomerService;
use crate::application::order_service::OrderService;
use crate::application::tag_service::{LikeService, TagService};
use crate::db::DbPool;
use crate::infrastructure::cart_repo::DieselCartRepository;
use crate::infrastructure::catalog_repo::DieselCatalogRepository;
use crate::infrastructure::customer_repo::DieselCustomerRepository;
use crate::infrastructure::memory::MemoryStore;
use crate::infrastructure::order_repo::DieselOrderRepository;
use crate::infrastructure::tag_repo::{DieselLikeRepository, DieselTagRepository};

/// Services shared by every worker; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub carts: CartService,
    pub orders: OrderService,
    pub customers: CustomerService,
    pub tags: TagService,
    pub likes: LikeService,
}

impl AppState {
    pub fn with_postgres(pool: DbPool) -> Self {
        let customers = Arc::new(DieselCustomerRepository::new(pool.clone()));
        Self {
            catalog: CatalogService::new(Arc::new(DieselCatalogRepository::new(pool.clone()))),
            carts: CartService::new(Arc::new(DieselCartRepository::new(pool.clone()))),
            orders: OrderService::new(
                Arc::new(DieselOrderRepository::new(pool.clone())),
                customers.clone(),
            ),
            customers: CustomerService::new(customers),
            tags: TagService::new(Arc::new(DieselTagRepository::new(pool.clone()))),
            likes: LikeService::new(Arc::new(DieselLikeRepository::new(pool))),
        }
    }

    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    /// Wires every service to the same in-memory store.
    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        Self {
            catalog: CatalogService::new(store.clone()),
            carts: CartService::new(store.clone()),
            orders: OrderService::new(store.clone(), store.clone()),
            customers: CustomerService::new(store.clone()),
            tags: TagService::new(store.clone()),
            likes: LikeService::new(store),
        }
    }
}
