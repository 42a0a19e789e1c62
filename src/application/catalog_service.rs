use std::sync::Arc;

use crate::domain::access::Principal;
use crate::domain::catalog::{
    CollectionInput, CollectionView, ProductFilter, ProductInput, ProductView, PromotionInput,
    PromotionView, ReviewInput, ReviewView,
};
use crate::domain::errors::DomainError;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::ports::CatalogRepository;

#[derive(Clone)]
pub struct CatalogService {
    repo: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn CatalogRepository>) -> Self {
        Self { repo }
    }

    // ── Collections ──────────────────────────────────────────────────────────

    pub fn list_collections(&self, page: PageRequest) -> Result<Page<CollectionView>, DomainError> {
        self.repo.list_collections(page)
    }

    pub fn get_collection(&self, id: i64) -> Result<CollectionView, DomainError> {
        self.repo
            .find_collection(id)?
            .ok_or_else(|| DomainError::not_found(format!("Collection {id}")))
    }

    pub fn create_collection(
        &self,
        principal: &Principal,
        input: CollectionInput,
    ) -> Result<CollectionView, DomainError> {
        principal.require_staff()?;
        input.validate()?;
        self.ensure_featured_product(input.featured_product_id)?;
        let collection = self.repo.create_collection(input)?;
        log::info!("Created collection {} '{}'", collection.id, collection.title);
        Ok(collection)
    }

    pub fn update_collection(
        &self,
        principal: &Principal,
        id: i64,
        input: CollectionInput,
    ) -> Result<CollectionView, DomainError> {
        principal.require_staff()?;
        input.validate()?;
        self.ensure_featured_product(input.featured_product_id)?;
        self.repo
            .update_collection(id, input)?
            .ok_or_else(|| DomainError::not_found(format!("Collection {id}")))
    }

    pub fn delete_collection(&self, principal: &Principal, id: i64) -> Result<(), DomainError> {
        principal.require_staff()?;
        let collection = self.get_collection(id)?;
        if collection.product_count > 0 {
            log::warn!(
                "Refusing to delete collection {id}: it still has {} products",
                collection.product_count
            );
            return Err(DomainError::Conflict(
                "Collection cannot be deleted because it includes one or more products".to_string(),
            ));
        }
        if !self.repo.delete_collection(id)? {
            return Err(DomainError::not_found(format!("Collection {id}")));
        }
        log::info!("Deleted collection {id}");
        Ok(())
    }

    fn ensure_featured_product(&self, product_id: Option<i64>) -> Result<(), DomainError> {
        if let Some(product_id) = product_id {
            if self.repo.find_product(product_id)?.is_none() {
                return Err(DomainError::validation(format!(
                    "featured product {product_id} does not exist"
                )));
            }
        }
        Ok(())
    }

    // ── Products ─────────────────────────────────────────────────────────────

    pub fn list_products(&self, filter: &ProductFilter) -> Result<Page<ProductView>, DomainError> {
        self.repo.list_products(filter)
    }

    pub fn get_product(&self, id: i64) -> Result<ProductView, DomainError> {
        self.repo
            .find_product(id)?
            .ok_or_else(|| DomainError::not_found(format!("Product {id}")))
    }

    pub fn create_product(
        &self,
        principal: &Principal,
        input: ProductInput,
    ) -> Result<ProductView, DomainError> {
        principal.require_staff()?;
        self.validate_product(&input)?;
        let product = self.repo.create_product(input)?;
        log::info!("Created product {} '{}'", product.id, product.title);
        Ok(product)
    }

    pub fn update_product(
        &self,
        principal: &Principal,
        id: i64,
        input: ProductInput,
    ) -> Result<ProductView, DomainError> {
        principal.require_staff()?;
        self.validate_product(&input)?;
        let product = self
            .repo
            .update_product(id, input)?
            .ok_or_else(|| DomainError::not_found(format!("Product {id}")))?;
        log::info!("Updated product {id}, unit price now {}", product.unit_price);
        Ok(product)
    }

    /// Products that appear on any order are part of a financial record and
    /// cannot be deleted.
    pub fn delete_product(&self, principal: &Principal, id: i64) -> Result<(), DomainError> {
        principal.require_staff()?;
        self.get_product(id)?;
        if self.repo.product_is_ordered(id)? {
            log::warn!("Refusing to delete product {id}: referenced by order items");
            return Err(DomainError::Protected(
                "Product cannot be deleted because it is associated with an order item"
                    .to_string(),
            ));
        }
        if !self.repo.delete_product(id)? {
            return Err(DomainError::not_found(format!("Product {id}")));
        }
        log::info!("Deleted product {id}");
        Ok(())
    }

    fn validate_product(&self, input: &ProductInput) -> Result<(), DomainError> {
        input.validate()?;
        if self.repo.find_collection(input.collection_id)?.is_none() {
            return Err(DomainError::validation(format!(
                "collection {} does not exist",
                input.collection_id
            )));
        }
        Ok(())
    }

    // ── Promotions ───────────────────────────────────────────────────────────

    pub fn list_promotions(&self) -> Result<Vec<PromotionView>, DomainError> {
        self.repo.list_promotions()
    }

    pub fn create_promotion(
        &self,
        principal: &Principal,
        input: PromotionInput,
    ) -> Result<PromotionView, DomainError> {
        principal.require_staff()?;
        input.validate()?;
        self.repo.create_promotion(input)
    }

    // ── Reviews ──────────────────────────────────────────────────────────────

    pub fn list_reviews(&self, product_id: i64) -> Result<Vec<ReviewView>, DomainError> {
        self.get_product(product_id)?;
        self.repo.list_reviews(product_id)
    }

    pub fn create_review(
        &self,
        product_id: i64,
        input: ReviewInput,
    ) -> Result<ReviewView, DomainError> {
        input.validate()?;
        self.get_product(product_id)?;
        self.repo.create_review(product_id, input)
    }

    pub fn delete_review(
        &self,
        principal: &Principal,
        product_id: i64,
        review_id: i64,
    ) -> Result<(), DomainError> {
        principal.require_staff()?;
        if !self.repo.delete_review(product_id, review_id)? {
            return Err(DomainError::not_found(format!("Review {review_id}")));
        }
        Ok(())
    }
}
