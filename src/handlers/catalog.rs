use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::access::Principal;
use crate::domain::catalog::{
    CollectionInput, CollectionView, ProductFilter, ProductInput, ProductOrdering, ProductView,
    PromotionInput, PromotionView, ReviewInput, ReviewView,
};
use crate::domain::pagination::PageRequest;
use crate::errors::AppError;
use crate::state::AppState;

use super::{default_limit, default_page, no_content, PageParams, PageResponse};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CollectionRequest {
    pub title: String,
    pub featured_product_id: Option<i64>,
}

impl From<CollectionRequest> for CollectionInput {
    fn from(r: CollectionRequest) -> Self {
        CollectionInput {
            title: r.title,
            featured_product_id: r.featured_product_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CollectionResponse {
    pub id: i64,
    pub title: String,
    pub featured_product_id: Option<i64>,
    pub product_count: i64,
}

impl From<CollectionView> for CollectionResponse {
    fn from(c: CollectionView) -> Self {
        Self {
            id: c.id,
            title: c.title,
            featured_product_id: c.featured_product_id,
            product_count: c.product_count,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductRequest {
    pub title: String,
    /// Derived from the title when omitted.
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub unit_price: String,
    pub inventory: i32,
    pub collection_id: i64,
    #[serde(default)]
    pub promotion_ids: Vec<i64>,
}

impl ProductRequest {
    fn into_input(self) -> Result<ProductInput, AppError> {
        Ok(ProductInput {
            unit_price: parse_decimal("unit_price", &self.unit_price)?,
            title: self.title,
            slug: self.slug,
            description: self.description,
            inventory: self.inventory,
            collection_id: self.collection_id,
            promotion_ids: self.promotion_ids,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub unit_price: String,
    pub price_with_tax: String,
    pub inventory: i32,
    /// "Low" below ten units, "OK" otherwise.
    pub inventory_status: String,
    pub collection_id: i64,
    pub last_update: String,
    pub promotion_ids: Vec<i64>,
}

impl From<ProductView> for ProductResponse {
    fn from(p: ProductView) -> Self {
        Self {
            price_with_tax: p.price_with_tax().to_string(),
            inventory_status: p.inventory_status().to_string(),
            id: p.id,
            title: p.title,
            slug: p.slug,
            description: p.description,
            unit_price: p.unit_price.to_string(),
            inventory: p.inventory,
            collection_id: p.collection_id,
            last_update: p.last_update.to_rfc3339(),
            promotion_ids: p.promotion_ids,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub collection_id: Option<i64>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl ProductQuery {
    fn into_filter(self) -> Result<ProductFilter, AppError> {
        let ordering = match self.ordering.as_deref() {
            Some(o) => ProductOrdering::from_str(o)?,
            None => ProductOrdering::default(),
        };
        Ok(ProductFilter {
            collection_id: self.collection_id,
            min_price: self
                .min_price
                .map(|p| parse_decimal("min_price", &p))
                .transpose()?,
            max_price: self
                .max_price
                .map(|p| parse_decimal("max_price", &p))
                .transpose()?,
            search: self.search.filter(|s| !s.trim().is_empty()),
            ordering,
            page: PageRequest::new(self.page, self.limit),
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PromotionRequest {
    pub description: String,
    pub discount: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PromotionResponse {
    pub id: i64,
    pub description: String,
    pub discount: f64,
}

impl From<PromotionView> for PromotionResponse {
    fn from(p: PromotionView) -> Self {
        Self {
            id: p.id,
            description: p.description,
            discount: p.discount,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub id: i64,
    pub product_id: i64,
    pub name: String,
    pub description: String,
    pub date: String,
}

impl From<ReviewView> for ReviewResponse {
    fn from(r: ReviewView) -> Self {
        Self {
            id: r.id,
            product_id: r.product_id,
            name: r.name,
            description: r.description,
            date: r.date.to_string(),
        }
    }
}

fn parse_decimal(field: &str, value: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(value.trim())
        .map_err(|e| AppError::BadRequest(format!("Invalid {field} '{value}': {e}")))
}

// ── Collections ──────────────────────────────────────────────────────────────

/// GET /store/collections
#[utoipa::path(
    get,
    path = "/store/collections",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 10, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of collections", body = PageResponse<CollectionResponse>),
    ),
    tag = "catalog"
)]
pub async fn list_collections(
    state: web::Data<AppState>,
    query: web::Query<PageParams>,
) -> Result<HttpResponse, AppError> {
    let request = query.request();
    let page = web::block(move || state.catalog.list_collections(request)).await??;
    Ok(HttpResponse::Ok().json(PageResponse::from_page(page, request, CollectionResponse::from)))
}

/// GET /store/collections/{id}
#[utoipa::path(
    get,
    path = "/store/collections/{id}",
    params(("id" = i64, Path, description = "Collection id")),
    responses(
        (status = 200, description = "Collection found", body = CollectionResponse),
        (status = 404, description = "Collection not found"),
    ),
    tag = "catalog"
)]
pub async fn get_collection(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let collection = web::block(move || state.catalog.get_collection(id)).await??;
    Ok(HttpResponse::Ok().json(CollectionResponse::from(collection)))
}

/// POST /store/collections
#[utoipa::path(
    post,
    path = "/store/collections",
    request_body = CollectionRequest,
    responses(
        (status = 201, description = "Collection created", body = CollectionResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Staff only"),
    ),
    tag = "catalog"
)]
pub async fn create_collection(
    state: web::Data<AppState>,
    principal: Principal,
    body: web::Json<CollectionRequest>,
) -> Result<HttpResponse, AppError> {
    let input = CollectionInput::from(body.into_inner());
    let collection =
        web::block(move || state.catalog.create_collection(&principal, input)).await??;
    Ok(HttpResponse::Created().json(CollectionResponse::from(collection)))
}

/// PUT /store/collections/{id}
#[utoipa::path(
    put,
    path = "/store/collections/{id}",
    params(("id" = i64, Path, description = "Collection id")),
    request_body = CollectionRequest,
    responses(
        (status = 200, description = "Collection updated", body = CollectionResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Collection not found"),
    ),
    tag = "catalog"
)]
pub async fn update_collection(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
    body: web::Json<CollectionRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let input = CollectionInput::from(body.into_inner());
    let collection =
        web::block(move || state.catalog.update_collection(&principal, id, input)).await??;
    Ok(HttpResponse::Ok().json(CollectionResponse::from(collection)))
}

/// DELETE /store/collections/{id}
///
/// Refused while the collection still contains products.
#[utoipa::path(
    delete,
    path = "/store/collections/{id}",
    params(("id" = i64, Path, description = "Collection id")),
    responses(
        (status = 204, description = "Collection deleted"),
        (status = 400, description = "Collection still has products"),
        (status = 404, description = "Collection not found"),
    ),
    tag = "catalog"
)]
pub async fn delete_collection(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || state.catalog.delete_collection(&principal, id)).await??;
    Ok(no_content())
}

// ── Products ─────────────────────────────────────────────────────────────────

/// GET /store/products
#[utoipa::path(
    get,
    path = "/store/products",
    params(
        ("collection_id" = Option<i64>, Query, description = "Only products in this collection"),
        ("min_price" = Option<String>, Query, description = "Lowest unit price, inclusive"),
        ("max_price" = Option<String>, Query, description = "Highest unit price, inclusive"),
        ("search" = Option<String>, Query, description = "Case-insensitive match on title or description"),
        ("ordering" = Option<String>, Query, description = "unit_price, title or last_update; prefix '-' to reverse"),
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 10, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of products", body = PageResponse<ProductResponse>),
        (status = 400, description = "Invalid filter"),
    ),
    tag = "catalog"
)]
pub async fn list_products(
    state: web::Data<AppState>,
    query: web::Query<ProductQuery>,
) -> Result<HttpResponse, AppError> {
    let filter = query.into_inner().into_filter()?;
    let request = filter.page;
    let page = web::block(move || state.catalog.list_products(&filter)).await??;
    Ok(HttpResponse::Ok().json(PageResponse::from_page(page, request, ProductResponse::from)))
}

/// GET /store/products/{id}
#[utoipa::path(
    get,
    path = "/store/products/{id}",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "catalog"
)]
pub async fn get_product(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let product = web::block(move || state.catalog.get_product(id)).await??;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// POST /store/products
#[utoipa::path(
    post,
    path = "/store/products",
    request_body = ProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Staff only"),
    ),
    tag = "catalog"
)]
pub async fn create_product(
    state: web::Data<AppState>,
    principal: Principal,
    body: web::Json<ProductRequest>,
) -> Result<HttpResponse, AppError> {
    let input = body.into_inner().into_input()?;
    let product = web::block(move || state.catalog.create_product(&principal, input)).await??;
    Ok(HttpResponse::Created().json(ProductResponse::from(product)))
}

/// PUT /store/products/{id}
#[utoipa::path(
    put,
    path = "/store/products/{id}",
    params(("id" = i64, Path, description = "Product id")),
    request_body = ProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Product not found"),
    ),
    tag = "catalog"
)]
pub async fn update_product(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
    body: web::Json<ProductRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let input = body.into_inner().into_input()?;
    let product =
        web::block(move || state.catalog.update_product(&principal, id, input)).await??;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// DELETE /store/products/{id}
///
/// Products that appear on an order are kept; the request is answered with
/// 405.
#[utoipa::path(
    delete,
    path = "/store/products/{id}",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found"),
        (status = 405, description = "Product is referenced by an order"),
    ),
    tag = "catalog"
)]
pub async fn delete_product(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || state.catalog.delete_product(&principal, id)).await??;
    Ok(no_content())
}

// ── Promotions ───────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/store/promotions",
    responses(
        (status = 200, description = "All promotions", body = Vec<PromotionResponse>),
    ),
    tag = "catalog"
)]
pub async fn list_promotions(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let promotions = web::block(move || state.catalog.list_promotions()).await??;
    let body: Vec<PromotionResponse> = promotions.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    post,
    path = "/store/promotions",
    request_body = PromotionRequest,
    responses(
        (status = 201, description = "Promotion created", body = PromotionResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Staff only"),
    ),
    tag = "catalog"
)]
pub async fn create_promotion(
    state: web::Data<AppState>,
    principal: Principal,
    body: web::Json<PromotionRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let input = PromotionInput {
        description: body.description,
        discount: body.discount,
    };
    let promotion =
        web::block(move || state.catalog.create_promotion(&principal, input)).await??;
    Ok(HttpResponse::Created().json(PromotionResponse::from(promotion)))
}

// ── Reviews ──────────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/store/products/{id}/reviews",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Reviews of the product", body = Vec<ReviewResponse>),
        (status = 404, description = "Product not found"),
    ),
    tag = "catalog"
)]
pub async fn list_reviews(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let reviews = web::block(move || state.catalog.list_reviews(product_id)).await??;
    let body: Vec<ReviewResponse> = reviews.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    post,
    path = "/store/products/{id}/reviews",
    params(("id" = i64, Path, description = "Product id")),
    request_body = ReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Product not found"),
    ),
    tag = "catalog"
)]
pub async fn create_review(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<ReviewRequest>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let body = body.into_inner();
    let input = ReviewInput {
        name: body.name,
        description: body.description,
    };
    let review = web::block(move || state.catalog.create_review(product_id, input)).await??;
    Ok(HttpResponse::Created().json(ReviewResponse::from(review)))
}

#[utoipa::path(
    delete,
    path = "/store/products/{id}/reviews/{review_id}",
    params(
        ("id" = i64, Path, description = "Product id"),
        ("review_id" = i64, Path, description = "Review id"),
    ),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Review not found"),
    ),
    tag = "catalog"
)]
pub async fn delete_review(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse, AppError> {
    let (product_id, review_id) = path.into_inner();
    web::block(move || state.catalog.delete_review(&principal, product_id, review_id)).await??;
    Ok(no_content())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_query_defaults_to_newest_first() {
        let query = ProductQuery {
            collection_id: None,
            min_price: None,
            max_price: None,
            search: Some("  ".to_string()),
            ordering: None,
            page: 1,
            limit: 10,
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.ordering, ProductOrdering::LastUpdateDesc);
        assert!(filter.search.is_none());
    }

    #[test]
    fn product_query_rejects_bad_price() {
        let query = ProductQuery {
            collection_id: None,
            min_price: Some("cheap".to_string()),
            max_price: None,
            search: None,
            ordering: None,
            page: 1,
            limit: 10,
        };
        assert!(matches!(query.into_filter(), Err(AppError::BadRequest(_))));
    }
}
