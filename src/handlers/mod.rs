pub mod carts;
pub mod catalog;
pub mod customers;
pub mod health;
pub mod orders;
pub mod tags;

use actix_web::http::header;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::domain::pagination::{Page, PageRequest, DEFAULT_PAGE_SIZE};
use crate::errors::AppError;

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PageParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 10, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl PageParams {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl<T> PageResponse<T> {
    pub fn from_page<U>(page: Page<U>, request: PageRequest, f: impl FnMut(U) -> T) -> Self {
        Self {
            items: page.items.into_iter().map(f).collect(),
            total: page.total,
            page: request.page,
            limit: request.limit,
        }
    }
}

pub(crate) fn no_content() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Trailing slashes are trimmed before routing, so the bare docs path has to
/// point the browser at a concrete Swagger UI file.
async fn docs_index() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, "/api/docs/index.html"))
        .finish()
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

// ── OpenAPI ──────────────────────────────────────────────────────────────────

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        catalog::list_collections,
        catalog::get_collection,
        catalog::create_collection,
        catalog::update_collection,
        catalog::delete_collection,
        catalog::list_products,
        catalog::get_product,
        catalog::create_product,
        catalog::update_product,
        catalog::delete_product,
        catalog::list_promotions,
        catalog::create_promotion,
        catalog::list_reviews,
        catalog::create_review,
        catalog::delete_review,
        carts::create_cart,
        carts::get_cart,
        carts::delete_cart,
        carts::list_items,
        carts::add_item,
        carts::get_item,
        carts::update_item,
        carts::remove_item,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::update_order,
        orders::delete_order,
        customers::list_customers,
        customers::get_customer,
        customers::get_me,
        customers::update_me,
        tags::list_tags,
        tags::create_tag,
        tags::delete_tag,
        tags::tag_item,
        tags::untag_item,
        tags::tags_for,
        tags::list_likes,
        tags::like,
        tags::unlike,
        tags::like_count,
    ),
    tags(
        (name = "catalog", description = "Collections, products, promotions and reviews"),
        (name = "carts", description = "Anonymous shopping carts"),
        (name = "orders", description = "Orders placed from carts"),
        (name = "customers", description = "Customer profiles"),
        (name = "tags", description = "Generic tags and likes"),
    )
)]
pub struct ApiDoc;

/// Registers every route. Shared by the server and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/health", web::get().to(health::health))
        .service(
            web::scope("/store")
                .service(
                    web::scope("/collections")
                        .route("", web::get().to(catalog::list_collections))
                        .route("", web::post().to(catalog::create_collection))
                        .route("/{id}", web::get().to(catalog::get_collection))
                        .route("/{id}", web::put().to(catalog::update_collection))
                        .route("/{id}", web::delete().to(catalog::delete_collection)),
                )
                .service(
                    web::scope("/products")
                        .route("", web::get().to(catalog::list_products))
                        .route("", web::post().to(catalog::create_product))
                        .route("/{id}", web::get().to(catalog::get_product))
                        .route("/{id}", web::put().to(catalog::update_product))
                        .route("/{id}", web::delete().to(catalog::delete_product))
                        .route("/{id}/reviews", web::get().to(catalog::list_reviews))
                        .route("/{id}/reviews", web::post().to(catalog::create_review))
                        .route(
                            "/{id}/reviews/{review_id}",
                            web::delete().to(catalog::delete_review),
                        ),
                )
                .service(
                    web::scope("/promotions")
                        .route("", web::get().to(catalog::list_promotions))
                        .route("", web::post().to(catalog::create_promotion)),
                )
                .service(
                    web::scope("/carts")
                        .route("", web::post().to(carts::create_cart))
                        .route("/{id}", web::get().to(carts::get_cart))
                        .route("/{id}", web::delete().to(carts::delete_cart))
                        .route("/{id}/items", web::get().to(carts::list_items))
                        .route("/{id}/items", web::post().to(carts::add_item))
                        .route("/{id}/items/{item_id}", web::get().to(carts::get_item))
                        .route("/{id}/items/{item_id}", web::patch().to(carts::update_item))
                        .route("/{id}/items/{item_id}", web::delete().to(carts::remove_item)),
                )
                .service(
                    web::scope("/orders")
                        .route("", web::get().to(orders::list_orders))
                        .route("", web::post().to(orders::create_order))
                        .route("/{id}", web::get().to(orders::get_order))
                        .route("/{id}", web::patch().to(orders::update_order))
                        .route("/{id}", web::delete().to(orders::delete_order)),
                )
                .service(
                    web::scope("/customers")
                        .route("", web::get().to(customers::list_customers))
                        .route("/me", web::get().to(customers::get_me))
                        .route("/me", web::put().to(customers::update_me))
                        .route("/{id}", web::get().to(customers::get_customer)),
                ),
        )
        .service(
            web::scope("/tags")
                .route("", web::get().to(tags::list_tags))
                .route("", web::post().to(tags::create_tag))
                .route("/for/{kind}/{entity_id}", web::get().to(tags::tags_for))
                .route("/{id}", web::delete().to(tags::delete_tag))
                .route("/{id}/items", web::post().to(tags::tag_item))
                .route(
                    "/{id}/items/{kind}/{entity_id}",
                    web::delete().to(tags::untag_item),
                ),
        )
        .service(
            web::scope("/likes")
                .route("", web::get().to(tags::list_likes))
                .route("", web::post().to(tags::like))
                .route("/{kind}/{entity_id}", web::delete().to(tags::unlike))
                .route("/{kind}/{entity_id}/count", web::get().to(tags::like_count)),
        )
        .route("/api/docs", web::get().to(docs_index))
        .service(
            SwaggerUi::new("/api/docs/{_:.*}").url("/api/docs/openapi.json", ApiDoc::openapi()),
        );
}
