use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::cart::{CartItemView, CartView};
use crate::errors::AppError;
use crate::state::AppState;

use super::no_content;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemRequest {
    pub product_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartProductResponse {
    pub id: i64,
    pub title: String,
    pub unit_price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemResponse {
    pub id: i64,
    pub product: CartProductResponse,
    pub quantity: i32,
    pub total_price: String,
}

impl From<CartItemView> for CartItemResponse {
    fn from(item: CartItemView) -> Self {
        Self {
            total_price: item.total_price().to_string(),
            id: item.id,
            product: CartProductResponse {
                id: item.product.id,
                title: item.product.title,
                unit_price: item.product.unit_price.to_string(),
            },
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub id: Uuid,
    pub created_at: String,
    pub items: Vec<CartItemResponse>,
    pub total_price: String,
}

impl From<CartView> for CartResponse {
    fn from(cart: CartView) -> Self {
        Self {
            total_price: cart.total_price().to_string(),
            id: cart.id,
            created_at: cart.created_at.to_rfc3339(),
            items: cart.items.into_iter().map(Into::into).collect(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /store/carts
///
/// Anyone may create a cart; the returned id is the only credential needed to
/// use it.
#[utoipa::path(
    post,
    path = "/store/carts",
    responses(
        (status = 201, description = "Cart created", body = CartResponse),
    ),
    tag = "carts"
)]
pub async fn create_cart(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let cart = web::block(move || state.carts.create_cart()).await??;
    Ok(HttpResponse::Created().json(CartResponse::from(cart)))
}

#[utoipa::path(
    get,
    path = "/store/carts/{id}",
    params(("id" = Uuid, Path, description = "Cart id")),
    responses(
        (status = 200, description = "Cart with items and totals", body = CartResponse),
        (status = 404, description = "Cart not found"),
    ),
    tag = "carts"
)]
pub async fn get_cart(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let cart = web::block(move || state.carts.get_cart(id)).await??;
    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

#[utoipa::path(
    delete,
    path = "/store/carts/{id}",
    params(("id" = Uuid, Path, description = "Cart id")),
    responses(
        (status = 204, description = "Cart deleted"),
        (status = 404, description = "Cart not found"),
    ),
    tag = "carts"
)]
pub async fn delete_cart(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || state.carts.delete_cart(id)).await??;
    Ok(no_content())
}

#[utoipa::path(
    get,
    path = "/store/carts/{id}/items",
    params(("id" = Uuid, Path, description = "Cart id")),
    responses(
        (status = 200, description = "Items in the cart", body = Vec<CartItemResponse>),
        (status = 404, description = "Cart not found"),
    ),
    tag = "carts"
)]
pub async fn list_items(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let cart_id = path.into_inner();
    let items = web::block(move || state.carts.list_items(cart_id)).await??;
    let body: Vec<CartItemResponse> = items.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// POST /store/carts/{id}/items
///
/// Adding a product that is already in the cart increases its quantity.
#[utoipa::path(
    post,
    path = "/store/carts/{id}/items",
    params(("id" = Uuid, Path, description = "Cart id")),
    request_body = AddItemRequest,
    responses(
        (status = 201, description = "Item added", body = CartItemResponse),
        (status = 400, description = "Quantity below 1"),
        (status = 404, description = "Cart or product not found"),
    ),
    tag = "carts"
)]
pub async fn add_item(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<AddItemRequest>,
) -> Result<HttpResponse, AppError> {
    let cart_id = path.into_inner();
    let AddItemRequest {
        product_id,
        quantity,
    } = body.into_inner();
    let item = web::block(move || state.carts.add_item(cart_id, product_id, quantity)).await??;
    Ok(HttpResponse::Created().json(CartItemResponse::from(item)))
}

#[utoipa::path(
    get,
    path = "/store/carts/{id}/items/{item_id}",
    params(
        ("id" = Uuid, Path, description = "Cart id"),
        ("item_id" = i64, Path, description = "Cart item id"),
    ),
    responses(
        (status = 200, description = "Cart item", body = CartItemResponse),
        (status = 404, description = "Cart or item not found"),
    ),
    tag = "carts"
)]
pub async fn get_item(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, i64)>,
) -> Result<HttpResponse, AppError> {
    let (cart_id, item_id) = path.into_inner();
    let item = web::block(move || state.carts.get_item(cart_id, item_id)).await??;
    Ok(HttpResponse::Ok().json(CartItemResponse::from(item)))
}

#[utoipa::path(
    patch,
    path = "/store/carts/{id}/items/{item_id}",
    params(
        ("id" = Uuid, Path, description = "Cart id"),
        ("item_id" = i64, Path, description = "Cart item id"),
    ),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Quantity updated", body = CartItemResponse),
        (status = 400, description = "Quantity below 1"),
        (status = 404, description = "Item not in this cart"),
    ),
    tag = "carts"
)]
pub async fn update_item(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, i64)>,
    body: web::Json<UpdateItemRequest>,
) -> Result<HttpResponse, AppError> {
    let (cart_id, item_id) = path.into_inner();
    let quantity = body.into_inner().quantity;
    let item =
        web::block(move || state.carts.update_item(cart_id, item_id, quantity)).await??;
    Ok(HttpResponse::Ok().json(CartItemResponse::from(item)))
}

/// DELETE /store/carts/{id}/items/{item_id}
///
/// Succeeds whether or not the item exists.
#[utoipa::path(
    delete,
    path = "/store/carts/{id}/items/{item_id}",
    params(
        ("id" = Uuid, Path, description = "Cart id"),
        ("item_id" = i64, Path, description = "Cart item id"),
    ),
    responses(
        (status = 204, description = "Item removed"),
    ),
    tag = "carts"
)]
pub async fn remove_item(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, i64)>,
) -> Result<HttpResponse, AppError> {
    let (cart_id, item_id) = path.into_inner();
    web::block(move || state.carts.remove_item(cart_id, item_id)).await??;
    Ok(no_content())
}
