use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::access::Principal;
use crate::domain::errors::DomainError;
use crate::domain::order::{OrderStatus, OrderView};
use crate::errors::AppError;
use crate::state::AppState;

use super::{no_content, PageParams, PageResponse};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub cart_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    /// One of PENDING, COMPLETE or FAILED.
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i32,
    /// Unit price at the time the order was placed.
    pub unit_price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    pub customer_id: i64,
    pub status: String,
    pub placed_at: String,
    pub items: Vec<OrderItemResponse>,
    pub total_price: String,
}

impl From<OrderView> for OrderResponse {
    fn from(o: OrderView) -> Self {
        Self {
            total_price: o.total_price().to_string(),
            id: o.id,
            customer_id: o.customer_id,
            status: o.status.to_string(),
            placed_at: o.placed_at.to_rfc3339(),
            items: o
                .items
                .into_iter()
                .map(|i| OrderItemResponse {
                    id: i.id,
                    product_id: i.product_id,
                    quantity: i.quantity,
                    unit_price: i.unit_price.to_string(),
                })
                .collect(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /store/orders
///
/// Converts the cart into an order. The order, its items and an
/// `OrderPlaced` outbox event are written in a single database transaction,
/// and the cart is deleted in that same transaction.
#[utoipa::path(
    post,
    path = "/store/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 400, description = "Cart is empty"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Cart not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    principal: Principal,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let cart_id = body.into_inner().cart_id;
    let order = web::block(move || state.orders.place_order(&principal, cart_id)).await??;
    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// GET /store/orders
///
/// Staff see every order, customers only their own. Newest first.
#[utoipa::path(
    get,
    path = "/store/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 10, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = PageResponse<OrderResponse>),
        (status = 401, description = "Not authenticated"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    principal: Principal,
    query: web::Query<PageParams>,
) -> Result<HttpResponse, AppError> {
    let request = query.request();
    let page = web::block(move || state.orders.list_orders(&principal, request)).await??;
    Ok(HttpResponse::Ok().json(PageResponse::from_page(page, request, OrderResponse::from)))
}

/// GET /store/orders/{id}
#[utoipa::path(
    get,
    path = "/store/orders/{id}",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let order = web::block(move || state.orders.get_order(&principal, id)).await??;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// PATCH /store/orders/{id}
#[utoipa::path(
    patch,
    path = "/store/orders/{id}",
    params(("id" = i64, Path, description = "Order id")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderResponse),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn update_order(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
    body: web::Json<UpdateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let raw_status = body.into_inner().status;
    let order = web::block(move || -> Result<_, DomainError> {
        principal.require_staff()?;
        let status: OrderStatus = raw_status.parse()?;
        state.orders.update_status(&principal, id, status)
    })
    .await??;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// DELETE /store/orders/{id}
#[utoipa::path(
    delete,
    path = "/store/orders/{id}",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 204, description = "Order and its items deleted"),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn delete_order(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || state.orders.delete_order(&principal, id)).await??;
    Ok(no_content())
}
