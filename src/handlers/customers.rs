use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::access::Principal;
use crate::domain::customer::{Address, CustomerUpdate, CustomerView, Membership};
use crate::errors::AppError;
use crate::state::AppState;

use super::{PageParams, PageResponse};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddressBody {
    pub street: String,
    pub city: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CustomerRequest {
    #[serde(default)]
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    /// BRONZE, SILVER or GOLD (or B, S, G). Defaults to BRONZE.
    pub membership: Option<String>,
    pub address: Option<AddressBody>,
}

impl CustomerRequest {
    fn into_update(self) -> Result<CustomerUpdate, AppError> {
        let membership = match self.membership.as_deref() {
            Some(m) => m.parse::<Membership>()?,
            None => Membership::default(),
        };
        Ok(CustomerUpdate {
            phone: self.phone,
            birth_date: self.birth_date,
            membership,
            address: self.address.map(|a| Address {
                street: a.street,
                city: a.city,
            }),
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerResponse {
    pub id: i64,
    pub user_id: i64,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    pub membership: String,
    pub address: Option<AddressBody>,
}

impl From<CustomerView> for CustomerResponse {
    fn from(c: CustomerView) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            phone: c.phone,
            birth_date: c.birth_date,
            membership: c.membership.as_str().to_string(),
            address: c.address.map(|a| AddressBody {
                street: a.street,
                city: a.city,
            }),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/store/customers",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 10, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of customers", body = PageResponse<CustomerResponse>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Staff only"),
    ),
    tag = "customers"
)]
pub async fn list_customers(
    state: web::Data<AppState>,
    principal: Principal,
    query: web::Query<PageParams>,
) -> Result<HttpResponse, AppError> {
    let request = query.request();
    let page = web::block(move || state.customers.list_customers(&principal, request)).await??;
    Ok(HttpResponse::Ok().json(PageResponse::from_page(page, request, CustomerResponse::from)))
}

#[utoipa::path(
    get,
    path = "/store/customers/{id}",
    params(("id" = i64, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer found", body = CustomerResponse),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Customer not found"),
    ),
    tag = "customers"
)]
pub async fn get_customer(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let customer = web::block(move || state.customers.get_customer(&principal, id)).await??;
    Ok(HttpResponse::Ok().json(CustomerResponse::from(customer)))
}

/// GET /store/customers/me
///
/// The profile is created with defaults the first time it is requested.
#[utoipa::path(
    get,
    path = "/store/customers/me",
    responses(
        (status = 200, description = "The caller's profile", body = CustomerResponse),
        (status = 401, description = "Not authenticated"),
    ),
    tag = "customers"
)]
pub async fn get_me(
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    let customer = web::block(move || state.customers.me(&principal)).await??;
    Ok(HttpResponse::Ok().json(CustomerResponse::from(customer)))
}

#[utoipa::path(
    put,
    path = "/store/customers/me",
    request_body = CustomerRequest,
    responses(
        (status = 200, description = "Profile updated", body = CustomerResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
    ),
    tag = "customers"
)]
pub async fn update_me(
    state: web::Data<AppState>,
    principal: Principal,
    body: web::Json<CustomerRequest>,
) -> Result<HttpResponse, AppError> {
    let update = body.into_inner().into_update()?;
    let customer = web::block(move || state.customers.update_me(&principal, update)).await??;
    Ok(HttpResponse::Ok().json(CustomerResponse::from(customer)))
}
