//! Tags and likes attach to any record by `(kind, id)`, where kind is one of
//! product, collection, customer, order or review.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::access::Principal;
use crate::domain::tagging::{LikeView, TagView, TaggedEntity};
use crate::errors::AppError;
use crate::state::AppState;

use super::no_content;

#[derive(Debug, Deserialize, ToSchema)]
pub struct TagRequest {
    pub label: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TagResponse {
    pub id: i64,
    pub label: String,
}

impl From<TagView> for TagResponse {
    fn from(t: TagView) -> Self {
        Self {
            id: t.id,
            label: t.label,
        }
    }
}

/// Body naming the record to tag or like.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EntityRequest {
    pub kind: String,
    pub entity_id: i64,
}

impl EntityRequest {
    fn entity(&self) -> Result<TaggedEntity, AppError> {
        Ok(TaggedEntity::from_parts(&self.kind, self.entity_id)?)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LikeResponse {
    pub id: i64,
    pub kind: String,
    pub entity_id: i64,
}

impl From<LikeView> for LikeResponse {
    fn from(l: LikeView) -> Self {
        Self {
            id: l.id,
            kind: l.entity.kind().to_string(),
            entity_id: l.entity.id(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LikeCountResponse {
    pub kind: String,
    pub entity_id: i64,
    pub likes: i64,
}

fn entity_from_path(path: web::Path<(String, i64)>) -> Result<TaggedEntity, AppError> {
    let (kind, id) = path.into_inner();
    Ok(TaggedEntity::from_parts(&kind, id)?)
}

// ── Tags ─────────────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/tags",
    responses((status = 200, description = "All tags", body = Vec<TagResponse>)),
    tag = "tags"
)]
pub async fn list_tags(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let tags = web::block(move || state.tags.list_tags()).await??;
    let body: Vec<TagResponse> = tags.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    post,
    path = "/tags",
    request_body = TagRequest,
    responses(
        (status = 201, description = "Tag created", body = TagResponse),
        (status = 400, description = "Blank label"),
        (status = 403, description = "Staff only"),
    ),
    tag = "tags"
)]
pub async fn create_tag(
    state: web::Data<AppState>,
    principal: Principal,
    body: web::Json<TagRequest>,
) -> Result<HttpResponse, AppError> {
    let label = body.into_inner().label;
    let tag = web::block(move || state.tags.create_tag(&principal, label)).await??;
    Ok(HttpResponse::Created().json(TagResponse::from(tag)))
}

/// DELETE /tags/{id}
///
/// Also detaches the tag from everything it was attached to.
#[utoipa::path(
    delete,
    path = "/tags/{id}",
    params(("id" = i64, Path, description = "Tag id")),
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Tag not found"),
    ),
    tag = "tags"
)]
pub async fn delete_tag(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    web::block(move || state.tags.delete_tag(&principal, id)).await??;
    Ok(no_content())
}

#[utoipa::path(
    post,
    path = "/tags/{id}/items",
    params(("id" = i64, Path, description = "Tag id")),
    request_body = EntityRequest,
    responses(
        (status = 204, description = "Tag attached (attaching twice is a no-op)"),
        (status = 400, description = "Unknown entity kind"),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Tag not found"),
    ),
    tag = "tags"
)]
pub async fn tag_item(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
    body: web::Json<EntityRequest>,
) -> Result<HttpResponse, AppError> {
    let tag_id = path.into_inner();
    let entity = body.entity()?;
    web::block(move || state.tags.tag_entity(&principal, tag_id, entity)).await??;
    Ok(no_content())
}

#[utoipa::path(
    delete,
    path = "/tags/{id}/items/{kind}/{entity_id}",
    params(
        ("id" = i64, Path, description = "Tag id"),
        ("kind" = String, Path, description = "Entity kind"),
        ("entity_id" = i64, Path, description = "Entity id"),
    ),
    responses(
        (status = 204, description = "Tag detached"),
        (status = 403, description = "Staff only"),
    ),
    tag = "tags"
)]
pub async fn untag_item(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<(i64, String, i64)>,
) -> Result<HttpResponse, AppError> {
    let (tag_id, kind, entity_id) = path.into_inner();
    let entity = TaggedEntity::from_parts(&kind, entity_id)?;
    web::block(move || state.tags.untag_entity(&principal, tag_id, entity)).await??;
    Ok(no_content())
}

#[utoipa::path(
    get,
    path = "/tags/for/{kind}/{entity_id}",
    params(
        ("kind" = String, Path, description = "Entity kind"),
        ("entity_id" = i64, Path, description = "Entity id"),
    ),
    responses(
        (status = 200, description = "Tags attached to the entity", body = Vec<TagResponse>),
        (status = 400, description = "Unknown entity kind"),
    ),
    tag = "tags"
)]
pub async fn tags_for(
    state: web::Data<AppState>,
    path: web::Path<(String, i64)>,
) -> Result<HttpResponse, AppError> {
    let entity = entity_from_path(path)?;
    let tags = web::block(move || state.tags.tags_for(entity)).await??;
    let body: Vec<TagResponse> = tags.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

// ── Likes ────────────────────────────────────────────────────────────────────

/// GET /likes
///
/// The caller's own likes.
#[utoipa::path(
    get,
    path = "/likes",
    responses(
        (status = 200, description = "Likes of the caller", body = Vec<LikeResponse>),
        (status = 401, description = "Not authenticated"),
    ),
    tag = "tags"
)]
pub async fn list_likes(
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    let likes = web::block(move || state.likes.my_likes(&principal)).await??;
    let body: Vec<LikeResponse> = likes.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    post,
    path = "/likes",
    request_body = EntityRequest,
    responses(
        (status = 201, description = "Liked (liking twice returns the existing like)", body = LikeResponse),
        (status = 400, description = "Unknown entity kind"),
        (status = 401, description = "Not authenticated"),
    ),
    tag = "tags"
)]
pub async fn like(
    state: web::Data<AppState>,
    principal: Principal,
    body: web::Json<EntityRequest>,
) -> Result<HttpResponse, AppError> {
    let entity = body.entity()?;
    let like = web::block(move || state.likes.like(&principal, entity)).await??;
    Ok(HttpResponse::Created().json(LikeResponse::from(like)))
}

#[utoipa::path(
    delete,
    path = "/likes/{kind}/{entity_id}",
    params(
        ("kind" = String, Path, description = "Entity kind"),
        ("entity_id" = i64, Path, description = "Entity id"),
    ),
    responses(
        (status = 204, description = "Like removed"),
        (status = 401, description = "Not authenticated"),
    ),
    tag = "tags"
)]
pub async fn unlike(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<(String, i64)>,
) -> Result<HttpResponse, AppError> {
    let entity = entity_from_path(path)?;
    web::block(move || state.likes.unlike(&principal, entity)).await??;
    Ok(no_content())
}

#[utoipa::path(
    get,
    path = "/likes/{kind}/{entity_id}/count",
    params(
        ("kind" = String, Path, description = "Entity kind"),
        ("entity_id" = i64, Path, description = "Entity id"),
    ),
    responses(
        (status = 200, description = "Number of likes", body = LikeCountResponse),
        (status = 400, description = "Unknown entity kind"),
    ),
    tag = "tags"
)]
pub async fn like_count(
    state: web::Data<AppState>,
    path: web::Path<(String, i64)>,
) -> Result<HttpResponse, AppError> {
    let entity = entity_from_path(path)?;
    let likes = web::block(move || state.likes.like_count(entity)).await??;
    Ok(HttpResponse::Ok().json(LikeCountResponse {
        kind: entity.kind().to_string(),
        entity_id: entity.id(),
        likes,
    }))
}
