use std::sync::Arc;

use crate::domain::access::Principal;
use crate::domain::errors::DomainError;
use crate::domain::ports::{LikeRepository, TagRepository};
use crate::domain::tagging::{validate_label, LikeView, TagView, TaggedEntity};

#[derive(Clone)]
pub struct TagService {
    repo: Arc<dyn TagRepository>,
}

impl TagService {
    pub fn new(repo: Arc<dyn TagRepository>) -> Self {
        Self { repo }
    }

    pub fn list_tags(&self) -> Result<Vec<TagView>, DomainError> {
        self.repo.list_tags()
    }

    pub fn create_tag(&self, principal: &Principal, label: String) -> Result<TagView, DomainError> {
        principal.require_staff()?;
        validate_label(&label)?;
        self.repo.create_tag(label.trim().to_string())
    }

    pub fn delete_tag(&self, principal: &Principal, id: i64) -> Result<(), DomainError> {
        principal.require_staff()?;
        if !self.repo.delete_tag(id)? {
            return Err(DomainError::not_found(format!("Tag {id}")));
        }
        Ok(())
    }

    pub fn tag_entity(
        &self,
        principal: &Principal,
        tag_id: i64,
        entity: TaggedEntity,
    ) -> Result<(), DomainError> {
        principal.require_staff()?;
        if !self.repo.tag(tag_id, entity)? {
            return Err(DomainError::not_found(format!("Tag {tag_id}")));
        }
        log::debug!("Tagged {entity} with tag {tag_id}");
        Ok(())
    }

    pub fn untag_entity(
        &self,
        principal: &Principal,
        tag_id: i64,
        entity: TaggedEntity,
    ) -> Result<(), DomainError> {
        principal.require_staff()?;
        self.repo.untag(tag_id, entity)
    }

    pub fn tags_for(&self, entity: TaggedEntity) -> Result<Vec<TagView>, DomainError> {
        self.repo.tags_for(entity)
    }
}

#[derive(Clone)]
pub struct LikeService {
    repo: Arc<dyn LikeRepository>,
}

impl LikeService {
    pub fn new(repo: Arc<dyn LikeRepository>) -> Self {
        Self { repo }
    }

    pub fn like(&self, principal: &Principal, entity: TaggedEntity) -> Result<LikeView, DomainError> {
        let user_id = principal.require_user()?;
        self.repo.like(user_id, entity)
    }

    pub fn unlike(&self, principal: &Principal, entity: TaggedEntity) -> Result<(), DomainError> {
        let user_id = principal.require_user()?;
        self.repo.unlike(user_id, entity)
    }

    pub fn my_likes(&self, principal: &Principal) -> Result<Vec<LikeView>, DomainError> {
        let user_id = principal.require_user()?;
        self.repo.likes_for_user(user_id)
    }

    pub fn like_count(&self, entity: TaggedEntity) -> Result<i64, DomainError> {
        self.repo.count_for(entity)
    }
}
