//! Tags and likes that can point at any kind of record.

use std::fmt;

use super::errors::DomainError;

/// A reference to any taggable or likeable record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaggedEntity {
    Product(i64),
    Collection(i64),
    Customer(i64),
    Order(i64),
    Review(i64),
}

impl TaggedEntity {
    pub fn from_parts(kind: &str, id: i64) -> Result<Self, DomainError> {
        match kind.to_ascii_lowercase().as_str() {
            "product" => Ok(TaggedEntity::Product(id)),
            "collection" => Ok(TaggedEntity::Collection(id)),
            "customer" => Ok(TaggedEntity::Customer(id)),
            "order" => Ok(TaggedEntity::Order(id)),
            "review" => Ok(TaggedEntity::Review(id)),
            other => Err(DomainError::validation(format!("unknown entity kind '{other}'"))),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TaggedEntity::Product(_) => "product",
            TaggedEntity::Collection(_) => "collection",
            TaggedEntity::Customer(_) => "customer",
            TaggedEntity::Order(_) => "order",
            TaggedEntity::Review(_) => "review",
        }
    }

    pub fn id(&self) -> i64 {
        match *self {
            TaggedEntity::Product(id)
            | TaggedEntity::Collection(id)
            | TaggedEntity::Customer(id)
            | TaggedEntity::Order(id)
            | TaggedEntity::Review(id) => id,
        }
    }
}

impl fmt::Display for TaggedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

#[derive(Debug, Clone)]
pub struct TagView {
    pub id: i64,
    pub label: String,
}

pub fn validate_label(label: &str) -> Result<(), DomainError> {
    if label.trim().is_empty() {
        return Err(DomainError::validation("label may not be blank"));
    }
    if label.chars().count() > 255 {
        return Err(DomainError::validation("label is longer than 255 characters"));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct LikeView {
    pub id: i64,
    pub user_id: i64,
    pub entity: TaggedEntity,
}
