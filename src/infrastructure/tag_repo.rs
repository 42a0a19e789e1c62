use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::{LikeRepository, TagRepository};
use crate::domain::tagging::{LikeView, TagView, TaggedEntity};
use crate::schema::{liked_items, tagged_items, tags};

use super::models::{LikedItemRow, NewLikedItemRow, NewTagRow, NewTaggedItemRow, TagRow};

fn tag_view(row: TagRow) -> TagView {
    TagView {
        id: row.id,
        label: row.label,
    }
}

fn like_view(row: LikedItemRow) -> Result<LikeView, DomainError> {
    Ok(LikeView {
        id: row.id,
        user_id: row.user_id,
        entity: TaggedEntity::from_parts(&row.entity_kind, row.entity_id)?,
    })
}

pub struct DieselTagRepository {
    pool: DbPool,
}

impl DieselTagRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl TagRepository for DieselTagRepository {
    fn list_tags(&self) -> Result<Vec<TagView>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = tags::table
            .select(TagRow::as_select())
            .order(tags::label.asc())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(tag_view).collect())
    }

    fn create_tag(&self, label: String) -> Result<TagView, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(tags::table)
            .values(&NewTagRow { label })
            .returning(TagRow::as_returning())
            .get_result(&mut conn)?;
        Ok(tag_view(row))
    }

    fn delete_tag(&self, id: i64) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        // tagged_items cascade
        let deleted = diesel::delete(tags::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn tag(&self, tag_id: i64, entity: TaggedEntity) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let exists = tags::table
                .find(tag_id)
                .select(tags::id)
                .first::<i64>(conn)
                .optional()?
                .is_some();
            if !exists {
                return Ok(false);
            }
            diesel::insert_into(tagged_items::table)
                .values(&NewTaggedItemRow {
                    tag_id,
                    entity_kind: entity.kind().to_string(),
                    entity_id: entity.id(),
                })
                .on_conflict_do_nothing()
                .execute(conn)?;
            Ok(true)
        })
    }

    fn untag(&self, tag_id: i64, entity: TaggedEntity) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        diesel::delete(
            tagged_items::table
                .filter(tagged_items::tag_id.eq(tag_id))
                .filter(tagged_items::entity_kind.eq(entity.kind()))
                .filter(tagged_items::entity_id.eq(entity.id())),
        )
        .execute(&mut conn)?;
        Ok(())
    }

    fn tags_for(&self, entity: TaggedEntity) -> Result<Vec<TagView>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = tagged_items::table
            .inner_join(tags::table)
            .filter(tagged_items::entity_kind.eq(entity.kind()))
            .filter(tagged_items::entity_id.eq(entity.id()))
            .select(TagRow::as_select())
            .order(tags::label.asc())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(tag_view).collect())
    }
}

pub struct DieselLikeRepository {
    pool: DbPool,
}

impl DieselLikeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl LikeRepository for DieselLikeRepository {
    fn like(&self, user_id: i64, entity: TaggedEntity) -> Result<LikeView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            diesel::insert_into(liked_items::table)
                .values(&NewLikedItemRow {
                    user_id,
                    entity_kind: entity.kind().to_string(),
                    entity_id: entity.id(),
                })
                .on_conflict_do_nothing()
                .execute(conn)?;
            let row = liked_items::table
                .filter(liked_items::user_id.eq(user_id))
                .filter(liked_items::entity_kind.eq(entity.kind()))
                .filter(liked_items::entity_id.eq(entity.id()))
                .select(LikedItemRow::as_select())
                .first(conn)?;
            like_view(row)
        })
    }

    fn unlike(&self, user_id: i64, entity: TaggedEntity) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        diesel::delete(
            liked_items::table
                .filter(liked_items::user_id.eq(user_id))
                .filter(liked_items::entity_kind.eq(entity.kind()))
                .filter(liked_items::entity_id.eq(entity.id())),
        )
        .execute(&mut conn)?;
        Ok(())
    }

    fn likes_for_user(&self, user_id: i64) -> Result<Vec<LikeView>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = liked_items::table
            .filter(liked_items::user_id.eq(user_id))
            .select(LikedItemRow::as_select())
            .order(liked_items::id.asc())
            .load(&mut conn)?;
        rows.into_iter().map(like_view).collect()
    }

    fn count_for(&self, entity: TaggedEntity) -> Result<i64, DomainError> {
        let mut conn = self.pool.get()?;
        let count = liked_items::table
            .filter(liked_items::entity_kind.eq(entity.kind()))
            .filter(liked_items::entity_id.eq(entity.id()))
            .count()
            .get_result(&mut conn)?;
        Ok(count)
    }
}
