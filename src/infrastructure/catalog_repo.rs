use std::collections::HashMap;

use chrono::Utc;
use diesel::dsl::{count, exists};
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::catalog::{
    CollectionInput, CollectionView, ProductFilter, ProductInput, ProductOrdering, ProductView,
    PromotionInput, PromotionView, ReviewInput, ReviewView,
};
use crate::domain::errors::DomainError;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::ports::CatalogRepository;
use crate::schema::{collections, order_items, product_promotions, products, promotions, reviews};

use super::models::{
    CollectionChanges, CollectionRow, NewPromotionRow, NewReviewRow, ProductChanges,
    ProductPromotionRow, ProductRow, PromotionRow, ReviewRow,
};

pub struct DieselCatalogRepository {
    pool: DbPool,
}

impl DieselCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn product_counts(conn: &mut PgConnection, ids: Vec<i64>) -> QueryResult<HashMap<i64, i64>> {
    let rows: Vec<(i64, i64)> = products::table
        .filter(products::collection_id.eq_any(ids))
        .group_by(products::collection_id)
        .select((products::collection_id, count(products::id)))
        .load(conn)?;
    Ok(rows.into_iter().collect())
}

fn collection_view(row: CollectionRow, counts: &HashMap<i64, i64>) -> CollectionView {
    CollectionView {
        product_count: counts.get(&row.id).copied().unwrap_or(0),
        id: row.id,
        title: row.title,
        featured_product_id: row.featured_product_id,
    }
}

fn promotion_ids(conn: &mut PgConnection, ids: Vec<i64>) -> QueryResult<HashMap<i64, Vec<i64>>> {
    let rows: Vec<(i64, i64)> = product_promotions::table
        .filter(product_promotions::product_id.eq_any(ids))
        .select((product_promotions::product_id, product_promotions::promotion_id))
        .order(product_promotions::promotion_id.asc())
        .load(conn)?;
    let mut by_product: HashMap<i64, Vec<i64>> = HashMap::new();
    for (product_id, promotion_id) in rows {
        by_product.entry(product_id).or_default().push(promotion_id);
    }
    Ok(by_product)
}

fn product_view(row: ProductRow, promotions: &mut HashMap<i64, Vec<i64>>) -> ProductView {
    ProductView {
        promotion_ids: promotions.remove(&row.id).unwrap_or_default(),
        id: row.id,
        title: row.title,
        slug: row.slug,
        description: row.description,
        unit_price: row.unit_price,
        inventory: row.inventory,
        collection_id: row.collection_id,
        last_update: row.last_update,
    }
}

fn product_changes(input: &ProductInput) -> ProductChanges {
    ProductChanges {
        title: input.title.clone(),
        slug: input.resolved_slug(),
        description: input.description.clone(),
        unit_price: input.unit_price.clone(),
        inventory: input.inventory,
        last_update: Utc::now(),
        collection_id: input.collection_id,
    }
}

fn replace_promotions(
    conn: &mut PgConnection,
    product_id: i64,
    promotion_ids: &[i64],
) -> QueryResult<()> {
    diesel::delete(product_promotions::table.filter(product_promotions::product_id.eq(product_id)))
        .execute(conn)?;
    if promotion_ids.is_empty() {
        return Ok(());
    }
    let rows: Vec<ProductPromotionRow> = promotion_ids
        .iter()
        .map(|promotion_id| ProductPromotionRow {
            product_id,
            promotion_id: *promotion_id,
        })
        .collect();
    diesel::insert_into(product_promotions::table)
        .values(&rows)
        .on_conflict_do_nothing()
        .execute(conn)?;
    Ok(())
}

/// `%term%` with the LIKE wildcards in `term` escaped by a backslash.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Products matching the filter, without ordering or paging applied.
fn filtered_products(filter: &ProductFilter) -> products::BoxedQuery<'static, Pg> {
    let mut query = products::table.into_boxed();
    if let Some(collection_id) = filter.collection_id {
        query = query.filter(products::collection_id.eq(collection_id));
    }
    if let Some(min) = &filter.min_price {
        query = query.filter(products::unit_price.ge(min.clone()));
    }
    if let Some(max) = &filter.max_price {
        query = query.filter(products::unit_price.le(max.clone()));
    }
    if let Some(term) = &filter.search {
        let pattern = contains_pattern(term);
        query = query.filter(
            products::title
                .ilike(pattern.clone())
                .escape('\\')
                .or(products::description.ilike(pattern).escape('\\')),
        );
    }
    query
}

impl CatalogRepository for DieselCatalogRepository {
    fn list_collections(&self, page: PageRequest) -> Result<Page<CollectionView>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = collections::table.count().get_result(conn)?;
            let rows = collections::table
                .select(CollectionRow::as_select())
                .order(collections::id.asc())
                .limit(page.limit)
                .offset(page.offset())
                .load(conn)?;
            let counts = product_counts(conn, rows.iter().map(|c| c.id).collect())?;

            Ok(Page {
                items: rows.into_iter().map(|c| collection_view(c, &counts)).collect(),
                total,
            })
        })
    }

    fn find_collection(&self, id: i64) -> Result<Option<CollectionView>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = collections::table
            .find(id)
            .select(CollectionRow::as_select())
            .first(&mut conn)
            .optional()?;
        let Some(row) = row else {
            return Ok(None);
        };
        let counts = product_counts(&mut conn, vec![row.id])?;
        Ok(Some(collection_view(row, &counts)))
    }

    fn create_collection(&self, input: CollectionInput) -> Result<CollectionView, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::insert_into(collections::table)
            .values(&CollectionChanges {
                title: input.title,
                featured_product_id: input.featured_product_id,
            })
            .returning(CollectionRow::as_returning())
            .get_result(&mut conn)?;
        Ok(collection_view(row, &HashMap::new()))
    }

    fn update_collection(
        &self,
        id: i64,
        input: CollectionInput,
    ) -> Result<Option<CollectionView>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::update(collections::table.find(id))
            .set(&CollectionChanges {
                title: input.title,
                featured_product_id: input.featured_product_id,
            })
            .returning(CollectionRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        let Some(row) = row else {
            return Ok(None);
        };
        let counts = product_counts(&mut conn, vec![row.id])?;
        Ok(Some(collection_view(row, &counts)))
    }

    fn delete_collection(&self, id: i64) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(collections::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn list_products(&self, filter: &ProductFilter) -> Result<Page<ProductView>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = filtered_products(filter).count().get_result(conn)?;

            let query = filtered_products(filter);
            let query = match filter.ordering {
                ProductOrdering::LastUpdateDesc => query.order(products::last_update.desc()),
                ProductOrdering::LastUpdate => query.order(products::last_update.asc()),
                ProductOrdering::UnitPrice => query.order(products::unit_price.asc()),
                ProductOrdering::UnitPriceDesc => query.order(products::unit_price.desc()),
                ProductOrdering::Title => query.order(products::title.asc()),
                ProductOrdering::TitleDesc => query.order(products::title.desc()),
            };
            let rows: Vec<ProductRow> = query
                .then_order_by(products::id.asc())
                .limit(filter.page.limit)
                .offset(filter.page.offset())
                .load(conn)?;

            let mut promotions = promotion_ids(conn, rows.iter().map(|p| p.id).collect())?;
            Ok(Page {
                items: rows
                    .into_iter()
                    .map(|p| product_view(p, &mut promotions))
                    .collect(),
                total,
            })
        })
    }

    fn find_product(&self, id: i64) -> Result<Option<ProductView>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = products::table
            .find(id)
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut promotions = promotion_ids(&mut conn, vec![row.id])?;
        Ok(Some(product_view(row, &mut promotions)))
    }

    fn create_product(&self, input: ProductInput) -> Result<ProductView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let row = diesel::insert_into(products::table)
                .values(&product_changes(&input))
                .returning(ProductRow::as_returning())
                .get_result(conn)?;
            replace_promotions(conn, row.id, &input.promotion_ids)?;

            let mut promotions = HashMap::from([(row.id, input.promotion_ids.clone())]);
            Ok(product_view(row, &mut promotions))
        })
    }

    fn update_product(
        &self,
        id: i64,
        input: ProductInput,
    ) -> Result<Option<ProductView>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let row = diesel::update(products::table.find(id))
                .set(&product_changes(&input))
                .returning(ProductRow::as_returning())
                .get_result(conn)
                .optional()?;
            let Some(row) = row else {
                return Ok(None);
            };
            replace_promotions(conn, id, &input.promotion_ids)?;

            let mut promotions = HashMap::from([(row.id, input.promotion_ids.clone())]);
            Ok(Some(product_view(row, &mut promotions)))
        })
    }

    fn delete_product(&self, id: i64) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(products::table.find(id))
            .execute(&mut conn)
            .map_err(|e| match DomainError::from(e) {
                DomainError::Conflict(msg) => DomainError::Protected(msg),
                other => other,
            })?;
        Ok(deleted > 0)
    }

    fn product_is_ordered(&self, id: i64) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let ordered = diesel::select(exists(
            order_items::table.filter(order_items::product_id.eq(id)),
        ))
        .get_result::<bool>(&mut conn)?;
        Ok(ordered)
    }

    fn list_promotions(&self) -> Result<Vec<PromotionView>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = promotions::table
            .select(PromotionRow::as_select())
            .order(promotions::id.asc())
            .load(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(|p| PromotionView {
                id: p.id,
                description: p.description,
                discount: p.discount,
            })
            .collect())
    }

    fn create_promotion(&self, input: PromotionInput) -> Result<PromotionView, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(promotions::table)
            .values(&NewPromotionRow {
                description: input.description,
                discount: input.discount,
            })
            .returning(PromotionRow::as_returning())
            .get_result(&mut conn)?;
        Ok(PromotionView {
            id: row.id,
            description: row.description,
            discount: row.discount,
        })
    }

    fn list_reviews(&self, product_id: i64) -> Result<Vec<ReviewView>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = reviews::table
            .filter(reviews::product_id.eq(product_id))
            .select(ReviewRow::as_select())
            .order(reviews::id.asc())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(review_view).collect())
    }

    fn create_review(
        &self,
        product_id: i64,
        input: ReviewInput,
    ) -> Result<ReviewView, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(reviews::table)
            .values(&NewReviewRow {
                product_id,
                name: input.name,
                description: input.description,
                date: Utc::now().date_naive(),
            })
            .returning(ReviewRow::as_returning())
            .get_result(&mut conn)?;
        Ok(review_view(row))
    }

    fn delete_review(&self, product_id: i64, review_id: i64) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(
            reviews::table
                .filter(reviews::id.eq(review_id))
                .filter(reviews::product_id.eq(product_id)),
        )
        .execute(&mut conn)?;
        Ok(deleted > 0)
    }
}

fn review_view(row: ReviewRow) -> ReviewView {
    ReviewView {
        id: row.id,
        product_id: row.product_id,
        name: row.name,
        description: row.description,
        date: row.date,
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::*;
    use crate::infrastructure::testing::setup_db;

    fn collection(title: &str) -> CollectionInput {
        CollectionInput {
            title: title.to_string(),
            featured_product_id: None,
        }
    }

    fn product(collection_id: i64, title: &str, price: &str) -> ProductInput {
        ProductInput {
            title: title.to_string(),
            slug: None,
            description: format!("{title} description"),
            unit_price: BigDecimal::from_str(price).expect("valid decimal"),
            inventory: 10,
            collection_id,
            promotion_ids: vec![],
        }
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn collection_counts_its_products() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCatalogRepository::new(pool);

        let c = repo.create_collection(collection("Kitchen")).expect("create failed");
        repo.create_product(product(c.id, "Mug", "4.00")).expect("create failed");
        repo.create_product(product(c.id, "Bowl", "6.00")).expect("create failed");

        let found = repo
            .find_collection(c.id)
            .expect("find failed")
            .expect("collection should exist");
        assert_eq!(found.product_count, 2);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn collection_with_products_is_protected_by_foreign_key() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCatalogRepository::new(pool);

        let c = repo.create_collection(collection("Kitchen")).expect("create failed");
        repo.create_product(product(c.id, "Mug", "4.00")).expect("create failed");

        let err = repo.delete_collection(c.id).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn list_products_filters_orders_and_paginates() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCatalogRepository::new(pool);

        let c = repo.create_collection(collection("Kitchen")).expect("create failed");
        for (title, price) in [("Mug", "4.00"), ("Bowl", "6.00"), ("Plate", "8.00"), ("Jug", "12.00")] {
            repo.create_product(product(c.id, title, price)).expect("create failed");
        }

        let filter = ProductFilter {
            min_price: Some(BigDecimal::from(5)),
            ordering: ProductOrdering::UnitPriceDesc,
            page: PageRequest::new(1, 2),
            ..Default::default()
        };
        let page = repo.list_products(&filter).expect("list failed");
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].title, "Jug");

        let search = ProductFilter {
            search: Some("BOWL".to_string()),
            ..Default::default()
        };
        let page = repo.list_products(&search).expect("search failed");
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].slug, "bowl");
    }

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("tea"), "%tea%");
        assert_eq!(contains_pattern("50%_off"), r"%50\%\_off%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn search_treats_wildcards_literally() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCatalogRepository::new(pool);

        let c = repo.create_collection(collection("Sale")).expect("create failed");
        repo.create_product(product(c.id, "Mug", "4.00")).expect("create failed");
        repo.create_product(product(c.id, "Bowl 50% off", "6.00"))
            .expect("create failed");

        for (term, expected) in [("%", 1), ("_", 0), ("50%", 1)] {
            let filter = ProductFilter {
                search: Some(term.to_string()),
                ..Default::default()
            };
            let page = repo.list_products(&filter).expect("search failed");
            assert_eq!(page.total, expected, "search {term:?}");
        }
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn product_promotions_are_replaced_on_update() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCatalogRepository::new(pool);

        let c = repo.create_collection(collection("Kitchen")).expect("create failed");
        let promo = repo
            .create_promotion(PromotionInput {
                description: "Summer".to_string(),
                discount: 0.1,
            })
            .expect("create failed");
        let mut input = product(c.id, "Mug", "4.00");
        input.promotion_ids = vec![promo.id];
        let p = repo.create_product(input.clone()).expect("create failed");
        assert_eq!(p.promotion_ids, vec![promo.id]);

        input.promotion_ids = vec![];
        let updated = repo
            .update_product(p.id, input)
            .expect("update failed")
            .expect("product should exist");
        assert!(updated.promotion_ids.is_empty());
    }
}
