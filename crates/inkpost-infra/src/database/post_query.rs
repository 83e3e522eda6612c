//! The visibility query builder.
//!
//! `all_posts` and `published_posts` are composable SeaORM selects; callers
//! narrow them further with ordinary filters. The published condition is the
//! SQL form of `inkpost_core::domain::visibility::is_published`.

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    Select,
};

use inkpost_core::domain::{PostQuery, PostScope};

use super::entity::{category, post};

/// Every post regardless of publication state, newest publication first.
pub fn all_posts() -> Select<post::Entity> {
    post::Entity::find()
        .order_by_desc(post::Column::PubDate)
        .order_by_desc(post::Column::Id)
}

/// Posts the public may see at `now`.
pub fn published_posts(now: DateTime<Utc>) -> Select<post::Entity> {
    all_posts()
        .join(JoinType::InnerJoin, post::Relation::Category.def())
        .filter(post::Column::IsPublished.eq(true))
        .filter(post::Column::PubDate.lte(now))
        .filter(post::Column::CategoryId.is_not_null())
        .filter(category::Column::IsPublished.eq(true))
}

/// Translate a domain query into a select.
pub fn select(query: &PostQuery) -> Select<post::Entity> {
    let mut select = match query.scope {
        PostScope::All => all_posts(),
        PostScope::Published { now } => published_posts(now),
    };
    if let Some(author_id) = query.author_id {
        select = select.filter(post::Column::AuthorId.eq(author_id));
    }
    if let Some(category_id) = query.category_id {
        select = select.filter(post::Column::CategoryId.eq(category_id));
    }
    select
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, QueryTrait};
    use uuid::Uuid;

    fn sql(select: Select<post::Entity>) -> String {
        select.build(DatabaseBackend::Postgres).to_string()
    }

    #[test]
    fn test_all_posts_has_no_visibility_filter() {
        let sql = sql(all_posts());
        assert!(!sql.contains("WHERE"));
        assert!(!sql.contains("JOIN"));
        assert!(sql.contains(r#"ORDER BY "posts"."pub_date" DESC, "posts"."id" DESC"#));
    }

    #[test]
    fn test_published_posts_filters_on_post_and_category() {
        let sql = sql(published_posts(Utc::now()));
        assert!(sql.contains(r#"INNER JOIN "categories""#));
        assert!(sql.contains(r#""posts"."is_published" = TRUE"#));
        assert!(sql.contains(r#""posts"."pub_date" <="#));
        assert!(sql.contains(r#""posts"."category_id" IS NOT NULL"#));
        assert!(sql.contains(r#""categories"."is_published" = TRUE"#));
    }

    #[test]
    fn test_select_adds_author_and_category_filters() {
        let author = Uuid::new_v4();
        let category = Uuid::new_v4();
        let query = PostQuery::published(Utc::now())
            .by_author(author)
            .in_category(category);

        let sql = sql(select(&query));
        assert!(sql.contains(&format!(r#""posts"."author_id" = '{author}'"#)));
        assert!(sql.contains(&format!(r#""posts"."category_id" = '{category}'"#)));
    }
}
