use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(users()).await?;
        manager.create_table(categories()).await?;
        manager.create_table(locations()).await?;
        manager.create_table(posts()).await?;
        manager.create_table(comments()).await?;

        for index in indexes() {
            manager.create_index(index).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            Comments::Table.into_iden(),
            Posts::Table.into_iden(),
            Locations::Table.into_iden(),
            Categories::Table.into_iden(),
            Users::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}

fn created_at<T: IntoIden>(column: T) -> ColumnDef {
    ColumnDef::new(column)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

fn users() -> TableCreateStatement {
    Table::create()
        .table(Users::Table)
        .if_not_exists()
        .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
        .col(
            ColumnDef::new(Users::Username)
                .string_len(150)
                .not_null()
                .unique_key(),
        )
        .col(
            ColumnDef::new(Users::Email)
                .string_len(254)
                .not_null()
                .unique_key(),
        )
        .col(ColumnDef::new(Users::FirstName).string_len(150).not_null().default(""))
        .col(ColumnDef::new(Users::LastName).string_len(150).not_null().default(""))
        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
        .col(ColumnDef::new(Users::IsStaff).boolean().not_null().default(false))
        .col(created_at(Users::CreatedAt))
        .col(created_at(Users::UpdatedAt))
        .to_owned()
}

fn categories() -> TableCreateStatement {
    Table::create()
        .table(Categories::Table)
        .if_not_exists()
        .col(ColumnDef::new(Categories::Id).uuid().not_null().primary_key())
        .col(ColumnDef::new(Categories::Title).string_len(256).not_null())
        .col(ColumnDef::new(Categories::Description).text().not_null())
        .col(
            ColumnDef::new(Categories::Slug)
                .string_len(64)
                .not_null()
                .unique_key(),
        )
        .col(
            ColumnDef::new(Categories::IsPublished)
                .boolean()
                .not_null()
                .default(true),
        )
        .col(created_at(Categories::CreatedAt))
        .to_owned()
}

fn locations() -> TableCreateStatement {
    Table::create()
        .table(Locations::Table)
        .if_not_exists()
        .col(ColumnDef::new(Locations::Id).uuid().not_null().primary_key())
        .col(ColumnDef::new(Locations::Name).string_len(256).not_null())
        .col(
            ColumnDef::new(Locations::IsPublished)
                .boolean()
                .not_null()
                .default(true),
        )
        .col(created_at(Locations::CreatedAt))
        .to_owned()
}

fn posts() -> TableCreateStatement {
    Table::create()
        .table(Posts::Table)
        .if_not_exists()
        .col(ColumnDef::new(Posts::Id).uuid().not_null().primary_key())
        .col(ColumnDef::new(Posts::AuthorId).uuid().not_null())
        .col(ColumnDef::new(Posts::Title).string_len(256).not_null())
        .col(ColumnDef::new(Posts::Text).text().not_null())
        .col(
            ColumnDef::new(Posts::PubDate)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(ColumnDef::new(Posts::IsPublished).boolean().not_null().default(true))
        .col(ColumnDef::new(Posts::CategoryId).uuid().null())
        .col(ColumnDef::new(Posts::LocationId).uuid().null())
        .col(ColumnDef::new(Posts::Image).string().null())
        .col(created_at(Posts::CreatedAt))
        .foreign_key(
            ForeignKey::create()
                .name("fk_posts_author")
                .from(Posts::Table, Posts::AuthorId)
                .to(Users::Table, Users::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .on_update(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_posts_category")
                .from(Posts::Table, Posts::CategoryId)
                .to(Categories::Table, Categories::Id)
                .on_delete(ForeignKeyAction::SetNull)
                .on_update(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_posts_location")
                .from(Posts::Table, Posts::LocationId)
                .to(Locations::Table, Locations::Id)
                .on_delete(ForeignKeyAction::SetNull)
                .on_update(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

fn comments() -> TableCreateStatement {
    Table::create()
        .table(Comments::Table)
        .if_not_exists()
        .col(ColumnDef::new(Comments::Id).uuid().not_null().primary_key())
        .col(ColumnDef::new(Comments::PostId).uuid().not_null())
        .col(ColumnDef::new(Comments::AuthorId).uuid().not_null())
        .col(ColumnDef::new(Comments::Text).text().not_null())
        .col(created_at(Comments::CreatedAt))
        .foreign_key(
            ForeignKey::create()
                .name("fk_comments_post")
                .from(Comments::Table, Comments::PostId)
                .to(Posts::Table, Posts::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .on_update(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_comments_author")
                .from(Comments::Table, Comments::AuthorId)
                .to(Users::Table, Users::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .on_update(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

fn indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .if_not_exists()
            .name("idx_posts_pub_date")
            .table(Posts::Table)
            .col(Posts::PubDate)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_posts_author_id")
            .table(Posts::Table)
            .col(Posts::AuthorId)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_posts_category_id")
            .table(Posts::Table)
            .col(Posts::CategoryId)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_comments_post_id")
            .table(Comments::Table)
            .col(Comments::PostId)
            .to_owned(),
    ]
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    FirstName,
    LastName,
    PasswordHash,
    IsStaff,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    Title,
    Description,
    Slug,
    IsPublished,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Locations {
    Table,
    Id,
    Name,
    IsPublished,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Posts {
    Table,
    Id,
    AuthorId,
    Title,
    Text,
    PubDate,
    IsPublished,
    CategoryId,
    LocationId,
    Image,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Comments {
    Table,
    Id,
    PostId,
    AuthorId,
    Text,
    CreatedAt,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posts_keep_rows_when_category_goes() {
        let sql = posts().to_string(PostgresQueryBuilder);

        assert!(sql.contains(r#"CONSTRAINT "fk_posts_category""#));
        assert!(sql.contains("ON DELETE SET NULL"));
        assert!(sql.contains("ON DELETE CASCADE"));
    }

    #[test]
    fn test_comments_cascade_with_post() {
        let sql = comments().to_string(PostgresQueryBuilder);

        assert!(sql.contains(r#"REFERENCES "posts" ("id") ON DELETE CASCADE"#));
    }

    #[test]
    fn test_feed_indexes() {
        let names: Vec<String> = indexes()
            .iter()
            .map(|index| index.to_string(PostgresQueryBuilder))
            .collect();

        assert_eq!(names.len(), 4);
        assert!(names[0].contains(r#""idx_posts_pub_date""#));
    }
}
