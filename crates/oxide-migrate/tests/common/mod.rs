#![allow(dead_code)]

use std::io::Write;

use oxide_sql_core::model::{
    Catalog, Constraint, ForeignKey, QualifiedName, SqlType, SqlValueType, Table, TableColumn,
};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tempfile::NamedTempFile;

pub async fn create_test_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .expect("Failed to create in-memory SQLite pool")
}

pub fn write_json(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

/// `authors` and `posts`, with a foreign key between them.
pub fn blog() -> Catalog {
    let mut catalog = Catalog::new("blog");
    let main = catalog.create_schema("main").unwrap();

    let authors = main.create_table("authors").unwrap();
    authors
        .add_column(TableColumn::new("id", SqlType::Int32).not_null())
        .unwrap();
    authors
        .create_column("name", SqlValueType::varchar(80))
        .unwrap();
    authors.create_primary_key("pk_authors", &["id"]).unwrap();

    let mut posts = Table::new("posts");
    posts
        .add_column(TableColumn::new("id", SqlType::Int32).not_null())
        .unwrap();
    posts.create_column("author_id", SqlType::Int32).unwrap();
    posts.create_column("body", SqlType::VarCharMax).unwrap();
    posts.create_primary_key("pk_posts", &["id"]).unwrap();
    posts
        .add_constraint(Constraint::foreign_key(
            "fk_posts_authors",
            ForeignKey::new(QualifiedName::new("main", "authors")).with_columns("author_id", "id"),
        ))
        .unwrap();
    main.add_table(posts).unwrap();
    catalog
}
