use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    application::repos::{CategoriesRepo, RepoError},
    domain::entities::CategoryRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    icon: String,
    position: i32,
}

impl From<CategoryRow> for CategoryRecord {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            icon: row.icon,
            position: row.position,
        }
    }
}

#[async_trait]
impl CategoriesRepo for PostgresRepositories {
    async fn fetch_all_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        let rows: Vec<CategoryRow> = sqlx::query_as(
            r#"
            SELECT id, name, icon, position
            FROM categories
            ORDER BY position ASC, name ASC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
