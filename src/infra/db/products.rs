use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{ProductsRepo, RepoError},
    domain::{currency::CurrencyCode, entities::ProductRecord},
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    price: f64,
    currency: String,
    stock: i32,
    category_id: Uuid,
    on_sale: bool,
    featured: bool,
    is_new: bool,
    image_urls: Vec<String>,
    created_at: OffsetDateTime,
}

impl From<ProductRow> for ProductRecord {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            price: row.price,
            currency: CurrencyCode::new(row.currency),
            stock: row.stock,
            category_id: row.category_id,
            on_sale: row.on_sale,
            featured: row.featured,
            is_new: row.is_new,
            image_urls: row.image_urls,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ProductsRepo for PostgresRepositories {
    async fn fetch_all_products(&self) -> Result<Vec<ProductRecord>, RepoError> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            r#"
            SELECT id,
                   name,
                   price,
                   currency,
                   stock,
                   category_id,
                   on_sale,
                   featured,
                   is_new,
                   image_urls,
                   created_at
            FROM products
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
