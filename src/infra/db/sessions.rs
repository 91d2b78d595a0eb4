use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{RepoError, SessionsRepo},
    domain::entities::SessionRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct SessionRow {
    token_digest: String,
    expires_at: OffsetDateTime,
}

impl From<SessionRow> for SessionRecord {
    fn from(row: SessionRow) -> Self {
        Self {
            token_digest: row.token_digest,
            expires_at: row.expires_at,
        }
    }
}

#[async_trait]
impl SessionsRepo for PostgresRepositories {
    async fn find_session(&self, token_digest: &str) -> Result<Option<SessionRecord>, RepoError> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT token_digest, expires_at
            FROM admin_sessions
            WHERE token_digest = $1
            "#,
        )
        .bind(token_digest)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }
}
