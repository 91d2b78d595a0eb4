use async_trait::async_trait;

use crate::{
    application::repos::{RatesRepo, RepoError},
    domain::{
        currency::{CurrencyCode, PIVOT_CURRENCY},
        entities::RateRow,
    },
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct ExchangeRateRow {
    currency_from: String,
    currency_to: String,
    rate: f64,
}

impl From<ExchangeRateRow> for RateRow {
    fn from(row: ExchangeRateRow) -> Self {
        Self {
            currency_from: CurrencyCode::new(row.currency_from),
            currency_to: CurrencyCode::new(row.currency_to),
            rate: row.rate,
        }
    }
}

#[async_trait]
impl RatesRepo for PostgresRepositories {
    async fn fetch_rates_to_pivot(&self) -> Result<Vec<RateRow>, RepoError> {
        let rows: Vec<ExchangeRateRow> = sqlx::query_as(
            r#"
            SELECT currency_from, currency_to, rate
            FROM exchange_rates
            WHERE currency_to = $1
            "#,
        )
        .bind(PIVOT_CURRENCY)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
