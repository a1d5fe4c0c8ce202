//! PostgreSQL implementation of the short URL repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::str::FromStr;
use std::sync::Arc;

use crate::domain::entities::{
    BlockState, ReachableState, RedirectMode, SafetyState, ShortUrl, ShortUrlProperties,
};
use crate::domain::repositories::ShortUrlRepository;
use crate::error::AppError;

const SELECT_COLUMNS: &str = r#"
    SELECT hash, target, created_at, redirect_mode, safety, block_state,
           reachable_state, ip, sponsor, country
    FROM short_urls
"#;

/// PostgreSQL repository for short URL records.
///
/// Validation updates are single conditional `UPDATE` statements. The
/// `CASE` expressions map the stored text value to the same rank as
/// [`ReachableState::rank`], [`SafetyState::rank`] and
/// [`RedirectMode::severity`]; the incoming rank is bound from Rust so the
/// row is only touched when the new value outranks the stored one.
/// `block_state` goes through the `merge_block_state` SQL function, which
/// mirrors [`BlockState::merge`].
pub struct PgShortUrlRepository {
    pool: Arc<PgPool>,
}

impl PgShortUrlRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ShortUrlRow {
    hash: String,
    target: String,
    created_at: DateTime<Utc>,
    redirect_mode: i32,
    safety: String,
    block_state: String,
    reachable_state: String,
    ip: Option<String>,
    sponsor: Option<String>,
    country: Option<String>,
}

fn corrupt(column: &str, value: &str) -> AppError {
    tracing::error!(column, value, "Unrecognised value stored in short_urls");
    AppError::internal(
        "Corrupt validation state",
        json!({ "column": column, "value": value }),
    )
}

impl TryFrom<ShortUrlRow> for ShortUrl {
    type Error = AppError;

    fn try_from(row: ShortUrlRow) -> Result<Self, Self::Error> {
        let redirect_mode = u16::try_from(row.redirect_mode)
            .map(RedirectMode::new)
            .map_err(|_| corrupt("redirect_mode", &row.redirect_mode.to_string()))?;
        let safety =
            SafetyState::from_str(&row.safety).map_err(|_| corrupt("safety", &row.safety))?;
        let block_state = BlockState::from_str(&row.block_state)
            .map_err(|_| corrupt("block_state", &row.block_state))?;
        let reachable_state = ReachableState::from_str(&row.reachable_state)
            .map_err(|_| corrupt("reachable_state", &row.reachable_state))?;

        Ok(ShortUrl {
            hash: row.hash,
            target: row.target,
            created_at: row.created_at,
            redirect_mode,
            safety,
            block_state,
            reachable_state,
            properties: ShortUrlProperties {
                ip: row.ip,
                sponsor: row.sponsor,
                country: row.country,
            },
        })
    }
}

#[async_trait]
impl ShortUrlRepository for PgShortUrlRepository {
    async fn save(&self, short_url: ShortUrl) -> Result<ShortUrl, AppError> {
        let row = sqlx::query_as::<_, ShortUrlRow>(
            r#"
            INSERT INTO short_urls
                (hash, target, created_at, redirect_mode, safety, block_state,
                 reachable_state, ip, sponsor, country)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING hash, target, created_at, redirect_mode, safety, block_state,
                      reachable_state, ip, sponsor, country
            "#,
        )
        .bind(&short_url.hash)
        .bind(&short_url.target)
        .bind(short_url.created_at)
        .bind(i32::from(short_url.redirect_mode.code()))
        .bind(short_url.safety.as_ref())
        .bind(short_url.block_state.as_ref())
        .bind(short_url.reachable_state.as_ref())
        .bind(&short_url.properties.ip)
        .bind(&short_url.properties.sponsor)
        .bind(&short_url.properties.country)
        .fetch_one(self.pool.as_ref())
        .await?;

        row.try_into()
    }

    async fn find_by_hash(&self, hash: &str) -> Result<Option<ShortUrl>, AppError> {
        let row = sqlx::query_as::<_, ShortUrlRow>(&format!("{SELECT_COLUMNS} WHERE hash = $1"))
            .bind(hash)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(ShortUrl::try_from).transpose()
    }

    async fn update_block_state(&self, hash: &str, state: BlockState) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE short_urls
            SET block_state = merge_block_state(block_state, $2)
            WHERE hash = $1
              AND merge_block_state(block_state, $2) <> block_state
            "#,
        )
        .bind(hash)
        .bind(state.as_ref())
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_reachable_state(
        &self,
        hash: &str,
        state: ReachableState,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE short_urls
            SET reachable_state = $2
            WHERE hash = $1
              AND (CASE reachable_state
                     WHEN 'NOT_DONE' THEN 0
                     WHEN 'REACHABLE' THEN 1
                     ELSE 2
                   END) < $3
            "#,
        )
        .bind(hash)
        .bind(state.as_ref())
        .bind(state.rank())
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_safe(&self, hash: &str, safe: bool) -> Result<bool, AppError> {
        let state = SafetyState::from_safe(safe);
        let result = sqlx::query(
            r#"
            UPDATE short_urls
            SET safety = $2
            WHERE hash = $1
              AND (CASE safety
                     WHEN 'NOT_DONE' THEN 0
                     WHEN 'SAFE' THEN 1
                     ELSE 2
                   END) < $3
            "#,
        )
        .bind(hash)
        .bind(state.as_ref())
        .bind(state.rank())
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_redirect_mode(
        &self,
        hash: &str,
        mode: RedirectMode,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE short_urls
            SET redirect_mode = $2
            WHERE hash = $1
              AND (CASE redirect_mode
                     WHEN 403 THEN 2
                     WHEN 400 THEN 1
                     ELSE 0
                   END) < $3
            "#,
        )
        .bind(hash)
        .bind(i32::from(mode.code()))
        .bind(mode.severity())
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn reset_validation(&self, hash: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE short_urls
            SET redirect_mode = $2,
                safety = 'NOT_DONE',
                block_state = 'NOT_DONE',
                reachable_state = 'NOT_DONE'
            WHERE hash = $1
            "#,
        )
        .bind(hash)
        .bind(i32::from(RedirectMode::default().code()))
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_hash(&self, hash: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM short_urls WHERE hash = $1")
            .bind(hash)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .is_ok()
    }
}
