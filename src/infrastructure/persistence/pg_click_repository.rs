//! PostgreSQL implementation of the click repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Click, ClickProperties, NewClick};
use crate::domain::repositories::ClickRepository;
use crate::error::AppError;

/// PostgreSQL repository for click records.
pub struct PgClickRepository {
    pool: Arc<PgPool>,
}

impl PgClickRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ClickRow {
    id: i64,
    hash: String,
    created_at: DateTime<Utc>,
    ip: Option<String>,
    referrer: Option<String>,
    browser: Option<String>,
    platform: Option<String>,
    country: Option<String>,
}

impl From<ClickRow> for Click {
    fn from(row: ClickRow) -> Self {
        Click::new(
            row.id,
            row.hash,
            row.created_at,
            ClickProperties {
                ip: row.ip,
                referrer: row.referrer,
                browser: row.browser,
                platform: row.platform,
                country: row.country,
            },
        )
    }
}

#[async_trait]
impl ClickRepository for PgClickRepository {
    async fn save(&self, new_click: NewClick) -> Result<Click, AppError> {
        let row = sqlx::query_as::<_, ClickRow>(
            r#"
            INSERT INTO clicks (hash, ip, referrer)
            VALUES ($1, $2, $3)
            RETURNING id, hash, created_at, ip, referrer, browser, platform, country
            "#,
        )
        .bind(&new_click.hash)
        .bind(&new_click.ip)
        .bind(&new_click.referrer)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn find_all_by_hash(&self, hash: &str) -> Result<Vec<Click>, AppError> {
        let rows = sqlx::query_as::<_, ClickRow>(
            r#"
            SELECT id, hash, created_at, ip, referrer, browser, platform, country
            FROM clicks
            WHERE hash = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(hash)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Click::from).collect())
    }

    async fn update_browser(&self, hash: &str, browser: &str) -> Result<u64, AppError> {
        let result =
            sqlx::query("UPDATE clicks SET browser = $2 WHERE hash = $1 AND browser IS NULL")
                .bind(hash)
                .bind(browser)
                .execute(self.pool.as_ref())
                .await?;

        Ok(result.rows_affected())
    }

    async fn update_platform(&self, hash: &str, platform: &str) -> Result<u64, AppError> {
        let result =
            sqlx::query("UPDATE clicks SET platform = $2 WHERE hash = $1 AND platform IS NULL")
                .bind(hash)
                .bind(platform)
                .execute(self.pool.as_ref())
                .await?;

        Ok(result.rows_affected())
    }
}
