//! PostgreSQL implementation of the link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewClick, NewShortLink, Principal, ShortLink};
use crate::domain::policy::DenyReason;
use crate::domain::repositories::{Admission, DeleteOutcome, LinkRepository};
use crate::error::AppError;

/// PostgreSQL repository for short links and their click log.
///
/// The admission predicate runs inside a single conditional `UPDATE`;
/// PostgreSQL row-level locking linearizes concurrent admissions per key.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, AppError> {
        let link = sqlx::query_as::<_, ShortLink>(
            r#"
            INSERT INTO short_links
                (short_key, original_url, owner, password_hash, custom_slug, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, short_key, original_url, owner, password_hash,
                      custom_slug, click_count, expires_at, created_at
            "#,
        )
        .bind(&new_link.short_key)
        .bind(&new_link.original_url)
        .bind(&new_link.owner)
        .bind(&new_link.password_hash)
        .bind(new_link.custom_slug)
        .bind(new_link.expires_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<ShortLink>, AppError> {
        let link = sqlx::query_as::<_, ShortLink>(
            r#"
            SELECT id, short_key, original_url, owner, password_hash,
                   custom_slug, click_count, expires_at, created_at
            FROM short_links
            WHERE short_key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn admit_click(&self, key: &str, now: DateTime<Utc>) -> Result<Admission, AppError> {
        let new_count = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE short_links
            SET click_count = click_count + 1
            WHERE short_key = $1
              AND (expires_at IS NULL OR expires_at > $2)
            RETURNING click_count
            "#,
        )
        .bind(key)
        .bind(now)
        .fetch_optional(self.pool.as_ref())
        .await?;

        if let Some(new_count) = new_count {
            return Ok(Admission::Admitted { new_count });
        }

        // Zero rows: the predicate failed or the row is gone. Re-read to
        // classify the denial.
        match self.find_by_key(key).await? {
            None => Ok(Admission::NotFound),
            Some(link) if link.is_expired(now) => Ok(Admission::Denied(DenyReason::Expired)),
            // Deleted-and-recreated race; the caller sees the row as gone.
            Some(_) => Ok(Admission::NotFound),
        }
    }

    async fn append_click(&self, click: NewClick) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO short_link_clicks (link_id, ip, user_agent)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(click.link_id)
        .bind(&click.ip)
        .bind(&click.user_agent)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn delete(&self, key: &str, requester: &Principal) -> Result<DeleteOutcome, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM short_links
            WHERE short_key = $1 AND owner = $2
            "#,
        )
        .bind(key)
        .bind(requester.storage_key())
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() > 0 {
            return Ok(DeleteOutcome::Deleted);
        }

        match self.find_by_key(key).await? {
            Some(_) => Ok(DeleteOutcome::Forbidden),
            None => Ok(DeleteOutcome::NotFound),
        }
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<ShortLink>, AppError> {
        let links = sqlx::query_as::<_, ShortLink>(
            r#"
            SELECT id, short_key, original_url, owner, password_hash,
                   custom_slug, click_count, expires_at, created_at
            FROM short_links
            WHERE owner = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(links)
    }

    async fn count_by_owner(&self, owner: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM short_links WHERE owner = $1",
        )
        .bind(owner)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            "DELETE FROM short_links WHERE expires_at IS NOT NULL AND expires_at <= $1",
        )
        .bind(now)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }
}
