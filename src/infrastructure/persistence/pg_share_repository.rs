//! PostgreSQL implementation of the share repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewTextShare, NewView, Principal, TextShare};
use crate::domain::policy::DenyReason;
use crate::domain::repositories::{Admission, DeleteOutcome, ShareRepository};
use crate::error::AppError;

const SHARE_COLUMNS: &str = "id, short_key, title, content, format, syntax_language, \
     password_hash, is_public, owner, view_count, view_limit, expires_at, created_at";

/// PostgreSQL repository for text shares and their view log.
pub struct PgShareRepository {
    pool: Arc<PgPool>,
}

impl PgShareRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShareRepository for PgShareRepository {
    async fn create(&self, new_share: NewTextShare) -> Result<TextShare, AppError> {
        let share = sqlx::query_as::<_, TextShare>(&format!(
            r#"
            INSERT INTO text_shares
                (short_key, title, content, format, syntax_language, password_hash,
                 is_public, owner, view_limit, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {SHARE_COLUMNS}
            "#
        ))
        .bind(&new_share.short_key)
        .bind(&new_share.title)
        .bind(&new_share.content)
        .bind(new_share.format)
        .bind(&new_share.syntax_language)
        .bind(&new_share.password_hash)
        .bind(new_share.is_public)
        .bind(&new_share.owner)
        .bind(new_share.view_limit)
        .bind(new_share.expires_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(share)
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<TextShare>, AppError> {
        let share = sqlx::query_as::<_, TextShare>(&format!(
            "SELECT {SHARE_COLUMNS} FROM text_shares WHERE short_key = $1"
        ))
        .bind(key)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(share)
    }

    async fn admit_view(&self, key: &str, now: DateTime<Utc>) -> Result<Admission, AppError> {
        // The increment is the unit of admission: expiry and view limit are
        // re-checked inside the conditional UPDATE, so two racers at
        // view_count == view_limit - 1 cannot both pass.
        let new_count = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE text_shares
            SET view_count = view_count + 1
            WHERE short_key = $1
              AND (expires_at IS NULL OR expires_at > $2)
              AND (view_limit IS NULL OR view_count < view_limit)
            RETURNING view_count
            "#,
        )
        .bind(key)
        .bind(now)
        .fetch_optional(self.pool.as_ref())
        .await?;

        if let Some(new_count) = new_count {
            return Ok(Admission::Admitted { new_count });
        }

        match self.find_by_key(key).await? {
            None => Ok(Admission::NotFound),
            Some(share) if share.is_expired(now) => Ok(Admission::Denied(DenyReason::Expired)),
            Some(share) if share.limit_reached() => {
                Ok(Admission::Denied(DenyReason::LimitReached))
            }
            Some(_) => Ok(Admission::NotFound),
        }
    }

    async fn append_view(&self, view: NewView) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO text_share_views (share_id, ip, user_agent)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(view.share_id)
        .bind(&view.ip)
        .bind(&view.user_agent)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn delete(&self, key: &str, requester: &Principal) -> Result<DeleteOutcome, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM text_shares
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

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<TextShare>, AppError> {
        let shares = sqlx::query_as::<_, TextShare>(&format!(
            "SELECT {SHARE_COLUMNS} FROM text_shares WHERE owner = $1 ORDER BY created_at DESC"
        ))
        .bind(owner)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(shares)
    }

    async fn count_by_owner(&self, owner: &str) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM text_shares WHERE owner = $1")
                .bind(owner)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(count)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            "DELETE FROM text_shares WHERE expires_at IS NOT NULL AND expires_at <= $1",
        )
        .bind(now)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }
}
