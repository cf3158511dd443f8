use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::StoreError;
use crate::jobs::repo_types::{Job, JobChanges, NewJob};

/// Job persistence. Every lookup by job ID is also filtered by owner.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Newest application date first, ties broken by newest creation.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Job>, StoreError>;

    /// Row counts grouped by lower-cased stored status.
    async fn status_counts(&self, user_id: Uuid) -> Result<Vec<(Option<String>, i64)>, StoreError>;

    async fn insert(&self, job: NewJob) -> Result<Job, StoreError>;

    async fn update_owned(
        &self,
        id: Uuid,
        user_id: Uuid,
        changes: JobChanges,
    ) -> Result<Option<Job>, StoreError>;

    async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> Result<Option<Job>, StoreError>;
}

#[derive(Clone)]
pub struct PgJobStore {
    db: PgPool,
}

impl PgJobStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Job>, StoreError> {
        let rows = sqlx::query_as::<_, Job>(
            r#"
            SELECT id, user_id, company, position, status, notes,
                   application_date, created_at, updated_at
            FROM jobs
            WHERE user_id = $1
            ORDER BY application_date DESC, created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list jobs by user")?;
        Ok(rows)
    }

    async fn status_counts(&self, user_id: Uuid) -> Result<Vec<(Option<String>, i64)>, StoreError> {
        let rows = sqlx::query_as::<_, (Option<String>, i64)>(
            r#"
            SELECT LOWER(status) AS status, COUNT(*) AS count
            FROM jobs
            WHERE user_id = $1
            GROUP BY LOWER(status)
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("count jobs by status")?;
        Ok(rows)
    }

    async fn insert(&self, job: NewJob) -> Result<Job, StoreError> {
        let now = OffsetDateTime::now_utc();
        let row = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (id, user_id, company, position, status, notes,
                              application_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING id, user_id, company, position, status, notes,
                      application_date, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(job.user_id)
        .bind(&job.company)
        .bind(&job.position)
        .bind(job.status.as_str())
        .bind(&job.notes)
        .bind(job.application_date)
        .bind(now)
        .fetch_one(&self.db)
        .await
        .context("insert job")?;
        Ok(row)
    }

    async fn update_owned(
        &self,
        id: Uuid,
        user_id: Uuid,
        changes: JobChanges,
    ) -> Result<Option<Job>, StoreError> {
        let row = sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
               SET company = $3,
                   position = $4,
                   status = COALESCE($5, status),
                   notes = CASE WHEN $8 THEN NULL ELSE COALESCE($6, notes) END,
                   application_date = COALESCE($7, application_date),
                   updated_at = now()
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, company, position, status, notes,
                      application_date, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&changes.company)
        .bind(&changes.position)
        .bind(changes.status.map(|s| s.as_str()))
        .bind(changes.notes.as_ref().and_then(|n| n.as_deref()))
        .bind(changes.application_date)
        .bind(matches!(changes.notes, Some(None)))
        .fetch_optional(&self.db)
        .await
        .context("update job")?;
        Ok(row)
    }

    async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> Result<Option<Job>, StoreError> {
        let row = sqlx::query_as::<_, Job>(
            r#"
            DELETE FROM jobs
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, company, position, status, notes,
                      application_date, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("delete job")?;
        Ok(row)
    }
}
