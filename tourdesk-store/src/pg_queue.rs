use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgExecutor;
use tourdesk_core::repository::NotificationQueue;
use tourdesk_core::{CoreError, CoreResult};
use tourdesk_shared::{JobStatus, Notification, NotificationJob, Recipient};

use crate::database::db_err;
use crate::pg_repo::PgStore;

#[derive(sqlx::FromRow)]
struct JobRow {
    id: i64,
    recipient_user_id: Option<i64>,
    recipient_name: String,
    recipient_email: String,
    template: String,
    payload: Value,
    status: String,
    attempts: i32,
    last_error: Option<String>,
    claimed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl JobRow {
    fn into_model(self) -> CoreResult<NotificationJob> {
        let payload = serde_json::from_value(self.payload).map_err(|e| {
            CoreError::internal(format!("notification job {} has a bad payload: {}", self.id, e))
        })?;
        Ok(NotificationJob {
            id: self.id,
            notification: Notification {
                recipient: Recipient {
                    user_id: self.recipient_user_id,
                    name: self.recipient_name,
                    email: self.recipient_email,
                },
                template: self.template.parse()?,
                payload,
            },
            status: self.status.parse()?,
            attempts: self.attempts,
            last_error: self.last_error,
            claimed_at: self.claimed_at,
            created_at: self.created_at,
        })
    }
}

const JOB_COLUMNS: &str = "id, recipient_user_id, recipient_name, recipient_email, template, \
     payload, status, attempts, last_error, claimed_at, created_at";

/// Inserts one pending job. Takes any executor so a caller's transaction can
/// queue notices together with the write they describe.
pub(crate) async fn insert_job<'e, E: PgExecutor<'e>>(
    exec: E,
    notification: &Notification,
) -> CoreResult<i64> {
    let payload = serde_json::to_value(&notification.payload).map_err(CoreError::internal)?;
    sqlx::query_scalar(
        "INSERT INTO notification_jobs \
         (recipient_user_id, recipient_name, recipient_email, template, payload) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(notification.recipient.user_id)
    .bind(&notification.recipient.name)
    .bind(&notification.recipient.email)
    .bind(notification.template.as_str())
    .bind(payload)
    .fetch_one(exec)
    .await
    .map_err(db_err)
}

#[async_trait]
impl NotificationQueue for PgStore {
    async fn enqueue(&self, notification: &Notification) -> CoreResult<i64> {
        insert_job(&self.pool, notification).await
    }

    /// Concurrent drains never claim the same job: locked rows are skipped.
    async fn claim_pending(
        &self,
        limit: i64,
        now: DateTime<Utc>,
        reclaim_before: DateTime<Utc>,
    ) -> CoreResult<Vec<NotificationJob>> {
        let sql = format!(
            "UPDATE notification_jobs \
             SET status = 'processing', attempts = attempts + 1, claimed_at = $2, updated_at = $2 \
             WHERE id IN ( \
                 SELECT id FROM notification_jobs \
                 WHERE status = 'pending' \
                    OR (status = 'processing' AND (claimed_at IS NULL OR claimed_at < $3)) \
                 ORDER BY id LIMIT $1 FOR UPDATE SKIP LOCKED \
             ) RETURNING {}",
            JOB_COLUMNS
        );
        let mut jobs = sqlx::query_as::<_, JobRow>(&sql)
            .bind(limit)
            .bind(now)
            .bind(reclaim_before)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(JobRow::into_model)
            .collect::<CoreResult<Vec<_>>>()?;
        jobs.sort_by_key(|j| j.id);
        Ok(jobs)
    }

    async fn mark_sent(&self, job_id: i64) -> CoreResult<()> {
        let affected = sqlx::query(
            "UPDATE notification_jobs SET status = 'sent', last_error = NULL, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?
        .rows_affected();
        if affected == 0 {
            return Err(CoreError::not_found("notification job", job_id));
        }
        Ok(())
    }

    async fn mark_failed(
        &self,
        job_id: i64,
        error: &str,
        max_attempts: i32,
    ) -> CoreResult<JobStatus> {
        let status: Option<String> = sqlx::query_scalar(
            "UPDATE notification_jobs \
             SET status = CASE WHEN attempts >= $3 THEN 'failed' ELSE 'pending' END, \
                 last_error = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING status",
        )
        .bind(job_id)
        .bind(error)
        .bind(max_attempts)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        let status = status.ok_or_else(|| CoreError::not_found("notification job", job_id))?;
        Ok(status.parse::<JobStatus>()?)
    }
}
