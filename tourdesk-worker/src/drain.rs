use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tourdesk_core::mail::Mailer;
use tourdesk_core::repository::NotificationQueue;
use tourdesk_core::CoreResult;
use tourdesk_shared::JobStatus;
use tracing::{debug, error, info, warn};

#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct DrainReport {
    pub claimed: usize,
    pub sent: usize,
    pub retried: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct DrainOptions {
    pub batch_size: i64,
    pub max_attempts: i32,
    /// How long a claimed job may go unacknowledged before another drain
    /// takes it over.
    pub visibility_timeout: Duration,
}

/// Claims one batch of jobs and hands each to the mailer.
///
/// A delivery failure goes back to the queue, which decides between another
/// attempt and parking the job as failed. Bookkeeping errors on a single job
/// are logged and do not stop the batch; the job stays claimed and is picked
/// up again once `visibility_timeout` has passed.
pub async fn drain_once(
    queue: &dyn NotificationQueue,
    mailer: &dyn Mailer,
    options: &DrainOptions,
    now: DateTime<Utc>,
) -> CoreResult<DrainReport> {
    let jobs = queue
        .claim_pending(options.batch_size, now, now - options.visibility_timeout)
        .await?;
    let mut report = DrainReport {
        claimed: jobs.len(),
        ..DrainReport::default()
    };

    for job in jobs {
        let n = &job.notification;
        match mailer.send(&n.recipient, n.template, &n.payload).await {
            Ok(()) => match queue.mark_sent(job.id).await {
                Ok(()) => {
                    debug!(job_id = job.id, template = %n.template, "Notification sent");
                    report.sent += 1;
                }
                Err(e) => error!(job_id = job.id, error = %e, "Failed to mark job sent"),
            },
            Err(send_err) => {
                match queue
                    .mark_failed(job.id, &send_err.to_string(), options.max_attempts)
                    .await
                {
                    Ok(JobStatus::Failed) => {
                        error!(
                            job_id = job.id,
                            attempts = job.attempts,
                            error = %send_err,
                            "Notification delivery failed, giving up"
                        );
                        report.failed += 1;
                    }
                    Ok(_) => {
                        warn!(
                            job_id = job.id,
                            attempts = job.attempts,
                            error = %send_err,
                            "Notification delivery failed, will retry"
                        );
                        report.retried += 1;
                    }
                    Err(e) => error!(job_id = job.id, error = %e, "Failed to record delivery failure"),
                }
            }
        }
    }

    if report.claimed > 0 {
        info!(
            claimed = report.claimed,
            sent = report.sent,
            retried = report.retried,
            failed = report.failed,
            "Notification queue drained"
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tourdesk_core::mail::LogMailer;
    use tourdesk_core::memory::InMemoryStore;
    use tourdesk_core::CoreError;
    use tourdesk_shared::{
        BookingNotice, Notification, NotificationPayload, Recipient, TemplateKind,
    };

    struct DownMailer;

    fn options(batch_size: i64, max_attempts: i32) -> DrainOptions {
        DrainOptions {
            batch_size,
            max_attempts,
            visibility_timeout: Duration::minutes(5),
        }
    }

    #[async_trait]
    impl Mailer for DownMailer {
        async fn send(
            &self,
            _recipient: &Recipient,
            _template: TemplateKind,
            _payload: &NotificationPayload,
        ) -> CoreResult<()> {
            Err(CoreError::internal("smtp connection refused"))
        }
    }

    fn reminder(email: &str) -> Notification {
        Notification {
            recipient: Recipient {
                user_id: Some(2),
                name: "Grace".to_string(),
                email: email.to_string(),
            },
            template: TemplateKind::DueDateReminder,
            payload: NotificationPayload::Booking(BookingNotice {
                package_title: "118 TKH".to_string(),
                seat_number: 3,
                client_name: "Jane Doe".to_string(),
                agent_name: Some("Grace".to_string()),
                admin_name: None,
                is_due_date: Some(false),
                days_left: Some(2),
            }),
        }
    }

    #[tokio::test]
    async fn test_pending_jobs_are_delivered_once() {
        let store = InMemoryStore::new();
        store.enqueue(&reminder("grace@example.com")).await.unwrap();
        store.enqueue(&reminder("ada@example.com")).await.unwrap();
        let mailer = LogMailer::new("office@example.com");

        let report = drain_once(&store, &mailer, &options(10, 3), Utc::now()).await.unwrap();
        assert_eq!(report.claimed, 2);
        assert_eq!(report.sent, 2);
        assert!(store.jobs().await.iter().all(|j| j.status == JobStatus::Sent));

        let again = drain_once(&store, &mailer, &options(10, 3), Utc::now()).await.unwrap();
        assert_eq!(again, DrainReport::default());
    }

    #[tokio::test]
    async fn test_failed_delivery_is_retried_then_parked() {
        let store = InMemoryStore::new();
        store.enqueue(&reminder("grace@example.com")).await.unwrap();

        let first = drain_once(&store, &DownMailer, &options(10, 2), Utc::now()).await.unwrap();
        assert_eq!(first.retried, 1);
        let job = &store.jobs().await[0];
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.last_error.as_deref(), Some("Internal service error: smtp connection refused"));

        let second = drain_once(&store, &DownMailer, &options(10, 2), Utc::now()).await.unwrap();
        assert_eq!(second.failed, 1);
        let job = &store.jobs().await[0];
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.attempts, 2);

        let third = drain_once(&store, &DownMailer, &options(10, 2), Utc::now()).await.unwrap();
        assert_eq!(third.claimed, 0);
    }

    #[tokio::test]
    async fn test_batch_size_limits_claims() {
        let store = InMemoryStore::new();
        for i in 0..3 {
            store
                .enqueue(&reminder(&format!("agent{}@example.com", i)))
                .await
                .unwrap();
        }
        let mailer = LogMailer::new("office@example.com");

        let report = drain_once(&store, &mailer, &options(2, 3), Utc::now()).await.unwrap();
        assert_eq!(report.sent, 2);
        let pending = store
            .jobs()
            .await
            .into_iter()
            .filter(|j| j.status == JobStatus::Pending)
            .count();
        assert_eq!(pending, 1);
    }

    #[tokio::test]
    async fn test_job_abandoned_mid_delivery_is_delivered_by_a_later_drain() {
        let store = InMemoryStore::new();
        let id = store.enqueue(&reminder("grace@example.com")).await.unwrap();
        let crashed_at = Utc::now();
        let opts = options(10, 3);

        // a worker claims the job and dies before acknowledging it
        let lost = store
            .claim_pending(opts.batch_size, crashed_at, crashed_at - opts.visibility_timeout)
            .await
            .unwrap();
        assert_eq!(lost.len(), 1);

        let mailer = LogMailer::new("office@example.com");
        let early = drain_once(&store, &mailer, &opts, crashed_at + Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(early.claimed, 0);

        let late = drain_once(&store, &mailer, &opts, crashed_at + Duration::minutes(10))
            .await
            .unwrap();
        assert_eq!(late.sent, 1);
        let job = &store.jobs().await[0];
        assert_eq!(job.id, id);
        assert_eq!(job.status, JobStatus::Sent);
        assert_eq!(job.attempts, 2);
    }
}
