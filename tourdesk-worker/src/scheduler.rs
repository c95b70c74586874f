use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tourdesk_booking::DueDateSweep;
use tourdesk_core::clock::Clock;
use tourdesk_core::mail::Mailer;
use tourdesk_core::repository::NotificationQueue;
use tracing::{error, info, warn};

use crate::drain::{drain_once, DrainOptions};

/// Parses the configured `HH:MM` sweep time.
pub fn parse_sweep_at(value: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| anyhow::anyhow!("invalid sweep_at {:?}: {}", value, e))
}

/// First instant strictly after `now` that falls on `at` (UTC).
pub fn next_run(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    }
}

pub struct Scheduler {
    pub sweep: DueDateSweep,
    pub queue: Arc<dyn NotificationQueue>,
    pub mailer: Arc<dyn Mailer>,
    pub clock: Arc<dyn Clock>,
    pub sweep_at: NaiveTime,
    pub drain_interval: Duration,
    pub drain: DrainOptions,
}

impl Scheduler {
    /// Runs the daily sweep and the queue drain until Ctrl-C.
    pub async fn run(self) -> anyhow::Result<()> {
        info!(
            sweep_at = %self.sweep_at,
            drain_interval_secs = self.drain_interval.as_secs(),
            "Scheduler started"
        );

        tokio::select! {
            _ = self.sweep_loop() => {}
            _ = self.drain_loop() => {}
            res = tokio::signal::ctrl_c() => {
                res?;
                info!("Shutdown signal received, stopping scheduler");
            }
        }
        Ok(())
    }

    async fn sweep_loop(&self) {
        loop {
            let now = self.clock.now();
            let next = next_run(now, self.sweep_at);
            let wait = (next - now).to_std().unwrap_or_default();
            info!(next_run = %next, "Next due-date sweep scheduled");
            tokio::time::sleep(wait).await;

            match self.sweep.run().await {
                Ok(report) if !report.failures.is_empty() => warn!(
                    failures = report.failures.len(),
                    "Due-date sweep finished with failures"
                ),
                Ok(_) => {}
                Err(e) => error!(error = %e, "Due-date sweep failed"),
            }
        }
    }

    /// The drain is awaited inside the loop, so runs never overlap. A tick
    /// that arrives while a drain is still going is skipped.
    async fn drain_loop(&self) {
        let mut interval = tokio::time::interval(self.drain_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            if let Err(e) = drain_once(
                self.queue.as_ref(),
                self.mailer.as_ref(),
                &self.drain,
                self.clock.now(),
            )
            .await
            {
                error!(error = %e, "Notification drain failed");
            }
        }
    }
}
