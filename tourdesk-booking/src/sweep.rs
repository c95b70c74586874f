//! Daily reservation due-date check.
//!
//! Active bookings whose due date falls between today and the end of the
//! reminder window are visited one by one. A booking due today is cancelled,
//! its seat released and its agent's notice queued in one write; any other
//! selected booking produces a reminder. A failure on one booking is logged
//! and recorded, and the run moves on to the next.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::sync::Arc;
use tourdesk_core::clock::Clock;
use tourdesk_core::projection::load_booking_context;
use tourdesk_core::repository::Store;
use tourdesk_core::{CoreError, CoreResult, ErrorKind};
use tourdesk_shared::Booking;
use tracing::{error, info};

use crate::notify::Notifier;

pub const DEFAULT_REMINDER_WINDOW_DAYS: i64 = 5;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SweepFailure {
    pub booking_id: i64,
    pub kind: ErrorKind,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SweepReport {
    pub today: NaiveDate,
    pub selected: usize,
    pub cancelled: Vec<i64>,
    pub reminded: Vec<i64>,
    pub failures: Vec<SweepFailure>,
}

enum Outcome {
    Cancelled,
    Reminded,
}

pub struct DueDateSweep {
    store: Arc<dyn Store>,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
    window_days: i64,
}

impl DueDateSweep {
    pub fn new(store: Arc<dyn Store>, notifier: Notifier, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            notifier,
            clock,
            window_days: DEFAULT_REMINDER_WINDOW_DAYS,
        }
    }

    pub fn with_window_days(mut self, days: i64) -> Self {
        self.window_days = days;
        self
    }

    /// Runs one pass. Only a failure to select the bookings aborts the run.
    pub async fn run(&self) -> CoreResult<SweepReport> {
        let today = self.clock.today();
        let due = self
            .store
            .due_bookings(today, today + Duration::days(self.window_days))
            .await?;
        info!(%today, selected = due.len(), "Checking reservation due dates");

        let mut report = SweepReport {
            today,
            selected: due.len(),
            cancelled: Vec::new(),
            reminded: Vec::new(),
            failures: Vec::new(),
        };

        for booking in due {
            let booking_id = booking.id;
            match self.process(booking, today).await {
                Ok(Outcome::Cancelled) => report.cancelled.push(booking_id),
                Ok(Outcome::Reminded) => report.reminded.push(booking_id),
                Err(e) => {
                    error!(booking_id, kind = ?e.kind(), "Due-date check failed: {}", e);
                    report.failures.push(SweepFailure {
                        booking_id,
                        kind: e.kind(),
                        detail: e.to_string(),
                    });
                }
            }
        }

        info!(
            cancelled = report.cancelled.len(),
            reminded = report.reminded.len(),
            failed = report.failures.len(),
            "Reservation due-date check finished"
        );
        Ok(report)
    }

    async fn process(&self, booking: Booking, today: NaiveDate) -> CoreResult<Outcome> {
        let due_date = booking
            .reservation_due_date
            .ok_or_else(|| CoreError::internal(format!("booking {} has no due date", booking.id)))?;
        let days_left = (due_date - today).num_days();
        info!(booking_id = booking.id, %due_date, days_left, "Reservation due date");

        // Resolve everything the notice needs before changing any state.
        let ctx = load_booking_context(self.store.as_ref(), booking).await?;

        if due_date == today {
            let notices = Notifier::due_date_notices(&ctx, 0);
            let booking = self
                .store
                .cancel_booking(ctx.booking.id, &notices, self.clock.now())
                .await?;
            info!(
                booking_id = booking.id,
                seat_id = ctx.seat.id,
                notices = notices.len(),
                "Reservation expired, booking cancelled and seat released"
            );
            Ok(Outcome::Cancelled)
        } else {
            self.notifier.due_date(&ctx, days_left).await?;
            Ok(Outcome::Reminded)
        }
    }
}
