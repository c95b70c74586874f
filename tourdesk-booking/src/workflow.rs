use chrono::NaiveDate;
use std::sync::Arc;
use tourdesk_core::clock::Clock;
use tourdesk_core::dates::DateNormalization;
use tourdesk_core::identity::Actor;
use tourdesk_core::lifecycle::{check_confirmation, ensure_active, seat_transition, SeatTransition};
use tourdesk_core::projection::{load_booking, load_booking_context, load_seat_path, BookingContext};
use tourdesk_core::repository::Store;
use tourdesk_core::storage::{ReceiptStorage, Upload};
use tourdesk_core::{CoreError, CoreResult};
use tourdesk_shared::{Booking, TourStatus};
use tracing::{error, info, warn};

use crate::notify::Notifier;
use crate::requests::BookSeatRequest;

/// Storage category payment receipts are filed under.
pub const RECEIPT_CATEGORY: &str = "payment-receipts";

/// The request-driven booking operations. Each one checks its preconditions,
/// performs a single atomic write through the store, and then queues the
/// notifications for it.
pub struct BookingWorkflow {
    store: Arc<dyn Store>,
    notifier: Notifier,
    storage: Arc<dyn ReceiptStorage>,
    clock: Arc<dyn Clock>,
    dates: DateNormalization,
}

impl BookingWorkflow {
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Notifier,
        storage: Arc<dyn ReceiptStorage>,
        clock: Arc<dyn Clock>,
        dates: DateNormalization,
    ) -> Self {
        Self {
            store,
            notifier,
            storage,
            clock,
            dates,
        }
    }

    /// Creates the client and an active booking, and reserves the seat.
    pub async fn create_booking(&self, actor: &Actor, req: BookSeatRequest) -> CoreResult<Booking> {
        actor.require_active()?;
        req.validate()?;

        let (seat, _, tour) = load_seat_path(self.store.as_ref(), req.seat_id).await?;
        if tour.status != TourStatus::Active {
            return Err(CoreError::PreconditionError(format!(
                "tour {} is {}",
                tour.id, tour.status
            )));
        }
        seat_transition(&seat, SeatTransition::Reserve)?;

        let (client, booking) = self
            .store
            .reserve_seat(&req.into_reservation(actor.user_id), self.clock.now())
            .await?;
        info!(
            booking_id = booking.id,
            seat_id = booking.seat_id,
            client_id = client.id,
            agent_id = actor.user_id,
            "Seat reserved"
        );

        match load_booking_context(self.store.as_ref(), booking.clone()).await {
            Ok(ctx) => self.report("request-submitted", &ctx, self.notifier.booking_requested(&ctx).await),
            Err(e) => error!(booking_id = booking.id, "Cannot notify booking request: {}", e),
        }
        Ok(booking)
    }

    /// Loads the booking and checks that `actor` may attach a receipt to it.
    async fn receipt_target(&self, actor: &Actor, booking_id: i64) -> CoreResult<BookingContext> {
        actor.require_active()?;
        let ctx = load_booking(self.store.as_ref(), booking_id).await?;
        if ctx.client.user_id != actor.user_id {
            return Err(CoreError::AuthorizationError(format!(
                "user {} is not authorized to upload a receipt for booking {}",
                actor.user_id, booking_id
            )));
        }
        ensure_active(&ctx.booking)?;
        Ok(ctx)
    }

    /// Stores a receipt reference already produced by the storage collaborator.
    pub async fn attach_receipt(
        &self,
        actor: &Actor,
        booking_id: i64,
        receipt: &str,
    ) -> CoreResult<Booking> {
        if receipt.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "paymentReceipt: the receipt reference is empty".to_string(),
            ));
        }
        let ctx = self.receipt_target(actor, booking_id).await?;
        self.write_receipt(ctx, receipt).await
    }

    /// Validates and stores the uploaded file, then attaches its reference.
    pub async fn upload_receipt(
        &self,
        actor: &Actor,
        booking_id: i64,
        upload: &Upload,
    ) -> CoreResult<Booking> {
        let ctx = self.receipt_target(actor, booking_id).await?;
        let receipt = self.storage.store(upload, RECEIPT_CATEGORY).await?;
        self.write_receipt(ctx, &receipt).await
    }

    async fn write_receipt(&self, mut ctx: BookingContext, receipt: &str) -> CoreResult<Booking> {
        let booking = self
            .store
            .attach_receipt(ctx.booking.id, receipt, self.clock.now())
            .await?;
        info!(booking_id = booking.id, receipt, "Payment receipt attached");

        ctx.booking = booking.clone();
        self.report("receipt-uploaded", &ctx, self.notifier.receipt_uploaded(&ctx).await);
        Ok(booking)
    }

    /// Admin confirmation of payment: booking to `confirmed_payment`, seat to
    /// `booked`.
    pub async fn confirm_booking(
        &self,
        actor: &Actor,
        booking_id: i64,
        seat_id: i64,
    ) -> CoreResult<Booking> {
        actor.require_admin()?;

        let ctx = load_booking(self.store.as_ref(), booking_id).await?;
        check_confirmation(&ctx.booking, &ctx.seat, seat_id)?;

        let booking = self
            .store
            .confirm_booking(booking_id, seat_id, self.clock.now())
            .await?;
        info!(booking_id, seat_id, admin_id = actor.user_id, "Booking confirmed");

        let admin = match self.store.get_user(actor.user_id).await {
            Ok(admin) => admin,
            Err(e) => {
                warn!(booking_id, admin_id = actor.user_id, "Cannot load confirming admin: {}", e);
                None
            }
        };
        let ctx = BookingContext {
            booking: booking.clone(),
            ..ctx
        };
        self.report(
            "booking-confirmed",
            &ctx,
            self.notifier.booking_confirmed(&ctx, admin.as_ref()).await,
        );
        Ok(booking)
    }

    /// Sets the payment deadline. The normalized date may not fall after the
    /// tour's start date.
    pub async fn set_due_date(
        &self,
        actor: &Actor,
        booking_id: i64,
        candidate: NaiveDate,
    ) -> CoreResult<Booking> {
        actor.require_admin()?;

        let ctx = load_booking(self.store.as_ref(), booking_id).await?;
        let due_date = self.dates.normalize(candidate);
        if due_date > ctx.tour.start_date {
            return Err(CoreError::ValidationError(format!(
                "reservationDueDate: {} is after the tour start date {}",
                due_date, ctx.tour.start_date
            )));
        }
        ensure_active(&ctx.booking)?;

        let booking = self
            .store
            .set_due_date(booking_id, due_date, self.clock.now())
            .await?;
        info!(booking_id, %due_date, "Reservation due date set");
        Ok(booking)
    }

    /// The write has committed by the time notifications are queued, so a queue
    /// failure is logged rather than returned.
    fn report(&self, event: &str, ctx: &BookingContext, queued: CoreResult<usize>) {
        match queued {
            Ok(count) => info!(booking_id = ctx.booking.id, event, count, "Notifications queued"),
            Err(e) => warn!(booking_id = ctx.booking.id, event, "Failed to queue notifications: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tourdesk_core::clock::FixedClock;
    use tourdesk_core::memory::InMemoryStore;
    use tourdesk_core::repository::{NewTour, TourLayout, TourRepository, UserRepository};
    use tourdesk_core::ErrorKind;
    use tourdesk_shared::{BookingStatus, SeatStatus, TemplateKind, UserRole, UserStatus};

    use crate::requests::ClientDetails;

    struct FakeStorage;

    #[async_trait]
    impl ReceiptStorage for FakeStorage {
        async fn store(&self, upload: &Upload, category: &str) -> CoreResult<String> {
            let kind = upload.validate(tourdesk_core::storage::MAX_UPLOAD_BYTES)?;
            Ok(format!("storage/uploads/{}/{}/{}", category, kind.folder(), upload.file_name))
        }
    }

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    struct Fixture {
        store: Arc<InMemoryStore>,
        workflow: BookingWorkflow,
        admin: Actor,
        agent: Actor,
        layout: TourLayout,
    }

    async fn fixture(offset: i64) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let admin = store.insert_user("Ada", "ada@example.com", UserRole::Admin).await;
        let agent = store.insert_user("Jane Smith", "jane@example.com", UserRole::Agent).await;
        let layout = store
            .create_tour(&NewTour {
                user_id: admin.id,
                title: "71 TKH".to_string(),
                start_date: day(7, 1),
                end_date: day(7, 8),
                language: "ENGLISH".to_string(),
                highlight_ids: vec![],
                seats_per_vehicle: 6,
            })
            .await
            .unwrap();
        let workflow = BookingWorkflow::new(
            store.clone(),
            Notifier::new(store.clone(), store.clone()),
            Arc::new(FakeStorage),
            Arc::new(FixedClock::on(day(6, 1))),
            DateNormalization::new(offset),
        );
        Fixture {
            store,
            workflow,
            admin: Actor::from(&admin),
            agent: Actor::from(&agent),
            layout,
        }
    }

    fn request(seat_id: i64) -> BookSeatRequest {
        BookSeatRequest {
            seat_id,
            start_date: day(7, 1),
            end_date: day(7, 8),
            client: ClientDetails {
                name: "John Doe".to_string(),
                email: Some("john@example.com".to_string()),
                phone: None,
                gender: None,
                date_of_birth: None,
                nationality: "Kenyan".to_string(),
                language: "ENGLISH".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_create_booking_reserves_seat_and_notifies_admins_and_agent() {
        let f = fixture(0).await;
        let seat_id = f.layout.seats[2].id;
        let booking = f.workflow.create_booking(&f.agent, request(seat_id)).await.unwrap();

        assert_eq!(booking.status, BookingStatus::Active);
        let seat = f.store.get_seat(seat_id).await.unwrap().unwrap();
        assert_eq!(seat.status, SeatStatus::Reserved);

        let sent = f.store.notifications().await;
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|n| n.template == TemplateKind::RequestSubmitted));
        let emails: Vec<&str> = sent.iter().map(|n| n.recipient.email.as_str()).collect();
        assert!(emails.contains(&"ada@example.com"));
        assert!(emails.contains(&"jane@example.com"));

        let err = f.workflow.create_booking(&f.agent, request(seat_id)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert_eq!(f.store.all_bookings().await.len(), 1);
    }

    #[tokio::test]
    async fn test_suspended_agent_cannot_book() {
        let f = fixture(0).await;
        f.store
            .set_user_status(f.agent.user_id, UserStatus::Inactive)
            .await
            .unwrap();
        let suspended = Actor {
            status: UserStatus::Inactive,
            ..f.agent.clone()
        };
        let err = f
            .workflow
            .create_booking(&suspended, request(f.layout.seats[0].id))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[tokio::test]
    async fn test_only_the_owning_agent_may_upload_a_receipt() {
        let f = fixture(0).await;
        let booking = f
            .workflow
            .create_booking(&f.agent, request(f.layout.seats[0].id))
            .await
            .unwrap();
        let other = f.store.insert_user("Bob", "bob@example.com", UserRole::Agent).await;

        let err = f
            .workflow
            .attach_receipt(&Actor::from(&other), booking.id, "storage/r.pdf")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);

        let upload = Upload {
            file_name: "receipt.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: vec![1, 2, 3],
        };
        let booking = f
            .workflow
            .upload_receipt(&f.agent, booking.id, &upload)
            .await
            .unwrap();
        assert_eq!(
            booking.payment_receipt.as_deref(),
            Some("storage/uploads/payment-receipts/pdfs/receipt.pdf")
        );

        let templates: Vec<TemplateKind> = f
            .store
            .notifications()
            .await
            .into_iter()
            .map(|n| n.template)
            .collect();
        assert!(templates.contains(&TemplateKind::ReceiptUploaded));
        assert!(templates.contains(&TemplateKind::ReceiptReceived));
    }

    #[tokio::test]
    async fn test_confirm_is_admin_only_and_names_the_admin() {
        let f = fixture(0).await;
        let seat_id = f.layout.seats[0].id;
        let booking = f.workflow.create_booking(&f.agent, request(seat_id)).await.unwrap();
        f.workflow
            .attach_receipt(&f.agent, booking.id, "storage/r.pdf")
            .await
            .unwrap();

        let err = f
            .workflow
            .confirm_booking(&f.agent, booking.id, seat_id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);

        let confirmed = f
            .workflow
            .confirm_booking(&f.admin, booking.id, seat_id)
            .await
            .unwrap();
        assert_eq!(confirmed.status, BookingStatus::ConfirmedPayment);

        let notice = f
            .store
            .notifications()
            .await
            .into_iter()
            .find(|n| n.template == TemplateKind::BookingConfirmedAgent)
            .unwrap();
        let json = serde_json::to_value(&notice.payload).unwrap();
        assert_eq!(json["data"]["adminName"], "Ada");
        assert_eq!(json["data"]["agentName"], "Jane Smith");
    }

    #[tokio::test]
    async fn test_due_date_offset_is_applied_before_the_bound_check() {
        let f = fixture(1).await;
        let booking = f
            .workflow
            .create_booking(&f.agent, request(f.layout.seats[0].id))
            .await
            .unwrap();

        // 2025-07-01 shifts to 07-02, past the tour start.
        let err = f
            .workflow
            .set_due_date(&f.admin, booking.id, day(7, 1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("2025-07-01"));

        let updated = f
            .workflow
            .set_due_date(&f.admin, booking.id, day(6, 30))
            .await
            .unwrap();
        assert_eq!(updated.reservation_due_date, Some(day(7, 1)));
    }
}
