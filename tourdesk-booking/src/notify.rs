use std::sync::Arc;
use tourdesk_core::projection::BookingContext;
use tourdesk_core::repository::{NotificationQueue, Store};
use tourdesk_core::CoreResult;
use tourdesk_shared::{
    AgentInvitation, BookingNotice, Masked, Notification, NotificationPayload, Recipient,
    TemplateKind, User, UserRole,
};
use tracing::debug;

/// Builds booking notices and decides who receives them. Delivery is deferred
/// to the notification queue.
#[derive(Clone)]
pub struct Notifier {
    store: Arc<dyn Store>,
    queue: Arc<dyn NotificationQueue>,
}

pub fn recipient(user: &User) -> Recipient {
    Recipient {
        user_id: Some(user.id),
        name: user.name.clone(),
        email: user.email.clone(),
    }
}

/// The fields every booking message carries.
pub fn booking_notice(ctx: &BookingContext) -> BookingNotice {
    BookingNotice {
        package_title: ctx.package_title().to_string(),
        seat_number: ctx.seat.seat_number,
        client_name: ctx.client.name.clone(),
        agent_name: Some(ctx.agent.name.clone()),
        admin_name: None,
        is_due_date: None,
        days_left: None,
    }
}

impl Notifier {
    pub fn new(store: Arc<dyn Store>, queue: Arc<dyn NotificationQueue>) -> Self {
        Self { store, queue }
    }

    /// Every active admin account.
    async fn admins(&self) -> CoreResult<Vec<Recipient>> {
        Ok(self
            .store
            .list_users(UserRole::Admin)
            .await?
            .iter()
            .filter(|u| u.is_active())
            .map(recipient)
            .collect())
    }

    async fn dispatch(
        &self,
        recipients: Vec<Recipient>,
        template: TemplateKind,
        notice: BookingNotice,
    ) -> CoreResult<usize> {
        let payload = NotificationPayload::Booking(notice);
        for to in &recipients {
            let job_id = self
                .queue
                .enqueue(&Notification {
                    recipient: to.clone(),
                    template,
                    payload: payload.clone(),
                })
                .await?;
            debug!(job_id, template = %template, to = %to.email, "Notification queued");
        }
        Ok(recipients.len())
    }

    /// request-submitted, to the admins and to the agent who made the request.
    pub async fn booking_requested(&self, ctx: &BookingContext) -> CoreResult<usize> {
        let mut to = self.admins().await?;
        to.push(recipient(&ctx.agent));
        self.dispatch(to, TemplateKind::RequestSubmitted, booking_notice(ctx))
            .await
    }

    /// receipt-uploaded to the admins, receipt-received to the agent.
    pub async fn receipt_uploaded(&self, ctx: &BookingContext) -> CoreResult<usize> {
        let notice = booking_notice(ctx);
        let admins = self
            .dispatch(self.admins().await?, TemplateKind::ReceiptUploaded, notice.clone())
            .await?;
        let agent = self
            .dispatch(vec![recipient(&ctx.agent)], TemplateKind::ReceiptReceived, notice)
            .await?;
        Ok(admins + agent)
    }

    pub async fn booking_confirmed(
        &self,
        ctx: &BookingContext,
        confirmed_by: Option<&User>,
    ) -> CoreResult<usize> {
        let notice = BookingNotice {
            admin_name: confirmed_by.map(|u| u.name.clone()),
            ..booking_notice(ctx)
        };
        let agent = self
            .dispatch(
                vec![recipient(&ctx.agent)],
                TemplateKind::BookingConfirmedAgent,
                notice.clone(),
            )
            .await?;
        let admins = self
            .dispatch(self.admins().await?, TemplateKind::BookingConfirmedAdmin, notice)
            .await?;
        Ok(agent + admins)
    }

    /// Reminder or expiry notice to the agent who owns the client. `days_left`
    /// of zero means the reservation has been cancelled; the store queues those
    /// together with the cancellation.
    pub fn due_date_notices(ctx: &BookingContext, days_left: i64) -> Vec<Notification> {
        let reached = days_left == 0;
        let template = if reached {
            TemplateKind::DueDateReached
        } else {
            TemplateKind::DueDateReminder
        };
        let notice = BookingNotice {
            is_due_date: Some(reached),
            days_left: Some(days_left),
            ..booking_notice(ctx)
        };
        vec![Notification {
            recipient: recipient(&ctx.agent),
            template,
            payload: NotificationPayload::Booking(notice),
        }]
    }

    pub async fn due_date(&self, ctx: &BookingContext, days_left: i64) -> CoreResult<usize> {
        let notices = Self::due_date_notices(ctx, days_left);
        for notification in &notices {
            let job_id = self.queue.enqueue(notification).await?;
            debug!(job_id, template = %notification.template, "Notification queued");
        }
        Ok(notices.len())
    }

    /// Welcome message carrying the temporary password.
    pub async fn agent_invited(&self, agent: &User, password: &str) -> CoreResult<i64> {
        self.queue
            .enqueue(&Notification {
                recipient: recipient(agent),
                template: TemplateKind::AgentInvitation,
                payload: NotificationPayload::Invitation(AgentInvitation {
                    name: agent.name.clone(),
                    email: agent.email.clone(),
                    password: Masked(password.to_string()),
                }),
            })
            .await
    }
}
