use async_trait::async_trait;
use tourdesk_shared::{NotificationPayload, Recipient, TemplateKind};
use tracing::info;

use crate::CoreResult;

/// Outbound message delivery. Rendering and transport live behind this trait.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        recipient: &Recipient,
        template: TemplateKind,
        payload: &NotificationPayload,
    ) -> CoreResult<()>;
}

/// Mailer that only records deliveries in the log.
pub struct LogMailer {
    from_address: String,
}

impl LogMailer {
    pub fn new(from_address: impl Into<String>) -> Self {
        Self {
            from_address: from_address.into(),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(
        &self,
        recipient: &Recipient,
        template: TemplateKind,
        payload: &NotificationPayload,
    ) -> CoreResult<()> {
        info!(
            from = %self.from_address,
            to = %recipient.email,
            template = %template,
            subject = template.subject(),
            payload = ?payload,
            "Delivering notification"
        );
        Ok(())
    }
}
