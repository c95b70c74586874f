use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::pii::Masked;
use crate::UnknownStatus;

/// Message templates the mail collaborator knows how to render.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateKind {
    RequestSubmitted,
    ReceiptUploaded,
    ReceiptReceived,
    BookingConfirmedAgent,
    BookingConfirmedAdmin,
    DueDateReminder,
    DueDateReached,
    AgentInvitation,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::RequestSubmitted => "request-submitted",
            TemplateKind::ReceiptUploaded => "receipt-uploaded",
            TemplateKind::ReceiptReceived => "receipt-received",
            TemplateKind::BookingConfirmedAgent => "booking-confirmed-agent",
            TemplateKind::BookingConfirmedAdmin => "booking-confirmed-admin",
            TemplateKind::DueDateReminder => "due-date-reminder",
            TemplateKind::DueDateReached => "due-date-reached",
            TemplateKind::AgentInvitation => "agent-invitation",
        }
    }

    /// Subject line used by the mail collaborator.
    pub fn subject(&self) -> &'static str {
        match self {
            TemplateKind::RequestSubmitted => "New Reservation Request",
            TemplateKind::ReceiptUploaded => "Payment Receipt Uploaded - Action Required",
            TemplateKind::ReceiptReceived => "Payment Receipt Received",
            TemplateKind::BookingConfirmedAgent => "Booking Confirmed - Payment Received",
            TemplateKind::BookingConfirmedAdmin => "Booking Confirmed",
            TemplateKind::DueDateReminder => "Reservation Due Date Reminder",
            TemplateKind::DueDateReached => "Reservation Due Date Reached",
            TemplateKind::AgentInvitation => "Welcome - Your Agent Account",
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateKind {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "request-submitted" => TemplateKind::RequestSubmitted,
            "receipt-uploaded" => TemplateKind::ReceiptUploaded,
            "receipt-received" => TemplateKind::ReceiptReceived,
            "booking-confirmed-agent" => TemplateKind::BookingConfirmedAgent,
            "booking-confirmed-admin" => TemplateKind::BookingConfirmedAdmin,
            "due-date-reminder" => TemplateKind::DueDateReminder,
            "due-date-reached" => TemplateKind::DueDateReached,
            "agent-invitation" => TemplateKind::AgentInvitation,
            other => {
                return Err(UnknownStatus {
                    kind: "template",
                    value: other.to_string(),
                })
            }
        };
        Ok(kind)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recipient {
    pub user_id: Option<i64>,
    pub name: String,
    pub email: String,
}

/// Plain key-value fields shared by every booking-related message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookingNotice {
    pub package_title: String,
    pub seat_number: i32,
    pub client_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_due_date: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_left: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentInvitation {
    pub name: String,
    pub email: String,
    pub password: Masked<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum NotificationPayload {
    Booking(BookingNotice),
    Invitation(AgentInvitation),
}

/// A message waiting to be handed to the mail collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub recipient: Recipient,
    pub template: TemplateKind,
    pub payload: NotificationPayload,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Sent,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Sent => "sent",
            JobStatus::Failed => "failed",
        }
    }
}

impl FromStr for JobStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "sent" => Ok(JobStatus::Sent),
            "failed" => Ok(JobStatus::Failed),
            other => Err(UnknownStatus {
                kind: "job",
                value: other.to_string(),
            }),
        }
    }
}

/// A queued notification together with its delivery bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationJob {
    pub id: i64,
    pub notification: Notification,
    pub status: JobStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
    /// When the job last moved to `processing`.
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
