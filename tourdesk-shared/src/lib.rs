pub mod models;
pub mod pii;

pub use models::entities::{
    Booking, BookingStatus, Client, Highlight, Seat, SeatStatus, Tour, TourStatus, User, UserRole,
    UserStatus, Vehicle, VehicleStatus,
};
pub use models::events::{
    AgentInvitation, BookingNotice, JobStatus, Notification, NotificationJob, NotificationPayload,
    Recipient, TemplateKind,
};
pub use pii::Masked;

/// Raised when a persisted status column holds a value no enum variant maps to.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} status: {value}")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub value: String,
}
