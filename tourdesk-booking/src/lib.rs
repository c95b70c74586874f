//! Booking workflow, reservation due-date sweep and agent administration.

pub mod agents;
pub mod notify;
pub mod requests;
pub mod sweep;
pub mod workflow;

pub use agents::{AgentAdmin, InviteAgentRequest};
pub use notify::Notifier;
pub use requests::{BookSeatRequest, ClientDetails};
pub use sweep::{DueDateSweep, SweepFailure, SweepReport};
pub use workflow::{BookingWorkflow, RECEIPT_CATEGORY};
