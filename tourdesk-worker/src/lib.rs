pub mod drain;
pub mod scheduler;

pub use drain::{drain_once, DrainOptions, DrainReport};
pub use scheduler::Scheduler;
