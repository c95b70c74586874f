pub mod title;
pub mod tours;

pub use title::generate_title;
pub use tours::{CreateTourRequest, TourAdmin, TourStats};
