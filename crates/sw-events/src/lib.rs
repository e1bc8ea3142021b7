pub mod hub;
pub mod types;

pub use hub::ReviewHub;
pub use types::{ReviewStreamEvent, ReviewStreamEventKind};
