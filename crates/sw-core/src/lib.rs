pub mod architect;
pub mod config;
pub mod error;
pub mod messages;
pub mod parser;
pub mod projects;
pub mod prompts;
pub mod reviews;
pub mod settings;
pub mod store;
pub mod types;

pub use architect::{Architect, BuildCompleteEvent, TriggeredReview};
pub use config::ShipwrightConfig;
pub use error::ShipwrightError;
pub use store::Store;
