pub mod message_repo;
pub mod project_repo;
pub mod review_repo;
pub mod schema;
pub mod settings_repo;
pub mod store;
pub mod util;

pub use schema::{migrate, open, open_and_migrate, with_test_db};
pub use store::DbStore;
