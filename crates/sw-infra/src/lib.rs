pub mod adapters;
pub mod browser;
pub mod docker;
pub mod postgres;
pub mod service;
pub mod sqlite;

pub use browser::DataBrowser;
pub use docker::{ContainerRuntime, DockerCli};
pub use postgres::PostgresContainers;
pub use service::DatabaseInfra;
