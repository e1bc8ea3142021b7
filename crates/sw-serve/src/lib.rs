pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod sse;

use axum::Router;
use std::sync::{Arc, Mutex};
use sw_agent::{CliAgent, CliChat};
use sw_core::{Architect, ShipwrightConfig, ShipwrightError};
use sw_db::DbStore;
use sw_db::schema;
use sw_events::ReviewHub;
use sw_infra::{DataBrowser, DatabaseInfra, DockerCli};
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<DbStore>>,
    pub hub: ReviewHub,
    pub architect: Architect<DbStore>,
    pub infra: Arc<DatabaseInfra<DockerCli>>,
    pub browser: DataBrowser,
}

pub fn build_state(config: &ShipwrightConfig) -> Result<AppState, ShipwrightError> {
    if let Some(parent) = config.db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|err| ShipwrightError::Internal {
            message: err.to_string(),
        })?;
    }
    let conn =
        schema::open_and_migrate(&config.db_path).map_err(|err| ShipwrightError::Internal {
            message: err.to_string(),
        })?;
    let store = Arc::new(Mutex::new(DbStore::new(conn)));
    let hub = ReviewHub::new();

    let agent = CliAgent::new(&config.agent_command)?;
    let chat = Arc::new(CliChat::new(agent.clone()));
    let architect = Architect::new(Arc::clone(&store), Arc::new(agent), chat, hub.clone());

    Ok(AppState {
        store,
        hub,
        architect,
        infra: Arc::new(DatabaseInfra::new(Arc::new(DockerCli::new()))),
        browser: DataBrowser::new(),
    })
}

pub fn app(state: AppState) -> Router {
    routes::router(state)
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app(state)).await
}
