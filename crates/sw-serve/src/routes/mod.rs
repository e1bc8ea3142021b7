pub mod data;
pub mod database;
pub mod error;
pub mod projects;
pub mod reviews;

use crate::middleware::correlation::correlation_middleware;
use crate::{AppState, openapi};
use axum::Router;
use axum::middleware;
use sw_core::error::ProjectError;
use sw_core::projects::ProjectRepository;
use sw_core::types::{Project, ProjectId};
use sw_core::{ShipwrightError, Store};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(projects::router(state.clone()))
        .merge(reviews::router(state.clone()))
        .merge(database::router(state.clone()))
        .merge(data::router(state.clone()))
        .merge(openapi::router())
        .route_layer(middleware::from_fn(correlation_middleware));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Parses the path id and loads the project, mapping both failures into the
/// envelope-ready error type.
pub(crate) fn load_project(state: &AppState, id: &str) -> Result<Project, ShipwrightError> {
    let project_id = ProjectId::new(id.to_string()).map_err(|err| {
        ShipwrightError::Project(ProjectError::InvalidInput {
            message: err.to_string(),
        })
    })?;
    let store = state.store.lock().expect("store lock poisoned");
    let project = store
        .projects()
        .get(&project_id)?
        .ok_or(ProjectError::NotFound)?;
    Ok(project)
}
