use crate::middleware::correlation::CorrelationId;
use crate::routes::{error::map_error, load_project};
use crate::AppState;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use sw_core::Store;
use sw_core::projects::ProjectRepository;
use sw_core::types::{CreateProjectInput, Project};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/projects", post(create_project))
        .route("/projects/{id}", get(get_project))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = CreateProjectInput,
    responses((status = 200, body = Project))
)]
pub(crate) async fn create_project(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Json(input): Json<CreateProjectInput>,
) -> Response {
    let project = {
        let store = state.store.lock().expect("store lock poisoned");
        match store.projects().create(input) {
            Ok(project) => project,
            Err(err) => {
                return map_error(&err.into(), Some(correlation.0)).into_response();
            }
        }
    };

    // Provision a database up front; the provider/url land on the project
    // record so later reads have the credentials the container cannot yield.
    match state
        .infra
        .create_database(&project.id, &project.path)
        .await
    {
        Ok(config) => {
            let updated = {
                let store = state.store.lock().expect("store lock poisoned");
                store
                    .projects()
                    .set_database(&project.id, config.provider(), config.url())
            };
            match updated {
                Ok(project) => Json(project).into_response(),
                Err(err) => map_error(&err.into(), Some(correlation.0)).into_response(),
            }
        }
        Err(err) => {
            tracing::warn!(project_id = %project.id, %err, "database provisioning failed");
            Json(project).into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(("id" = String, Path, description = "Project ID")),
    responses((status = 200, body = Project))
)]
pub(crate) async fn get_project(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match load_project(&state, &id) {
        Ok(project) => Json(project).into_response(),
        Err(err) => map_error(&err, None).into_response(),
    }
}
