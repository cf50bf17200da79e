use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::error::{remote_failure, AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct StatesResponse {
    pub states: Vec<String>,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct DistrictsResponse {
    pub districts: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/get_states",
    tag = "regions",
    responses(
        (status = 200, description = "State names, sorted", body = StatesResponse),
        (status = 500, description = "Boundary dataset not loaded", body = crate::error::ErrorResponse)
    )
)]
pub(crate) async fn get_states(State(state): State<AppState>) -> AppResult<Json<StatesResponse>> {
    let catalog = state.catalog.as_ref().ok_or_else(|| {
        AppError::ServiceUnavailable(
            "States data not available. Check EE connection or asset path.".to_string(),
        )
    })?;
    Ok(Json(StatesResponse {
        states: catalog.states().to_vec(),
    }))
}

#[utoipa::path(
    get,
    path = "/get_districts/{state_name}",
    tag = "regions",
    params(
        ("state_name" = String, Path, description = "Exact state name as returned by /get_states")
    ),
    responses(
        (status = 200, description = "District names of the state, sorted; empty for unknown states", body = DistrictsResponse),
        (status = 500, description = "Dataset not loaded or remote query failed", body = crate::error::ErrorResponse)
    )
)]
pub(crate) async fn get_districts(
    State(state): State<AppState>,
    Path(state_name): Path<String>,
) -> AppResult<Json<DistrictsResponse>> {
    let catalog = state.catalog.as_ref().ok_or_else(|| {
        AppError::ServiceUnavailable("EE asset for districts is not loaded.".to_string())
    })?;
    let districts = catalog
        .list_districts(state.engine.as_ref(), &state_name)
        .await
        .map_err(|err| remote_failure(&format!("Listing districts of {state_name} failed"), err))?;
    Ok(Json(DistrictsResponse { districts }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/get_states", get(get_states))
        .route("/get_districts/{state_name}", get(get_districts))
}
