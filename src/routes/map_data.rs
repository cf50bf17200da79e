use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use tracing::info;

use crate::error::{remote_failure, AppError, AppResult};
use crate::services::map_data::{self, MapDataResponse};
use crate::services::regions::RegionError;
use crate::state::AppState;

#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::ToSchema)]
pub struct MapDataRequest {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[utoipa::path(
    post,
    path = "/generate_map_data",
    tag = "map",
    request_body = MapDataRequest,
    responses(
        (status = 200, description = "Tile URLs, map center and land-cover areas", body = MapDataResponse),
        (status = 400, description = "Missing state or district", body = crate::error::ErrorResponse),
        (status = 404, description = "District not found", body = crate::error::ErrorResponse),
        (status = 500, description = "Datasets not loaded or remote failure", body = crate::error::ErrorResponse)
    )
)]
pub(crate) async fn generate_map_data(
    State(state): State<AppState>,
    payload: Result<Json<MapDataRequest>, JsonRejection>,
) -> AppResult<Json<MapDataResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    })?;
    let (Some(state_name), Some(district)) =
        (required(request.state), required(request.district))
    else {
        return Err(AppError::Validation("Missing state or district".to_string()));
    };

    let catalog = state.catalog.as_ref().ok_or_else(|| {
        AppError::ServiceUnavailable(
            "Earth Engine assets not loaded. Check server logs for EE initialization errors."
                .to_string(),
        )
    })?;

    let context = format!("Map data generation failed for {district}, {state_name}");
    let engine = state.engine.as_ref();
    let region = match catalog.resolve_region(engine, &state_name, &district).await {
        Ok(region) => region,
        Err(RegionError::NotFound { .. }) => {
            info!(state = %state_name, district = %district, "district not found");
            return Err(AppError::RegionNotFound(
                "District not found in the dataset.".to_string(),
            ));
        }
        Err(err) => return Err(remote_failure(&context, err)),
    };

    let today = Utc::now().date_naive();
    let response = map_data::generate(engine, &state.registry, &region, today)
        .await
        .map_err(|err| remote_failure(&context, err))?;
    Ok(Json(response))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/generate_map_data", post(generate_map_data))
}
