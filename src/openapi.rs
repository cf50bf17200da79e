use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(title = "District Atlas", description = "State and district map layers"),
    paths(
        crate::routes::health::healthz_handler,
        crate::routes::regions::get_states,
        crate::routes::regions::get_districts,
        crate::routes::map_data::generate_map_data,
        crate::routes::legends::get_layer_legends,
    ),
    components(schemas(
        crate::error::ErrorResponse,
        crate::routes::health::HealthResponse,
        crate::routes::regions::StatesResponse,
        crate::routes::regions::DistrictsResponse,
        crate::routes::map_data::MapDataRequest,
        crate::services::map_data::MapDataResponse,
        crate::services::landcover::ChartSeries,
        crate::routes::legends::LayerLegendsResponse,
        crate::datasets::VisParams,
        crate::datasets::ValueRange,
    )),
    tags(
        (name = "regions", description = "Administrative boundaries"),
        (name = "map", description = "Map layers and land-cover statistics")
    )
)]
pub struct ApiDoc;

pub fn openapi_json() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi_json())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_handler))
}
