use std::collections::BTreeMap;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::datasets::{LayerKind, VisParams};
use crate::state::AppState;

/// Rendering parameters keyed by the map response's URL field names.
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct LayerLegendsResponse {
    pub layers: BTreeMap<String, VisParams>,
}

#[utoipa::path(
    get,
    path = "/get_layer_legends",
    tag = "map",
    responses((status = 200, description = "Legend per map layer", body = LayerLegendsResponse))
)]
pub(crate) async fn get_layer_legends(State(state): State<AppState>) -> Json<LayerLegendsResponse> {
    let layers = LayerKind::ALL
        .into_iter()
        .map(|layer| {
            (
                layer.field_name().to_string(),
                state.registry.layer_visualization(layer).clone(),
            )
        })
        .collect();
    Json(LayerLegendsResponse { layers })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/get_layer_legends", get(get_layer_legends))
}
