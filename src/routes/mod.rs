pub mod health;
pub mod legends;
pub mod map_data;
pub mod regions;

use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(regions::router())
        .merge(map_data::router())
        .merge(legends::router())
        .nest("/api", crate::openapi::router())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::test_support::{
        sample_features, test_state, unavailable_state, FakeEngine, FakeFailure,
    };
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn histogram() -> BTreeMap<String, f64> {
        [("0".to_string(), 5_000.0), ("4".to_string(), 80_000.0)]
            .into_iter()
            .collect()
    }

    async fn ready_state() -> AppState {
        test_state(FakeEngine::new(sample_features()).with_histogram(histogram())).await
    }

    async fn get(state: AppState, uri: &str) -> Response {
        router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn post_json(state: AppState, body: &str) -> Response {
        router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/generate_map_data")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn json_body(resp: Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn states_are_listed() {
        let resp = get(ready_state().await, "/get_states").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            json_body(resp).await,
            json!({"states": ["Karnataka", "Kerala", "Tamil Nadu"]})
        );
    }

    #[tokio::test]
    async fn districts_of_a_state_with_spaces() {
        let resp = get(ready_state().await, "/get_districts/Karnataka").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            json_body(resp).await,
            json!({"districts": ["Bengaluru Urban", "Mandya", "Mysuru"]})
        );

        let resp = get(ready_state().await, "/get_districts/Tamil%20Nadu").await;
        assert_eq!(json_body(resp).await, json!({"districts": ["Nilgiris"]}));
    }

    #[tokio::test]
    async fn unknown_state_has_an_empty_district_list() {
        let resp = get(ready_state().await, "/get_districts/Atlantis").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await, json!({"districts": []}));
    }

    #[tokio::test]
    async fn district_listing_failure_is_a_server_error() {
        let mut state = ready_state().await;
        state.engine = std::sync::Arc::new(
            FakeEngine::new(sample_features()).failing(FakeFailure::Everything),
        );
        let resp = get(state, "/get_districts/Kerala").await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(resp).await;
        assert!(body["error"].as_str().unwrap().contains("Kerala"));
    }

    #[tokio::test]
    async fn unloaded_assets_are_reported_on_every_data_endpoint() {
        let resp = get(unavailable_state(), "/get_states").await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(resp).await["error"],
            "States data not available. Check EE connection or asset path."
        );

        let resp = get(unavailable_state(), "/get_districts/Kerala").await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(resp).await["error"],
            "EE asset for districts is not loaded."
        );

        let resp = post_json(
            unavailable_state(),
            r#"{"state":"Kerala","district":"Wayanad"}"#,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(resp).await["error"],
            "Earth Engine assets not loaded. Check server logs for EE initialization errors."
        );
    }

    #[tokio::test]
    async fn missing_or_empty_fields_are_rejected() {
        for body in [
            r#"{"state":"Kerala"}"#,
            r#"{"district":"Wayanad"}"#,
            r#"{"state":"","district":"Wayanad"}"#,
            r#"{}"#,
        ] {
            let resp = post_json(ready_state().await, body).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(json_body(resp).await["error"], "Missing state or district");
        }
    }

    #[tokio::test]
    async fn validation_happens_before_the_asset_check() {
        let resp = post_json(unavailable_state(), r#"{"state":"Kerala"}"#).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unreadable_body_is_a_bad_request() {
        let resp = post_json(ready_state().await, "not json").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn unknown_district_is_not_found() {
        let resp = post_json(
            ready_state().await,
            r#"{"state":"Kerala","district":"Mysuru"}"#,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            json_body(resp).await["error"],
            "District not found in the dataset."
        );
    }

    #[tokio::test]
    async fn map_data_for_a_known_district() {
        let resp = post_json(
            ready_state().await,
            r#"{"state":"Karnataka","district":"Mysuru"}"#,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["zoom"], 9);
        assert_eq!(body["center"], json!([12.23, 76.42]));
        assert_eq!(
            body["chart_data"],
            json!({"labels": ["Water", "Crops"], "values": [0.5, 8.0]})
        );
        for field in [
            "landcover_url",
            "dem_url",
            "slope_url",
            "rivers_url",
            "gsw_url",
            "boundary_url",
        ] {
            assert!(body[field].as_str().unwrap().ends_with("/tiles/{z}/{x}/{y}"));
        }
    }

    #[tokio::test]
    async fn downstream_failure_names_the_region() {
        let mut state = ready_state().await;
        state.engine = std::sync::Arc::new(
            FakeEngine::new(sample_features()).failing(FakeFailure::Tiles),
        );
        let resp = post_json(state, r#"{"state":"Kerala","district":"Wayanad"}"#).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let message = json_body(resp).await["error"].as_str().unwrap().to_string();
        assert!(message.contains("Wayanad, Kerala"), "{message}");
        assert!(message.ends_with("Check server logs."), "{message}");
    }

    #[tokio::test]
    async fn legends_are_served_without_loaded_assets() {
        let resp = get(unavailable_state(), "/get_layer_legends").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["layers"]["slope_url"]["value_range"]["max"], 45.0);
        assert_eq!(body["layers"]["boundary_url"]["palette"], json!(["red"]));
        assert_eq!(body["layers"].as_object().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn health_reports_asset_state() {
        let body = json_body(get(ready_state().await, "/healthz").await).await;
        assert_eq!(body, json!({"status": "ok", "assets_loaded": true}));
        let body = json_body(get(unavailable_state(), "/healthz").await).await;
        assert_eq!(body["assets_loaded"], false);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let resp = get(unavailable_state(), "/api/openapi.json").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert!(body["paths"]["/generate_map_data"].is_object());
    }
}
