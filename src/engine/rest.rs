use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value as JsonValue};

use super::expr::{constant, expression, invoke, ToNode};
use super::{
    EarthEngine, EngineError, FeatureCollection, Geometry, HistogramRequest, Image, LatLon,
};
use crate::datasets::VisParams;

const MAP_FILE_FORMAT: &str = "AUTO_JPEG_PNG";
const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Deserialize)]
struct ComputeEnvelope {
    #[serde(default)]
    result: JsonValue,
}

#[derive(Deserialize)]
struct MapEnvelope {
    name: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Earth Engine REST v1 client.
#[derive(Clone)]
pub struct RestEngine {
    base_url: String,
    project: String,
    access_token: Option<String>,
    http: Client,
}

impl RestEngine {
    pub fn new(
        base_url: String,
        project: String,
        access_token: Option<String>,
        http: Client,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            project,
            access_token,
            http,
        }
    }

    fn project_url(&self, method: &str) -> String {
        format!("{}/projects/{}/{}", self.base_url, self.project, method)
    }

    async fn post(&self, url: &str, body: &JsonValue) -> Result<reqwest::Response, EngineError> {
        let mut request = self.http.post(url).json(body);
        if let Some(token) = self.access_token.as_deref() {
            request = request.bearer_auth(token);
        }
        let resp = request.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let text = resp.text().await.unwrap_or_default();
        Err(EngineError::Api {
            status: status.as_u16(),
            message: api_error_message(&text),
        })
    }

    async fn compute(&self, root: JsonValue) -> Result<JsonValue, EngineError> {
        let body = json!({ "expression": expression(root) });
        let envelope: ComputeEnvelope = self
            .post(&self.project_url("value:compute"), &body)
            .await?
            .json()
            .await?;
        Ok(envelope.result)
    }
}

#[async_trait]
impl EarthEngine for RestEngine {
    async fn distinct_values(
        &self,
        collection: &FeatureCollection,
        property: &str,
    ) -> Result<Vec<String>, EngineError> {
        let values = invoke(
            "AggregateFeatureCollection.array",
            [
                ("collection", collection.to_node()),
                ("property", constant(property)),
            ],
        );
        let distinct = invoke("List.distinct", [("list", values)]);
        let sorted = invoke("List.sort", [("list", distinct)]);
        let result = self.compute(sorted).await?;
        decode_string_list(result)
    }

    async fn size(&self, collection: &FeatureCollection) -> Result<u64, EngineError> {
        let result = self
            .compute(invoke("Collection.size", [("collection", collection.to_node())]))
            .await?;
        result
            .as_u64()
            .or_else(|| result.as_f64().filter(|n| *n >= 0.0).map(|n| n as u64))
            .ok_or_else(|| EngineError::Decode(format!("collection size was {result}")))
    }

    async fn centroid(&self, geometry: &Geometry) -> Result<LatLon, EngineError> {
        let result = self
            .compute(invoke("Geometry.centroid", [("geometry", geometry.to_node())]))
            .await?;
        decode_point(&result)
    }

    async fn frequency_histogram(
        &self,
        request: HistogramRequest<'_>,
    ) -> Result<BTreeMap<String, f64>, EngineError> {
        let reduced = invoke(
            "Image.reduceRegion",
            [
                ("image", request.image.to_node()),
                (
                    "reducer",
                    invoke(
                        "Reducer.frequencyHistogram",
                        std::iter::empty::<(&str, JsonValue)>(),
                    ),
                ),
                ("geometry", request.geometry.to_node()),
                ("scale", constant(request.scale_m)),
                ("maxPixels", constant(request.max_pixels)),
            ],
        );
        let band = invoke(
            "Dictionary.get",
            [("dictionary", reduced), ("key", constant(request.band))],
        );
        let result = self.compute(band).await?;
        decode_histogram(result)
    }

    async fn tile_url(
        &self,
        image: &Image,
        visualization: &VisParams,
    ) -> Result<String, EngineError> {
        let body = map_request_body(image, visualization);
        let envelope: MapEnvelope = self
            .post(&self.project_url("maps"), &body)
            .await?
            .json()
            .await?;
        Ok(format!(
            "{}/{}/tiles/{{z}}/{{x}}/{{y}}",
            self.base_url, envelope.name
        ))
    }
}

fn map_request_body(image: &Image, visualization: &VisParams) -> JsonValue {
    let mut body = json!({
        "expression": expression(image.to_node()),
        "fileFormat": MAP_FILE_FORMAT,
    });

    let mut options = Map::new();
    if let Some(range) = visualization.value_range {
        options.insert(
            "ranges".to_string(),
            json!([{ "min": range.min, "max": range.max }]),
        );
    }
    if !visualization.palette.is_empty() {
        let colors: Vec<&str> = visualization
            .palette
            .iter()
            .map(|color| color.trim_start_matches('#'))
            .collect();
        options.insert("paletteColors".to_string(), json!(colors));
    }
    if !options.is_empty() {
        body["visualizationOptions"] = JsonValue::Object(options);
    }
    if let Some(bands) = visualization.selected_bands.as_ref() {
        body["bandIds"] = json!(bands);
    }
    body
}

fn api_error_message(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        return envelope.error.message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

fn decode_string_list(result: JsonValue) -> Result<Vec<String>, EngineError> {
    let items = match result {
        JsonValue::Array(items) => items,
        other => {
            return Err(EngineError::Decode(format!("expected a list, got {other}")));
        }
    };
    Ok(items
        .into_iter()
        .map(|item| match item {
            JsonValue::String(value) => value,
            other => other.to_string(),
        })
        .collect())
}

fn decode_point(result: &JsonValue) -> Result<LatLon, EngineError> {
    let coordinates = result
        .get("coordinates")
        .and_then(JsonValue::as_array)
        .ok_or_else(|| EngineError::Decode(format!("centroid was not a point: {result}")))?;
    match coordinates.as_slice() {
        [lon, lat, ..] => match (lon.as_f64(), lat.as_f64()) {
            (Some(lon), Some(lat)) => Ok(LatLon { lat, lon }),
            _ => Err(EngineError::Decode(format!(
                "centroid coordinates not numeric: {result}"
            ))),
        },
        _ => Err(EngineError::Decode(format!(
            "centroid has {} coordinates",
            coordinates.len()
        ))),
    }
}

fn decode_histogram(result: JsonValue) -> Result<BTreeMap<String, f64>, EngineError> {
    match result {
        JsonValue::Null => Ok(BTreeMap::new()),
        JsonValue::Object(counts) => counts
            .into_iter()
            .map(|(key, count)| match count.as_f64() {
                Some(count) => Ok((key, count)),
                None => Err(EngineError::Decode(format!(
                    "histogram count for {key} was {count}"
                ))),
            })
            .collect(),
        other => Err(EngineError::Decode(format!(
            "expected a histogram object, got {other}"
        ))),
    }
}
