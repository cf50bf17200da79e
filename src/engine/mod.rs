pub mod expr;
pub mod rest;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::datasets::VisParams;

pub use expr::{FeatureCollection, Filter, Geometry, Image, ImageCollection};
pub use rest::RestEngine;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("earth engine request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("earth engine returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("unexpected earth engine response: {0}")]
    Decode(String),
}

/// Frequency histogram reduction of one band over a region.
#[derive(Debug, Clone)]
pub struct HistogramRequest<'a> {
    pub image: &'a Image,
    pub band: &'a str,
    pub geometry: &'a Geometry,
    pub scale_m: f64,
    pub max_pixels: f64,
}

/// Remote evaluation of [`expr`] values.
///
/// Every method is a single round trip. Implementations must not retry.
#[async_trait]
pub trait EarthEngine: Send + Sync {
    /// Distinct values of a string property, sorted ascending.
    async fn distinct_values(
        &self,
        collection: &FeatureCollection,
        property: &str,
    ) -> Result<Vec<String>, EngineError>;

    async fn size(&self, collection: &FeatureCollection) -> Result<u64, EngineError>;

    async fn centroid(&self, geometry: &Geometry) -> Result<LatLon, EngineError>;

    /// Pixel counts keyed by the class value as the service prints it
    /// (`"3"` or `"3.0"`). An empty reduction yields an empty map.
    async fn frequency_histogram(
        &self,
        request: HistogramRequest<'_>,
    ) -> Result<BTreeMap<String, f64>, EngineError>;

    /// Mints a tile URL template with `{z}`, `{x}` and `{y}` placeholders.
    async fn tile_url(&self, image: &Image, visualization: &VisParams)
        -> Result<String, EngineError>;
}
