use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::{AtlasConfig, DatasetHandles};
use crate::datasets::{DatasetRegistry, VisParams};
use crate::engine::{
    EarthEngine, EngineError, FeatureCollection, Filter, Geometry, HistogramRequest, Image, LatLon,
};
use crate::services::regions::{RegionCatalog, DISTRICT_PROPERTY, STATE_PROPERTY};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq)]
pub struct FakeFeature {
    pub state: String,
    pub district: String,
    pub centroid: LatLon,
}

fn feature(state: &str, district: &str, lat: f64, lon: f64) -> FakeFeature {
    FakeFeature {
        state: state.to_string(),
        district: district.to_string(),
        centroid: LatLon { lat, lon },
    }
}

/// Unsorted on purpose; Kerala/Idukki appears twice with different centroids.
pub fn sample_features() -> Vec<FakeFeature> {
    vec![
        feature("Karnataka", "Mysuru", 12.23, 76.42),
        feature("Kerala", "Wayanad", 11.7, 76.08),
        feature("Tamil Nadu", "Nilgiris", 11.45, 76.7),
        feature("Karnataka", "Bengaluru Urban", 12.97, 77.59),
        feature("Kerala", "Idukki", 9.85, 76.97),
        feature("Karnataka", "Mandya", 12.52, 76.9),
        feature("Kerala", "Idukki", 10.01, 77.12),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeFailure {
    Everything,
    Tiles,
    Histogram,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedHistogram {
    pub band: String,
    pub scale_m: f64,
    pub max_pixels: f64,
}

/// In-memory engine that evaluates the expression algebra against a fixed
/// set of boundary features. Bounds and date filters always match.
#[derive(Debug, Default)]
pub struct FakeEngine {
    features: Vec<FakeFeature>,
    histogram: BTreeMap<String, f64>,
    failure: Option<FakeFailure>,
    minted: AtomicU64,
    centroid_calls: AtomicU64,
    histogram_calls: Mutex<Vec<RecordedHistogram>>,
}

impl FakeEngine {
    pub fn new(features: Vec<FakeFeature>) -> Self {
        Self {
            features,
            ..Self::default()
        }
    }

    pub fn with_histogram(mut self, histogram: BTreeMap<String, f64>) -> Self {
        self.histogram = histogram;
        self
    }

    pub fn failing(mut self, failure: FakeFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn histogram_calls(&self) -> Vec<RecordedHistogram> {
        self.histogram_calls.lock().unwrap().clone()
    }

    pub fn centroid_calls(&self) -> u64 {
        self.centroid_calls.load(Ordering::Relaxed)
    }

    fn check(&self, operation: FakeFailure) -> Result<(), EngineError> {
        match self.failure {
            Some(FakeFailure::Everything) => Err(unavailable()),
            Some(failure) if failure == operation => Err(unavailable()),
            _ => Ok(()),
        }
    }

    fn check_any(&self) -> Result<(), EngineError> {
        match self.failure {
            Some(FakeFailure::Everything) => Err(unavailable()),
            _ => Ok(()),
        }
    }

    fn evaluate(&self, collection: &FeatureCollection) -> Vec<&FakeFeature> {
        match collection {
            FeatureCollection::Table(_) => self.features.iter().collect(),
            FeatureCollection::Filtered { source, filter } => self
                .evaluate(source)
                .into_iter()
                .filter(|feature| matches(feature, filter))
                .collect(),
        }
    }
}

fn unavailable() -> EngineError {
    EngineError::Api {
        status: 503,
        message: "backend unavailable".to_string(),
    }
}

fn property<'a>(feature: &'a FakeFeature, name: &str) -> Option<&'a str> {
    match name {
        STATE_PROPERTY => Some(&feature.state),
        DISTRICT_PROPERTY => Some(&feature.district),
        _ => None,
    }
}

fn matches(feature: &FakeFeature, filter: &Filter) -> bool {
    match filter {
        Filter::Eq { property: name, value } => property(feature, name) == Some(value.as_str()),
        Filter::And(filters) => filters.iter().all(|filter| matches(feature, filter)),
        Filter::Bounds(_) | Filter::DateRange { .. } => true,
    }
}

#[async_trait]
impl EarthEngine for FakeEngine {
    async fn distinct_values(
        &self,
        collection: &FeatureCollection,
        name: &str,
    ) -> Result<Vec<String>, EngineError> {
        self.check_any()?;
        let mut values: Vec<String> = self
            .evaluate(collection)
            .into_iter()
            .filter_map(|feature| property(feature, name).map(str::to_string))
            .collect();
        values.sort();
        values.dedup();
        Ok(values)
    }

    async fn size(&self, collection: &FeatureCollection) -> Result<u64, EngineError> {
        self.check_any()?;
        Ok(self.evaluate(collection).len() as u64)
    }

    async fn centroid(&self, geometry: &Geometry) -> Result<LatLon, EngineError> {
        self.centroid_calls.fetch_add(1, Ordering::Relaxed);
        self.check_any()?;
        let Geometry::FirstFeature(collection) = geometry;
        self.evaluate(collection)
            .first()
            .map(|feature| feature.centroid)
            .ok_or_else(|| EngineError::Decode("geometry of an empty collection".to_string()))
    }

    async fn frequency_histogram(
        &self,
        request: HistogramRequest<'_>,
    ) -> Result<BTreeMap<String, f64>, EngineError> {
        self.histogram_calls.lock().unwrap().push(RecordedHistogram {
            band: request.band.to_string(),
            scale_m: request.scale_m,
            max_pixels: request.max_pixels,
        });
        self.check(FakeFailure::Histogram)?;
        Ok(self.histogram.clone())
    }

    async fn tile_url(
        &self,
        _image: &Image,
        _visualization: &VisParams,
    ) -> Result<String, EngineError> {
        self.check(FakeFailure::Tiles)?;
        let id = self.minted.fetch_add(1, Ordering::Relaxed);
        Ok(format!(
            "https://earthengine.test/v1/projects/demo/maps/map-{id}/tiles/{{z}}/{{x}}/{{y}}"
        ))
    }
}

pub fn test_handles() -> DatasetHandles {
    DatasetHandles {
        boundaries: "users/demo/districts".to_string(),
        ..DatasetHandles::default()
    }
}

pub fn test_registry() -> DatasetRegistry {
    DatasetRegistry::new(&test_handles())
}

pub fn test_config() -> AtlasConfig {
    AtlasConfig {
        ee_project: "demo".to_string(),
        ee_api_base_url: "http://127.0.0.1:9/v1".to_string(),
        ee_access_token: None,
        ee_timeout_seconds: 5,
        static_root: None,
        datasets: test_handles(),
    }
}

pub async fn test_state(engine: FakeEngine) -> AppState {
    let registry = Arc::new(test_registry());
    let catalog = RegionCatalog::load(&engine, &registry)
        .await
        .expect("catalog");
    AppState {
        config: test_config(),
        engine: Arc::new(engine),
        registry,
        catalog: Some(Arc::new(catalog)),
    }
}

/// State after a failed startup load.
pub fn unavailable_state() -> AppState {
    AppState {
        config: test_config(),
        engine: Arc::new(FakeEngine::new(Vec::new()).failing(FakeFailure::Everything)),
        registry: Arc::new(test_registry()),
        catalog: None,
    }
}
