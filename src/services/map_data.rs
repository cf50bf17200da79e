use chrono::NaiveDate;
use serde::Serialize;

use crate::datasets::{DatasetRegistry, LayerKind};
use crate::engine::{EarthEngine, EngineError, LatLon};
use crate::services::landcover::{self, ChartSeries, SummaryUnavailable};
use crate::services::layers::{compose_layers, LayerSet};
use crate::services::regions::AdministrativeRegion;

/// Roughly one district across on a typical viewport.
pub const DEFAULT_ZOOM: u8 = 9;

#[derive(Debug, thiserror::Error)]
pub enum CompositionError {
    #[error("failed to render {layer} layer: {source}")]
    Layer {
        layer: LayerKind,
        #[source]
        source: EngineError,
    },
    #[error(transparent)]
    Summary(#[from] SummaryUnavailable),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileUrls {
    pub landcover: String,
    pub elevation: String,
    pub slope: String,
    pub rivers: String,
    pub surface_water: String,
    pub boundary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct MapDataResponse {
    pub landcover_url: String,
    pub dem_url: String,
    pub slope_url: String,
    pub rivers_url: String,
    pub gsw_url: String,
    pub boundary_url: String,
    /// `[latitude, longitude]`
    #[schema(value_type = Vec<f64>)]
    pub center: [f64; 2],
    pub zoom: u8,
    pub chart_data: ChartSeries,
    pub status: String,
}

pub fn assemble(urls: TileUrls, centroid: LatLon, chart: ChartSeries) -> MapDataResponse {
    MapDataResponse {
        landcover_url: urls.landcover,
        dem_url: urls.elevation,
        slope_url: urls.slope,
        rivers_url: urls.rivers,
        gsw_url: urls.surface_water,
        boundary_url: urls.boundary,
        center: [centroid.lat, centroid.lon],
        zoom: DEFAULT_ZOOM,
        chart_data: chart,
        status: "success".to_string(),
    }
}

async fn render(
    engine: &dyn EarthEngine,
    registry: &DatasetRegistry,
    layers: &LayerSet,
    layer: LayerKind,
) -> Result<String, CompositionError> {
    engine
        .tile_url(layers.get(layer), registry.layer_visualization(layer))
        .await
        .map_err(|source| CompositionError::Layer { layer, source })
}

/// Renders every layer and summarizes land cover for `region`. Any single
/// failure fails the whole response.
pub async fn generate(
    engine: &dyn EarthEngine,
    registry: &DatasetRegistry,
    region: &AdministrativeRegion,
    today: NaiveDate,
) -> Result<MapDataResponse, CompositionError> {
    let layers = compose_layers(registry, region, today);

    let (landcover, elevation, slope, rivers, surface_water, boundary, chart) = futures::try_join!(
        render(engine, registry, &layers, LayerKind::LandCover),
        render(engine, registry, &layers, LayerKind::Elevation),
        render(engine, registry, &layers, LayerKind::Slope),
        render(engine, registry, &layers, LayerKind::Rivers),
        render(engine, registry, &layers, LayerKind::SurfaceWater),
        render(engine, registry, &layers, LayerKind::Boundary),
        async {
            landcover::summarize(engine, &layers.landcover, &region.geometry)
                .await
                .map_err(CompositionError::from)
        },
    )?;

    let urls = TileUrls {
        landcover,
        elevation,
        slope,
        rivers,
        surface_water,
        boundary,
    };
    Ok(assemble(urls, region.centroid, chart))
}
