use chrono::{Duration, NaiveDate};

use crate::datasets::{DatasetId, DatasetRegistry, LayerKind};
use crate::engine::{FeatureCollection, Image, ImageCollection};
use crate::services::regions::AdministrativeRegion;

pub const LANDCOVER_LOOKBACK_DAYS: i64 = 60;
pub const LANDCOVER_BAND: &str = "label";
pub const SURFACE_WATER_BAND: &str = "occurrence";

const PAINT_COLOR: i64 = 0;
const RIVER_LINE_WIDTH: u32 = 2;
const BOUNDARY_LINE_WIDTH: u32 = 1;

/// Layer images for one region, not yet rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSet {
    pub landcover: Image,
    pub elevation: Image,
    pub slope: Image,
    pub rivers: Image,
    pub surface_water: Image,
    pub boundary: Image,
}

impl LayerSet {
    pub fn get(&self, layer: LayerKind) -> &Image {
        match layer {
            LayerKind::LandCover => &self.landcover,
            LayerKind::Elevation => &self.elevation,
            LayerKind::Slope => &self.slope,
            LayerKind::Rivers => &self.rivers,
            LayerKind::SurfaceWater => &self.surface_water,
            LayerKind::Boundary => &self.boundary,
        }
    }
}

/// `[today - 60 days, today)`; the end date is exclusive on the remote side.
pub fn lookback_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(LANDCOVER_LOOKBACK_DAYS), today)
}

pub fn compose_layers(
    registry: &DatasetRegistry,
    region: &AdministrativeRegion,
    today: NaiveDate,
) -> LayerSet {
    let geometry = &region.geometry;
    let (start, end) = lookback_window(today);

    let landcover = ImageCollection::load(registry.handle(DatasetId::LandCover))
        .filter_date(start, end)
        .filter_bounds(geometry)
        .mosaic()
        .select(&[LANDCOVER_BAND])
        .clip(geometry);

    let elevation = Image::load(registry.handle(DatasetId::Elevation)).clip(geometry);
    // Derived from the clipped DEM, so pixels on the clip edge can read steep.
    let slope = elevation.slope().clip(geometry);

    let rivers = FeatureCollection::table(registry.handle(DatasetId::Rivers))
        .filter_bounds(geometry);
    let rivers = Image::empty().paint(&rivers, PAINT_COLOR, RIVER_LINE_WIDTH);

    let surface_water = Image::load(registry.handle(DatasetId::SurfaceWater))
        .clip(geometry)
        .select(&[SURFACE_WATER_BAND]);

    let boundary = Image::empty().paint(&region.features, PAINT_COLOR, BOUNDARY_LINE_WIDTH);

    LayerSet {
        landcover,
        elevation,
        slope,
        rivers,
        surface_water,
        boundary,
    }
}
