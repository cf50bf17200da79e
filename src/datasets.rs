//! Remote datasets and how each map layer is rendered.

use serde::Serialize;

use crate::config::DatasetHandles;

/// Dynamic World `label` band values 0..=8.
pub const LANDCOVER_CLASS_NAMES: [&str; 9] = [
    "Water",
    "Trees",
    "Grass",
    "Flooded vegetation",
    "Crops",
    "Shrub and scrub",
    "Built",
    "Bare",
    "Snow and ice",
];

const LANDCOVER_PALETTE: [&str; 9] = [
    "#419BDF", "#397D49", "#88B053", "#7A87C6", "#E49635", "#DFC35A", "#C4281B", "#A59B8F",
    "#B39FE1",
];
const ELEVATION_PALETTE: [&str; 6] = [
    "#006400", "#7FFF00", "#FFFF00", "#FFA500", "#FF0000", "#800000",
];
const SLOPE_PALETTE: [&str; 5] = ["#f7fbff", "#c6dbef", "#6baed6", "#2171b5", "#08306b"];
const SURFACE_WATER_LEGEND: [&str; 5] = ["0-20%", "20-40%", "40-60%", "60-80%", "80-100%"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetId {
    Boundaries,
    LandCover,
    Elevation,
    Rivers,
    SurfaceWater,
}

impl DatasetId {
    pub const ALL: [DatasetId; 5] = [
        DatasetId::Boundaries,
        DatasetId::LandCover,
        DatasetId::Elevation,
        DatasetId::Rivers,
        DatasetId::SurfaceWater,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DatasetId::Boundaries => "boundaries",
            DatasetId::LandCover => "landcover",
            DatasetId::Elevation => "elevation",
            DatasetId::Rivers => "rivers",
            DatasetId::SurfaceWater => "surface_water",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Image,
    ImageCollection,
    FeatureCollection,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, utoipa::ToSchema)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct VisParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_range: Option<ValueRange>,
    pub palette: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_bands: Option<Vec<String>>,
    pub title: String,
}

impl VisParams {
    fn new(title: &str, palette: &[&str]) -> Self {
        Self {
            value_range: None,
            palette: strings(palette),
            class_names: None,
            selected_bands: None,
            title: title.to_string(),
        }
    }

    fn with_range(mut self, min: f64, max: f64) -> Self {
        self.value_range = Some(ValueRange { min, max });
        self
    }

    fn with_class_names(mut self, names: &[&str]) -> Self {
        self.class_names = Some(strings(names));
        self
    }

    fn with_bands(mut self, bands: &[&str]) -> Self {
        self.selected_bands = Some(strings(bands));
        self
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetDescriptor {
    pub id: DatasetId,
    pub handle: String,
    pub kind: DatasetKind,
    pub visualization: VisParams,
}

/// One rendered layer of the map response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    LandCover,
    Elevation,
    Slope,
    Rivers,
    SurfaceWater,
    Boundary,
}

impl LayerKind {
    pub const ALL: [LayerKind; 6] = [
        LayerKind::LandCover,
        LayerKind::Elevation,
        LayerKind::Slope,
        LayerKind::Rivers,
        LayerKind::SurfaceWater,
        LayerKind::Boundary,
    ];

    /// Response field carrying this layer's tile URL.
    pub fn field_name(self) -> &'static str {
        match self {
            LayerKind::LandCover => "landcover_url",
            LayerKind::Elevation => "dem_url",
            LayerKind::Slope => "slope_url",
            LayerKind::Rivers => "rivers_url",
            LayerKind::SurfaceWater => "gsw_url",
            LayerKind::Boundary => "boundary_url",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LayerKind::LandCover => "land cover",
            LayerKind::Elevation => "elevation",
            LayerKind::Slope => "slope",
            LayerKind::Rivers => "river network",
            LayerKind::SurfaceWater => "surface water",
            LayerKind::Boundary => "boundary outline",
        }
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Immutable after construction; shared by every request.
#[derive(Debug, Clone)]
pub struct DatasetRegistry {
    boundaries: DatasetDescriptor,
    landcover: DatasetDescriptor,
    elevation: DatasetDescriptor,
    rivers: DatasetDescriptor,
    surface_water: DatasetDescriptor,
    slope: VisParams,
}

impl DatasetRegistry {
    pub fn new(handles: &DatasetHandles) -> Self {
        Self {
            boundaries: DatasetDescriptor {
                id: DatasetId::Boundaries,
                handle: handles.boundaries.clone(),
                kind: DatasetKind::FeatureCollection,
                visualization: VisParams::new("District Boundary", &["red"]),
            },
            landcover: DatasetDescriptor {
                id: DatasetId::LandCover,
                handle: handles.landcover.clone(),
                kind: DatasetKind::ImageCollection,
                visualization: VisParams::new("Dynamic World LULC", &LANDCOVER_PALETTE)
                    .with_range(0.0, 8.0)
                    .with_class_names(&LANDCOVER_CLASS_NAMES),
            },
            elevation: DatasetDescriptor {
                id: DatasetId::Elevation,
                handle: handles.elevation.clone(),
                kind: DatasetKind::Image,
                visualization: VisParams::new("SRTM DEM Elevation (m)", &ELEVATION_PALETTE)
                    .with_range(0.0, 3000.0),
            },
            rivers: DatasetDescriptor {
                id: DatasetId::Rivers,
                handle: handles.rivers.clone(),
                kind: DatasetKind::FeatureCollection,
                visualization: VisParams::new("HydroSHEDS River Networks", &["#0000FF"]),
            },
            surface_water: DatasetDescriptor {
                id: DatasetId::SurfaceWater,
                handle: handles.surface_water.clone(),
                kind: DatasetKind::Image,
                visualization: VisParams::new(
                    "Global Surface Water Occurrence (%)",
                    &["#FFFFFF", "#0000FF"],
                )
                .with_range(0.0, 100.0)
                .with_bands(&["occurrence"])
                .with_class_names(&SURFACE_WATER_LEGEND),
            },
            slope: VisParams::new("Slope (Degrees)", &SLOPE_PALETTE).with_range(0.0, 45.0),
        }
    }

    pub fn descriptor(&self, id: DatasetId) -> &DatasetDescriptor {
        match id {
            DatasetId::Boundaries => &self.boundaries,
            DatasetId::LandCover => &self.landcover,
            DatasetId::Elevation => &self.elevation,
            DatasetId::Rivers => &self.rivers,
            DatasetId::SurfaceWater => &self.surface_water,
        }
    }

    pub fn get(&self, name: &str) -> Option<&DatasetDescriptor> {
        DatasetId::from_name(name).map(|id| self.descriptor(id))
    }

    pub fn handle(&self, id: DatasetId) -> &str {
        &self.descriptor(id).handle
    }

    pub fn layer_visualization(&self, layer: LayerKind) -> &VisParams {
        match layer {
            LayerKind::LandCover => &self.landcover.visualization,
            LayerKind::Elevation => &self.elevation.visualization,
            LayerKind::Slope => &self.slope,
            LayerKind::Rivers => &self.rivers.visualization,
            LayerKind::SurfaceWater => &self.surface_water.visualization,
            LayerKind::Boundary => &self.boundaries.visualization,
        }
    }
}
