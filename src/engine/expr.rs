//! Lazy server-side computations, described locally and shipped to Earth
//! Engine as a REST expression graph.
//!
//! Nothing in this module performs I/O. Builders return new values that
//! describe a computation; an [`EarthEngine`](super::EarthEngine)
//! implementation decides how to evaluate them.

use chrono::NaiveDate;
use serde_json::{json, Map, Value as JsonValue};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_START_PROPERTY: &str = "system:time_start";
const ALL_GEOMETRY_FIELD: &str = ".all";

/// Serialization into an Earth Engine `ValueNode`.
pub trait ToNode {
    fn to_node(&self) -> JsonValue;
}

/// Wraps a root node into the `{result, values}` envelope expected by the
/// `value:compute` and `maps` endpoints.
pub fn expression(root: JsonValue) -> JsonValue {
    json!({
        "result": "0",
        "values": { "0": root },
    })
}

pub(crate) fn invoke<'a>(
    function: &str,
    arguments: impl IntoIterator<Item = (&'a str, JsonValue)>,
) -> JsonValue {
    let arguments: Map<String, JsonValue> = arguments
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();
    json!({
        "functionInvocationValue": {
            "functionName": function,
            "arguments": arguments,
        }
    })
}

pub(crate) fn constant(value: impl Into<JsonValue>) -> JsonValue {
    json!({ "constantValue": value.into() })
}

fn array(values: Vec<JsonValue>) -> JsonValue {
    json!({ "arrayValue": { "values": values } })
}

fn date(value: NaiveDate) -> JsonValue {
    invoke(
        "Date",
        [("value", constant(value.format(DATE_FORMAT).to_string()))],
    )
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Property equals a string value, case-sensitively.
    Eq { property: String, value: String },
    And(Vec<Filter>),
    /// Element footprint intersects the geometry.
    Bounds(Box<Geometry>),
    /// Acquisition time within `[start, end)`.
    DateRange { start: NaiveDate, end: NaiveDate },
}

impl Filter {
    pub fn eq(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq {
            property: property.into(),
            value: value.into(),
        }
    }

    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::And(filters.into_iter().collect())
    }
}

impl ToNode for Filter {
    fn to_node(&self) -> JsonValue {
        match self {
            Filter::Eq { property, value } => invoke(
                "Filter.equals",
                [
                    ("leftField", constant(property.as_str())),
                    ("rightValue", constant(value.as_str())),
                ],
            ),
            Filter::And(filters) => invoke(
                "Filter.and",
                [(
                    "filters",
                    array(filters.iter().map(ToNode::to_node).collect()),
                )],
            ),
            Filter::Bounds(geometry) => invoke(
                "Filter.intersects",
                [
                    ("leftField", constant(ALL_GEOMETRY_FIELD)),
                    ("rightValue", geometry.to_node()),
                ],
            ),
            Filter::DateRange { start, end } => invoke(
                "Filter.dateRangeContains",
                [
                    (
                        "leftValue",
                        invoke("DateRange", [("start", date(*start)), ("end", date(*end))]),
                    ),
                    ("rightField", constant(TIME_START_PROPERTY)),
                ],
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureCollection {
    Table(String),
    Filtered {
        source: Box<FeatureCollection>,
        filter: Filter,
    },
}

impl FeatureCollection {
    pub fn table(id: impl Into<String>) -> Self {
        Self::Table(id.into())
    }

    pub fn filter(&self, filter: Filter) -> Self {
        Self::Filtered {
            source: Box::new(self.clone()),
            filter,
        }
    }

    pub fn filter_bounds(&self, geometry: &Geometry) -> Self {
        self.filter(Filter::Bounds(Box::new(geometry.clone())))
    }

    /// Geometry of the first feature in the collection.
    pub fn first_geometry(&self) -> Geometry {
        Geometry::FirstFeature(Box::new(self.clone()))
    }
}

impl ToNode for FeatureCollection {
    fn to_node(&self) -> JsonValue {
        match self {
            FeatureCollection::Table(id) => {
                invoke("Collection.loadTable", [("tableId", constant(id.as_str()))])
            }
            FeatureCollection::Filtered { source, filter } => invoke(
                "Collection.filter",
                [("collection", source.to_node()), ("filter", filter.to_node())],
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    FirstFeature(Box<FeatureCollection>),
}

impl ToNode for Geometry {
    fn to_node(&self) -> JsonValue {
        match self {
            Geometry::FirstFeature(collection) => invoke(
                "Feature.geometry",
                [(
                    "feature",
                    invoke("Collection.first", [("collection", collection.to_node())]),
                )],
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageCollection {
    Load(String),
    Filtered {
        source: Box<ImageCollection>,
        filter: Filter,
    },
}

impl ImageCollection {
    pub fn load(id: impl Into<String>) -> Self {
        Self::Load(id.into())
    }

    pub fn filter(&self, filter: Filter) -> Self {
        Self::Filtered {
            source: Box::new(self.clone()),
            filter,
        }
    }

    /// Keeps images acquired in `[start, end)`.
    pub fn filter_date(&self, start: NaiveDate, end: NaiveDate) -> Self {
        self.filter(Filter::DateRange { start, end })
    }

    pub fn filter_bounds(&self, geometry: &Geometry) -> Self {
        self.filter(Filter::Bounds(Box::new(geometry.clone())))
    }

    /// Composites the collection into one image; later images win where
    /// acquisitions overlap.
    pub fn mosaic(&self) -> Image {
        Image::Mosaic(Box::new(self.clone()))
    }
}

impl ToNode for ImageCollection {
    fn to_node(&self) -> JsonValue {
        match self {
            ImageCollection::Load(id) => {
                invoke("ImageCollection.load", [("id", constant(id.as_str()))])
            }
            ImageCollection::Filtered { source, filter } => invoke(
                "Collection.filter",
                [("collection", source.to_node()), ("filter", filter.to_node())],
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Image {
    Load(String),
    /// Fully masked canvas, the base for painting vectors.
    Empty,
    Mosaic(Box<ImageCollection>),
    Select {
        input: Box<Image>,
        bands: Vec<String>,
    },
    Clip {
        input: Box<Image>,
        geometry: Box<Geometry>,
    },
    /// Slope in degrees derived from an elevation image.
    Slope(Box<Image>),
    Paint {
        canvas: Box<Image>,
        features: Box<FeatureCollection>,
        color: i64,
        width: u32,
    },
}

impl Image {
    pub fn load(id: impl Into<String>) -> Self {
        Self::Load(id.into())
    }

    pub fn empty() -> Self {
        Self::Empty
    }

    pub fn select<S: AsRef<str>>(&self, bands: &[S]) -> Self {
        Self::Select {
            input: Box::new(self.clone()),
            bands: bands.iter().map(|band| band.as_ref().to_string()).collect(),
        }
    }

    pub fn clip(&self, geometry: &Geometry) -> Self {
        Self::Clip {
            input: Box::new(self.clone()),
            geometry: Box::new(geometry.clone()),
        }
    }

    pub fn slope(&self) -> Self {
        Self::Slope(Box::new(self.clone()))
    }

    /// Rasterizes feature outlines onto this image.
    pub fn paint(&self, features: &FeatureCollection, color: i64, width: u32) -> Self {
        Self::Paint {
            canvas: Box::new(self.clone()),
            features: Box::new(features.clone()),
            color,
            width,
        }
    }
}

impl ToNode for Image {
    fn to_node(&self) -> JsonValue {
        match self {
            Image::Load(id) => invoke("Image.load", [("id", constant(id.as_str()))]),
            Image::Empty => {
                let zero = || invoke("Image.constant", [("value", constant(0))]);
                invoke("Image.mask", [("image", zero()), ("mask", zero())])
            }
            Image::Mosaic(collection) => {
                invoke("ImageCollection.mosaic", [("collection", collection.to_node())])
            }
            Image::Select { input, bands } => invoke(
                "Image.select",
                [
                    ("input", input.to_node()),
                    (
                        "bandSelectors",
                        array(bands.iter().map(|band| constant(band.as_str())).collect()),
                    ),
                ],
            ),
            Image::Clip { input, geometry } => invoke(
                "Image.clip",
                [("input", input.to_node()), ("geometry", geometry.to_node())],
            ),
            Image::Slope(input) => invoke("Terrain.slope", [("input", input.to_node())]),
            Image::Paint {
                canvas,
                features,
                color,
                width,
            } => invoke(
                "Image.paint",
                [
                    ("image", canvas.to_node()),
                    ("featureCollection", features.to_node()),
                    ("color", constant(*color)),
                    ("width", constant(*width)),
                ],
            ),
        }
    }
}
