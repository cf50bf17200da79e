use std::collections::BTreeMap;

use tracing::warn;

use crate::datasets::LANDCOVER_CLASS_NAMES;
use crate::engine::{EarthEngine, EngineError, Geometry, HistogramRequest, Image};
use crate::services::layers::LANDCOVER_BAND;

/// Native Dynamic World resolution.
pub const LANDCOVER_SCALE_M: f64 = 10.0;
pub const HISTOGRAM_MAX_PIXELS: f64 = 1e13;

const SQUARE_METERS_PER_KM2: f64 = 1e6;

#[derive(Debug, thiserror::Error)]
#[error("land-cover summary unavailable: {0}")]
pub struct SummaryUnavailable(#[from] pub EngineError);

/// Area per land-cover class, ordered by class code.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, utoipa::ToSchema)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// Pixel count to km², rounded to two decimals on the exact binary value
/// (ties to even), so 150 px at 10 m is 0.01 rather than 0.02.
pub fn pixel_area_km2(pixel_count: f64, scale_m: f64) -> f64 {
    let km2 = pixel_count * scale_m * scale_m / SQUARE_METERS_PER_KM2;
    format!("{km2:.2}").parse().unwrap_or(km2)
}

pub fn class_label(code: i64) -> String {
    usize::try_from(code)
        .ok()
        .and_then(|index| LANDCOVER_CLASS_NAMES.get(index))
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("Class {code}"))
}

fn parse_class_code(key: &str) -> Option<i64> {
    let value: f64 = key.trim().parse().ok()?;
    value.is_finite().then_some(value.trunc() as i64)
}

pub fn chart_series(histogram: &BTreeMap<String, f64>, scale_m: f64) -> ChartSeries {
    let mut by_code: BTreeMap<i64, f64> = BTreeMap::new();
    for (key, count) in histogram {
        match parse_class_code(key) {
            Some(code) => *by_code.entry(code).or_default() += count,
            None => warn!(key = %key, "skipping non-numeric land-cover class"),
        }
    }

    let mut series = ChartSeries::default();
    for (code, count) in by_code {
        series.labels.push(class_label(code));
        series.values.push(pixel_area_km2(count, scale_m));
    }
    series
}

pub async fn summarize(
    engine: &dyn EarthEngine,
    landcover: &Image,
    geometry: &Geometry,
) -> Result<ChartSeries, SummaryUnavailable> {
    let histogram = engine
        .frequency_histogram(HistogramRequest {
            image: landcover,
            band: LANDCOVER_BAND,
            geometry,
            scale_m: LANDCOVER_SCALE_M,
            max_pixels: HISTOGRAM_MAX_PIXELS,
        })
        .await?;
    Ok(chart_series(&histogram, LANDCOVER_SCALE_M))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FeatureCollection;
    use crate::test_support::{FakeEngine, FakeFailure};

    fn histogram(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries
            .iter()
            .map(|(key, count)| (key.to_string(), *count))
            .collect()
    }

    #[test]
    fn ten_meter_pixels_are_a_hundred_square_meters() {
        assert_eq!(pixel_area_km2(50_000.0, 10.0), 5.0);
        assert_eq!(pixel_area_km2(12_345.0, 10.0), 1.23);
        assert_eq!(pixel_area_km2(0.0, 10.0), 0.0);
    }

    #[test]
    fn rounding_follows_the_binary_value_not_the_decimal_tie() {
        // 0.015, 0.045 and 0.105 are all stored slightly below the tie.
        assert_eq!(pixel_area_km2(150.0, 10.0), 0.01);
        assert_eq!(pixel_area_km2(450.0, 10.0), 0.04);
        assert_eq!(pixel_area_km2(1_050.0, 10.0), 0.1);
        assert_eq!(pixel_area_km2(250.0, 10.0), 0.03);
    }

    #[test]
    fn series_is_ordered_by_numeric_class_code() {
        let series = chart_series(
            &histogram(&[("3.0", 10_000.0), ("0.0", 5_000.0), ("8.0", 2_000.0)]),
            LANDCOVER_SCALE_M,
        );
        assert_eq!(series.labels, ["Water", "Flooded vegetation", "Snow and ice"]);
        assert_eq!(series.values, [0.5, 1.0, 0.2]);
    }

    #[test]
    fn numeric_order_is_not_lexicographic() {
        let series = chart_series(
            &histogram(&[("10", 100.0), ("2", 100.0), ("1", 100.0)]),
            LANDCOVER_SCALE_M,
        );
        assert_eq!(series.labels, ["Trees", "Grass", "Class 10"]);
    }

    #[test]
    fn unknown_codes_get_synthesized_labels() {
        assert_eq!(class_label(9), "Class 9");
        assert_eq!(class_label(-1), "Class -1");
        assert_eq!(class_label(4), "Crops");
    }

    #[test]
    fn equivalent_keys_are_merged_and_garbage_skipped() {
        let series = chart_series(
            &histogram(&[("6", 30_000.0), ("6.0", 20_000.0), ("built-up", 1.0)]),
            LANDCOVER_SCALE_M,
        );
        assert_eq!(series.labels, ["Built"]);
        assert_eq!(series.values, [5.0]);
    }

    #[test]
    fn empty_histogram_gives_empty_series() {
        assert_eq!(
            chart_series(&BTreeMap::new(), LANDCOVER_SCALE_M),
            ChartSeries::default()
        );
    }

    #[tokio::test]
    async fn requests_the_label_band_at_native_resolution() {
        let engine = FakeEngine::new(Vec::new())
            .with_histogram(histogram(&[("1", 50_000.0)]));
        let geometry = FeatureCollection::table("districts").first_geometry();
        let image = Image::load("landcover");

        let series = summarize(&engine, &image, &geometry).await.unwrap();
        assert_eq!(series.labels, ["Trees"]);
        assert_eq!(series.values, [5.0]);

        let calls = engine.histogram_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].band, "label");
        assert_eq!(calls[0].scale_m, 10.0);
        assert_eq!(calls[0].max_pixels, 1e13);
    }

    #[tokio::test]
    async fn reduction_failure_is_reported_as_unavailable() {
        let engine = FakeEngine::new(Vec::new()).failing(FakeFailure::Histogram);
        let geometry = FeatureCollection::table("districts").first_geometry();
        let err = summarize(&engine, &Image::load("landcover"), &geometry)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("land-cover summary unavailable"));
    }
}
