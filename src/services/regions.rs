use tracing::warn;

use crate::datasets::{DatasetId, DatasetRegistry};
use crate::engine::{EarthEngine, EngineError, FeatureCollection, Filter, Geometry, LatLon};

pub const STATE_PROPERTY: &str = "stname";
pub const DISTRICT_PROPERTY: &str = "dtname";

#[derive(Debug, thiserror::Error)]
pub enum RegionError {
    #[error("no boundary feature for district {district:?} in state {state:?}")]
    NotFound { state: String, district: String },
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to list states from {asset}: {source}")]
    Engine {
        asset: String,
        #[source]
        source: EngineError,
    },
    #[error("boundary dataset {asset} has no states")]
    Empty { asset: String },
}

/// A district resolved against the boundary dataset for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct AdministrativeRegion {
    pub state: String,
    pub district: String,
    /// Every boundary feature matching the names; the outline layer paints all of them.
    pub features: FeatureCollection,
    pub geometry: Geometry,
    pub centroid: LatLon,
}

/// Boundary dataset plus the state list read from it at startup.
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    boundaries: FeatureCollection,
    states: Vec<String>,
}

impl RegionCatalog {
    pub async fn load(
        engine: &dyn EarthEngine,
        registry: &DatasetRegistry,
    ) -> Result<Self, CatalogError> {
        let asset = registry.handle(DatasetId::Boundaries).to_string();
        let boundaries = FeatureCollection::table(asset.clone());
        let states = engine
            .distinct_values(&boundaries, STATE_PROPERTY)
            .await
            .map_err(|source| CatalogError::Engine {
                asset: asset.clone(),
                source,
            })?;
        if states.is_empty() {
            return Err(CatalogError::Empty { asset });
        }
        Ok(Self { boundaries, states })
    }

    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn boundaries(&self) -> &FeatureCollection {
        &self.boundaries
    }

    /// Distinct district names of `state`, sorted. Unknown states yield an
    /// empty list.
    pub async fn list_districts(
        &self,
        engine: &dyn EarthEngine,
        state: &str,
    ) -> Result<Vec<String>, EngineError> {
        let in_state = self.boundaries.filter(Filter::eq(STATE_PROPERTY, state));
        engine.distinct_values(&in_state, DISTRICT_PROPERTY).await
    }

    pub async fn resolve_region(
        &self,
        engine: &dyn EarthEngine,
        state: &str,
        district: &str,
    ) -> Result<AdministrativeRegion, RegionError> {
        let features = self.boundaries.filter(Filter::and([
            Filter::eq(STATE_PROPERTY, state),
            Filter::eq(DISTRICT_PROPERTY, district),
        ]));
        let geometry = features.first_geometry();

        // An empty match must never reach the centroid or any later operation.
        match engine.size(&features).await? {
            0 => {
                return Err(RegionError::NotFound {
                    state: state.to_string(),
                    district: district.to_string(),
                })
            }
            1 => {}
            matches => warn!(
                state,
                district, matches, "multiple boundary features match; using the first"
            ),
        }

        let centroid = engine.centroid(&geometry).await?;
        Ok(AdministrativeRegion {
            state: state.to_string(),
            district: district.to_string(),
            features,
            geometry,
            centroid,
        })
    }
}
