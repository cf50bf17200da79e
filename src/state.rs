use std::sync::Arc;

use crate::config::AtlasConfig;
use crate::datasets::DatasetRegistry;
use crate::engine::EarthEngine;
use crate::services::regions::RegionCatalog;

#[derive(Clone)]
pub struct AppState {
    pub config: AtlasConfig,
    pub engine: Arc<dyn EarthEngine>,
    pub registry: Arc<DatasetRegistry>,
    /// `None` when the boundary dataset failed to load at startup.
    pub catalog: Option<Arc<RegionCatalog>>,
}
