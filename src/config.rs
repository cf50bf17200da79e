use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_SETUP_CONFIG_PATH: &str = "/etc/district-atlas/config.json";
const DEFAULT_EE_API_BASE_URL: &str = "https://earthengine.googleapis.com/v1";
const DEFAULT_EE_TIMEOUT_SECONDS: u64 = 60;

const DEFAULT_BOUNDARY_ASSET: &str = "users/sachinbobbili/India_Dist";
const DEFAULT_LANDCOVER_ASSET: &str = "GOOGLE/DYNAMICWORLD/V1";
const DEFAULT_ELEVATION_ASSET: &str = "CGIAR/SRTM90_V4";
const DEFAULT_RIVERS_ASSET: &str = "WWF/HydroSHEDS/v1/FreeFlowingRivers";
const DEFAULT_SURFACE_WATER_ASSET: &str = "JRC/GSW1_4/GlobalSurfaceWater";

pub(crate) fn setup_config_path(lookup: &dyn Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(path) = lookup("ATLAS_SETUP_CONFIG_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    PathBuf::from(DEFAULT_SETUP_CONFIG_PATH)
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SetupConfigOverrides {
    #[serde(default)]
    ee_project: Option<String>,
    #[serde(default)]
    ee_api_base_url: Option<String>,
    #[serde(default)]
    ee_access_token: Option<String>,
    #[serde(default)]
    ee_timeout_seconds: Option<u64>,
    #[serde(default)]
    static_root: Option<String>,
    #[serde(default)]
    boundary_asset: Option<String>,
    #[serde(default)]
    landcover_asset: Option<String>,
    #[serde(default)]
    elevation_asset: Option<String>,
    #[serde(default)]
    rivers_asset: Option<String>,
    #[serde(default)]
    surface_water_asset: Option<String>,
}

fn load_setup_config_overrides(path: &Path) -> Option<SetupConfigOverrides> {
    if !path.exists() {
        return None;
    }
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to read setup config; using env defaults"
            );
            return None;
        }
    };
    match serde_json::from_str(&contents) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to parse setup config; using env defaults"
            );
            None
        }
    }
}

/// Remote asset ids for each registered dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetHandles {
    pub boundaries: String,
    pub landcover: String,
    pub elevation: String,
    pub rivers: String,
    pub surface_water: String,
}

impl Default for DatasetHandles {
    fn default() -> Self {
        Self {
            boundaries: DEFAULT_BOUNDARY_ASSET.to_string(),
            landcover: DEFAULT_LANDCOVER_ASSET.to_string(),
            elevation: DEFAULT_ELEVATION_ASSET.to_string(),
            rivers: DEFAULT_RIVERS_ASSET.to_string(),
            surface_water: DEFAULT_SURFACE_WATER_ASSET.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AtlasConfig {
    pub ee_project: String,
    pub ee_api_base_url: String,
    pub ee_access_token: Option<String>,
    pub ee_timeout_seconds: u64,
    pub static_root: Option<PathBuf>,
    pub datasets: DatasetHandles,
}

impl std::fmt::Debug for AtlasConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtlasConfig")
            .field("ee_project", &self.ee_project)
            .field("ee_api_base_url", &self.ee_api_base_url)
            .field(
                "ee_access_token",
                &self.ee_access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("ee_timeout_seconds", &self.ee_timeout_seconds)
            .field("static_root", &self.static_root)
            .field("datasets", &self.datasets)
            .finish()
    }
}

impl AtlasConfig {
    pub fn from_env(cli_static_root: Option<PathBuf>) -> Result<Self> {
        let lookup = |key: &str| std::env::var(key).ok();
        let overrides = load_setup_config_overrides(&setup_config_path(&lookup));
        Self::from_sources(&lookup, overrides.unwrap_or_default(), cli_static_root)
    }

    /// Environment values win over the setup file; the CLI wins over both
    /// for the static root.
    fn from_sources(
        lookup: &dyn Fn(&str) -> Option<String>,
        overrides: SetupConfigOverrides,
        cli_static_root: Option<PathBuf>,
    ) -> Result<Self> {
        let env = EnvSource { lookup };

        let ee_project = env
            .optional_string("ATLAS_EE_PROJECT")
            .or_else(|| non_empty(overrides.ee_project))
            .context("ATLAS_EE_PROJECT must be set (or present as ee_project in the setup config)")?;
        let ee_api_base_url = env
            .optional_string("ATLAS_EE_API_BASE_URL")
            .or_else(|| non_empty(overrides.ee_api_base_url))
            .unwrap_or_else(|| DEFAULT_EE_API_BASE_URL.to_string());
        if !ee_api_base_url.starts_with("http://") && !ee_api_base_url.starts_with("https://") {
            anyhow::bail!("ATLAS_EE_API_BASE_URL must be an http(s) URL, got {ee_api_base_url}");
        }
        let ee_access_token = env
            .optional_string("ATLAS_EE_ACCESS_TOKEN")
            .or_else(|| non_empty(overrides.ee_access_token));
        let ee_timeout_seconds = env
            .optional_u64("ATLAS_EE_TIMEOUT_SECONDS")
            .filter(|v| *v != 0)
            .or(overrides.ee_timeout_seconds.filter(|v| *v != 0))
            .unwrap_or(DEFAULT_EE_TIMEOUT_SECONDS);
        let static_root = cli_static_root
            .or_else(|| env.optional_string("ATLAS_STATIC_ROOT").map(PathBuf::from))
            .or_else(|| non_empty(overrides.static_root).map(PathBuf::from));

        let defaults = DatasetHandles::default();
        let datasets = DatasetHandles {
            boundaries: env.asset(
                "ATLAS_BOUNDARY_ASSET",
                overrides.boundary_asset,
                defaults.boundaries,
            ),
            landcover: env.asset(
                "ATLAS_LANDCOVER_ASSET",
                overrides.landcover_asset,
                defaults.landcover,
            ),
            elevation: env.asset(
                "ATLAS_ELEVATION_ASSET",
                overrides.elevation_asset,
                defaults.elevation,
            ),
            rivers: env.asset("ATLAS_RIVERS_ASSET", overrides.rivers_asset, defaults.rivers),
            surface_water: env.asset(
                "ATLAS_SURFACE_WATER_ASSET",
                overrides.surface_water_asset,
                defaults.surface_water,
            ),
        };

        Ok(Self {
            ee_project,
            ee_api_base_url,
            ee_access_token,
            ee_timeout_seconds,
            static_root,
            datasets,
        })
    }
}

struct EnvSource<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl EnvSource<'_> {
    fn optional_string(&self, key: &str) -> Option<String> {
        non_empty((self.lookup)(key))
    }

    fn optional_u64(&self, key: &str) -> Option<u64> {
        let raw = self.optional_string(key)?;
        match raw.parse::<u64>() {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(key, value = %raw, error = %err, "ignoring invalid integer");
                None
            }
        }
    }

    fn asset(&self, key: &str, file_value: Option<String>, default: String) -> String {
        self.optional_string(key)
            .or_else(|| non_empty(file_value))
            .unwrap_or(default)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
