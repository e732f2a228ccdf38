//! Domain core for the pharmacy delivery planner: configuration, the
//! point-of-sale registry, and the pure planning functions (proximity filter,
//! route summary, viewport) that the server and CLI build on.

pub mod app_config;
pub mod catalog;
pub mod columns;
pub mod config;
pub mod coordinate;
pub mod proximity;
pub mod registry;
pub mod route;
pub mod selection;
pub mod viewport;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use catalog::{layers_for, Area, Overlay, OverlayKind, AREAS, OVERLAYS};
pub use columns::{load_column_mapping, ColumnMapping};
pub use config::{load_app_config, load_app_config_from_env};
pub use coordinate::Coordinate;
pub use proximity::{filter_within_radius, nearby, Nearby, NearbyPointOfSale};
pub use registry::{load_registry, OpeningHours, PointOfSale, Registry, RegistryError};
pub use route::{format_km, summarize, RouteSummary};
pub use selection::{OverlayToggles, Phase, SelectionState, Suggestion};
pub use viewport::{map_center, zoom_for_radius};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error(
        "no Google Maps API key found; set GOOGLE_API_KEY or GOOGLE_MAPS_API_KEY in the secrets file or the environment"
    )]
    MissingApiKey,

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse secrets file {path}: {source}")]
    SecretsParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to parse column mapping: {0}")]
    ColumnMappingParse(#[from] serde_yaml::Error),

    #[error("column mapping validation error: {0}")]
    Validation(String),
}
