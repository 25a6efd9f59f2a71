use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod analysis;
pub mod catalog;
pub mod config;
pub mod crumbs;
pub mod extract;
pub mod geometry;
pub mod hashing;
pub mod render;
mod staging;

pub use analysis::{
    analyze, run_analysis, AnalysisError, AnalysisReport, AnalysisRun, DeathLocationAggregate,
    NoBreadcrumbsError, PlayerLanding, PlayerOutcome, RunManifest, RunTotals, ZoneAggregate,
};
pub use catalog::{load_zone_catalog, CatalogError, Zone, ZoneCatalog};
pub use config::{AnalysisConfig, ConfigError, MapExtent, RenderConfig};
pub use crumbs::{load_breadcrumbs, Breadcrumb, BreadcrumbError, BreadcrumbTable};
pub use extract::{extract_breadcrumbs, ExtractError, ExtractSummary, DEFAULT_CHUNK_SIZE};
pub use geometry::{point_in_polygon, polygon_centroid, Point2};
pub use render::RenderError;

/// A required input file does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{role} input not found at {path}")]
pub struct MissingInputError {
    pub role: &'static str,
    pub path: PathBuf,
}

impl MissingInputError {
    pub fn new(role: &'static str, path: &Path) -> Self {
        Self {
            role,
            path: path.to_path_buf(),
        }
    }
}
