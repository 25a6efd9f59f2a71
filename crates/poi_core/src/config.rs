use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_LANDING_WINDOW: usize = 45;
pub const DEFAULT_DEFEAT_LIFE_THRESHOLD: f64 = 0.0;
pub const DEFAULT_MAP_HALF_EXTENT: f64 = 70_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub catalog_path: PathBuf,
    pub breadcrumbs_path: PathBuf,
    pub output_dir: PathBuf,
    /// Time steps after a player's first breadcrumb searched for the landing
    /// point (inclusive).
    pub landing_window: usize,
    /// A final life value at or below this marks the player as defeated.
    pub defeat_life_threshold: f64,
    pub render: RenderConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("CalderaCoordinates.csv"),
            breadcrumbs_path: PathBuf::from("caldera_breadcrumbs.csv"),
            output_dir: PathBuf::from("reports"),
            landing_window: DEFAULT_LANDING_WINDOW,
            defeat_life_threshold: DEFAULT_DEFEAT_LIFE_THRESHOLD,
            render: RenderConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub enabled: bool,
    pub image_size_px: u32,
    pub extent: MapExtent,
    pub density_bins: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            image_size_px: 1200,
            extent: MapExtent::default(),
            density_bins: 250,
        }
    }
}

/// World window drawn by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapExtent {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Default for MapExtent {
    fn default() -> Self {
        Self {
            min_x: -DEFAULT_MAP_HALF_EXTENT,
            max_x: DEFAULT_MAP_HALF_EXTENT,
            min_y: -DEFAULT_MAP_HALF_EXTENT,
            max_y: DEFAULT_MAP_HALF_EXTENT,
        }
    }
}

impl MapExtent {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("landing_window must be at least 1")]
    ZeroLandingWindow,
    #[error("defeat_life_threshold must be finite")]
    NonFiniteThreshold,
    #[error("render.image_size_px must be between 16 and 16384, got {0}")]
    ImageSize(u32),
    #[error("render.density_bins must be between 1 and 4096, got {0}")]
    DensityBins(u32),
    #[error("render.extent must be finite with min < max on both axes")]
    InvalidExtent,
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.landing_window == 0 {
            return Err(ConfigError::ZeroLandingWindow);
        }
        if !self.defeat_life_threshold.is_finite() {
            return Err(ConfigError::NonFiniteThreshold);
        }
        let render = &self.render;
        if !(16..=16_384).contains(&render.image_size_px) {
            return Err(ConfigError::ImageSize(render.image_size_px));
        }
        if !(1..=4_096).contains(&render.density_bins) {
            return Err(ConfigError::DensityBins(render.density_bins));
        }
        let extent = render.extent;
        let finite = [extent.min_x, extent.max_x, extent.min_y, extent.max_y]
            .iter()
            .all(|value| value.is_finite());
        if !finite || extent.width() <= 0.0 || extent.height() <= 0.0 {
            return Err(ConfigError::InvalidExtent);
        }
        Ok(())
    }

    /// Joins every relative path onto `base_dir`; absolute paths are kept.
    pub fn resolved_against(&self, base_dir: &Path) -> Self {
        let resolve = |path: &Path| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                base_dir.join(path)
            }
        };
        Self {
            catalog_path: resolve(&self.catalog_path),
            breadcrumbs_path: resolve(&self.breadcrumbs_path),
            output_dir: resolve(&self.output_dir),
            ..self.clone()
        }
    }
}
