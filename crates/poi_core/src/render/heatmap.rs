use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::analysis::AnalysisReport;
use crate::catalog::{Zone, ZoneCatalog};
use crate::config::{MapExtent, RenderConfig};
use crate::geometry::Point2;
use crate::staging::write_output;

use super::canvas::Canvas;
use super::colormap::{normalize, Colormap};

pub const RAW_DEATH_DENSITY_FILE: &str = "heatmap_raw_death_density.png";

const SCATTER_COLOR: [u8; 3] = [128, 128, 128];
const SCATTER_ALPHA: f64 = 0.35;
const ZONE_FILL_ALPHA: f64 = 0.8;
const ZONE_OUTLINE: [u8; 3] = [255, 255, 255];
const DENSITY_OUTLINE: [u8; 3] = [0, 255, 255];

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to encode heatmap {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to write heatmap {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatmapMetric {
    LandingCount,
    SurvivalScore,
    DeathCount,
    DeathLocationCount,
}

impl HeatmapMetric {
    pub const ALL: [Self; 4] = [
        Self::LandingCount,
        Self::SurvivalScore,
        Self::DeathCount,
        Self::DeathLocationCount,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Self::LandingCount => "heatmap_landing_count.png",
            Self::SurvivalScore => "heatmap_survival_score.png",
            Self::DeathCount => "heatmap_death_count.png",
            Self::DeathLocationCount => "heatmap_death_location_count.png",
        }
    }

    pub fn colormap(self) -> Colormap {
        match self {
            Self::LandingCount => Colormap::Viridis,
            Self::SurvivalScore => Colormap::Magma,
            Self::DeathCount | Self::DeathLocationCount => Colormap::Hot,
        }
    }

    /// Per-zone values for this metric, in catalog order.
    fn zone_values<'a>(self, report: &'a AnalysisReport) -> Vec<(&'a str, f64)> {
        match self {
            Self::LandingCount => report
                .zone_aggregates
                .iter()
                .map(|agg| (agg.zone_name.as_str(), agg.landing_count as f64))
                .collect(),
            Self::SurvivalScore => report
                .zone_aggregates
                .iter()
                .map(|agg| (agg.zone_name.as_str(), agg.survival_score))
                .collect(),
            Self::DeathCount => report
                .zone_aggregates
                .iter()
                .map(|agg| (agg.zone_name.as_str(), agg.death_count as f64))
                .collect(),
            Self::DeathLocationCount => report
                .death_locations
                .iter()
                .map(|death| (death.zone_name.as_str(), death.death_count as f64))
                .collect(),
        }
    }

    fn scatter_points(self, report: &AnalysisReport) -> Vec<Point2> {
        match self {
            Self::LandingCount | Self::SurvivalScore => report
                .landings
                .iter()
                .map(|landing| landing.landing.position())
                .collect(),
            Self::DeathCount | Self::DeathLocationCount => death_positions(report),
        }
    }
}

/// Writes one PNG per [`HeatmapMetric`] plus the raw death density image into
/// `out_dir` and returns the written paths.
pub fn render_heatmaps(
    report: &AnalysisReport,
    catalog: &ZoneCatalog,
    config: &RenderConfig,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, RenderError> {
    let mut written = Vec::with_capacity(HeatmapMetric::ALL.len() + 1);
    for metric in HeatmapMetric::ALL {
        let values = metric
            .zone_values(report)
            .into_iter()
            .filter_map(|(name, value)| catalog.zone(name).map(|zone| (zone, value)))
            .collect::<Vec<_>>();
        let canvas = draw_zone_heatmap(
            &values,
            &metric.scatter_points(report),
            metric.colormap(),
            config,
        );
        let path = out_dir.join(metric.file_name());
        write_png(&canvas, &path)?;
        info!(
            metric = ?metric,
            zone_count = values.len(),
            path = %path.display(),
            "heatmap_written"
        );
        written.push(path);
    }

    let deaths = death_positions(report);
    let canvas = draw_death_density(catalog, &deaths, config);
    let path = out_dir.join(RAW_DEATH_DENSITY_FILE);
    write_png(&canvas, &path)?;
    info!(
        death_count = deaths.len(),
        bins = config.density_bins,
        path = %path.display(),
        "death_density_written"
    );
    written.push(path);
    Ok(written)
}

pub fn draw_zone_heatmap(
    values: &[(&Zone, f64)],
    scatter: &[Point2],
    colormap: Colormap,
    config: &RenderConfig,
) -> Canvas {
    let mut canvas = Canvas::new(config.image_size_px, config.extent);
    canvas.scatter(scatter, SCATTER_COLOR, SCATTER_ALPHA);

    let raw = values.iter().map(|(_, value)| *value).collect::<Vec<_>>();
    let normalized = normalize(&raw);
    for ((zone, _), t) in values.iter().zip(normalized) {
        canvas.fill_polygon(&zone.polygon, colormap.sample(t), ZONE_FILL_ALPHA);
        canvas.stroke_polygon(&zone.polygon, ZONE_OUTLINE);
        if let Some(centroid) = zone.centroid() {
            canvas.draw_marker(centroid, marker_half_size(config.image_size_px), ZONE_OUTLINE);
        }
    }
    canvas.draw_colorbar(colormap);
    canvas
}

pub fn draw_death_density(
    catalog: &ZoneCatalog,
    deaths: &[Point2],
    config: &RenderConfig,
) -> Canvas {
    let mut canvas = Canvas::new(config.image_size_px, config.extent);
    let bins = config.density_bins;
    let counts = density_histogram(deaths, &config.extent, bins);
    let max = counts.iter().copied().max().unwrap_or(0);

    let plot = i64::from(canvas.plot_px());
    let edge = |i: u32| (i64::from(i) * plot / i64::from(bins)) as i32;
    for by in 0..bins {
        for bx in 0..bins {
            let count = counts[(by * bins + bx) as usize];
            if count == 0 {
                continue;
            }
            let color = Colormap::Hot.sample(f64::from(count) / f64::from(max));
            let top = plot as i32 - edge(by + 1);
            let bottom = plot as i32 - edge(by);
            canvas.fill_rect(edge(bx), top, edge(bx + 1), bottom, color);
        }
    }
    for zone in catalog.zones() {
        canvas.stroke_polygon(&zone.polygon, DENSITY_OUTLINE);
    }
    canvas.draw_colorbar(Colormap::Hot);
    canvas
}

/// Row-major `bins x bins` counts, row 0 at `min_y`. Points outside the
/// extent are dropped; the max edge is inclusive.
pub fn density_histogram(points: &[Point2], extent: &MapExtent, bins: u32) -> Vec<u32> {
    let mut counts = vec![0u32; (bins as usize) * (bins as usize)];
    if bins == 0 {
        return counts;
    }
    let bin_of = |value: f64, min: f64, span: f64| -> Option<u32> {
        if !value.is_finite() || value < min || value > min + span {
            return None;
        }
        let idx = ((value - min) / span * f64::from(bins)).floor() as u32;
        Some(idx.min(bins - 1))
    };
    for point in points {
        let (Some(bx), Some(by)) = (
            bin_of(point.x, extent.min_x, extent.width()),
            bin_of(point.y, extent.min_y, extent.height()),
        ) else {
            continue;
        };
        counts[(by * bins + bx) as usize] += 1;
    }
    counts
}

fn death_positions(report: &AnalysisReport) -> Vec<Point2> {
    report
        .outcomes
        .iter()
        .filter(|outcome| outcome.died)
        .map(|outcome| outcome.final_position)
        .collect()
}

fn marker_half_size(image_size_px: u32) -> i32 {
    (image_size_px / 300).max(1) as i32
}

fn write_png(canvas: &Canvas, path: &Path) -> Result<(), RenderError> {
    let bytes = canvas.encode_png().map_err(|source| RenderError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    write_output(path, &bytes).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })
}
