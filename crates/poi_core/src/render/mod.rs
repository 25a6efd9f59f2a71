mod canvas;
mod colormap;
mod heatmap;

pub use canvas::Canvas;
pub use colormap::{normalize, Colormap};
pub use heatmap::{
    density_histogram, draw_death_density, draw_zone_heatmap, render_heatmaps, HeatmapMetric,
    RenderError, RAW_DEATH_DENSITY_FILE,
};
