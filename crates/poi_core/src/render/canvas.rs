use std::io::Cursor;

use image::{ImageFormat, ImageResult, Rgba, RgbaImage};

use crate::config::MapExtent;
use crate::geometry::Point2;

use super::colormap::Colormap;

pub const BACKGROUND: [u8; 3] = [0, 0, 0];

/// Square plot of a world extent with a colorbar band on the right.
/// World y grows up; pixel y grows down.
pub struct Canvas {
    image: RgbaImage,
    extent: MapExtent,
    plot_px: u32,
}

impl Canvas {
    pub fn new(plot_px: u32, extent: MapExtent) -> Self {
        let width = plot_px + colorbar_band_px(plot_px);
        let [r, g, b] = BACKGROUND;
        Self {
            image: RgbaImage::from_pixel(width, plot_px, Rgba([r, g, b, 255])),
            extent,
            plot_px,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn plot_px(&self) -> u32 {
        self.plot_px
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.image.get_pixel_checked(x, y).map(|pixel| pixel.0)
    }

    /// Continuous pixel coordinates; not clipped to the plot.
    pub fn world_to_pixel(&self, world: Point2) -> (f64, f64) {
        let size = f64::from(self.plot_px);
        let x = (world.x - self.extent.min_x) / self.extent.width() * size;
        let y = size - (world.y - self.extent.min_y) / self.extent.height() * size;
        (x, y)
    }

    fn world_to_pixel_i32(&self, world: Point2) -> (i32, i32) {
        let (x, y) = self.world_to_pixel(world);
        (x.floor() as i32, y.floor() as i32)
    }

    /// Alpha-blends onto the plot area; pixels outside it are dropped.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: [u8; 3], alpha: f64) {
        if x < 0 || y < 0 || x >= self.plot_px as i32 || y >= self.plot_px as i32 {
            return;
        }
        let alpha = alpha.clamp(0.0, 1.0);
        let pixel = self.image.get_pixel_mut(x as u32, y as u32);
        for (channel, src) in pixel.0.iter_mut().zip(color) {
            let blended = f64::from(*channel) * (1.0 - alpha) + f64::from(src) * alpha;
            *channel = blended.round() as u8;
        }
        pixel.0[3] = 255;
    }

    pub fn scatter(&mut self, points: &[Point2], color: [u8; 3], alpha: f64) {
        for point in points {
            if !point.x.is_finite() || !point.y.is_finite() {
                continue;
            }
            let (x, y) = self.world_to_pixel_i32(*point);
            self.blend_pixel(x, y, color, alpha);
        }
    }

    /// Even-odd scanline fill sampled at pixel centers.
    pub fn fill_polygon(&mut self, polygon: &[Point2], color: [u8; 3], alpha: f64) {
        if polygon.len() < 3 {
            return;
        }
        let vertices = polygon
            .iter()
            .map(|point| self.world_to_pixel(*point))
            .collect::<Vec<_>>();
        let mut crossings = Vec::<f64>::new();
        for row in 0..self.plot_px as i32 {
            let yc = f64::from(row) + 0.5;
            crossings.clear();
            for (i, a) in vertices.iter().enumerate() {
                let b = vertices[(i + 1) % vertices.len()];
                if (a.1 <= yc) != (b.1 <= yc) {
                    crossings.push(a.0 + (yc - a.1) * (b.0 - a.0) / (b.1 - a.1));
                }
            }
            crossings.sort_by(f64::total_cmp);
            for span in crossings.chunks_exact(2) {
                let start = (span[0] - 0.5).ceil() as i32;
                let end = (span[1] - 0.5).floor() as i32;
                for col in start.max(0)..=end.min(self.plot_px as i32 - 1) {
                    self.blend_pixel(col, row, color, alpha);
                }
            }
        }
    }

    pub fn stroke_polygon(&mut self, polygon: &[Point2], color: [u8; 3]) {
        for (i, a) in polygon.iter().enumerate() {
            let b = polygon[(i + 1) % polygon.len()];
            let from = self.world_to_pixel_i32(*a);
            let to = self.world_to_pixel_i32(b);
            self.draw_line(from, to, color);
        }
    }

    pub fn draw_line(&mut self, from: (i32, i32), to: (i32, i32), color: [u8; 3]) {
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let sx = if x < to.0 { 1 } else { -1 };
        let sy = if y < to.1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.blend_pixel(x, y, color, 1.0);
            if x == to.0 && y == to.1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    pub fn draw_marker(&mut self, world: Point2, half_size: i32, color: [u8; 3]) {
        let (cx, cy) = self.world_to_pixel_i32(world);
        for y in (cy - half_size)..=(cy + half_size) {
            for x in (cx - half_size)..=(cx + half_size) {
                self.blend_pixel(x, y, color, 1.0);
            }
        }
    }

    /// Fills a pixel-space rectangle of the plot, half-open on both axes.
    pub fn fill_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: [u8; 3]) {
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend_pixel(x, y, color, 1.0);
            }
        }
    }

    /// Vertical gradient in the band right of the plot, top = 1.0.
    pub fn draw_colorbar(&mut self, colormap: Colormap) {
        let band = colorbar_band_px(self.plot_px);
        let x0 = self.plot_px + band / 3;
        let x1 = (self.plot_px + band * 2 / 3).max(x0 + 1);
        let margin = self.plot_px / 20;
        let top = margin;
        let bottom = self.plot_px.saturating_sub(margin).max(top + 1);
        let span = f64::from(bottom - top - 1).max(1.0);
        for y in top..bottom {
            let t = 1.0 - f64::from(y - top) / span;
            let [r, g, b] = colormap.sample(t);
            for x in x0..x1.min(self.image.width()) {
                self.image.put_pixel(x, y, Rgba([r, g, b, 255]));
            }
        }
    }

    pub fn encode_png(&self) -> ImageResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

fn colorbar_band_px(plot_px: u32) -> u32 {
    (plot_px / 10).max(6)
}
