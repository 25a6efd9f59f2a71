use serde::{Deserialize, Serialize};

const ON_EDGE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point2,
    pub max: Point2,
}

impl BoundingBox {
    pub fn of(points: &[Point2]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Self {
            min: *first,
            max: *first,
        };
        for point in &points[1..] {
            bounds.min.x = bounds.min.x.min(point.x);
            bounds.min.y = bounds.min.y.min(point.y);
            bounds.max.x = bounds.max.x.max(point.x);
            bounds.max.y = bounds.max.y.max(point.y);
        }
        Some(bounds)
    }

    pub fn contains(&self, point: Point2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }
}

/// Even-odd (ray casting) containment test. Points lying on an edge or a
/// vertex count as contained. The ring is closed implicitly; a repeated
/// closing vertex is harmless.
pub fn point_in_polygon(point: Point2, polygon: &[Point2]) -> bool {
    if polygon.len() < 3 || !point.x.is_finite() || !point.y.is_finite() {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[j];
        if on_segment(point, a, b) {
            return true;
        }
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn on_segment(point: Point2, a: Point2, b: Point2) -> bool {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length = (dx * dx + dy * dy).sqrt();
    if length == 0.0 {
        return point.x == a.x && point.y == a.y;
    }
    let cross = (point.x - a.x) * dy - (point.y - a.y) * dx;
    if (cross / length).abs() > ON_EDGE_TOLERANCE * length.max(1.0) {
        return false;
    }
    let dot = (point.x - a.x) * dx + (point.y - a.y) * dy;
    dot >= 0.0 && dot <= length * length
}

/// Area-weighted centroid; falls back to the vertex mean for degenerate rings.
pub fn polygon_centroid(polygon: &[Point2]) -> Option<Point2> {
    if polygon.is_empty() {
        return None;
    }

    let mut twice_area = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let a = polygon[j];
        let b = polygon[i];
        let cross = a.x * b.y - b.x * a.y;
        twice_area += cross;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
        j = i;
    }

    if twice_area.abs() <= f64::EPSILON {
        let count = polygon.len() as f64;
        let sum = polygon.iter().fold(Point2::default(), |acc, p| Point2 {
            x: acc.x + p.x,
            y: acc.y + p.y,
        });
        return Some(Point2::new(sum.x / count, sum.y / count));
    }

    Some(Point2::new(cx / (3.0 * twice_area), cy / (3.0 * twice_area)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 10.0),
            Point2::new(10.0, 10.0),
            Point2::new(10.0, 0.0),
        ]
    }

    fn concave_l() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(6.0, 0.0),
            Point2::new(6.0, 2.0),
            Point2::new(2.0, 2.0),
            Point2::new(2.0, 6.0),
            Point2::new(0.0, 6.0),
        ]
    }

    #[test]
    fn centroid_of_square_is_contained() {
        let polygon = square();
        let centroid = polygon_centroid(&polygon).expect("centroid");
        assert!((centroid.x - 5.0).abs() < 1e-12);
        assert!((centroid.y - 5.0).abs() < 1e-12);
        assert!(point_in_polygon(centroid, &polygon));
    }

    #[test]
    fn far_point_is_outside() {
        assert!(!point_in_polygon(Point2::new(1.0e9, -1.0e9), &square()));
        assert!(!point_in_polygon(Point2::new(-0.5, 5.0), &square()));
    }

    #[test]
    fn edges_and_vertices_count_as_contained() {
        let polygon = square();
        assert!(point_in_polygon(Point2::new(0.0, 5.0), &polygon));
        assert!(point_in_polygon(Point2::new(10.0, 10.0), &polygon));
        assert!(point_in_polygon(Point2::new(5.0, 0.0), &polygon));
        assert!(point_in_polygon(Point2::new(10.0, 3.0), &polygon));
    }

    #[test]
    fn concave_notch_is_outside() {
        let polygon = concave_l();
        assert!(point_in_polygon(Point2::new(1.0, 1.0), &polygon));
        assert!(point_in_polygon(Point2::new(5.0, 1.0), &polygon));
        assert!(point_in_polygon(Point2::new(1.0, 5.0), &polygon));
        assert!(!point_in_polygon(Point2::new(4.0, 4.0), &polygon));
    }

    #[test]
    fn winding_direction_does_not_matter() {
        let mut polygon = square();
        polygon.reverse();
        assert!(point_in_polygon(Point2::new(3.0, 7.0), &polygon));
        assert!(!point_in_polygon(Point2::new(13.0, 7.0), &polygon));
    }

    #[test]
    fn explicitly_closed_ring_behaves_like_open_ring() {
        let mut polygon = square();
        polygon.push(Point2::new(0.0, 0.0));
        assert!(point_in_polygon(Point2::new(2.0, 2.0), &polygon));
        assert!(!point_in_polygon(Point2::new(12.0, 2.0), &polygon));
    }

    #[test]
    fn degenerate_inputs_are_never_contained() {
        let line = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)];
        assert!(!point_in_polygon(Point2::new(0.5, 0.5), &line));
        assert!(!point_in_polygon(Point2::new(f64::NAN, 1.0), &square()));
    }

    #[test]
    fn bounding_box_covers_all_vertices() {
        let bounds = BoundingBox::of(&concave_l()).expect("bounds");
        assert_eq!(bounds.min, Point2::new(0.0, 0.0));
        assert_eq!(bounds.max, Point2::new(6.0, 6.0));
        assert!(bounds.contains(Point2::new(4.0, 4.0)));
        assert!(!bounds.contains(Point2::new(7.0, 4.0)));
        assert!(BoundingBox::of(&[]).is_none());
    }
}
