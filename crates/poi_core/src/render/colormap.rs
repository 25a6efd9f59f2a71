type Stop = (f64, [u8; 3]);

const VIRIDIS: [Stop; 9] = [
    (0.0, [68, 1, 84]),
    (0.125, [71, 44, 122]),
    (0.25, [59, 81, 139]),
    (0.375, [44, 113, 142]),
    (0.5, [33, 144, 141]),
    (0.625, [39, 173, 129]),
    (0.75, [92, 200, 99]),
    (0.875, [170, 220, 50]),
    (1.0, [253, 231, 37]),
];

const MAGMA: [Stop; 9] = [
    (0.0, [0, 0, 4]),
    (0.125, [28, 16, 68]),
    (0.25, [79, 18, 123]),
    (0.375, [129, 37, 129]),
    (0.5, [181, 54, 122]),
    (0.625, [229, 80, 100]),
    (0.75, [251, 135, 97]),
    (0.875, [254, 194, 135]),
    (1.0, [252, 253, 191]),
];

const HOT: [Stop; 4] = [
    (0.0, [11, 0, 0]),
    (0.365, [255, 0, 0]),
    (0.746, [255, 255, 0]),
    (1.0, [255, 255, 255]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colormap {
    Viridis,
    Magma,
    Hot,
}

impl Colormap {
    fn stops(self) -> &'static [Stop] {
        match self {
            Self::Viridis => &VIRIDIS,
            Self::Magma => &MAGMA,
            Self::Hot => &HOT,
        }
    }

    /// Piecewise-linear lookup; `t` is clamped to `[0, 1]` and NaN maps to 0.
    pub fn sample(self, t: f64) -> [u8; 3] {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let stops = self.stops();
        for pair in stops.windows(2) {
            let (t0, c0) = pair[0];
            let (t1, c1) = pair[1];
            if t <= t1 {
                let frac = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
                return lerp_rgb(c0, c1, frac);
            }
        }
        stops.last().map(|(_, color)| *color).unwrap_or([0, 0, 0])
    }
}

fn lerp_rgb(a: [u8; 3], b: [u8; 3], frac: f64) -> [u8; 3] {
    let mix = |x: u8, y: u8| (f64::from(x) + (f64::from(y) - f64::from(x)) * frac).round() as u8;
    [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])]
}

/// Maps `values` onto `[0, 1]` by min/max. Everything maps to 0 when all
/// values are equal.
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let Some(first) = values.first() else {
        return Vec::new();
    };
    let (min, max) = values
        .iter()
        .fold((*first, *first), |(min, max), v| (min.min(*v), max.max(*v)));
    let span = max - min;
    values
        .iter()
        .map(|v| if span > 0.0 { (v - min) / span } else { 0.0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_hit_first_and_last_stop() {
        assert_eq!(Colormap::Viridis.sample(0.0), [68, 1, 84]);
        assert_eq!(Colormap::Viridis.sample(1.0), [253, 231, 37]);
        assert_eq!(Colormap::Magma.sample(2.0), [252, 253, 191]);
        assert_eq!(Colormap::Hot.sample(-1.0), [11, 0, 0]);
        assert_eq!(Colormap::Hot.sample(f64::NAN), [11, 0, 0]);
    }

    #[test]
    fn midpoints_interpolate_between_stops() {
        assert_eq!(Colormap::Hot.sample(0.746), [255, 255, 0]);
        let between = Colormap::Hot.sample(0.873);
        assert_eq!(between[0], 255);
        assert_eq!(between[1], 255);
        assert!(between[2] > 100 && between[2] < 155);
    }

    #[test]
    fn normalize_spans_unit_interval() {
        assert_eq!(normalize(&[2.0, 4.0, 3.0]), vec![0.0, 1.0, 0.5]);
        assert_eq!(normalize(&[7.0, 7.0]), vec![0.0, 0.0]);
        assert!(normalize(&[]).is_empty());
    }
}
