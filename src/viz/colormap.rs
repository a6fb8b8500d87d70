//! Colormaps that turn per-vertex quantities into RGB colors.
//!
//! All colors are linear RGB in `[0, 1]`.

use crate::algo::parameterize::UVMap;

use super::DataType;

/// Color for values that are NaN or infinite in a scalar field.
pub const NON_FINITE_COLOR: [f32; 3] = [1.0, 0.0, 1.0];

/// Color for vertices a distance field never reached.
pub const UNREACHED_COLOR: [f32; 3] = [0.25, 0.25, 0.25];

/// Viridis samples at `t = 0, 1/8, ..., 1`.
const VIRIDIS: [[f32; 3]; 9] = [
    [0.267, 0.005, 0.329],
    [0.283, 0.141, 0.458],
    [0.254, 0.265, 0.530],
    [0.207, 0.372, 0.553],
    [0.164, 0.471, 0.558],
    [0.128, 0.567, 0.551],
    [0.135, 0.659, 0.518],
    [0.478, 0.821, 0.318],
    [0.993, 0.906, 0.144],
];

/// Sample viridis at `t`, clamped to `[0, 1]`.
pub fn viridis(t: f64) -> [f32; 3] {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (VIRIDIS.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let s = (scaled - i as f64) as f32;

    let (a, b) = (VIRIDIS[i], VIRIDIS[i + 1]);
    [
        a[0] + (b[0] - a[0]) * s,
        a[1] + (b[1] - a[1]) * s,
        a[2] + (b[2] - a[2]) * s,
    ]
}

/// Diverging blue-white-red map for `t` in `[-1, 1]`.
///
/// Saturated ends stay at 0.3 brightness so that both signs remain visible
/// under shading.
pub fn blue_white_red(t: f64) -> [f32; 3] {
    let t = if t.is_finite() { t.clamp(-1.0, 1.0) } else { 0.0 };
    let s = (0.3 + 0.7 * (1.0 - t.abs())) as f32;
    if t < 0.0 {
        [s, s, 1.0]
    } else {
        [1.0, s, s]
    }
}

/// Range spanned by the 5th to 95th percentile of the finite values.
///
/// Falls back to `(0, 1)` when there is nothing finite, and widens a
/// degenerate range to unit width.
pub fn robust_range(values: &[f64]) -> (f64, f64) {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return (0.0, 1.0);
    }
    sorted.sort_by(f64::total_cmp);

    let low = sorted[(sorted.len() as f64 * 0.05) as usize];
    let high = sorted[((sorted.len() as f64 * 0.95) as usize).min(sorted.len() - 1)];

    if (high - low).abs() < 1e-12 {
        (low - 0.5, high + 0.5)
    } else {
        (low, high)
    }
}

/// Colors for a scalar field.
///
/// `Standard` maps the robust range onto viridis. `Symmetric` centers a
/// blue-white-red map on zero, scaled by the 95th percentile of `|x|`.
/// `Magnitude` maps `|x|` from zero onto viridis.
pub fn scalar_colors(values: &[f64], data_type: DataType) -> Vec<[f32; 3]> {
    let color = |map: &dyn Fn(f64) -> [f32; 3], x: f64| {
        if x.is_finite() {
            map(x)
        } else {
            NON_FINITE_COLOR
        }
    };

    match data_type {
        DataType::Standard => {
            let (low, high) = robust_range(values);
            values
                .iter()
                .map(|&x| color(&|x| viridis((x - low) / (high - low)), x))
                .collect()
        }
        DataType::Symmetric => {
            let magnitudes: Vec<f64> = values.iter().map(|x| x.abs()).collect();
            let scale = positive_scale(&magnitudes);
            values
                .iter()
                .map(|&x| color(&|x| blue_white_red(x / scale), x))
                .collect()
        }
        DataType::Magnitude => {
            let magnitudes: Vec<f64> = values.iter().map(|x| x.abs()).collect();
            let scale = positive_scale(&magnitudes);
            magnitudes
                .iter()
                .map(|&x| color(&|x| viridis(x / scale), x))
                .collect()
        }
    }
}

fn positive_scale(magnitudes: &[f64]) -> f64 {
    let (_, high) = robust_range(magnitudes);
    if high > 1e-12 {
        high
    } else {
        1.0
    }
}

/// Colors for a distance field, with alternating bands every `stripe` units.
///
/// A non-positive `stripe` disables the bands.
pub fn distance_colors(values: &[f64], stripe: f64) -> Vec<[f32; 3]> {
    let max = values
        .iter()
        .copied()
        .filter(|d| d.is_finite())
        .fold(0.0f64, f64::max);
    let scale = if max > 0.0 { max } else { 1.0 };

    values
        .iter()
        .map(|&d| {
            if !d.is_finite() {
                return UNREACHED_COLOR;
            }
            let c = viridis(d / scale);
            if stripe > 0.0 && (d / stripe).floor() as i64 % 2 == 1 {
                [c[0] * 0.8, c[1] * 0.8, c[2] * 0.8]
            } else {
                c
            }
        })
        .collect()
}

/// Base tint for a parameterization: `u` drives red, `v` drives green.
///
/// The viewer overlays a checkerboard on top of this in the shader.
pub fn uv_colors(uv_map: &UVMap) -> Vec<[f32; 3]> {
    let Some((min, max)) = uv_map.bounding_box() else {
        return Vec::new();
    };
    let extent = (max.x - min.x).max(max.y - min.y).max(1e-12);

    uv_map
        .as_slice()
        .iter()
        .map(|uv| {
            let u = ((uv.x - min.x) / extent) as f32;
            let v = ((uv.y - min.y) / extent) as f32;
            [0.35 + 0.6 * u, 0.35 + 0.6 * v, 0.75]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-6)
    }

    #[test]
    fn test_viridis_ends() {
        assert!(close(viridis(0.0), VIRIDIS[0]));
        assert!(close(viridis(1.0), VIRIDIS[8]));
        assert!(close(viridis(-3.0), VIRIDIS[0]));
        assert!(close(viridis(0.5), VIRIDIS[4]));
    }

    #[test]
    fn test_symmetric_is_centered_on_zero() {
        let colors = scalar_colors(&[-2.0, 0.0, 2.0, f64::NAN], DataType::Symmetric);

        assert!(close(colors[1], [1.0, 1.0, 1.0]));
        // Negative is blue, positive is red
        assert!(colors[0][2] > colors[0][0]);
        assert!(colors[2][0] > colors[2][2]);
        assert_eq!(colors[3], NON_FINITE_COLOR);
    }

    #[test]
    fn test_constant_field() {
        let colors = scalar_colors(&[3.0; 5], DataType::Standard);
        assert!(colors.iter().all(|&c| close(c, colors[0])));
    }

    #[test]
    fn test_robust_range_ignores_outliers() {
        let mut values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        values.push(1e9);
        values.push(f64::INFINITY);

        let (low, high) = robust_range(&values);
        assert!(low >= 0.0);
        assert!(high < 1e9);
    }

    #[test]
    fn test_distance_stripes_and_unreached() {
        let colors = distance_colors(&[0.0, 1.5, 4.0, f64::INFINITY], 1.0);

        assert!(close(colors[0], viridis(0.0)));
        // 1.5 lies in an odd band, so it is darkened
        let plain = viridis(1.5 / 4.0);
        assert!(colors[1][1] < plain[1]);
        assert!(close(colors[2], viridis(1.0)));
        assert_eq!(colors[3], UNREACHED_COLOR);
    }

    #[test]
    fn test_uv_colors_follow_coordinates() {
        let uv_map = UVMap::new(vec![Point2::new(0.0, 0.0), Point2::new(2.0, 1.0)]);
        let colors = uv_colors(&uv_map);

        assert_eq!(colors.len(), 2);
        assert!(colors[1][0] > colors[0][0]);
        assert!(colors[1][1] > colors[0][1]);
        assert!(uv_colors(&UVMap::new(Vec::new())).is_empty());
    }
}
