//! Resampling kernels for warping.
//!
//! Positions are fractional pixel coordinates where pixel `(c, r)` covers
//! `[c, c + 1) x [r, r + 1)`, so its center sits at `(c + 0.5, r + 0.5)`.
//! Neighbors that are outside the band or hold nodata drop out and the
//! remaining kernel weights are renormalized.

use crate::types::ResampleAlg;

/// Read-only view of a band with its nodata value.
#[derive(Debug, Clone, Copy)]
pub struct Band<'a> {
    pub data: &'a [f64],
    pub width: usize,
    pub height: usize,
    pub nodata: Option<f64>,
}

impl<'a> Band<'a> {
    pub fn new(data: &'a [f64], width: usize, height: usize, nodata: Option<f64>) -> Self {
        Self {
            data,
            width,
            height,
            nodata,
        }
    }

    /// Value at a pixel if it is inside the band and valid.
    #[inline]
    fn valid(&self, col: isize, row: isize) -> Option<f64> {
        if col < 0 || row < 0 || col as usize >= self.width || row as usize >= self.height {
            return None;
        }
        let v = self.data[row as usize * self.width + col as usize];
        let is_nodata = match self.nodata {
            Some(nd) => v == nd,
            None => false,
        };
        if v.is_nan() || is_nodata {
            None
        } else {
            Some(v)
        }
    }

    fn covers(&self, x: f64, y: f64) -> bool {
        x >= 0.0 && y >= 0.0 && x < self.width as f64 && y < self.height as f64
    }
}

/// Sample the band at a fractional pixel position.
///
/// Returns `None` outside the band or when no valid neighbor contributes.
pub fn sample(alg: ResampleAlg, band: &Band, x: f64, y: f64) -> Option<f64> {
    if !x.is_finite() || !y.is_finite() || !band.covers(x, y) {
        return None;
    }

    match alg {
        ResampleAlg::Nearest => nearest(band, x, y),
        ResampleAlg::Bilinear => bilinear(band, x, y),
        ResampleAlg::Cubic => separable(band, x, y, catmull_rom_weights),
        ResampleAlg::CubicSpline => separable(band, x, y, bspline_weights),
    }
}

/// Nearest neighbor: the pixel containing the position.
pub fn nearest(band: &Band, x: f64, y: f64) -> Option<f64> {
    band.valid(x.floor() as isize, y.floor() as isize)
}

/// Bilinear interpolation between the four surrounding pixel centers.
pub fn bilinear(band: &Band, x: f64, y: f64) -> Option<f64> {
    let cx = x - 0.5;
    let cy = y - 0.5;
    let x0 = cx.floor();
    let y0 = cy.floor();
    let fx = cx - x0;
    let fy = cy - y0;

    convolve(
        band,
        x0 as isize,
        y0 as isize,
        &[1.0 - fx, fx],
        &[1.0 - fy, fy],
    )
}

fn separable(band: &Band, x: f64, y: f64, weights: fn(f64) -> [f64; 4]) -> Option<f64> {
    let cx = x - 0.5;
    let cy = y - 0.5;
    let x0 = cx.floor();
    let y0 = cy.floor();

    convolve(
        band,
        x0 as isize - 1,
        y0 as isize - 1,
        &weights(cx - x0),
        &weights(cy - y0),
    )
}

/// Weighted sum over the window starting at `(col0, row0)`.
fn convolve(band: &Band, col0: isize, row0: isize, wx: &[f64], wy: &[f64]) -> Option<f64> {
    let mut sum = 0.0;
    let mut weight = 0.0;

    for (j, &ky) in wy.iter().enumerate() {
        for (i, &kx) in wx.iter().enumerate() {
            let w = kx * ky;
            if w == 0.0 {
                continue;
            }
            if let Some(v) = band.valid(col0 + i as isize, row0 + j as isize) {
                sum += w * v;
                weight += w;
            }
        }
    }

    if weight.abs() < 1e-12 {
        None
    } else {
        Some(sum / weight)
    }
}

/// Catmull-Rom weights for the four taps around offset `t` in `[0, 1)`.
pub fn catmull_rom_weights(t: f64) -> [f64; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        0.5 * (-t3 + 2.0 * t2 - t),
        0.5 * (3.0 * t3 - 5.0 * t2 + 2.0),
        0.5 * (-3.0 * t3 + 4.0 * t2 + t),
        0.5 * (t3 - t2),
    ]
}

/// Uniform cubic B-spline weights. All non-negative, so never overshoots.
pub fn bspline_weights(t: f64) -> [f64; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    let u = 1.0 - t;
    [
        u * u * u / 6.0,
        (3.0 * t3 - 6.0 * t2 + 4.0) / 6.0,
        (-3.0 * t3 + 3.0 * t2 + 3.0 * t + 1.0) / 6.0,
        t3 / 6.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rustfmt::skip]
    const GRID: [f64; 9] = [
        1.0, 2.0, 3.0,
        4.0, 5.0, 6.0,
        7.0, 8.0, 9.0,
    ];

    fn band(data: &[f64], nodata: Option<f64>) -> Band<'_> {
        Band::new(data, 3, 3, nodata)
    }

    #[test]
    fn test_nearest() {
        let b = band(&GRID, None);
        assert_eq!(nearest(&b, 0.0, 0.0), Some(1.0));
        assert_eq!(nearest(&b, 1.5, 1.5), Some(5.0));
        assert_eq!(nearest(&b, 0.99, 1.01), Some(4.0));
        assert_eq!(sample(ResampleAlg::Nearest, &b, 3.0, 0.0), None);
        assert_eq!(sample(ResampleAlg::Nearest, &b, -0.1, 0.0), None);
    }

    #[test]
    fn test_bilinear_at_centers_and_between() {
        let b = band(&GRID, None);
        assert_eq!(bilinear(&b, 0.5, 0.5), Some(1.0));
        assert_eq!(bilinear(&b, 1.5, 1.5), Some(5.0));

        let mid = bilinear(&b, 1.0, 1.0).unwrap();
        assert!((mid - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_bilinear_skips_nodata() {
        #[rustfmt::skip]
        let data = [
            1.0, -9999.0, 3.0,
            3.0, 3.0,     6.0,
            7.0, 8.0,     9.0,
        ];
        let b = band(&data, Some(-9999.0));
        // Remaining three neighbors have equal weight
        let v = bilinear(&b, 1.0, 1.0).unwrap();
        assert!((v - 7.0 / 3.0).abs() < 1e-12);

        assert_eq!(sample(ResampleAlg::Nearest, &b, 1.5, 0.5), None);
    }

    #[test]
    fn test_bilinear_with_nan() {
        let data = [f64::NAN; 9];
        let b = band(&data, None);
        assert_eq!(bilinear(&b, 1.0, 1.0), None);
    }

    #[test]
    fn test_kernel_weights_sum_to_one() {
        for t in [0.0, 0.25, 0.5, 0.9] {
            let cr: f64 = catmull_rom_weights(t).iter().sum();
            let bs: f64 = bspline_weights(t).iter().sum();
            assert!((cr - 1.0).abs() < 1e-12);
            assert!((bs - 1.0).abs() < 1e-12);
        }
        assert_eq!(catmull_rom_weights(0.0), [0.0, 1.0, 0.0, 0.0]);
        assert!(bspline_weights(0.3).iter().all(|&w| w >= 0.0));
    }

    #[test]
    fn test_cubic_reproduces_linear_ramp() {
        // Catmull-Rom is exact for linear data away from the edges
        let data: Vec<f64> = (0..25).map(|i| (i % 5) as f64 * 2.0).collect();
        let b = Band::new(&data, 5, 5, None);
        let v = sample(ResampleAlg::Cubic, &b, 2.25, 2.5).unwrap();
        assert!((v - 3.5).abs() < 1e-12, "got {}", v);
    }

    #[test]
    fn test_cubic_spline_constant_field() {
        let data = [4.0; 9];
        let b = band(&data, None);
        for (x, y) in [(0.1, 0.1), (1.5, 1.5), (2.9, 0.7)] {
            let v = sample(ResampleAlg::CubicSpline, &b, x, y).unwrap();
            assert!((v - 4.0).abs() < 1e-12);
        }
    }
}
