//! Point transformations between supported coordinate reference systems.

use hazard_common::{BoundingBox, Crs};

use crate::TransverseMercator;

/// Transforms points from a source CRS to a destination CRS.
///
/// Geographic coordinates use x = longitude, y = latitude (degrees).
/// Every transformation goes through WGS84 geographic coordinates, which is
/// exact here because all supported systems share the WGS84 datum.
#[derive(Debug, Clone)]
pub struct CoordinateTransform {
    src: Crs,
    dst: Crs,
    src_proj: Option<TransverseMercator>,
    dst_proj: Option<TransverseMercator>,
}

impl CoordinateTransform {
    pub fn new(src: Crs, dst: Crs) -> Self {
        Self {
            src,
            dst,
            src_proj: projection_for(src),
            dst_proj: projection_for(dst),
        }
    }

    pub fn source(&self) -> Crs {
        self.src
    }

    pub fn destination(&self) -> Crs {
        self.dst
    }

    /// True when source and destination are the same system.
    pub fn is_identity(&self) -> bool {
        self.src == self.dst
    }

    /// Transform a single point.
    pub fn transform(&self, x: f64, y: f64) -> (f64, f64) {
        if self.is_identity() {
            return (x, y);
        }

        let (lon, lat) = match &self.src_proj {
            Some(proj) => {
                let (lat, lon) = proj.inverse(x, y);
                (lon, lat)
            }
            None => (x, y),
        };

        match &self.dst_proj {
            Some(proj) => proj.forward(lat, lon),
            None => (lon, lat),
        }
    }

    /// The inverse transformation (destination back to source).
    pub fn inverse(&self) -> CoordinateTransform {
        CoordinateTransform::new(self.dst, self.src)
    }

    /// Transform a bounding box by densifying its edges.
    ///
    /// The edges of a box are curved in the other system, so each edge is
    /// sampled at `samples` intervals and the enclosing box of all
    /// transformed points is returned.
    pub fn transform_bounds(&self, bbox: &BoundingBox, samples: usize) -> BoundingBox {
        if self.is_identity() {
            return *bbox;
        }

        let samples = samples.max(1);
        let mut points = Vec::with_capacity(4 * (samples + 1));

        for t in 0..=samples {
            let frac = t as f64 / samples as f64;
            let x = bbox.min_x + frac * bbox.width();
            let y = bbox.min_y + frac * bbox.height();

            // Bottom and top edges
            points.push(self.transform(x, bbox.min_y));
            points.push(self.transform(x, bbox.max_y));
            // Left and right edges
            points.push(self.transform(bbox.min_x, y));
            points.push(self.transform(bbox.max_x, y));
        }

        // Non-empty by construction
        BoundingBox::from_points(points).unwrap_or(*bbox)
    }
}

fn projection_for(crs: Crs) -> Option<TransverseMercator> {
    match crs {
        Crs::Wgs84 => None,
        Crs::Utm { zone, north } => Some(TransverseMercator::utm(zone, north)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let t = CoordinateTransform::new(Crs::UTM_45N, Crs::UTM_45N);
        assert!(t.is_identity());
        assert_eq!(t.transform(123.0, 456.0), (123.0, 456.0));
    }

    #[test]
    fn test_geographic_to_utm_and_back() {
        let t = CoordinateTransform::new(Crs::Wgs84, Crs::UTM_45N);
        let (e, n) = t.transform(85.3240, 27.7172);
        assert!((e - 334_770.0).abs() < 1.0, "easting {}", e);
        assert!((n - 3_067_000.0).abs() < 1.0, "northing {}", n);

        let (lon, lat) = t.inverse().transform(e, n);
        assert!((lon - 85.3240).abs() < 1e-7);
        assert!((lat - 27.7172).abs() < 1e-7);
    }

    #[test]
    fn test_transform_bounds_encloses_corners() {
        let t = CoordinateTransform::new(Crs::Wgs84, Crs::UTM_45N);
        let geo = BoundingBox::new(85.0, 27.0, 86.0, 28.0);
        let utm = t.transform_bounds(&geo, 16);

        for (lon, lat) in [(85.0, 27.0), (86.0, 27.0), (85.0, 28.0), (86.0, 28.0)] {
            let (x, y) = t.transform(lon, lat);
            assert!(utm.contains_point(x, y));
        }
        assert!(utm.width() > 90_000.0 && utm.width() < 110_000.0);
    }
}
