//! Vector inputs: point layers bound from delimited tables and boundary
//! polygons read from GeoJSON.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use hazard_common::{BoundingBox, Crs};
use serde::Deserialize;
use tracing::debug;

use crate::error::{GridProcessorError, Result};

/// Column names bound to the x, y and z fields of a point layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointBinding {
    pub x: String,
    pub y: String,
    pub z: String,
}

impl PointBinding {
    pub fn new(x: impl Into<String>, y: impl Into<String>, z: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            z: z.into(),
        }
    }

    /// Longitude/latitude geometry with `value` as the z field.
    pub fn lon_lat(value: impl Into<String>) -> Self {
        Self::new("lon", "lat", value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Irregular points with one value each.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLayer {
    pub points: Vec<Point>,
    pub crs: Crs,
}

impl PointLayer {
    pub fn new(points: Vec<Point>, crs: Crs) -> Self {
        Self { points, crs }
    }

    /// Bind the columns of a delimited table on disk.
    pub fn from_csv(path: &Path, binding: &PointBinding, crs: Crs) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| GridProcessorError::open_failed(format!("{}: {}", path.display(), e)))?;
        let layer = Self::from_reader(file, binding, crs)?;
        debug!(
            path = %path.display(),
            z = %binding.z,
            points = layer.len(),
            "Bound point layer"
        );
        Ok(layer)
    }

    /// Bind the columns of a delimited table.
    ///
    /// Rows whose x, y or z cell is empty or not numeric carry no usable
    /// point and are skipped.
    pub fn from_reader<R: Read>(reader: R, binding: &PointBinding, crs: Crs) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = rdr.headers()?.clone();

        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| GridProcessorError::InvalidField(format!("no column named '{}'", name)))
        };
        let (xi, yi, zi) = (column(&binding.x)?, column(&binding.y)?, column(&binding.z)?);

        let mut points = Vec::new();
        let mut skipped = 0usize;
        for record in rdr.records() {
            let record = record?;
            let parse = |i: usize| record.get(i).and_then(|s| s.parse::<f64>().ok());
            match (parse(xi), parse(yi), parse(zi)) {
                (Some(x), Some(y), Some(z)) if z.is_finite() => points.push(Point { x, y, z }),
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!(skipped = skipped, z = %binding.z, "Skipped rows without a usable point");
        }

        Ok(Self { points, crs })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Extent of the points, `None` for an empty layer.
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.points.iter().map(|p| (p.x, p.y)))
    }
}

/// A polygon as a list of rings. The first ring is the exterior, the rest
/// are holes; inside-ness follows the even-odd rule over all rings.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub rings: Vec<Vec<(f64, f64)>>,
}

impl Polygon {
    pub fn new(rings: Vec<Vec<(f64, f64)>>) -> Result<Self> {
        if rings.is_empty() {
            return Err(GridProcessorError::invalid_geometry("polygon has no rings"));
        }
        for ring in &rings {
            let mut positions = ring.clone();
            positions.dedup();
            if positions.len() > 1 && positions.first() == positions.last() {
                positions.pop();
            }
            let distinct = positions.len();
            if distinct < 3 {
                return Err(GridProcessorError::invalid_geometry(format!(
                    "ring needs at least 3 distinct positions, got {}",
                    distinct
                )));
            }
            if ring.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
                return Err(GridProcessorError::invalid_geometry("ring has non-finite coordinates"));
            }
        }
        Ok(Self { rings })
    }

    /// Axis-aligned rectangle, handy for crop boundaries.
    pub fn rectangle(bbox: &BoundingBox) -> Self {
        Self {
            rings: vec![vec![
                (bbox.min_x, bbox.min_y),
                (bbox.max_x, bbox.min_y),
                (bbox.max_x, bbox.max_y),
                (bbox.min_x, bbox.max_y),
                (bbox.min_x, bbox.min_y),
            ]],
        }
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.rings.iter().flatten().copied())
    }

    /// X coordinates where the horizontal line at `y` crosses the rings,
    /// sorted ascending.
    ///
    /// Each edge is half-open in y so a vertex on the line counts once.
    pub fn crossings(&self, y: f64) -> Vec<f64> {
        let mut xs = Vec::new();
        for ring in &self.rings {
            let n = ring.len();
            for i in 0..n {
                let (x0, y0) = ring[i];
                let (x1, y1) = ring[(i + 1) % n];
                if (y0 <= y && y < y1) || (y1 <= y && y < y0) {
                    xs.push(x0 + (y - y0) * (x1 - x0) / (y1 - y0));
                }
            }
        }
        xs.sort_by(f64::total_cmp);
        xs
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.crossings(y).iter().filter(|&&cx| cx <= x).count() % 2 == 1
    }
}

/// Boundary polygons with an optional declared CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    pub polygons: Vec<Polygon>,
    pub crs: Option<Crs>,
}

impl Boundary {
    pub fn new(polygons: Vec<Polygon>, crs: Option<Crs>) -> Result<Self> {
        if polygons.is_empty() {
            return Err(GridProcessorError::invalid_geometry("boundary has no polygons"));
        }
        Ok(Self { polygons, crs })
    }

    /// Read a GeoJSON boundary file.
    pub fn from_geojson_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| GridProcessorError::open_failed(format!("{}: {}", path.display(), e)))?;
        let boundary = Self::from_geojson_str(&text).map_err(|e| match e {
            GridProcessorError::InvalidGeometry(msg) => {
                GridProcessorError::InvalidGeometry(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        debug!(
            path = %path.display(),
            polygons = boundary.polygons.len(),
            crs = ?boundary.crs,
            "Read boundary"
        );
        Ok(boundary)
    }

    /// Parse a GeoJSON FeatureCollection, Feature or bare (Multi)Polygon.
    ///
    /// Geometries other than polygons are ignored.
    pub fn from_geojson_str(text: &str) -> Result<Self> {
        let document: GeoJsonDocument = serde_json::from_str(text)?;

        let (geometries, crs) = match document {
            GeoJsonDocument::FeatureCollection { features, crs } => (
                features.into_iter().filter_map(|f| f.geometry).collect(),
                crs,
            ),
            GeoJsonDocument::Feature { geometry, crs } => (geometry.into_iter().collect(), crs),
            GeoJsonDocument::Polygon { coordinates, crs } => {
                (vec![GeoJsonGeometry::Polygon { coordinates }], crs)
            }
            GeoJsonDocument::MultiPolygon { coordinates, crs } => {
                (vec![GeoJsonGeometry::MultiPolygon { coordinates }], crs)
            }
        };

        let mut polygons = Vec::new();
        for geometry in geometries {
            match geometry {
                GeoJsonGeometry::Polygon { coordinates } => polygons.push(to_polygon(coordinates)?),
                GeoJsonGeometry::MultiPolygon { coordinates } => {
                    for part in coordinates {
                        polygons.push(to_polygon(part)?);
                    }
                }
                GeoJsonGeometry::Other => {}
            }
        }

        let crs = match crs {
            Some(named) => Some(
                Crs::parse(&named.properties.name)
                    .map_err(|e| GridProcessorError::invalid_geometry(e.to_string()))?,
            ),
            None => None,
        };

        Self::new(polygons, crs)
    }

    /// Bounding extent of every polygon.
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.polygons
            .iter()
            .filter_map(Polygon::bounds)
            .reduce(|a, b| a.union(&b))
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.polygons.iter().any(|p| p.contains(x, y))
    }

    /// Inside spans `[start, end)` of the horizontal line at `y`.
    pub fn spans(&self, y: f64) -> Vec<(f64, f64)> {
        let mut spans = Vec::new();
        for polygon in &self.polygons {
            let xs = polygon.crossings(y);
            spans.extend(xs.chunks_exact(2).map(|pair| (pair[0], pair[1])));
        }
        spans
    }
}

fn to_polygon(rings: Vec<Vec<Vec<f64>>>) -> Result<Polygon> {
    let rings = rings
        .into_iter()
        .map(|ring| {
            ring.into_iter()
                .map(|pos| match pos.as_slice() {
                    [x, y, ..] => Ok((*x, *y)),
                    _ => Err(GridProcessorError::invalid_geometry(
                        "position needs at least two coordinates",
                    )),
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;
    Polygon::new(rings)
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum GeoJsonDocument {
    FeatureCollection {
        features: Vec<GeoJsonFeature>,
        #[serde(default)]
        crs: Option<NamedCrs>,
    },
    Feature {
        geometry: Option<GeoJsonGeometry>,
        #[serde(default)]
        crs: Option<NamedCrs>,
    },
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
        #[serde(default)]
        crs: Option<NamedCrs>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
        #[serde(default)]
        crs: Option<NamedCrs>,
    },
}

#[derive(Debug, Deserialize)]
struct GeoJsonFeature {
    geometry: Option<GeoJsonGeometry>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum GeoJsonGeometry {
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
    #[serde(other)]
    Other,
}

/// Legacy GeoJSON `crs` member: `{"type": "name", "properties": {"name": ...}}`.
#[derive(Debug, Deserialize)]
struct NamedCrs {
    properties: NamedCrsProperties,
}

#[derive(Debug, Deserialize)]
struct NamedCrsProperties {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r#"{
        "type": "FeatureCollection",
        "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::32645"}},
        "features": [
            {"type": "Feature", "properties": {"name": "district"},
             "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]]}},
            {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [5, 5]}}
        ]
    }"#;

    #[test]
    fn test_point_layer_binding() {
        let csv = "lat,lon,ppt,tmax,rh\n27.7,85.3,3,30,40\n27.8,85.4,,31,41\n27.9,85.5,x,32,42\n";
        let layer =
            PointLayer::from_reader(csv.as_bytes(), &PointBinding::lon_lat("tmax"), Crs::Wgs84).unwrap();
        assert_eq!(layer.len(), 3);
        assert_eq!(layer.points[0], Point { x: 85.3, y: 27.7, z: 30.0 });

        // Empty and non-numeric values are skipped
        let layer =
            PointLayer::from_reader(csv.as_bytes(), &PointBinding::lon_lat("ppt"), Crs::Wgs84).unwrap();
        assert_eq!(layer.len(), 1);
    }

    #[test]
    fn test_point_layer_missing_column() {
        let csv = "lat,lon,ppt\n27.7,85.3,3\n";
        let err = PointLayer::from_reader(csv.as_bytes(), &PointBinding::lon_lat("rh"), Crs::Wgs84)
            .unwrap_err();
        assert!(matches!(err, GridProcessorError::InvalidField(_)));
    }

    #[test]
    fn test_boundary_from_feature_collection() {
        let boundary = Boundary::from_geojson_str(SQUARE).unwrap();
        assert_eq!(boundary.polygons.len(), 1);
        assert_eq!(boundary.crs, Some(Crs::UTM_45N));
        assert_eq!(boundary.bounds(), Some(BoundingBox::new(0.0, 0.0, 10.0, 10.0)));
        assert!(boundary.contains(5.0, 5.0));
        assert!(!boundary.contains(11.0, 5.0));
    }

    #[test]
    fn test_bare_multipolygon_without_crs() {
        let json = r#"{"type": "MultiPolygon", "coordinates": [
            [[[0, 0], [1, 0], [1, 1], [0, 0]]],
            [[[5, 5], [6, 5], [6, 6], [5, 5]]]
        ]}"#;
        let boundary = Boundary::from_geojson_str(json).unwrap();
        assert_eq!(boundary.polygons.len(), 2);
        assert_eq!(boundary.crs, None);
        assert_eq!(boundary.bounds(), Some(BoundingBox::new(0.0, 0.0, 6.0, 6.0)));
    }

    #[test]
    fn test_boundary_errors() {
        assert!(Boundary::from_geojson_str("not json").is_err());

        let only_points = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1, 2]}}
        ]}"#;
        assert!(matches!(
            Boundary::from_geojson_str(only_points),
            Err(GridProcessorError::InvalidGeometry(_))
        ));

        let degenerate = r#"{"type": "Polygon", "coordinates": [[[0, 0], [1, 1], [0, 0]]]}"#;
        assert!(Boundary::from_geojson_str(degenerate).is_err());
    }

    #[test]
    fn test_polygon_with_hole() {
        let outer = vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)];
        let hole = vec![(4.0, 4.0), (6.0, 4.0), (6.0, 6.0), (4.0, 6.0), (4.0, 4.0)];
        let polygon = Polygon::new(vec![outer, hole]).unwrap();

        assert!(polygon.contains(2.0, 5.0));
        assert!(!polygon.contains(5.0, 5.0));
        assert_eq!(polygon.crossings(5.0), vec![0.0, 4.0, 6.0, 10.0]);

        let boundary = Boundary::new(vec![polygon], None).unwrap();
        assert_eq!(boundary.spans(5.0), vec![(0.0, 4.0), (6.0, 10.0)]);
        assert!(boundary.spans(20.0).is_empty());
    }

    #[test]
    fn test_triangle_crossings() {
        let triangle = Polygon::new(vec![vec![(0.0, 0.0), (4.0, 0.0), (2.0, 4.0)]]).unwrap();
        assert_eq!(triangle.crossings(2.0), vec![1.0, 3.0]);
        assert!(triangle.contains(2.0, 1.0));
        assert!(!triangle.contains(0.5, 3.0));
    }
}
