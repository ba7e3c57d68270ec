//! Common test fixtures for hazard preparation tests.
//!
//! This module provides pre-defined extents and table headers that
//! represent the region the pipelines are run over.

/// Common bounding box definitions for testing, as (min_x, min_y, max_x, max_y).
pub mod bbox {
    /// Geographic extent of the forecast grid (degrees)
    pub const NEPAL: (f64, f64, f64, f64) = (80.0, 26.3, 88.2, 30.5);

    /// Small geographic window around the Kathmandu valley (degrees)
    pub const KATHMANDU_GEO: (f64, f64, f64, f64) = (85.25, 27.6, 85.35, 27.72);

    /// District-sized window in UTM 45N (meters)
    pub const DISTRICT_UTM: (f64, f64, f64, f64) = (330_000.0, 3_060_000.0, 333_000.0, 3_063_000.0);

    /// Invalid bbox (min > max)
    pub const INVALID: (f64, f64, f64, f64) = (10.0, 10.0, 5.0, 5.0);
}

/// Common grid specifications for testing.
pub mod grid {
    /// A raster grid: origin at the top-left corner, square pixels.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct GridSpec {
        pub width: usize,
        pub height: usize,
        pub min_x: f64,
        pub max_y: f64,
        pub pixel_size: f64,
    }

    impl GridSpec {
        /// Total number of cells.
        pub fn size(&self) -> usize {
            self.width * self.height
        }

        /// Extent as (min_x, min_y, max_x, max_y).
        pub fn bbox(&self) -> (f64, f64, f64, f64) {
            (
                self.min_x,
                self.max_y - self.height as f64 * self.pixel_size,
                self.min_x + self.width as f64 * self.pixel_size,
                self.max_y,
            )
        }
    }

    /// 100 x 100 static layer at 30 m over the district window
    pub const DISTRICT_30M: GridSpec = GridSpec {
        width: 100,
        height: 100,
        min_x: 330_000.0,
        max_y: 3_063_000.0,
        pixel_size: 30.0,
    };

    /// Coarse geographic forecast reference grid (0.02 degree), covers DISTRICT_30M
    pub const KATHMANDU_REFERENCE: GridSpec = GridSpec {
        width: 5,
        height: 6,
        min_x: 85.25,
        max_y: 27.72,
        pixel_size: 0.02,
    };
}

/// Raw forecast table columns, in export order.
pub mod forecast {
    pub const RAW_HEADER: &str = "administrative_id,date_range_start,date_range_end,rainfall_daily_weighted_average,tmax_daily_tmax_region,rh_daily_avg_region,ws_daily_avg_region,geom";

    pub const DAY_HEADER: &str = "lat,lon,ppt,tmax,rh,s_date,e_date";
}

/// CRS identifiers as they appear in boundary files.
pub mod crs {
    pub const EPSG_4326: &str = "EPSG:4326";

    pub const EPSG_32645: &str = "EPSG:32645";

    pub const URN_32645: &str = "urn:ogc:def:crs:EPSG::32645";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_spec_bbox() {
        assert_eq!(grid::DISTRICT_30M.bbox(), bbox::DISTRICT_UTM);
        assert_eq!(grid::DISTRICT_30M.size(), 10_000);

        let (min_x, min_y, max_x, max_y) = grid::KATHMANDU_REFERENCE.bbox();
        assert!((min_x - 85.25).abs() < 1e-9);
        assert!((max_x - 85.35).abs() < 1e-9);
        assert!((min_y - 27.6).abs() < 1e-9);
        assert!((max_y - 27.72).abs() < 1e-9);
    }

    #[test]
    fn test_headers() {
        assert_eq!(forecast::RAW_HEADER.split(',').count(), 8);
        assert_eq!(forecast::DAY_HEADER.split(',').count(), 7);
    }
}
