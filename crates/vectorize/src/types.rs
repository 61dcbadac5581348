use geo::Centroid;
use geo_types::Polygon;
use image::{GrayImage, ImageBuffer, Luma};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::SizeThresholds;
use crate::error::{Result, VectorizeError};

/// Per-cell detection confidence in [0, 1], same shape as the mask.
pub type ProbabilityMap = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Confidence assigned to lots when no probability map was supplied.
pub const DEFAULT_CONFIDENCE: f64 = 0.8;

/// Affine transform from pixel (col, row) to geographic (lon, lat), using
/// the GDAL/rasterio coefficient order:
///
/// ```text
/// lon = a * col + b * row + c
/// lat = d * col + e * row + f
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TileTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl TileTransform {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// North-up transform from the tile's top-left corner and per-pixel
    /// resolution in degrees. Latitude decreases as row increases.
    pub fn from_origin(west: f64, north: f64, xres: f64, yres: f64) -> Self {
        Self::new(xres, 0.0, west, 0.0, -yres, north)
    }

    /// Map a pixel coordinate to (lon, lat).
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }

    pub fn from_coefficients(coeffs: [f64; 6]) -> Self {
        let [a, b, c, d, e, f] = coeffs;
        Self::new(a, b, c, d, e, f)
    }

    /// Map every vertex of a pixel-space polygon into geographic space.
    pub fn project_polygon(&self, polygon: &Polygon<f64>) -> Polygon<f64> {
        use geo_types::{Coord, LineString};

        let project_ring = |ring: &LineString<f64>| -> LineString<f64> {
            LineString::new(
                ring.coords()
                    .map(|coord| {
                        let (x, y) = self.apply(coord.x, coord.y);
                        Coord { x, y }
                    })
                    .collect(),
            )
        };

        Polygon::new(
            project_ring(polygon.exterior()),
            polygon.interiors().iter().map(project_ring).collect(),
        )
    }
}

/// Coordinate reference system identifier, e.g. `EPSG:4326`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Crs(pub String);

impl Crs {
    pub fn wgs84() -> Self {
        Self("EPSG:4326".to_string())
    }

    /// The pipeline traces polygons directly in lon/lat; projected tiles
    /// must be reprojected upstream.
    pub fn is_geographic(&self) -> bool {
        self.0.eq_ignore_ascii_case("EPSG:4326")
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One tile's worth of detection output, ready for vectorization.
#[derive(Debug, Clone)]
pub struct TileInput {
    /// Binary detection mask; zero = empty, nonzero = occupied.
    pub mask: GrayImage,
    /// Optional per-cell confidence, same dimensions as `mask`.
    pub prob: Option<ProbabilityMap>,
    pub transform: TileTransform,
    pub crs: Crs,
}

impl TileInput {
    pub fn validate(&self) -> Result<()> {
        if !self.crs.is_geographic() {
            return Err(VectorizeError::UnsupportedCrs(self.crs.0.clone()));
        }
        if let Some(prob) = &self.prob {
            if prob.dimensions() != self.mask.dimensions() {
                return Err(VectorizeError::ShapeMismatch {
                    mask_width: self.mask.width(),
                    mask_height: self.mask.height(),
                    prob_width: prob.width(),
                    prob_height: prob.height(),
                });
            }
        }
        Ok(())
    }
}

/// Lot classification by estimated spot count.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SizeCategory {
    Small,
    Medium,
    Large,
}

impl SizeCategory {
    /// First matching exclusive upper bound wins.
    pub fn classify(num_spots: u32, thresholds: &SizeThresholds) -> Self {
        if num_spots < thresholds.small {
            SizeCategory::Small
        } else if num_spots < thresholds.medium {
            SizeCategory::Medium
        } else {
            SizeCategory::Large
        }
    }
}

/// A single detected parking lot in geographic coordinates.
#[derive(Debug, Clone)]
pub struct DetectedLot {
    /// Unique within one run; assigned during the global merge, 0 before.
    pub lot_id: u64,
    /// Simple or multi-ring polygon in lon/lat.
    pub polygon: Polygon<f64>,
    pub area_m2: f64,
    pub num_spots: u32,
    pub confidence: f64,
    pub size_category: SizeCategory,
    pub center_lon: f64,
    pub center_lat: f64,
}

impl DetectedLot {
    /// Build a lot from an already-simplified, non-degenerate polygon.
    pub fn from_polygon(
        polygon: Polygon<f64>,
        area_m2: f64,
        confidence: f64,
        spot_area_m2: f64,
        thresholds: &SizeThresholds,
    ) -> Result<Self> {
        let centroid = polygon.centroid().ok_or_else(|| {
            VectorizeError::GeometricComputation("polygon has no centroid".to_string())
        })?;
        let num_spots = crate::attributes::estimate_spots(area_m2, spot_area_m2);
        Ok(Self {
            lot_id: 0,
            polygon,
            area_m2,
            num_spots,
            confidence,
            size_category: SizeCategory::classify(num_spots, thresholds),
            center_lon: centroid.x(),
            center_lat: centroid.y(),
        })
    }
}

/// The globally merged, deduplicated set of detected lots.
#[derive(Debug, Clone, Default)]
pub struct LotCollection {
    pub lots: Vec<DetectedLot>,
}

impl LotCollection {
    pub fn len(&self) -> usize {
        self.lots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    pub fn total_spots(&self) -> u64 {
        self.lots.iter().map(|lot| u64::from(lot.num_spots)).sum()
    }

    pub fn total_area_m2(&self) -> f64 {
        self.lots.iter().map(|lot| lot.area_m2).sum()
    }

    /// Lot counts per size category, in (small, medium, large) order.
    pub fn size_distribution(&self) -> (usize, usize, usize) {
        let mut counts = (0, 0, 0);
        for lot in &self.lots {
            match lot.size_category {
                SizeCategory::Small => counts.0 += 1,
                SizeCategory::Medium => counts.1 += 1,
                SizeCategory::Large => counts.2 += 1,
            }
        }
        counts
    }
}
