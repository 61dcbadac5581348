use geo_types::Polygon;
use image::GrayImage;

use crate::algorithms::contour::TracedContour;
use crate::error::Result;

/// A mask-cleanup step. Implementations must be pure: same input, same
/// output, no side effects.
pub trait MaskFilter: Send + Sync {
    fn apply(&self, mask: &GrayImage) -> Result<GrayImage>;
}

/// Traces region boundaries of occupied cells in a binary mask.
pub trait ContourTracer: Send + Sync {
    fn trace(&self, mask: &GrayImage) -> Result<Vec<TracedContour>>;
}

/// Assembles traced contours into pixel-space polygons, attaching hole
/// boundaries as interior rings of their enclosing region.
pub trait RingAssembler: Send + Sync {
    fn assemble(&self, contours: Vec<TracedContour>) -> Result<Vec<Polygon<f64>>>;
}
