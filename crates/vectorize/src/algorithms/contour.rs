use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};

use crate::error::Result;
use crate::traits::ContourTracer;

/// Whether a traced boundary encloses occupied cells or a hole inside them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingKind {
    Outer,
    Hole,
}

/// One region boundary in pixel coordinates, with a link to the boundary
/// that encloses it (if any).
#[derive(Debug, Clone)]
pub struct TracedContour {
    pub points: Vec<[f64; 2]>,
    pub kind: RingKind,
    /// Index of the enclosing contour in the traced sequence.
    pub parent: Option<usize>,
}

/// Suzuki-Abe border following via imageproc. Yields outer borders and hole
/// borders of all maximal connected regions of nonzero cells, parent-linked.
#[derive(Debug, Clone, Default)]
pub struct SuzukiTracer;

impl ContourTracer for SuzukiTracer {
    fn trace(&self, mask: &GrayImage) -> Result<Vec<TracedContour>> {
        let contours = find_contours::<i32>(mask);

        let traced = contours
            .into_iter()
            .map(|contour| TracedContour {
                points: contour
                    .points
                    .iter()
                    .map(|p| [f64::from(p.x), f64::from(p.y)])
                    .collect(),
                kind: match contour.border_type {
                    BorderType::Outer => RingKind::Outer,
                    BorderType::Hole => RingKind::Hole,
                },
                parent: contour.parent,
            })
            .collect();

        Ok(traced)
    }
}
