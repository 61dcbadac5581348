use std::collections::HashMap;

use geo_types::{Coord, LineString, Polygon};

use crate::algorithms::contour::{RingKind, TracedContour};
use crate::error::Result;
use crate::traits::RingAssembler;

/// Builds pixel-space polygons from parent-linked contours: outer borders
/// become exterior rings, hole borders become interior rings of their
/// enclosing region. Contours with fewer than 3 vertices are tracing noise
/// and are dropped, as are holes whose enclosing contour was dropped.
#[derive(Debug, Clone, Default)]
pub struct ParentLinkAssembler;

impl RingAssembler for ParentLinkAssembler {
    fn assemble(&self, contours: Vec<TracedContour>) -> Result<Vec<Polygon<f64>>> {
        let mut exteriors: Vec<LineString<f64>> = Vec::new();
        let mut interiors: Vec<Vec<LineString<f64>>> = Vec::new();
        // traced index of each kept outer contour -> slot in `exteriors`
        let mut slots: HashMap<usize, usize> = HashMap::new();

        for (index, contour) in contours.iter().enumerate() {
            if contour.kind == RingKind::Outer && contour.points.len() >= 3 {
                slots.insert(index, exteriors.len());
                exteriors.push(to_ring(&contour.points));
                interiors.push(Vec::new());
            }
        }

        for contour in &contours {
            if contour.kind != RingKind::Hole || contour.points.len() < 3 {
                continue;
            }
            if let Some(slot) = contour.parent.and_then(|parent| slots.get(&parent)) {
                interiors[*slot].push(to_ring(&contour.points));
            }
        }

        let polygons = exteriors
            .into_iter()
            .zip(interiors)
            .map(|(exterior, holes)| Polygon::new(exterior, holes))
            .collect();

        Ok(polygons)
    }
}

fn to_ring(points: &[[f64; 2]]) -> LineString<f64> {
    LineString::new(points.iter().map(|&[x, y]| Coord { x, y }).collect())
}
