use geo::{Area, SimplifyVwPreserve};
use geo_types::Polygon;

/// Rough meters-per-degree at the equator, used to translate the metric
/// simplification tolerance into degrees.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Planar area (in square degrees) below which a polygon is a degenerate
/// sliver left over from raster tracing.
const MIN_RING_AREA_DEG2: f64 = 1e-10;

/// Reduce boundary vertex count to within `tolerance_m` while preserving
/// topology: the Visvalingam-Whyatt variant used here introduces no
/// self-intersections and cannot collapse rings entirely.
pub fn simplify_boundary(polygon: &Polygon<f64>, tolerance_m: f64) -> Polygon<f64> {
    if tolerance_m <= 0.0 {
        return polygon.clone();
    }
    let tolerance_deg = tolerance_m / METERS_PER_DEGREE;
    // VW tolerance is areal: triangles below this area are eliminated.
    polygon.simplify_vw_preserve(&(tolerance_deg * tolerance_deg))
}

/// True when a polygon must be discarded rather than enter the collection:
/// too few vertices, non-finite coordinates, or near-zero area.
pub fn is_degenerate(polygon: &Polygon<f64>) -> bool {
    if polygon.exterior().coords().count() < 4 {
        return true;
    }
    let finite = polygon
        .exterior()
        .coords()
        .chain(polygon.interiors().iter().flat_map(|ring| ring.coords()))
        .all(|coord| coord.x.is_finite() && coord.y.is_finite());
    if !finite {
        return true;
    }
    polygon.unsigned_area() < MIN_RING_AREA_DEG2
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{LineString, polygon};

    fn dense_square(side: f64, step: f64) -> Polygon<f64> {
        let mut points = Vec::new();
        let n = (side / step) as usize;
        for i in 0..=n {
            points.push((i as f64 * step, 0.0));
        }
        for i in 1..=n {
            points.push((side, i as f64 * step));
        }
        for i in (0..n).rev() {
            points.push((i as f64 * step, side));
        }
        for i in (1..n).rev() {
            points.push((0.0, i as f64 * step));
        }
        Polygon::new(LineString::from(points), vec![])
    }

    #[test]
    fn zero_tolerance_returns_input() {
        let square = dense_square(0.01, 0.001);
        let simplified = simplify_boundary(&square, 0.0);
        assert_eq!(simplified, square);
    }

    #[test]
    fn simplification_reduces_vertices_without_killing_ring() {
        let square = dense_square(0.01, 0.0001);
        let simplified = simplify_boundary(&square, 5.0);
        assert!(
            simplified.exterior().coords().count() < square.exterior().coords().count()
        );
        assert!(!is_degenerate(&simplified));
    }

    #[test]
    fn detects_degenerate_polygons() {
        let sliver = polygon![
            (x: 0.0, y: 0.0),
            (x: 1e-7, y: 0.0),
            (x: 2e-7, y: 1e-9),
        ];
        assert!(is_degenerate(&sliver));

        let with_nan = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: f64::NAN, y: 1.0),
        ];
        assert!(is_degenerate(&with_nan));

        let healthy = polygon![
            (x: 0.0, y: 0.0),
            (x: 0.01, y: 0.0),
            (x: 0.01, y: 0.01),
            (x: 0.0, y: 0.01),
        ];
        assert!(!is_degenerate(&healthy));
    }
}
