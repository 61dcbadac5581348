use image::GrayImage;

use crate::types::{DEFAULT_CONFIDENCE, ProbabilityMap};

/// Estimated capacity from lot area. The 12.5 m² default per spot
/// corresponds to a 2.5 m x 5 m space.
pub fn estimate_spots(area_m2: f64, spot_area_m2: f64) -> u32 {
    let spots = (area_m2 / spot_area_m2).floor();
    if spots.is_finite() && spots > 0.0 {
        spots.min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

/// Mean probability over the mask's occupied cells, clamped to [0, 1].
/// Falls back to the fixed default when the mask has no occupied cells.
pub fn tile_confidence(mask: &GrayImage, prob: &ProbabilityMap) -> f64 {
    let mut sum = 0.0f64;
    let mut count = 0u64;
    for (mask_pixel, prob_pixel) in mask.pixels().zip(prob.pixels()) {
        if mask_pixel[0] != 0 {
            sum += f64::from(prob_pixel[0]);
            count += 1;
        }
    }
    if count == 0 {
        return DEFAULT_CONFIDENCE;
    }
    (sum / count as f64).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn spots_floor_of_area_ratio() {
        assert_eq!(estimate_spots(125.0, 12.5), 10);
        assert_eq!(estimate_spots(124.9, 12.5), 9);
        assert_eq!(estimate_spots(0.0, 12.5), 0);
        assert_eq!(estimate_spots(5.0, 12.5), 0);
    }

    #[test]
    fn confidence_averages_occupied_cells_only() {
        let mut mask = GrayImage::new(2, 2);
        mask.put_pixel(0, 0, Luma([255u8]));
        mask.put_pixel(1, 0, Luma([255u8]));

        let mut prob = ProbabilityMap::new(2, 2);
        prob.put_pixel(0, 0, Luma([0.9f32]));
        prob.put_pixel(1, 0, Luma([0.7f32]));
        prob.put_pixel(0, 1, Luma([0.1f32]));
        prob.put_pixel(1, 1, Luma([0.1f32]));

        let confidence = tile_confidence(&mask, &prob);
        assert!((confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn confidence_defaults_on_empty_mask() {
        let mask = GrayImage::new(3, 3);
        let prob = ProbabilityMap::new(3, 3);
        assert_eq!(tile_confidence(&mask, &prob), DEFAULT_CONFIDENCE);
    }
}
