use std::collections::{HashMap, HashSet};

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::region_labelling::{Connectivity, connected_components};

use crate::config::PostprocessConfig;
use crate::error::Result;
use crate::traits::MaskFilter;

const OCCUPIED: u8 = 255;

/// Normalizes a mask to {0, 255}. Downstream filters require this encoding;
/// it always runs first.
#[derive(Debug, Clone)]
pub struct Binarizer {
    pub threshold: u8,
}

impl Default for Binarizer {
    fn default() -> Self {
        Self { threshold: 0 }
    }
}

impl MaskFilter for Binarizer {
    fn apply(&self, mask: &GrayImage) -> Result<GrayImage> {
        Ok(imageproc::contrast::threshold(mask, self.threshold))
    }
}

/// Removes 4-connected occupied components with strictly fewer than
/// `min_area_px` pixels.
#[derive(Debug, Clone)]
pub struct SmallObjectRemover {
    pub min_area_px: u32,
}

impl MaskFilter for SmallObjectRemover {
    fn apply(&self, mask: &GrayImage) -> Result<GrayImage> {
        if self.min_area_px == 0 {
            return Ok(mask.clone());
        }
        let labels = connected_components(mask, Connectivity::Four, Luma([0u8]));
        let sizes = component_sizes(&labels);

        let mut output = mask.clone();
        for (x, y, pixel) in output.enumerate_pixels_mut() {
            let label = labels.get_pixel(x, y)[0];
            if label != 0 && sizes[&label] < self.min_area_px {
                *pixel = Luma([0]);
            }
        }
        Ok(output)
    }
}

/// Fills 4-connected empty components with strictly fewer than
/// `max_hole_px` pixels that are fully surrounded by occupied cells.
/// Empty regions touching the tile border are never holes.
#[derive(Debug, Clone)]
pub struct SmallHoleFiller {
    pub max_hole_px: u32,
}

impl MaskFilter for SmallHoleFiller {
    fn apply(&self, mask: &GrayImage) -> Result<GrayImage> {
        if self.max_hole_px == 0 {
            return Ok(mask.clone());
        }
        let (width, height) = mask.dimensions();
        let mut inverted = GrayImage::new(width, height);
        for (x, y, pixel) in inverted.enumerate_pixels_mut() {
            if mask.get_pixel(x, y)[0] == 0 {
                *pixel = Luma([OCCUPIED]);
            }
        }

        let labels = connected_components(&inverted, Connectivity::Four, Luma([0u8]));
        let sizes = component_sizes(&labels);
        let border = border_labels(&labels);

        let mut output = mask.clone();
        for (x, y, pixel) in output.enumerate_pixels_mut() {
            let label = labels.get_pixel(x, y)[0];
            if label != 0 && !border.contains(&label) && sizes[&label] < self.max_hole_px {
                *pixel = Luma([OCCUPIED]);
            }
        }
        Ok(output)
    }
}

/// Morphological closing (dilate then erode) with a square structuring
/// element of side `kernel_size`. Bridges empty gaps up to half the kernel
/// wide and smooths jagged boundaries.
#[derive(Debug, Clone)]
pub struct ClosingFilter {
    pub kernel_size: u32,
}

impl MaskFilter for ClosingFilter {
    fn apply(&self, mask: &GrayImage) -> Result<GrayImage> {
        // The L-inf ball of radius r is the square of side 2r + 1.
        let radius = (self.kernel_size / 2).min(u32::from(u8::MAX));
        if radius == 0 {
            return Ok(mask.clone());
        }
        Ok(imageproc::morphology::close(mask, Norm::LInf, radius as u8))
    }
}

/// Composes the standard cleanup sequence for `config`. Order matters:
/// removing noise first keeps closing from enlarging it, and closing last
/// cannot re-open filled holes.
pub fn standard_filters(config: &PostprocessConfig) -> Vec<Box<dyn MaskFilter>> {
    let mut filters: Vec<Box<dyn MaskFilter>> = vec![Box::new(Binarizer::default())];
    if config.min_area_pixels > 0 {
        filters.push(Box::new(SmallObjectRemover {
            min_area_px: config.min_area_pixels,
        }));
    }
    if config.fill_holes_pixels > 0 {
        filters.push(Box::new(SmallHoleFiller {
            max_hole_px: config.fill_holes_pixels,
        }));
    }
    if config.morphology_kernel_size > 0 {
        filters.push(Box::new(ClosingFilter {
            kernel_size: config.morphology_kernel_size,
        }));
    }
    filters
}

/// Cleans a noisy binary detection mask. Pure function; output has the same
/// dimensions as the input.
pub fn postprocess_mask(mask: &GrayImage, config: &PostprocessConfig) -> Result<GrayImage> {
    let mut cleaned = mask.clone();
    for filter in standard_filters(config) {
        cleaned = filter.apply(&cleaned)?;
    }
    Ok(cleaned)
}

fn component_sizes(labels: &image::ImageBuffer<Luma<u32>, Vec<u32>>) -> HashMap<u32, u32> {
    let mut sizes = HashMap::new();
    for pixel in labels.pixels() {
        if pixel[0] != 0 {
            *sizes.entry(pixel[0]).or_insert(0) += 1;
        }
    }
    sizes
}

fn border_labels(labels: &image::ImageBuffer<Luma<u32>, Vec<u32>>) -> HashSet<u32> {
    let (width, height) = labels.dimensions();
    let mut border = HashSet::new();
    for x in 0..width {
        border.insert(labels.get_pixel(x, 0)[0]);
        border.insert(labels.get_pixel(x, height - 1)[0]);
    }
    for y in 0..height {
        border.insert(labels.get_pixel(0, y)[0]);
        border.insert(labels.get_pixel(width - 1, y)[0]);
    }
    border.remove(&0);
    border
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(width: u32, height: u32, value: u8) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([value]))
    }

    #[test]
    fn zero_thresholds_are_identity() {
        let mut mask = filled(8, 8, 0);
        mask.put_pixel(2, 2, Luma([OCCUPIED]));
        mask.put_pixel(5, 6, Luma([OCCUPIED]));

        let config = PostprocessConfig {
            min_area_pixels: 0,
            fill_holes_pixels: 0,
            morphology_kernel_size: 0,
        };
        let cleaned = postprocess_mask(&mask, &config).unwrap();
        assert_eq!(cleaned, mask);
    }

    #[test]
    fn fills_center_hole_in_occupied_tile() {
        let mut mask = filled(10, 10, OCCUPIED);
        mask.put_pixel(5, 5, Luma([0]));

        let config = PostprocessConfig {
            min_area_pixels: 0,
            fill_holes_pixels: 2,
            morphology_kernel_size: 0,
        };
        let cleaned = postprocess_mask(&mask, &config).unwrap();
        assert_eq!(cleaned, filled(10, 10, OCCUPIED));
    }

    #[test]
    fn keeps_holes_at_or_above_threshold() {
        let mut mask = filled(10, 10, OCCUPIED);
        mask.put_pixel(4, 4, Luma([0]));
        mask.put_pixel(5, 4, Luma([0]));

        let config = PostprocessConfig {
            min_area_pixels: 0,
            fill_holes_pixels: 2,
            morphology_kernel_size: 0,
        };
        let cleaned = postprocess_mask(&mask, &config).unwrap();
        assert_eq!(cleaned.get_pixel(4, 4)[0], 0);
        assert_eq!(cleaned.get_pixel(5, 4)[0], 0);
    }

    #[test]
    fn never_fills_empty_regions_touching_border() {
        let mut mask = filled(10, 10, OCCUPIED);
        mask.put_pixel(0, 3, Luma([0]));

        let config = PostprocessConfig {
            min_area_pixels: 0,
            fill_holes_pixels: 5,
            morphology_kernel_size: 0,
        };
        let cleaned = postprocess_mask(&mask, &config).unwrap();
        assert_eq!(cleaned.get_pixel(0, 3)[0], 0);
    }

    #[test]
    fn removes_specks_keeps_lots() {
        let mut mask = filled(12, 12, 0);
        // 3x3 lot
        for y in 2..5 {
            for x in 2..5 {
                mask.put_pixel(x, y, Luma([OCCUPIED]));
            }
        }
        // single-pixel speck
        mask.put_pixel(9, 9, Luma([OCCUPIED]));

        let config = PostprocessConfig {
            min_area_pixels: 4,
            fill_holes_pixels: 0,
            morphology_kernel_size: 0,
        };
        let cleaned = postprocess_mask(&mask, &config).unwrap();
        assert_eq!(cleaned.get_pixel(9, 9)[0], 0);
        assert_eq!(cleaned.get_pixel(3, 3)[0], OCCUPIED);
    }

    #[test]
    fn closing_bridges_narrow_gap() {
        let mut mask = filled(9, 9, 0);
        for y in 0..9 {
            mask.put_pixel(3, y, Luma([OCCUPIED]));
            mask.put_pixel(5, y, Luma([OCCUPIED]));
        }

        let config = PostprocessConfig {
            min_area_pixels: 0,
            fill_holes_pixels: 0,
            morphology_kernel_size: 3,
        };
        let cleaned = postprocess_mask(&mask, &config).unwrap();
        for y in 0..9 {
            assert_eq!(cleaned.get_pixel(4, y)[0], OCCUPIED, "gap not bridged at row {y}");
        }
    }

    #[test]
    fn postprocess_is_idempotent() {
        let mut mask = filled(16, 16, 0);
        for y in 3..12 {
            for x in 3..12 {
                mask.put_pixel(x, y, Luma([OCCUPIED]));
            }
        }
        mask.put_pixel(7, 7, Luma([0]));
        mask.put_pixel(14, 1, Luma([OCCUPIED]));

        let config = PostprocessConfig {
            min_area_pixels: 3,
            fill_holes_pixels: 2,
            morphology_kernel_size: 3,
        };
        let once = postprocess_mask(&mask, &config).unwrap();
        let twice = postprocess_mask(&once, &config).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn output_dimensions_match_input() {
        let mask = filled(7, 13, OCCUPIED);
        let cleaned = postprocess_mask(&mask, &PostprocessConfig::default()).unwrap();
        assert_eq!(cleaned.dimensions(), mask.dimensions());
    }
}
