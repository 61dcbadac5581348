use std::fs;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VectorizeError};

/// Parameters for the full mask-to-GeoJSON job, read once at job start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct VectorizeConfig {
    pub postprocessing: PostprocessConfig,
    pub vectorization: VectorizationConfig,
}

/// Mask cleanup thresholds. A value of 0 skips that step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PostprocessConfig {
    /// Occupied components smaller than this many pixels are removed as noise.
    pub min_area_pixels: u32,
    /// Enclosed empty components smaller than this many pixels are filled.
    pub fill_holes_pixels: u32,
    /// Side length of the square structuring element used for closing.
    pub morphology_kernel_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct VectorizationConfig {
    /// Average area of a single parking space in square meters.
    pub spot_area_m2: f64,
    /// Boundary simplification tolerance in meters.
    pub simplify_tolerance: f64,
    pub size_categories: SizeThresholds,
}

/// Spot-count breakpoints. Exclusive upper bounds: a lot is `small` below
/// `small`, `medium` below `medium`, `large` otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SizeThresholds {
    pub small: u32,
    pub medium: u32,
}

impl Default for PostprocessConfig {
    fn default() -> Self {
        Self {
            min_area_pixels: 100,
            fill_holes_pixels: 50,
            morphology_kernel_size: 3,
        }
    }
}

impl Default for VectorizationConfig {
    fn default() -> Self {
        Self {
            spot_area_m2: 12.5,
            simplify_tolerance: 0.5,
            size_categories: SizeThresholds::default(),
        }
    }
}

impl Default for SizeThresholds {
    fn default() -> Self {
        Self {
            small: 50,
            medium: 200,
        }
    }
}

impl Default for VectorizeConfig {
    fn default() -> Self {
        Self {
            postprocessing: PostprocessConfig::default(),
            vectorization: VectorizationConfig::default(),
        }
    }
}

impl VectorizeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: VectorizeConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: VectorizeConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Auto-detect file format from the extension and load.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path_ref),
            Some("json") => Self::from_json_file(path_ref),
            _ => Err(VectorizeError::Configuration(format!(
                "unsupported config format for {}: use .toml or .json",
                path_ref.display()
            ))),
        }
    }

    /// Reject invalid parameter combinations before any tile is processed.
    pub fn validate(&self) -> Result<()> {
        let v = &self.vectorization;
        if !v.spot_area_m2.is_finite() || v.spot_area_m2 <= 0.0 {
            return Err(VectorizeError::Configuration(format!(
                "spot_area_m2 must be a positive finite number, got {}",
                v.spot_area_m2
            )));
        }
        if !v.simplify_tolerance.is_finite() || v.simplify_tolerance < 0.0 {
            return Err(VectorizeError::Configuration(format!(
                "simplify_tolerance must be a non-negative finite number, got {}",
                v.simplify_tolerance
            )));
        }
        if v.size_categories.small >= v.size_categories.medium {
            return Err(VectorizeError::Configuration(format!(
                "size_categories.small ({}) must be below size_categories.medium ({})",
                v.size_categories.small, v.size_categories.medium
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        VectorizeConfig::default().validate().expect("defaults should validate");
    }

    #[test]
    fn rejects_zero_spot_area() {
        let mut config = VectorizeConfig::default();
        config.vectorization.spot_area_m2 = 0.0;
        assert!(matches!(
            config.validate(),
            Err(VectorizeError::Configuration(_))
        ));
    }

    #[test]
    fn rejects_negative_tolerance() {
        let mut config = VectorizeConfig::default();
        config.vectorization.simplify_tolerance = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_size_thresholds() {
        let mut config = VectorizeConfig::default();
        config.vectorization.size_categories = SizeThresholds { small: 200, medium: 50 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config: VectorizeConfig = toml::from_str(
            r#"
            [postprocessing]
            min_area_pixels = 25

            [vectorization]
            simplify_tolerance = 2.0
            "#,
        )
        .unwrap();
        assert_eq!(config.postprocessing.min_area_pixels, 25);
        assert_eq!(config.postprocessing.fill_holes_pixels, 50);
        assert_eq!(config.vectorization.simplify_tolerance, 2.0);
        assert_eq!(config.vectorization.spot_area_m2, 12.5);
    }
}
