use std::fs;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vectorize::types::{Crs, ProbabilityMap, TileInput, TileTransform};

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("Missing georeference sidecar {0}")]
    MissingSidecar(PathBuf),
}

/// Georeferencing sidecar written by the inference step next to each mask:
/// `{ "transform": [a, b, c, d, e, f], "crs": "EPSG:4326" }`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GeorefSidecar {
    /// Affine coefficients in GDAL order, pixel (col, row) to (lon, lat).
    pub transform: [f64; 6],
    pub crs: String,
}

/// One tile's files on disk: `<name>_mask.png`, required `<name>.json`
/// sidecar, optional `<name>_prob.png`.
#[derive(Debug, Clone)]
pub struct TileEntry {
    pub name: String,
    pub mask_path: PathBuf,
    pub prob_path: Option<PathBuf>,
    pub sidecar_path: PathBuf,
}

/// Scan a predictions directory for mask tiles, sorted by name so that
/// downstream lot ids are stable across runs.
pub fn discover_tiles(dir: &Path) -> Result<Vec<TileEntry>, CliError> {
    let mut entries = Vec::new();

    for dir_entry in fs::read_dir(dir)? {
        let mask_path = dir_entry?.path();
        let Some(file_name) = mask_path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(name) = file_name.strip_suffix("_mask.png") else {
            continue;
        };

        let sidecar_path = dir.join(format!("{name}.json"));
        if !sidecar_path.exists() {
            return Err(CliError::MissingSidecar(sidecar_path));
        }

        let prob_path = Some(dir.join(format!("{name}_prob.png"))).filter(|p| p.exists());

        entries.push(TileEntry {
            name: name.to_string(),
            mask_path,
            prob_path,
            sidecar_path,
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

impl TileEntry {
    pub fn load(&self) -> Result<TileInput, CliError> {
        let mask = image::open(&self.mask_path)?.to_luma8();

        let prob = match &self.prob_path {
            Some(path) => Some(load_probability(path)?),
            None => None,
        };

        let sidecar: GeorefSidecar = serde_json::from_str(&fs::read_to_string(&self.sidecar_path)?)?;

        Ok(TileInput {
            mask,
            prob,
            transform: TileTransform::from_coefficients(sidecar.transform),
            crs: Crs(sidecar.crs),
        })
    }
}

fn load_probability(path: &Path) -> Result<ProbabilityMap, CliError> {
    let raster = image::open(path)?.to_luma16();
    let mut prob = ProbabilityMap::new(raster.width(), raster.height());
    for (source, target) in raster.pixels().zip(prob.pixels_mut()) {
        target.0 = [f32::from(source.0[0]) / f32::from(u16::MAX)];
    }
    Ok(prob)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn write_tile(dir: &Path, name: &str, with_prob: bool) {
        let mut mask = GrayImage::new(8, 8);
        mask.put_pixel(3, 3, Luma([255u8]));
        mask.save(dir.join(format!("{name}_mask.png"))).unwrap();

        if with_prob {
            let prob = GrayImage::from_pixel(8, 8, Luma([230u8]));
            prob.save(dir.join(format!("{name}_prob.png"))).unwrap();
        }

        let sidecar = serde_json::json!({
            "transform": [1e-4, 0.0, -84.4, 0.0, -1e-4, 33.8],
            "crs": "EPSG:4326",
        });
        fs::write(
            dir.join(format!("{name}.json")),
            serde_json::to_string(&sidecar).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn discovers_and_loads_tiles_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_tile(dir.path(), "tile_b", false);
        write_tile(dir.path(), "tile_a", true);

        let entries = discover_tiles(dir.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "tile_a");
        assert!(entries[0].prob_path.is_some());
        assert!(entries[1].prob_path.is_none());

        let tile = entries[0].load().unwrap();
        assert_eq!(tile.mask.dimensions(), (8, 8));
        assert!(tile.crs.is_geographic());
        let prob = tile.prob.unwrap();
        assert!((prob.get_pixel(0, 0).0[0] - 230.0 / 255.0).abs() < 1e-3);
    }

    #[test]
    fn missing_sidecar_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mask = GrayImage::new(4, 4);
        mask.save(dir.path().join("lonely_mask.png")).unwrap();

        assert!(matches!(
            discover_tiles(dir.path()),
            Err(CliError::MissingSidecar(_))
        ));
    }

    #[test]
    fn empty_directory_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_tiles(dir.path()).unwrap().is_empty());
    }
}
