use std::fs;
use std::path::Path;
use std::str::FromStr;

use geo_types::{Coord, LineString, Polygon};
use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::{Map, Number};

use crate::error::{Result, VectorizeError};
use crate::types::{DetectedLot, LotCollection, SizeCategory};

impl LotCollection {
    /// One feature per lot: polygon geometry plus the attribute set consumed
    /// by the map viewer and the knowledge-base ingester. Numeric attributes
    /// are coerced through `serde_json::Number`, so a non-finite value
    /// upstream fails serialization instead of emitting invalid JSON.
    pub fn to_geojson(&self) -> Result<FeatureCollection> {
        let mut features = Vec::with_capacity(self.lots.len());

        for lot in &self.lots {
            let rings = polygon_rings(&lot.polygon)?;
            let geometry = Geometry::new(Value::Polygon(rings));

            let mut properties = Map::new();
            properties.insert("lot_id".to_string(), Number::from(lot.lot_id).into());
            properties.insert(
                "area_m2".to_string(),
                finite_number(lot.area_m2, "area_m2")?.into(),
            );
            properties.insert("num_spots".to_string(), Number::from(lot.num_spots).into());
            properties.insert(
                "confidence".to_string(),
                finite_number(lot.confidence, "confidence")?.into(),
            );
            properties.insert(
                "size_category".to_string(),
                lot.size_category.to_string().into(),
            );
            properties.insert(
                "center_lon".to_string(),
                finite_number(lot.center_lon, "center_lon")?.into(),
            );
            properties.insert(
                "center_lat".to_string(),
                finite_number(lot.center_lat, "center_lat")?.into(),
            );

            features.push(Feature {
                bbox: None,
                geometry: Some(geometry),
                id: Some(geojson::feature::Id::Number(Number::from(lot.lot_id))),
                properties: Some(properties),
                foreign_members: None,
            });
        }

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
    }

    pub fn to_geojson_string(&self) -> Result<String> {
        let collection = self.to_geojson()?;
        Ok(serde_json::to_string_pretty(&collection)?)
    }

    /// Write the collection to `path`. The document is staged at a sibling
    /// temporary path and renamed into place, so a failed job never leaves a
    /// truncated output file behind.
    pub fn save_geojson<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = self.to_geojson_string()?;

        let staging = staging_path(path);
        fs::write(&staging, content)?;
        fs::rename(&staging, path)?;
        Ok(())
    }

    pub fn from_geojson_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_geojson_str(&content)
    }

    pub fn from_geojson_str(content: &str) -> Result<Self> {
        let collection: FeatureCollection = content.parse()?;

        let mut lots = Vec::with_capacity(collection.features.len());
        for feature in collection.features {
            lots.push(feature_to_lot(feature)?);
        }
        Ok(LotCollection { lots })
    }
}

fn staging_path(path: &Path) -> std::path::PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn finite_number(value: f64, attribute: &str) -> Result<Number> {
    Number::from_f64(value).ok_or_else(|| {
        VectorizeError::MalformedGeometry(format!("non-finite {attribute}: {value}"))
    })
}

/// Exterior ring first, interior rings after, every ring closed.
fn polygon_rings(polygon: &Polygon<f64>) -> Result<Vec<Vec<Vec<f64>>>> {
    let mut rings = Vec::with_capacity(1 + polygon.interiors().len());
    rings.push(ring_positions(polygon.exterior())?);
    for interior in polygon.interiors() {
        rings.push(ring_positions(interior)?);
    }
    Ok(rings)
}

fn ring_positions(ring: &LineString<f64>) -> Result<Vec<Vec<f64>>> {
    let positions = ring.coords().count();
    if positions < 4 {
        return Err(VectorizeError::MalformedGeometry(format!(
            "ring has {positions} positions, need at least 4"
        )));
    }
    Ok(ring.coords().map(|coord| vec![coord.x, coord.y]).collect())
}

fn feature_to_lot(feature: Feature) -> Result<DetectedLot> {
    let geometry = feature
        .geometry
        .ok_or_else(|| VectorizeError::MalformedGeometry("feature without geometry".into()))?;
    let polygon = match geometry.value {
        Value::Polygon(rings) => rings_to_polygon(rings)?,
        other => {
            return Err(VectorizeError::MalformedGeometry(format!(
                "expected Polygon geometry, got {}",
                other.type_name()
            )));
        }
    };

    let properties = feature
        .properties
        .ok_or_else(|| VectorizeError::MalformedGeometry("feature without properties".into()))?;

    let float = |key: &str| -> Result<f64> {
        properties
            .get(key)
            .and_then(|value| value.as_f64())
            .ok_or_else(|| {
                VectorizeError::MalformedGeometry(format!("missing or non-numeric {key}"))
            })
    };
    let integer = |key: &str| -> Result<u64> {
        properties
            .get(key)
            .and_then(|value| value.as_u64())
            .ok_or_else(|| {
                VectorizeError::MalformedGeometry(format!("missing or non-integer {key}"))
            })
    };

    let size_category = properties
        .get("size_category")
        .and_then(|value| value.as_str())
        .and_then(|name| SizeCategory::from_str(name).ok())
        .ok_or_else(|| {
            VectorizeError::MalformedGeometry("missing or unknown size_category".into())
        })?;

    Ok(DetectedLot {
        lot_id: integer("lot_id")?,
        polygon,
        area_m2: float("area_m2")?,
        num_spots: integer("num_spots")?.min(u64::from(u32::MAX)) as u32,
        confidence: float("confidence")?,
        size_category,
        center_lon: float("center_lon")?,
        center_lat: float("center_lat")?,
    })
}

fn rings_to_polygon(rings: Vec<Vec<Vec<f64>>>) -> Result<Polygon<f64>> {
    let mut iter = rings.into_iter().map(|ring| {
        LineString::new(
            ring.into_iter()
                .map(|position| Coord {
                    x: position.first().copied().unwrap_or(f64::NAN),
                    y: position.get(1).copied().unwrap_or(f64::NAN),
                })
                .collect(),
        )
    });
    let exterior = iter
        .next()
        .ok_or_else(|| VectorizeError::MalformedGeometry("polygon without rings".into()))?;
    Ok(Polygon::new(exterior, iter.collect()))
}
