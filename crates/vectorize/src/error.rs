use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectorizeError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Failed to load raster: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("Probability map is {prob_width}x{prob_height} but mask is {mask_width}x{mask_height}")]
    ShapeMismatch {
        mask_width: u32,
        mask_height: u32,
        prob_width: u32,
        prob_height: u32,
    },

    #[error("Unsupported coordinate reference system: {0} (expected a geographic lon/lat CRS)")]
    UnsupportedCrs(String),

    #[error("Geometric computation error: {0}")]
    GeometricComputation(String),

    #[error("Malformed geometry: {0}")]
    MalformedGeometry(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

pub type Result<T> = std::result::Result<T, VectorizeError>;
