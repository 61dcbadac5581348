//! # Parking-lot mask vectorization
//!
//! Turns per-tile binary detection masks into a deduplicated GeoJSON
//! collection of parking-lot polygons with derived attributes.
//!
//! ## Core features
//!
//! - **Trait-based stages**: swap mask filters, the boundary tracer, or the
//!   ring assembler by implementing a trait
//! - **Hole-aware tracing**: gaps inside a lot become interior rings
//! - **Metric attributes**: geodesic area, estimated spot capacity, size
//!   classification, per-tile confidence
//! - **GeoJSON output**: atomic writes, parse-back support
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use vectorize::{TileInput, TilePipeline, TileTransform};
//! use vectorize::config::VectorizeConfig;
//! use vectorize::types::Crs;
//!
//! let config = VectorizeConfig::default();
//! let pipeline = TilePipeline::from_config(&config)?;
//!
//! let tile = TileInput {
//!     mask: image::open("tile_mask.png")?.to_luma8(),
//!     prob: None,
//!     transform: TileTransform::from_origin(-84.4, 33.8, 1e-5, 1e-5),
//!     crs: Crs::wgs84(),
//! };
//!
//! let lots = pipeline.process(&tile)?;
//! let collection = vectorize::merge_tiles(vec![lots]);
//! collection.save_geojson("parking_lots.geojson")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod algorithms;
pub mod attributes;
pub mod config;
pub mod error;
pub mod io;
pub mod merge;
pub mod pipeline;
pub mod traits;
pub mod types;

pub use config::VectorizeConfig;
pub use error::{Result, VectorizeError};
pub use merge::merge_tiles;
pub use pipeline::{TilePipeline, builder::TilePipelineBuilder};
pub use traits::*;
pub use types::{
    DetectedLot, LotCollection, ProbabilityMap, SizeCategory, TileInput, TileTransform,
};
