pub mod builder;

use geo::GeodesicArea;
use tracing::debug;

use crate::algorithms::simplification::{is_degenerate, simplify_boundary};
use crate::attributes::tile_confidence;
use crate::config::{VectorizationConfig, VectorizeConfig};
use crate::error::Result;
use crate::traits::{ContourTracer, MaskFilter, RingAssembler};
use crate::types::{DEFAULT_CONFIDENCE, DetectedLot, TileInput};

/// Per-tile vectorization pipeline: mask cleanup, boundary tracing, ring
/// assembly, then per-polygon attribute derivation. Tiles are independent,
/// so one pipeline may be shared across worker threads.
pub struct TilePipeline {
    filters: Vec<Box<dyn MaskFilter>>,
    tracer: Box<dyn ContourTracer>,
    assembler: Box<dyn RingAssembler>,
    vectorization: VectorizationConfig,
}

impl TilePipeline {
    pub fn builder() -> builder::TilePipelineBuilder {
        builder::TilePipelineBuilder::new()
    }

    /// Standard stages wired from a validated job configuration.
    pub fn from_config(config: &VectorizeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::builder()
            .with_postprocessing(&config.postprocessing)
            .with_vectorization(config.vectorization.clone())
            .build())
    }

    pub fn new(
        filters: Vec<Box<dyn MaskFilter>>,
        tracer: Box<dyn ContourTracer>,
        assembler: Box<dyn RingAssembler>,
        vectorization: VectorizationConfig,
    ) -> Self {
        Self {
            filters,
            tracer,
            assembler,
            vectorization,
        }
    }

    /// Extract all detected lots from one tile. Degenerate polygons are
    /// routine tracing noise and are dropped silently; `lot_id` stays 0
    /// until the global merge assigns the final identifier.
    pub fn process(&self, tile: &TileInput) -> Result<Vec<DetectedLot>> {
        tile.validate()?;

        let mut mask = tile.mask.clone();
        for filter in &self.filters {
            mask = filter.apply(&mask)?;
        }

        let contours = self.tracer.trace(&mask)?;
        let pixel_polygons = self.assembler.assemble(contours)?;

        let confidence = match &tile.prob {
            Some(prob) => tile_confidence(&mask, prob),
            None => DEFAULT_CONFIDENCE,
        };

        let mut lots = Vec::with_capacity(pixel_polygons.len());
        let mut discarded = 0usize;
        for pixel_polygon in &pixel_polygons {
            let geographic = tile.transform.project_polygon(pixel_polygon);
            let simplified =
                simplify_boundary(&geographic, self.vectorization.simplify_tolerance);
            if is_degenerate(&simplified) {
                discarded += 1;
                continue;
            }

            // Area must come from a distance-preserving computation, never
            // from raw degrees.
            let area_m2 = simplified.geodesic_area_unsigned();

            lots.push(DetectedLot::from_polygon(
                simplified,
                area_m2,
                confidence,
                self.vectorization.spot_area_m2,
                &self.vectorization.size_categories,
            )?);
        }

        debug!(
            lots = lots.len(),
            discarded, "vectorized tile"
        );
        Ok(lots)
    }
}
