use crate::algorithms::{ParentLinkAssembler, SuzukiTracer, standard_filters};
use crate::config::{PostprocessConfig, VectorizationConfig};
use crate::pipeline::TilePipeline;
use crate::traits::{ContourTracer, MaskFilter, RingAssembler};

/// Fluent construction of a [`TilePipeline`], with standard components
/// filled in for anything left unset.
pub struct TilePipelineBuilder {
    filters: Vec<Box<dyn MaskFilter>>,
    tracer: Option<Box<dyn ContourTracer>>,
    assembler: Option<Box<dyn RingAssembler>>,
    vectorization: VectorizationConfig,
}

impl TilePipelineBuilder {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            tracer: None,
            assembler: None,
            vectorization: VectorizationConfig::default(),
        }
    }

    /// Append a mask-cleanup step; steps run in insertion order.
    pub fn add_filter<F>(mut self, filter: F) -> Self
    where
        F: MaskFilter + 'static,
    {
        self.filters.push(Box::new(filter));
        self
    }

    /// Append the standard cleanup sequence for the given thresholds.
    pub fn with_postprocessing(mut self, config: &PostprocessConfig) -> Self {
        self.filters.extend(standard_filters(config));
        self
    }

    /// Replace the boundary tracer.
    pub fn set_tracer<T>(mut self, tracer: T) -> Self
    where
        T: ContourTracer + 'static,
    {
        self.tracer = Some(Box::new(tracer));
        self
    }

    /// Replace the ring assembler.
    pub fn set_assembler<A>(mut self, assembler: A) -> Self
    where
        A: RingAssembler + 'static,
    {
        self.assembler = Some(Box::new(assembler));
        self
    }

    /// Set attribute-derivation parameters (spot area, simplification
    /// tolerance, size breakpoints).
    pub fn with_vectorization(mut self, vectorization: VectorizationConfig) -> Self {
        self.vectorization = vectorization;
        self
    }

    pub fn build(self) -> TilePipeline {
        let tracer = self
            .tracer
            .unwrap_or_else(|| Box::new(SuzukiTracer));
        let assembler = self
            .assembler
            .unwrap_or_else(|| Box::new(ParentLinkAssembler));

        TilePipeline::new(self.filters, tracer, assembler, self.vectorization)
    }
}

impl Default for TilePipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
