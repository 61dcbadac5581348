pub mod assembly;
pub mod contour;
pub mod morphology;
pub mod simplification;

pub use assembly::ParentLinkAssembler;
pub use contour::{RingKind, SuzukiTracer, TracedContour};
pub use morphology::{
    Binarizer, ClosingFilter, SmallHoleFiller, SmallObjectRemover, postprocess_mask,
    standard_filters,
};
pub use simplification::{METERS_PER_DEGREE, is_degenerate, simplify_boundary};
