//! # Wellsite Algorithms
//!
//! Spatial screening algorithms for wellsite analysis.
//!
//! ## Pipeline stages
//!
//! - **buffer**: protection-distance exclusion regions around polygon layers
//! - **filter**: candidate wells split by the exclusion region
//! - **project**: EOV to WGS84 projection of the survivors
//! - **pipeline**: the full screening run ending in a report

pub mod buffer;
pub mod filter;
pub mod maybe_rayon;
pub mod pipeline;
pub mod project;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::buffer::{
        build_exclusion_region, Buffer, BufferParams, BufferedFeature, ExclusionRegion,
    };
    pub use crate::filter::{filter_wells, BoundaryRule, Filter, FilterParams, FilterResult};
    pub use crate::pipeline::{
        analysis_fingerprint, assemble_report, run_analysis, Analysis, AnalysisStats,
        PipelineParams,
    };
    pub use crate::project::{project_wells, Projector};
    pub use wellsite_core::prelude::*;
}
