//! # Wellsite Core
//!
//! Core types, CRS handling and I/O for the wellsite analysis library.
//!
//! This crate provides:
//! - `PolygonLayer` / `WellSet`: vector data containers in a tagged CRS
//! - `CRS`: Coordinate Reference System handling and the EOV / WGS84 /
//!   Web Mercator point transforms
//! - `WellReport`: assembled analysis results with CSV and map views
//! - Native readers for ESRI shapefiles and tab-separated well tables

pub mod crs;
pub mod error;
pub mod io;
pub mod report;
pub mod vector;

pub use crs::CRS;
pub use error::{Error, Result};
pub use report::{MapPoint, PointCategory, WellRecord, WellReport};
pub use vector::{Bounds, GeoPoint, PolygonLayer, Well, WellSet};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::report::{MapPoint, PointCategory, WellRecord, WellReport};
    pub use crate::vector::{Bounds, GeoPoint, PolygonLayer, Well, WellSet};
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in the wellsite pipeline.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}

/// Marker trait for algorithms that can be parallelized
pub trait ParallelAlgorithm: Algorithm {
    /// Execute in parallel using available cores
    fn execute_parallel(
        &self,
        input: Self::Input,
        params: Self::Params,
    ) -> std::result::Result<Self::Output, Self::Error>;
}
