//! Candidate filtering against the exclusion region
//!
//! Splits a well set into retained and excluded wells. Each well is
//! tested independently against the exclusion region, so the stage is a
//! pure function of its inputs and both output lists keep the input
//! order.

use crate::buffer::ExclusionRegion;
use crate::maybe_rayon::*;
use wellsite_core::{Algorithm, Error, Result, Well, WellSet};

/// How a well exactly on the exclusion boundary is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryRule {
    /// Boundary wells are excluded. The conservative default: a well at
    /// exactly the protection distance still counts as too close.
    #[default]
    Intersects,
    /// Boundary wells are retained
    Contains,
}

/// Parameters for the filtering stage
#[derive(Debug, Clone, Default)]
pub struct FilterParams {
    /// Boundary treatment
    pub boundary: BoundaryRule,
}

/// Outcome of the filtering stage.
///
/// Every input well lands in exactly one list; both lists preserve the
/// input order.
#[derive(Debug, Clone)]
pub struct FilterResult {
    pub retained: Vec<Well>,
    pub excluded: Vec<Well>,
}

/// Containment filtering algorithm
#[derive(Debug, Clone, Default)]
pub struct Filter;

impl Algorithm for Filter {
    type Input = (WellSet, ExclusionRegion);
    type Output = FilterResult;
    type Params = FilterParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Filter"
    }

    fn description(&self) -> &'static str {
        "Split candidate wells into retained and excluded by the exclusion region"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (wells, region) = input;
        filter_wells(&wells, &region, &params)
    }
}

/// Filter a well set against an exclusion region.
///
/// The wells and the region must be in equivalent coordinate systems;
/// comparing metres against degrees would silently retain everything.
///
/// # Arguments
/// * `wells` - Candidate wells
/// * `region` - Exclusion region from [`crate::buffer::build_exclusion_region`]
/// * `params` - Boundary treatment
///
/// # Returns
/// Retained and excluded wells, both in input order
pub fn filter_wells(
    wells: &WellSet,
    region: &ExclusionRegion,
    params: &FilterParams,
) -> Result<FilterResult> {
    if !wells.crs().is_equivalent(region.crs()) {
        return Err(Error::CrsMismatch(
            wells.crs().identifier(),
            region.crs().identifier(),
        ));
    }

    let boundary = params.boundary;
    let hits: Vec<bool> = wells
        .wells()
        .into_par_iter()
        .map(|well| {
            let point = well.point();
            match boundary {
                BoundaryRule::Intersects => region.covers(&point),
                BoundaryRule::Contains => region.covers_interior(&point),
            }
        })
        .collect();

    let mut retained = Vec::new();
    let mut excluded = Vec::new();
    for (well, hit) in wells.iter().zip(&hits) {
        if *hit {
            excluded.push(*well);
        } else {
            retained.push(*well);
        }
    }
    Ok(FilterResult { retained, excluded })
}
