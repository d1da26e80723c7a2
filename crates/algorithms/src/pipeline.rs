//! The full screening pipeline
//!
//! Wires the stages together: build the exclusion region, filter the
//! candidates, project the survivors and assemble the report. Each stage
//! is pure, so the whole run is a deterministic function of its inputs.

use crate::buffer::{build_exclusion_region, BufferParams};
use crate::filter::{filter_wells, FilterParams};
use crate::project::project_wells;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use wellsite_core::{
    Error, GeoPoint, MapPoint, PointCategory, PolygonLayer, Result, Well, WellRecord, WellReport,
    WellSet,
};

/// Parameters for a full screening run
#[derive(Debug, Clone, Default)]
pub struct PipelineParams {
    /// Exclusion region construction
    pub buffer: BufferParams,
    /// Boundary treatment during filtering
    pub filter: FilterParams,
}

/// Counters describing one screening run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisStats {
    /// Protection layers that went in
    pub layer_count: usize,
    /// Buffered features in the exclusion region
    pub feature_count: usize,
    /// Cover pieces across all features
    pub piece_count: usize,
    /// Candidate wells that went in
    pub candidate_count: usize,
    /// Candidates that survived
    pub retained_count: usize,
    /// Candidates removed by the region
    pub excluded_count: usize,
    /// Fingerprint of the region inputs, see [`analysis_fingerprint`]
    pub fingerprint: u64,
}

/// Outcome of a full screening run
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Export table and map handoff
    pub report: WellReport,
    /// Retained wells in planar coordinates, input order
    pub retained: Vec<Well>,
    /// Excluded wells in planar coordinates, input order
    pub excluded: Vec<Well>,
    /// Run counters
    pub stats: AnalysisStats,
}

/// Run the whole screening pipeline.
///
/// Reference wells are only projected and placed on the map; they take
/// no part in the filtering. An outcome with zero retained wells is a
/// valid result that callers should surface as a warning, not an error.
pub fn run_analysis(
    layers: &[PolygonLayer],
    candidates: &WellSet,
    reference: Option<&WellSet>,
    params: &PipelineParams,
) -> Result<Analysis> {
    let region = build_exclusion_region(layers, &params.buffer)?;
    let filtered = filter_wells(candidates, &region, &params.filter)?;

    let retained_set = WellSet::new(
        candidates.name(),
        filtered.retained.clone(),
        candidates.crs().clone(),
    );
    let projected = project_wells(&retained_set)?;
    let reference_projected = match reference {
        Some(set) => project_wells(set)?,
        None => Vec::new(),
    };

    let report = assemble_report(&filtered.retained, &projected, &reference_projected)?;
    let stats = AnalysisStats {
        layer_count: layers.len(),
        feature_count: region.len(),
        piece_count: region.piece_count(),
        candidate_count: candidates.len(),
        retained_count: filtered.retained.len(),
        excluded_count: filtered.excluded.len(),
        fingerprint: analysis_fingerprint(layers, params.buffer.distance),
    };

    Ok(Analysis {
        report,
        retained: filtered.retained,
        excluded: filtered.excluded,
        stats,
    })
}

/// Pair retained wells with their projected positions into a report.
///
/// Pairing is positional, so the projected list must line up with the
/// retained list exactly; any divergence means a bug upstream and comes
/// back as a consistency error rather than a silently shuffled table.
/// Reference wells go on the map first so candidates draw above them.
pub fn assemble_report(
    retained: &[Well],
    projected: &[(Well, GeoPoint)],
    reference: &[(Well, GeoPoint)],
) -> Result<WellReport> {
    if retained.len() != projected.len() {
        return Err(Error::Consistency(format!(
            "{} retained wells but {} projected positions",
            retained.len(),
            projected.len()
        )));
    }

    let mut records = Vec::with_capacity(retained.len());
    for (well, (projected_well, geo)) in retained.iter().zip(projected) {
        if well.x.to_bits() != projected_well.x.to_bits()
            || well.y.to_bits() != projected_well.y.to_bits()
        {
            return Err(Error::Consistency(format!(
                "projected well ({}, {}) does not match retained well ({}, {})",
                projected_well.x, projected_well.y, well.x, well.y
            )));
        }
        records.push(WellRecord {
            x: well.x,
            y: well.y,
            lat: geo.lat,
            lon: geo.lon,
        });
    }

    let mut map_points = Vec::with_capacity(reference.len() + records.len());
    for (_, geo) in reference {
        map_points.push(MapPoint::new(geo.lat, geo.lon, PointCategory::Reference));
    }
    for record in &records {
        map_points.push(MapPoint::new(record.lat, record.lon, PointCategory::Candidate));
    }

    Ok(WellReport::new(records, map_points))
}

/// Stable fingerprint of the inputs that determine an exclusion region.
///
/// Two runs with equal fingerprints build identical regions, so a caller
/// that screens several candidate sets against the same layers can build
/// the region once and key it by this value. Coordinates are hashed by
/// their bit patterns; any change to a layer name, polygon or the
/// distance changes the fingerprint.
pub fn analysis_fingerprint(layers: &[PolygonLayer], distance: f64) -> u64 {
    let mut hasher = DefaultHasher::new();
    distance.to_bits().hash(&mut hasher);
    layers.len().hash(&mut hasher);
    for layer in layers {
        layer.name().hash(&mut hasher);
        layer.len().hash(&mut hasher);
        for polygon in layer.iter() {
            let rings = std::iter::once(polygon.exterior()).chain(polygon.interiors().iter());
            for ring in rings {
                ring.0.len().hash(&mut hasher);
                for coord in ring.coords() {
                    coord.x.to_bits().hash(&mut hasher);
                    coord.y.to_bits().hash(&mut hasher);
                }
            }
        }
    }
    hasher.finish()
}
