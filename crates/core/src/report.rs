//! Result table and map handoff structures.
//!
//! The screening pipeline ends in a [`WellReport`]: one [`WellRecord`] per
//! retained well, in input order, plus the [`MapPoint`] list a map front
//! end needs to draw reference and candidate markers.

use crate::vector::GeoPoint;
use serde::{Deserialize, Serialize};

/// Marker category on the output map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointCategory {
    /// Existing production well shown for orientation
    Reference,
    /// Candidate well that survived the exclusion screening
    Candidate,
}

/// One retained well with both coordinate representations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WellRecord {
    /// EOV easting (m)
    pub x: f64,
    /// EOV northing (m)
    pub y: f64,
    /// WGS84 latitude (degrees)
    pub lat: f64,
    /// WGS84 longitude (degrees)
    pub lon: f64,
}

/// A categorised marker position for the map handoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub lat: f64,
    pub lon: f64,
    pub category: PointCategory,
}

impl MapPoint {
    pub fn new(lat: f64, lon: f64, category: PointCategory) -> Self {
        Self { lat, lon, category }
    }
}

/// Final output of a screening run.
///
/// An empty report is a valid outcome: it means every candidate fell
/// inside a protection buffer, not that the run failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WellReport {
    records: Vec<WellRecord>,
    map_points: Vec<MapPoint>,
}

impl WellReport {
    pub fn new(records: Vec<WellRecord>, map_points: Vec<MapPoint>) -> Self {
        Self {
            records,
            map_points,
        }
    }

    /// Retained wells in input order
    pub fn records(&self) -> &[WellRecord] {
        &self.records
    }

    /// Marker positions, reference wells first
    pub fn map_points(&self) -> &[MapPoint] {
        &self.map_points
    }

    /// Number of retained wells
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no candidate survived the screening
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Render the export table.
    ///
    /// Column order is fixed: planar coordinates first, then the
    /// geographic pair. The header is part of the file contract.
    pub fn to_csv(&self) -> String {
        let mut out = String::from("EOV_X,EOV_Y,Latitude,Longitude\n");
        for record in &self.records {
            out.push_str(&format!(
                "{},{},{},{}\n",
                record.x, record.y, record.lat, record.lon
            ));
        }
        out
    }

    /// Suggested map centre: the mean of the per-category mean positions.
    ///
    /// Averaging category means first keeps a large candidate cloud from
    /// drowning out a handful of reference wells. `None` when there are
    /// no markers at all.
    pub fn map_center(&self) -> Option<GeoPoint> {
        let mut means: Vec<(f64, f64)> = Vec::new();
        for category in [PointCategory::Reference, PointCategory::Candidate] {
            let mut lat_sum = 0.0;
            let mut lon_sum = 0.0;
            let mut count = 0usize;
            for point in self.map_points.iter().filter(|p| p.category == category) {
                lat_sum += point.lat;
                lon_sum += point.lon;
                count += 1;
            }
            if count > 0 {
                means.push((lat_sum / count as f64, lon_sum / count as f64));
            }
        }
        if means.is_empty() {
            return None;
        }
        let n = means.len() as f64;
        let lat = means.iter().map(|m| m.0).sum::<f64>() / n;
        let lon = means.iter().map(|m| m.1).sum::<f64>() / n;
        Some(GeoPoint::new(lat, lon))
    }
}
