//! Projection of wells to geographic coordinates
//!
//! The screening runs in EOV metres but the outputs need WGS84 degrees
//! for the export table and the map handoff. Projection happens after
//! filtering, on the survivors only.

use crate::maybe_rayon::*;
use wellsite_core::crs::eov_to_wgs84;
use wellsite_core::{Algorithm, Error, GeoPoint, Result, Well, WellSet, CRS};

/// Coordinate projection algorithm
#[derive(Debug, Clone, Default)]
pub struct Projector;

impl Algorithm for Projector {
    type Input = WellSet;
    type Output = Vec<(Well, GeoPoint)>;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "Projector"
    }

    fn description(&self) -> &'static str {
        "Project EOV well coordinates to WGS84 latitude/longitude"
    }

    fn execute(&self, input: Self::Input, _params: ()) -> Result<Self::Output> {
        project_wells(&input)
    }
}

/// Project a well set from EOV to WGS84.
///
/// Pairs each well with its geographic position, in input order. The
/// set must actually be in EOV, and a coordinate that fails to project
/// aborts the whole run instead of producing a partial table.
pub fn project_wells(wells: &WellSet) -> Result<Vec<(Well, GeoPoint)>> {
    let eov = CRS::eov();
    if !wells.crs().is_equivalent(&eov) {
        return Err(Error::CrsMismatch(
            wells.crs().identifier(),
            eov.identifier(),
        ));
    }
    wells
        .wells()
        .into_par_iter()
        .map(|&well| Ok((well, eov_to_wgs84(well.x, well.y)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eov_wells(coords: &[(f64, f64)]) -> WellSet {
        WellSet::new(
            "wells",
            coords.iter().map(|&(x, y)| Well::new(x, y)).collect(),
            CRS::eov(),
        )
    }

    #[test]
    fn test_projects_into_hungary() {
        let set = eov_wells(&[(650_000.0, 200_000.0)]);
        let projected = project_wells(&set).unwrap();
        assert_eq!(projected.len(), 1);
        let (well, geo) = projected[0];
        assert_eq!(well, Well::new(650_000.0, 200_000.0));
        assert!((47.0..47.3).contains(&geo.lat), "latitude {}", geo.lat);
        assert!((18.9..19.2).contains(&geo.lon), "longitude {}", geo.lon);
    }

    #[test]
    fn test_pairs_keep_input_order() {
        let coords = [
            (650_000.0, 200_000.0),
            (700_000.0, 250_000.0),
            (600_000.0, 150_000.0),
        ];
        let projected = project_wells(&eov_wells(&coords)).unwrap();
        assert_eq!(projected.len(), 3);
        for ((x, y), (well, _)) in coords.iter().zip(&projected) {
            assert_eq!(well, &Well::new(*x, *y));
        }
        // Further north in EOV means further north in WGS84
        assert!(projected[1].1.lat > projected[0].1.lat);
        assert!(projected[2].1.lat < projected[0].1.lat);
    }

    #[test]
    fn test_non_eov_set_rejected() {
        let set = WellSet::new("geo", vec![Well::new(19.0, 47.0)], CRS::wgs84());
        assert!(matches!(
            project_wells(&set),
            Err(Error::CrsMismatch(_, _))
        ));
    }

    #[test]
    fn test_non_finite_coordinate_aborts() {
        let set = eov_wells(&[(650_000.0, 200_000.0), (f64::NAN, 200_000.0)]);
        assert!(matches!(
            project_wells(&set),
            Err(Error::Projection { .. })
        ));
    }
}
