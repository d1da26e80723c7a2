//! Coordinate transformations between the supported reference systems.
//!
//! Everything the pipeline needs routes through three systems: EOV
//! (EPSG:23700) for planar analysis, WGS84 (EPSG:4326) for display
//! coordinates and Web Mercator (EPSG:3857) for tile backgrounds.
//! [`transform_point`] dispatches on the EPSG pair.

use super::eov::{eov_to_wgs84, wgs84_to_eov};
use super::CRS;
use crate::error::{Error, Result};
use std::f64::consts::{FRAC_PI_4, PI};

/// Earth radius of the Web Mercator sphere (m)
const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude limit where the Web Mercator cylinder closes
const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// WGS84 latitude/longitude (degrees) to Web Mercator x/y (metres).
///
/// Latitude is clamped to the projection's limits.
pub fn wgs84_to_web_mercator(lat: f64, lon: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = lon.to_radians() * EARTH_RADIUS;
    let y = (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln() * EARTH_RADIUS;
    (x, y)
}

/// Web Mercator x/y (metres) to WGS84 latitude/longitude (degrees).
pub fn web_mercator_to_wgs84(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    (lat, lon)
}

/// Transform a single point between two coordinate reference systems.
///
/// Input and output are `(x, y)` in the axis order of the respective
/// system: easting/northing for planar systems, longitude/latitude for
/// geographic ones. Equivalent systems pass through unchanged. Pairs
/// without a registered path yield [`Error::UnsupportedTransform`].
pub fn transform_point(x: f64, y: f64, from: &CRS, to: &CRS) -> Result<(f64, f64)> {
    if from.is_equivalent(to) {
        return Ok((x, y));
    }

    match (from.epsg(), to.epsg()) {
        (Some(23700), Some(4326)) => {
            let gp = eov_to_wgs84(x, y)?;
            Ok((gp.lon, gp.lat))
        }
        (Some(4326), Some(23700)) => wgs84_to_eov(y, x),
        (Some(4326), Some(3857)) => {
            let (mx, my) = wgs84_to_web_mercator(y, x);
            Ok((mx, my))
        }
        (Some(3857), Some(4326)) => {
            let (lat, lon) = web_mercator_to_wgs84(x, y);
            Ok((lon, lat))
        }
        (Some(23700), Some(3857)) => {
            let gp = eov_to_wgs84(x, y)?;
            Ok(wgs84_to_web_mercator(gp.lat, gp.lon))
        }
        (Some(3857), Some(23700)) => {
            let (lat, lon) = web_mercator_to_wgs84(x, y);
            wgs84_to_eov(lat, lon)
        }
        _ => Err(Error::UnsupportedTransform(
            from.identifier(),
            to.identifier(),
        )),
    }
}
