//! Pure-Rust HD72 / EOV (EPSG:23700) projection.
//!
//! EOV is a conformal oblique ("Swiss-style") cylindrical projection: the
//! ellipsoid is first mapped to a Gauss conformal sphere, the sphere is
//! rotated so the projection centre lies on the image equator, and the
//! rotated sphere is developed with a Mercator cylinder. Constants are
//! derived at run time from the published EPSG parameters, so forward and
//! inverse stay consistent by construction. The WGS84 entry points add the
//! published HD72 3-parameter geocentric datum shift through ECEF.

use crate::error::{Error, Result};
use crate::vector::GeoPoint;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

// ── IUGG 1967 ellipsoid and projection constants (EPSG:23700) ───────────

const A_GRS67: f64 = 6_378_160.0; // semi-major axis (m)
const F_GRS67: f64 = 1.0 / 298.247_167_427; // flattening
const E2_GRS67: f64 = 2.0 * F_GRS67 - F_GRS67 * F_GRS67; // eccentricity squared

const LAT0_DEG: f64 = 47.144_393_722_222_22; // projection centre, 47°08'39.8174"N
const LON0_DEG: f64 = 19.048_571_777_777_78; // projection centre, 19°02'54.8584"E
const K0: f64 = 0.99993; // scale reduction at the centre
const FALSE_EASTING: f64 = 650_000.0;
const FALSE_NORTHING: f64 = 200_000.0;

// ── HD72 → WGS84 geocentric translation, metres (EPSG:1831) ─────────────

const DX: f64 = 52.17;
const DY: f64 = -71.82;
const DZ: f64 = -14.9;

// ── WGS84 ellipsoid constants ────────────────────────────────────────────

const A_WGS84: f64 = 6_378_137.0;
const F_WGS84: f64 = 1.0 / 298.257_223_563;
const E2_WGS84: f64 = 2.0 * F_WGS84 - F_WGS84 * F_WGS84;

/// Convergence threshold for the latitude iterations (radians)
const CONVERGENCE: f64 = 1e-14;
const MAX_ITER: usize = 30;

/// Gauss conformal sphere fitted at the projection centre.
struct GaussSphere {
    /// Conformal latitude exponent
    c: f64,
    /// Conformal latitude scaling constant
    k: f64,
    /// Rotated pole position (sine and cosine of the centre's
    /// conformal latitude)
    sin_chi0: f64,
    cos_chi0: f64,
    /// Sphere radius times the scale reduction (m)
    rk: f64,
}

fn gauss_sphere() -> GaussSphere {
    let e2 = E2_GRS67;
    let e = e2.sqrt();
    let phi0 = LAT0_DEG.to_radians();
    let (sin_phi0, cos_phi0) = phi0.sin_cos();

    let c = (1.0 + e2 * cos_phi0.powi(4) / (1.0 - e2)).sqrt();
    let sin_chi0 = sin_phi0 / c;
    let cos_chi0 = (1.0 - sin_chi0 * sin_chi0).sqrt();
    let chi0 = sin_chi0.asin();

    // Scaling constant pinning the conformal latitude of the centre
    let t0 = (FRAC_PI_4 + phi0 / 2.0).tan();
    let es0 = ((1.0 - e * sin_phi0) / (1.0 + e * sin_phi0)).powf(e / 2.0);
    let k = (FRAC_PI_4 + chi0 / 2.0).tan() / (t0 * es0).powf(c);

    // Gauss sphere radius sqrt(M0 * N0), scaled by k0
    let rk = K0 * A_GRS67 * (1.0 - e2).sqrt() / (1.0 - e2 * sin_phi0 * sin_phi0);

    GaussSphere {
        c,
        k,
        sin_chi0,
        cos_chi0,
        rk,
    }
}

/// HD72 geodetic coordinates (degrees) to EOV easting/northing (metres).
///
/// The projection core: no datum change. Input outside the projection
/// domain produces non-finite output, which the WGS84 entry points check.
pub fn hd72_to_eov(lat_deg: f64, lon_deg: f64) -> (f64, f64) {
    let gs = gauss_sphere();
    let e = E2_GRS67.sqrt();
    let phi = lat_deg.to_radians();
    let lam = lon_deg.to_radians();

    // Ellipsoid latitude to conformal sphere latitude
    let sin_phi = phi.sin();
    let t = (FRAC_PI_4 + phi / 2.0).tan();
    let es = ((1.0 - e * sin_phi) / (1.0 + e * sin_phi)).powf(e / 2.0);
    let chi = 2.0 * (gs.k * (t * es).powf(gs.c)).atan() - FRAC_PI_2;
    let dlam = gs.c * (lam - LON0_DEG.to_radians());

    // Rotate the sphere so the centre's parallel becomes the equator
    let (sin_chi, cos_chi) = chi.sin_cos();
    let (sin_dlam, cos_dlam) = dlam.sin_cos();
    let sin_phi_r = gs.cos_chi0 * sin_chi - gs.sin_chi0 * cos_chi * cos_dlam;
    let lam_r =
        (cos_chi * sin_dlam).atan2(gs.cos_chi0 * cos_chi * cos_dlam + gs.sin_chi0 * sin_chi);

    // Mercator development of the rotated sphere
    let easting = FALSE_EASTING + gs.rk * lam_r;
    let northing = FALSE_NORTHING + gs.rk * sin_phi_r.atanh();
    (easting, northing)
}

/// EOV easting/northing (metres) to HD72 geodetic coordinates (degrees).
pub fn eov_to_hd72(easting: f64, northing: f64) -> (f64, f64) {
    let gs = gauss_sphere();
    let e = E2_GRS67.sqrt();

    // Undo the Mercator development
    let lam_r = (easting - FALSE_EASTING) / gs.rk;
    let phi_r = 2.0 * ((northing - FALSE_NORTHING) / gs.rk).exp().atan() - FRAC_PI_2;

    // Rotate back to the unrotated sphere
    let (sin_phi_r, cos_phi_r) = phi_r.sin_cos();
    let (sin_lam_r, cos_lam_r) = lam_r.sin_cos();
    let sin_chi = gs.cos_chi0 * sin_phi_r + gs.sin_chi0 * cos_phi_r * cos_lam_r;
    let dlam =
        (cos_phi_r * sin_lam_r).atan2(gs.cos_chi0 * cos_phi_r * cos_lam_r - gs.sin_chi0 * sin_phi_r);
    let chi = sin_chi.asin();

    // Conformal sphere latitude back to ellipsoid latitude, fixed point
    let s = ((FRAC_PI_4 + chi / 2.0).tan() / gs.k).powf(1.0 / gs.c);
    let mut phi = chi;
    for _ in 0..MAX_ITER {
        let esp = e * phi.sin();
        let next = 2.0 * (s * ((1.0 + esp) / (1.0 - esp)).powf(e / 2.0)).atan() - FRAC_PI_2;
        let delta = (next - phi).abs();
        phi = next;
        if delta < CONVERGENCE {
            break;
        }
    }

    let lam = LON0_DEG.to_radians() + dlam / gs.c;
    (phi.to_degrees(), lam.to_degrees())
}

/// EOV easting/northing to WGS84 latitude/longitude.
pub fn eov_to_wgs84(easting: f64, northing: f64) -> Result<GeoPoint> {
    if !easting.is_finite() || !northing.is_finite() {
        return Err(Error::Projection {
            x: easting,
            y: northing,
            reason: "non-finite planar coordinate".to_string(),
        });
    }
    let (lat_hd, lon_hd) = eov_to_hd72(easting, northing);
    let (lat, lon) = hd72_to_wgs84(lat_hd, lon_hd);
    if !lat.is_finite() || !lon.is_finite() {
        return Err(Error::Projection {
            x: easting,
            y: northing,
            reason: "outside the projection domain".to_string(),
        });
    }
    Ok(GeoPoint { lat, lon })
}

/// WGS84 latitude/longitude to EOV easting/northing.
pub fn wgs84_to_eov(lat_deg: f64, lon_deg: f64) -> Result<(f64, f64)> {
    if !lat_deg.is_finite() || !lon_deg.is_finite() || lat_deg.abs() >= 90.0 {
        return Err(Error::Projection {
            x: lon_deg,
            y: lat_deg,
            reason: "latitude must lie strictly inside (-90, 90)".to_string(),
        });
    }
    let (lat_hd, lon_hd) = wgs84_to_hd72(lat_deg, lon_deg);
    let (easting, northing) = hd72_to_eov(lat_hd, lon_hd);
    if !easting.is_finite() || !northing.is_finite() {
        return Err(Error::Projection {
            x: lon_deg,
            y: lat_deg,
            reason: "outside the projection domain".to_string(),
        });
    }
    Ok((easting, northing))
}

// ── Datum shift through earth-centred cartesian coordinates ─────────────

fn hd72_to_wgs84(lat_deg: f64, lon_deg: f64) -> (f64, f64) {
    let (x, y, z) = geodetic_to_ecef(lat_deg.to_radians(), lon_deg.to_radians(), A_GRS67, E2_GRS67);
    let (lat, lon) = ecef_to_geodetic(x + DX, y + DY, z + DZ, A_WGS84, E2_WGS84);
    (lat.to_degrees(), lon.to_degrees())
}

fn wgs84_to_hd72(lat_deg: f64, lon_deg: f64) -> (f64, f64) {
    let (x, y, z) = geodetic_to_ecef(lat_deg.to_radians(), lon_deg.to_radians(), A_WGS84, E2_WGS84);
    let (lat, lon) = ecef_to_geodetic(x - DX, y - DY, z - DZ, A_GRS67, E2_GRS67);
    (lat.to_degrees(), lon.to_degrees())
}

/// Geodetic (radians, ellipsoid height 0) to earth-centred cartesian.
fn geodetic_to_ecef(lat: f64, lon: f64, a: f64, e2: f64) -> (f64, f64, f64) {
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();
    let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    (
        n * cos_lat * cos_lon,
        n * cos_lat * sin_lon,
        n * (1.0 - e2) * sin_lat,
    )
}

/// Earth-centred cartesian to geodetic (radians). Height is re-derived
/// during the iteration and dropped: this is a 2-D transform.
fn ecef_to_geodetic(x: f64, y: f64, z: f64, a: f64, e2: f64) -> (f64, f64) {
    let lon = y.atan2(x);
    let p = x.hypot(y);
    if p < 1e-9 {
        // On the polar axis
        return (FRAC_PI_2.copysign(z), 0.0);
    }

    let mut lat = z.atan2(p * (1.0 - e2));
    for _ in 0..MAX_ITER {
        let sin_lat = lat.sin();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let h = p / lat.cos() - n;
        let next = z.atan2(p * (1.0 - e2 * n / (n + h)));
        let delta = (next - lat).abs();
        lat = next;
        if delta < CONVERGENCE {
            break;
        }
    }
    (lat, lon)
}

// ── Tests ────────────────────────────────────────────────────────────────
