//! Native ESRI shapefile reading (without GDAL dependency)
//!
//! Reads the `.shp` main file directly with `byteorder`: mixed-endian
//! header, record loop driven by the declared file length, polygon ring
//! assembly by winding order. Z and M payloads are skipped. The `.prj`
//! sidecar, when present, names the source CRS; layers are reprojected
//! to EOV at load time so the rest of the pipeline works in one planar
//! system.

use crate::crs::{transform_point, CRS};
use crate::error::{Error, Result};
use crate::vector::PolygonLayer;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use geo_types::{LineString, Polygon};
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

const SHP_MAGIC: i32 = 9994;
const SHP_VERSION: i32 = 1000;
const HEADER_BYTES: u64 = 100;

const SHAPE_NULL: i32 = 0;
const SHAPE_POLYGON: i32 = 5;
const SHAPE_POLYGON_Z: i32 = 15;
const SHAPE_POLYGON_M: i32 = 25;

fn is_polygon_type(shape: i32) -> bool {
    matches!(shape, SHAPE_POLYGON | SHAPE_POLYGON_Z | SHAPE_POLYGON_M)
}

/// Read a polygon shapefile into a [`PolygonLayer`].
///
/// The layer takes its name from the file stem. A `.prj` sidecar next to
/// the `.shp` names the source CRS; without one the coordinates are
/// assumed to already be EOV. Non-EOV layers are reprojected on load.
pub fn read_shapefile<P: AsRef<Path>>(path: P) -> Result<PolygonLayer> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("layer")
        .to_string();
    let file = File::open(path)?;
    let polygons = decode_shp(BufReader::new(file)).map_err(|e| Error::GeometryRead {
        source_id: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let prj = read_prj_sidecar(path);
    finish_layer(&name, polygons, prj.as_deref())
}

/// Read a polygon shapefile from an in-memory buffer.
///
/// Same as [`read_shapefile`] but takes the `.shp` bytes and the `.prj`
/// content directly. Useful when the data never touches the filesystem.
pub fn read_shapefile_from_buffer(
    data: &[u8],
    prj: Option<&str>,
    name: &str,
) -> Result<PolygonLayer> {
    let polygons = decode_shp(Cursor::new(data)).map_err(|e| Error::GeometryRead {
        source_id: name.to_string(),
        reason: e.to_string(),
    })?;
    finish_layer(name, polygons, prj)
}

fn read_prj_sidecar(path: &Path) -> Option<String> {
    std::fs::read_to_string(path.with_extension("prj")).ok()
}

fn bad(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

/// Internal: decode `.shp` bytes from any `Read + Seek` source.
///
/// Polygons come out in record order; multiple outer rings in one record
/// become multiple polygons.
fn decode_shp<R: Read + Seek>(mut reader: R) -> io::Result<Vec<Polygon<f64>>> {
    let magic = reader.read_i32::<BigEndian>()?;
    if magic != SHP_MAGIC {
        return Err(bad(format!("bad file code {magic}, not a shapefile")));
    }
    for _ in 0..5 {
        reader.read_i32::<BigEndian>()?;
    }
    let file_words = reader.read_i32::<BigEndian>()?;
    if file_words < 50 {
        return Err(bad("declared file length shorter than the header"));
    }
    let total_bytes = file_words as u64 * 2;
    let version = reader.read_i32::<LittleEndian>()?;
    if version != SHP_VERSION {
        return Err(bad(format!("unsupported shapefile version {version}")));
    }
    let file_shape = reader.read_i32::<LittleEndian>()?;
    if file_shape != SHAPE_NULL && !is_polygon_type(file_shape) {
        return Err(bad(format!("shape type {file_shape} is not a polygon type")));
    }
    // Header bounding box, unused
    for _ in 0..8 {
        reader.read_f64::<LittleEndian>()?;
    }

    let mut polygons = Vec::new();
    let mut offset = HEADER_BYTES;
    while offset + 8 <= total_bytes {
        let record = reader.read_i32::<BigEndian>()?;
        let content_words = reader.read_i32::<BigEndian>()?;
        if content_words < 2 {
            return Err(bad(format!("record {record}: content length too short")));
        }
        let content_bytes = content_words as u64 * 2;
        let rec_end = offset + 8 + content_bytes;
        if rec_end > total_bytes {
            return Err(bad(format!(
                "record {record} overruns the declared file length"
            )));
        }
        let rec_shape = reader.read_i32::<LittleEndian>()?;
        if rec_shape != SHAPE_NULL {
            if !is_polygon_type(rec_shape) {
                return Err(bad(format!(
                    "record {record}: shape type {rec_shape} is not a polygon type"
                )));
            }
            let rings = read_polygon_record(&mut reader, content_bytes, record)?;
            polygons.extend(assemble_polygons(rings));
        }
        // Z and M payloads trail the XY data; skip whatever remains
        reader.seek(SeekFrom::Start(rec_end))?;
        offset = rec_end;
    }
    Ok(polygons)
}

/// Read the ring coordinates of one polygon record (XY part only).
fn read_polygon_record<R: Read>(
    reader: &mut R,
    content_bytes: u64,
    record: i32,
) -> io::Result<Vec<Vec<(f64, f64)>>> {
    // Record bounding box, unused
    for _ in 0..4 {
        reader.read_f64::<LittleEndian>()?;
    }
    let num_parts = reader.read_i32::<LittleEndian>()?;
    let num_points = reader.read_i32::<LittleEndian>()?;
    if num_parts < 0 || num_points < 0 {
        return Err(bad(format!("record {record}: negative part or point count")));
    }
    let num_parts = num_parts as usize;
    let num_points = num_points as usize;
    let need = 4 + 32 + 8 + 4 * num_parts as u64 + 16 * num_points as u64;
    if need > content_bytes {
        return Err(bad(format!(
            "record {record}: {num_parts} parts and {num_points} points exceed the declared content length"
        )));
    }

    let mut parts = Vec::with_capacity(num_parts);
    for _ in 0..num_parts {
        let part = reader.read_i32::<LittleEndian>()?;
        if part < 0 || part as usize > num_points {
            return Err(bad(format!("record {record}: part offset {part} out of range")));
        }
        parts.push(part as usize);
    }
    if parts.windows(2).any(|w| w[0] > w[1]) {
        return Err(bad(format!("record {record}: part offsets out of order")));
    }

    let mut points = Vec::with_capacity(num_points);
    for _ in 0..num_points {
        let x = reader.read_f64::<LittleEndian>()?;
        let y = reader.read_f64::<LittleEndian>()?;
        points.push((x, y));
    }

    let mut rings = Vec::with_capacity(parts.len());
    for (i, &start) in parts.iter().enumerate() {
        let end = parts.get(i + 1).copied().unwrap_or(num_points);
        rings.push(points[start..end].to_vec());
    }
    Ok(rings)
}

/// Shoelace sum; negative means clockwise, the shapefile shell winding.
fn ring_signed_area(ring: &[(f64, f64)]) -> f64 {
    let mut sum = 0.0;
    for window in ring.windows(2) {
        let (x1, y1) = window[0];
        let (x2, y2) = window[1];
        sum += x1 * y2 - x2 * y1;
    }
    sum / 2.0
}

/// Even-odd ray cast against a closed ring.
fn ring_contains(ring: &[(f64, f64)], x: f64, y: f64) -> bool {
    let mut inside = false;
    for window in ring.windows(2) {
        let (x1, y1) = window[0];
        let (x2, y2) = window[1];
        if (y1 > y) != (y2 > y) {
            let t = (y - y1) / (y2 - y1);
            if x < x1 + t * (x2 - x1) {
                inside = !inside;
            }
        }
    }
    inside
}

/// Assemble raw rings into polygons by winding order.
///
/// Clockwise rings are shells. Counter-clockwise rings are holes and
/// attach to the first shell containing them; a hole with no containing
/// shell is promoted to a shell, which keeps files with sloppy winding
/// usable. Rings are closed if the writer left them open, and rings too
/// short to bound an area are dropped.
fn assemble_polygons(rings: Vec<Vec<(f64, f64)>>) -> Vec<Polygon<f64>> {
    let mut shells: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut holes: Vec<Vec<(f64, f64)>> = Vec::new();

    for mut ring in rings {
        if let (Some(&first), Some(&last)) = (ring.first(), ring.last()) {
            if first != last {
                ring.push(first);
            }
        }
        if ring.len() < 4 {
            continue;
        }
        if ring_signed_area(&ring) < 0.0 {
            shells.push(ring);
        } else {
            holes.push(ring);
        }
    }

    let mut interiors: Vec<Vec<Vec<(f64, f64)>>> = vec![Vec::new(); shells.len()];
    for hole in holes {
        let (hx, hy) = hole[0];
        match shells.iter().position(|shell| ring_contains(shell, hx, hy)) {
            Some(i) => interiors[i].push(hole),
            None => {
                shells.push(hole);
                interiors.push(Vec::new());
            }
        }
    }

    shells
        .into_iter()
        .zip(interiors)
        .map(|(shell, shell_holes)| {
            Polygon::new(
                LineString::from(shell),
                shell_holes.into_iter().map(LineString::from).collect(),
            )
        })
        .collect()
}

/// Resolve the source CRS and bring the layer into EOV.
fn finish_layer(name: &str, polygons: Vec<Polygon<f64>>, prj: Option<&str>) -> Result<PolygonLayer> {
    let source_crs = match prj {
        Some(wkt) => parse_prj(wkt),
        None => CRS::eov(),
    };
    let target = CRS::eov();
    if source_crs.is_equivalent(&target) {
        return Ok(PolygonLayer::new(name, polygons, target));
    }
    let reprojected = polygons
        .iter()
        .map(|polygon| reproject_polygon(polygon, &source_crs, &target))
        .collect::<Result<Vec<_>>>()?;
    Ok(PolygonLayer::new(name, reprojected, target))
}

fn reproject_polygon(polygon: &Polygon<f64>, from: &CRS, to: &CRS) -> Result<Polygon<f64>> {
    let reproject_ring = |ring: &LineString<f64>| -> Result<LineString<f64>> {
        let coords = ring
            .coords()
            .map(|c| transform_point(c.x, c.y, from, to))
            .collect::<Result<Vec<_>>>()?;
        Ok(LineString::from(coords))
    };
    let exterior = reproject_ring(polygon.exterior())?;
    let interiors = polygon
        .interiors()
        .iter()
        .map(reproject_ring)
        .collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

/// Identify a CRS from `.prj` well-known text.
///
/// OGC WKT carries `AUTHORITY["EPSG","..."]` nodes and the last one names
/// the whole definition. ESRI WKT has no authority nodes, so the common
/// names are matched directly; anything unrecognised is kept as raw WKT
/// and surfaces later as an unsupported transformation.
fn parse_prj(wkt: &str) -> CRS {
    if let Some(epsg) = last_epsg_authority(wkt) {
        return CRS::from_epsg(epsg);
    }
    let upper = wkt.to_uppercase();
    if upper.contains("EOV") || upper.contains("EGYSEGES_ORSZAGOS_VETULETI") {
        CRS::eov()
    } else if upper.contains("WEB_MERCATOR") || upper.contains("PSEUDO-MERCATOR") {
        CRS::web_mercator()
    } else if upper.contains("WGS_1984") || upper.contains("WGS 84") {
        CRS::wgs84()
    } else {
        CRS::from_wkt(wkt)
    }
}

fn last_epsg_authority(wkt: &str) -> Option<u32> {
    const NEEDLE: &str = "AUTHORITY[\"EPSG\",\"";
    let start = wkt.rfind(NEEDLE)? + NEEDLE.len();
    let rest = &wkt[start..];
    let end = rest.find('"')?;
    rest[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Write;

    const EOV_PRJ: &str = r#"PROJCS["HD72 / EOV",GEOGCS["HD72",DATUM["Hungarian_Datum_1972",SPHEROID["GRS 1967",6378160,298.247167427,AUTHORITY["EPSG","7036"]],AUTHORITY["EPSG","6237"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4237"]],PROJECTION["Hotine_Oblique_Mercator_Azimuth_Center"],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AUTHORITY["EPSG","23700"]]"#;

    const WGS84_ESRI_PRJ: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

    fn write_record(buf: &mut Vec<u8>, number: i32, shape: i32, rings: &[Vec<(f64, f64)>]) {
        let mut content: Vec<u8> = Vec::new();
        content.write_i32::<LittleEndian>(shape).unwrap();
        if shape != SHAPE_NULL {
            let num_points: usize = rings.iter().map(|r| r.len()).sum();
            for _ in 0..4 {
                content.write_f64::<LittleEndian>(0.0).unwrap();
            }
            content.write_i32::<LittleEndian>(rings.len() as i32).unwrap();
            content.write_i32::<LittleEndian>(num_points as i32).unwrap();
            let mut start = 0i32;
            for ring in rings {
                content.write_i32::<LittleEndian>(start).unwrap();
                start += ring.len() as i32;
            }
            for ring in rings {
                for &(x, y) in ring {
                    content.write_f64::<LittleEndian>(x).unwrap();
                    content.write_f64::<LittleEndian>(y).unwrap();
                }
            }
            if shape == SHAPE_POLYGON_Z {
                // Z range followed by one Z per point
                content.write_f64::<LittleEndian>(0.0).unwrap();
                content.write_f64::<LittleEndian>(2.0).unwrap();
                for _ in 0..num_points {
                    content.write_f64::<LittleEndian>(1.5).unwrap();
                }
            }
        }
        buf.write_i32::<BigEndian>(number).unwrap();
        buf.write_i32::<BigEndian>((content.len() / 2) as i32).unwrap();
        buf.extend_from_slice(&content);
    }

    fn build_shp(file_shape: i32, records: &[(i32, Vec<Vec<(f64, f64)>>)]) -> Vec<u8> {
        let mut body: Vec<u8> = Vec::new();
        for (i, (shape, rings)) in records.iter().enumerate() {
            write_record(&mut body, (i + 1) as i32, *shape, rings);
        }
        let mut buf: Vec<u8> = Vec::new();
        buf.write_i32::<BigEndian>(SHP_MAGIC).unwrap();
        for _ in 0..5 {
            buf.write_i32::<BigEndian>(0).unwrap();
        }
        buf.write_i32::<BigEndian>(((100 + body.len()) / 2) as i32).unwrap();
        buf.write_i32::<LittleEndian>(SHP_VERSION).unwrap();
        buf.write_i32::<LittleEndian>(file_shape).unwrap();
        for _ in 0..8 {
            buf.write_f64::<LittleEndian>(0.0).unwrap();
        }
        buf.extend_from_slice(&body);
        buf
    }

    /// Clockwise square ring, the shapefile shell winding
    fn cw_square(x0: f64, y0: f64, size: f64) -> Vec<(f64, f64)> {
        vec![
            (x0, y0),
            (x0, y0 + size),
            (x0 + size, y0 + size),
            (x0 + size, y0),
            (x0, y0),
        ]
    }

    /// Counter-clockwise square ring, the hole winding
    fn ccw_square(x0: f64, y0: f64, size: f64) -> Vec<(f64, f64)> {
        vec![
            (x0, y0),
            (x0 + size, y0),
            (x0 + size, y0 + size),
            (x0, y0 + size),
            (x0, y0),
        ]
    }

    #[test]
    fn test_read_single_polygon() {
        let data = build_shp(SHAPE_POLYGON, &[(SHAPE_POLYGON, vec![cw_square(0.0, 0.0, 10.0)])]);
        let layer = read_shapefile_from_buffer(&data, None, "forest").unwrap();
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.name(), "forest");
        assert_eq!(layer.crs().epsg(), Some(23700));
        let polygon = &layer.polygons()[0];
        assert_eq!(polygon.exterior().coords().count(), 5);
        assert!(polygon.interiors().is_empty());
    }

    #[test]
    fn test_hole_attaches_to_shell() {
        let rings = vec![cw_square(0.0, 0.0, 10.0), ccw_square(2.0, 2.0, 6.0)];
        let data = build_shp(SHAPE_POLYGON, &[(SHAPE_POLYGON, rings)]);
        let layer = read_shapefile_from_buffer(&data, None, "lake").unwrap();
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.polygons()[0].interiors().len(), 1);
    }

    #[test]
    fn test_two_shells_become_two_polygons() {
        let rings = vec![cw_square(0.0, 0.0, 10.0), cw_square(100.0, 100.0, 5.0)];
        let data = build_shp(SHAPE_POLYGON, &[(SHAPE_POLYGON, rings)]);
        let layer = read_shapefile_from_buffer(&data, None, "patches").unwrap();
        assert_eq!(layer.len(), 2);
    }

    #[test]
    fn test_orphan_hole_promoted_to_shell() {
        // All rings wound counter-clockwise, as sloppy writers produce
        let rings = vec![ccw_square(0.0, 0.0, 10.0)];
        let data = build_shp(SHAPE_POLYGON, &[(SHAPE_POLYGON, rings)]);
        let layer = read_shapefile_from_buffer(&data, None, "sloppy").unwrap();
        assert_eq!(layer.len(), 1);
    }

    #[test]
    fn test_polygon_z_payload_skipped() {
        let records = vec![
            (SHAPE_POLYGON_Z, vec![cw_square(0.0, 0.0, 10.0)]),
            (SHAPE_POLYGON_Z, vec![cw_square(50.0, 50.0, 10.0)]),
        ];
        let data = build_shp(SHAPE_POLYGON_Z, &records);
        let layer = read_shapefile_from_buffer(&data, None, "terrain").unwrap();
        assert_eq!(layer.len(), 2);
        let bounds = layer.bounds().unwrap();
        assert_eq!(bounds.max_x, 60.0);
        assert_eq!(bounds.max_y, 60.0);
    }

    #[test]
    fn test_null_records_skipped() {
        let records = vec![
            (SHAPE_NULL, Vec::new()),
            (SHAPE_POLYGON, vec![cw_square(0.0, 0.0, 10.0)]),
        ];
        let data = build_shp(SHAPE_POLYGON, &records);
        let layer = read_shapefile_from_buffer(&data, None, "gappy").unwrap();
        assert_eq!(layer.len(), 1);
    }

    #[test]
    fn test_empty_file_gives_empty_layer() {
        let data = build_shp(SHAPE_POLYGON, &[]);
        let layer = read_shapefile_from_buffer(&data, None, "empty").unwrap();
        assert!(layer.is_empty());
        assert_eq!(layer.crs().epsg(), Some(23700));
    }

    #[test]
    fn test_point_file_rejected() {
        let data = build_shp(1, &[]);
        let result = read_shapefile_from_buffer(&data, None, "points");
        match result {
            Err(Error::GeometryRead { reason, .. }) => {
                assert!(reason.contains("not a polygon"), "reason: {reason}")
            }
            other => panic!("expected GeometryRead, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut data = build_shp(SHAPE_POLYGON, &[]);
        data[0] = 1;
        let result = read_shapefile_from_buffer(&data, None, "junk");
        assert!(matches!(result, Err(Error::GeometryRead { .. })));
    }

    #[test]
    fn test_truncated_file_rejected() {
        let data = build_shp(SHAPE_POLYGON, &[(SHAPE_POLYGON, vec![cw_square(0.0, 0.0, 10.0)])]);
        let result = read_shapefile_from_buffer(&data[..data.len() - 40], None, "cut");
        assert!(matches!(result, Err(Error::GeometryRead { .. })));
    }

    #[test]
    fn test_bad_part_offsets_rejected() {
        let mut data = build_shp(SHAPE_POLYGON, &[(SHAPE_POLYGON, vec![cw_square(0.0, 0.0, 10.0)])]);
        // Part offset lives right after the record bbox and counts
        let part_pos = 100 + 8 + 4 + 32 + 8;
        data[part_pos..part_pos + 4].copy_from_slice(&100i32.to_le_bytes());
        let result = read_shapefile_from_buffer(&data, None, "badparts");
        match result {
            Err(Error::GeometryRead { reason, .. }) => {
                assert!(reason.contains("out of range"), "reason: {reason}")
            }
            other => panic!("expected GeometryRead, got {other:?}"),
        }
    }

    #[test]
    fn test_prj_authority_detected() {
        let data = build_shp(SHAPE_POLYGON, &[(SHAPE_POLYGON, vec![cw_square(650_000.0, 200_000.0, 100.0)])]);
        let layer = read_shapefile_from_buffer(&data, Some(EOV_PRJ), "zones").unwrap();
        assert_eq!(layer.crs().epsg(), Some(23700));
        // Already EOV, so coordinates pass through untouched
        let bounds = layer.bounds().unwrap();
        assert_eq!(bounds.min_x, 650_000.0);
    }

    #[test]
    fn test_wgs84_layer_reprojected_to_eov() {
        // A small square near Budapest in lon/lat order
        let ring = vec![
            (19.0, 47.1),
            (19.0, 47.11),
            (19.01, 47.11),
            (19.01, 47.1),
            (19.0, 47.1),
        ];
        let data = build_shp(SHAPE_POLYGON, &[(SHAPE_POLYGON, vec![ring])]);
        let layer = read_shapefile_from_buffer(&data, Some(WGS84_ESRI_PRJ), "geo").unwrap();
        assert_eq!(layer.crs().epsg(), Some(23700));
        let bounds = layer.bounds().unwrap();
        assert!((600_000.0..700_000.0).contains(&bounds.min_x), "easting {}", bounds.min_x);
        assert!((150_000.0..250_000.0).contains(&bounds.min_y), "northing {}", bounds.min_y);
        assert!(bounds.width() > 500.0 && bounds.width() < 1_200.0, "width {}", bounds.width());
    }

    #[test]
    fn test_unknown_prj_rejected() {
        let data = build_shp(SHAPE_POLYGON, &[(SHAPE_POLYGON, vec![cw_square(0.0, 0.0, 10.0)])]);
        let prj = r#"PROJCS["Mystery_Grid",GEOGCS["GCS_Unknown",DATUM["D_Unknown",SPHEROID["S",6378137.0,298.25]]]]"#;
        let result = read_shapefile_from_buffer(&data, Some(prj), "mystery");
        assert!(matches!(result, Err(Error::UnsupportedTransform(_, _))));
    }

    #[test]
    fn test_read_from_path_with_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let shp_path = dir.path().join("wetland.shp");
        let data = build_shp(SHAPE_POLYGON, &[(SHAPE_POLYGON, vec![cw_square(640_000.0, 190_000.0, 500.0)])]);
        std::fs::File::create(&shp_path)
            .unwrap()
            .write_all(&data)
            .unwrap();
        std::fs::write(dir.path().join("wetland.prj"), EOV_PRJ).unwrap();

        let layer = read_shapefile(&shp_path).unwrap();
        assert_eq!(layer.name(), "wetland");
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.crs().epsg(), Some(23700));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = read_shapefile("/nonexistent/zones.shp");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
