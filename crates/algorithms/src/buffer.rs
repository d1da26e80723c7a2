//! Exclusion region construction around protection layers
//!
//! Every polygon in a protection layer pushes wells away by a fixed
//! distance. Instead of computing offset outlines and dissolving them,
//! each polygon is covered by simple convex pieces: the polygon itself,
//! one rectangle per boundary edge and one disc per boundary vertex. A
//! point lies within the buffered area exactly when it hits any piece,
//! which turns membership into cheap point-in-polygon tests.

use crate::maybe_rayon::*;
use geo::{Contains, Coord, Intersects, LineString, Point, Polygon};
use std::f64::consts::PI;
use wellsite_core::{Algorithm, Bounds, Error, PolygonLayer, Result, CRS};

/// Parameters for exclusion region construction
#[derive(Debug, Clone)]
pub struct BufferParams {
    /// Protection distance in metres
    pub distance: f64,
    /// Number of segments to approximate discs (default: 16)
    pub segments: usize,
}

impl Default for BufferParams {
    fn default() -> Self {
        Self {
            distance: 50.0,
            segments: 16,
        }
    }
}

/// One source polygon together with its buffer piece cover.
///
/// The pieces overlap; that is harmless because membership is an
/// any-piece test. The bounds are pre-expanded by the distance so most
/// far-away points are rejected without touching any piece.
#[derive(Debug, Clone)]
pub struct BufferedFeature {
    bounds: Bounds,
    pieces: Vec<Polygon<f64>>,
}

impl BufferedFeature {
    /// Cover one polygon. `None` when the polygon has no coordinates.
    fn from_polygon(polygon: &Polygon<f64>, distance: f64, segments: usize) -> Option<Self> {
        let bounds =
            Bounds::from_coords(polygon.exterior().coords().map(|c| (c.x, c.y)))?.expand(distance);
        let pieces = buffer_polygon(polygon, distance, segments);
        Some(Self { bounds, pieces })
    }

    /// Pre-expanded bounds of the buffered area
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Number of cover pieces
    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    /// Whether the point is on or inside the buffered area
    pub fn covers(&self, point: &Point<f64>) -> bool {
        self.bounds.contains_point(point.x(), point.y())
            && self.pieces.iter().any(|piece| piece.intersects(point))
    }

    /// Whether the point is strictly inside the buffered area
    pub fn covers_interior(&self, point: &Point<f64>) -> bool {
        self.bounds.contains_point(point.x(), point.y())
            && self.pieces.iter().any(|piece| piece.contains(point))
    }
}

/// Build the piece cover of one polygon.
///
/// With a zero distance the cover is the polygon alone. Interior rings
/// are boundary too: their edges and vertices get pieces as well, so a
/// hole shrinks by the distance instead of disappearing.
fn buffer_polygon(polygon: &Polygon<f64>, distance: f64, segments: usize) -> Vec<Polygon<f64>> {
    let mut pieces = vec![polygon.clone()];
    if distance <= 0.0 {
        return pieces;
    }
    ring_pieces(polygon.exterior(), distance, segments, &mut pieces);
    for interior in polygon.interiors() {
        ring_pieces(interior, distance, segments, &mut pieces);
    }
    pieces
}

fn ring_pieces(
    ring: &LineString<f64>,
    distance: f64,
    segments: usize,
    pieces: &mut Vec<Polygon<f64>>,
) {
    let coords = &ring.0;
    for window in coords.windows(2) {
        if let Some(slab) = edge_slab(window[0], window[1], distance) {
            pieces.push(slab);
        }
    }
    // The closing coordinate repeats the first: one disc per distinct vertex
    let distinct = if coords.len() > 1 {
        &coords[..coords.len() - 1]
    } else {
        &coords[..]
    };
    for &vertex in distinct {
        pieces.push(vertex_disc(vertex, distance, segments));
    }
}

/// Rectangle of half-width `distance` centred on the edge.
///
/// The slab spans both sides of the edge, which removes all winding and
/// orientation logic: the half inside the polygon is already covered by
/// the polygon piece, so it never over-claims. Zero-length edges have no
/// slab; their endpoints are covered by vertex discs.
fn edge_slab(a: Coord<f64>, b: Coord<f64>, distance: f64) -> Option<Polygon<f64>> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = dx.hypot(dy);
    if len == 0.0 {
        return None;
    }
    let nx = -dy / len * distance;
    let ny = dx / len * distance;
    Some(Polygon::new(
        LineString::from(vec![
            (a.x - nx, a.y - ny),
            (b.x - nx, b.y - ny),
            (b.x + nx, b.y + ny),
            (a.x + nx, a.y + ny),
            (a.x - nx, a.y - ny),
        ]),
        vec![],
    ))
}

/// Inscribed regular polygon approximating the distance disc at a vertex.
fn vertex_disc(center: Coord<f64>, distance: f64, segments: usize) -> Polygon<f64> {
    let n = segments.max(4);
    let mut coords = Vec::with_capacity(n + 1);
    for i in 0..n {
        let angle = 2.0 * PI * i as f64 / n as f64;
        coords.push((
            center.x + distance * angle.cos(),
            center.y + distance * angle.sin(),
        ));
    }
    // Close the ring
    coords.push(coords[0]);
    Polygon::new(LineString::from(coords), vec![])
}

/// The combined exclusion region of every protection layer.
///
/// Layers are not dissolved into one geometry. The region keeps the
/// buffered features side by side and a point is excluded when any one
/// of them covers it, so overlapping protection areas need no special
/// treatment.
#[derive(Debug, Clone)]
pub struct ExclusionRegion {
    features: Vec<BufferedFeature>,
    crs: CRS,
    distance: f64,
}

impl ExclusionRegion {
    /// The buffered features in layer, then record, order
    pub fn features(&self) -> &[BufferedFeature] {
        &self.features
    }

    /// Coordinate system the region was built in
    pub fn crs(&self) -> &CRS {
        &self.crs
    }

    /// Protection distance the region was built with
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Number of buffered features
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the region excludes nothing
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Total number of cover pieces across all features
    pub fn piece_count(&self) -> usize {
        self.features.iter().map(|f| f.piece_count()).sum()
    }

    /// Whether the point is on or inside any buffered feature
    pub fn covers(&self, point: &Point<f64>) -> bool {
        self.features.iter().any(|feature| feature.covers(point))
    }

    /// Whether the point is strictly inside any buffered feature
    pub fn covers_interior(&self, point: &Point<f64>) -> bool {
        self.features
            .iter()
            .any(|feature| feature.covers_interior(point))
    }
}

/// Exclusion region construction algorithm
#[derive(Debug, Clone, Default)]
pub struct Buffer;

impl Algorithm for Buffer {
    type Input = Vec<PolygonLayer>;
    type Output = ExclusionRegion;
    type Params = BufferParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Buffer"
    }

    fn description(&self) -> &'static str {
        "Build the protection-distance exclusion region around polygon layers"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        build_exclusion_region(&input, &params)
    }
}

/// Build the exclusion region for a set of protection layers.
///
/// All layers must share one coordinate system; the region inherits it.
/// With no layers the region is empty and excludes nothing, which is a
/// valid configuration, not an error.
///
/// # Arguments
/// * `layers` - Protection layers, already in a common planar CRS
/// * `params` - Distance and disc approximation settings
///
/// # Returns
/// The exclusion region ready for point membership tests
pub fn build_exclusion_region(
    layers: &[PolygonLayer],
    params: &BufferParams,
) -> Result<ExclusionRegion> {
    if !params.distance.is_finite() || params.distance < 0.0 {
        return Err(Error::InvalidParameter {
            name: "distance",
            value: params.distance.to_string(),
            reason: "must be a finite, non-negative number of metres".to_string(),
        });
    }
    let crs = uniform_crs(layers)?;

    let polygons: Vec<&Polygon<f64>> = layers.iter().flat_map(|layer| layer.iter()).collect();
    let features: Vec<BufferedFeature> = polygons
        .into_par_iter()
        .filter_map(|polygon| BufferedFeature::from_polygon(polygon, params.distance, params.segments))
        .collect();

    Ok(ExclusionRegion {
        features,
        crs,
        distance: params.distance,
    })
}

fn uniform_crs(layers: &[PolygonLayer]) -> Result<CRS> {
    let mut crs: Option<&CRS> = None;
    for layer in layers {
        match crs {
            None => crs = Some(layer.crs()),
            Some(existing) if existing.is_equivalent(layer.crs()) => {}
            Some(existing) => {
                return Err(Error::CrsMismatch(
                    existing.identifier(),
                    layer.crs().identifier(),
                ))
            }
        }
    }
    Ok(crs.cloned().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;

    fn square(x0: f64, y0: f64, size: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (x0, y0),
                (x0 + size, y0),
                (x0 + size, y0 + size),
                (x0, y0 + size),
                (x0, y0),
            ]),
            vec![],
        )
    }

    fn layer(name: &str, polygons: Vec<Polygon<f64>>) -> PolygonLayer {
        PolygonLayer::new(name, polygons, CRS::eov())
    }

    fn region(layers: &[PolygonLayer], distance: f64) -> ExclusionRegion {
        build_exclusion_region(
            layers,
            &BufferParams {
                distance,
                segments: 16,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_negative_distance_rejected() {
        let result = build_exclusion_region(
            &[layer("forest", vec![square(0.0, 0.0, 10.0)])],
            &BufferParams {
                distance: -5.0,
                segments: 16,
            },
        );
        assert!(matches!(
            result,
            Err(Error::InvalidParameter { name: "distance", .. })
        ));
    }

    #[test]
    fn test_nan_distance_rejected() {
        let result = build_exclusion_region(
            &[],
            &BufferParams {
                distance: f64::NAN,
                segments: 16,
            },
        );
        assert!(matches!(result, Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn test_zero_distance_is_the_polygon_itself() {
        let r = region(&[layer("forest", vec![square(0.0, 0.0, 10.0)])], 0.0);
        assert_eq!(r.piece_count(), 1);
        // Boundary points count as covered, interior-only tests do not
        assert!(r.covers(&Point::new(10.0, 5.0)));
        assert!(!r.covers_interior(&Point::new(10.0, 5.0)));
        assert!(r.covers(&Point::new(5.0, 5.0)));
        assert!(!r.covers(&Point::new(10.1, 5.0)));
    }

    #[test]
    fn test_piece_count_of_square() {
        // Square: the polygon, four edge slabs, four vertex discs
        let r = region(&[layer("forest", vec![square(0.0, 0.0, 10.0)])], 5.0);
        assert_eq!(r.len(), 1);
        assert_eq!(r.piece_count(), 9);
    }

    #[test]
    fn test_disc_area_approximates_circle() {
        let disc = vertex_disc(Coord { x: 0.0, y: 0.0 }, 10.0, 64);
        let expected = PI * 100.0;
        let actual = disc.unsigned_area();
        let error = (actual - expected).abs() / expected;
        assert!(
            error < 0.01,
            "Disc area error {:.2}% (expected {:.1}, got {:.1})",
            error * 100.0,
            expected,
            actual
        );
    }

    #[test]
    fn test_edge_slab_spans_both_sides() {
        let slab = edge_slab(Coord { x: 0.0, y: 0.0 }, Coord { x: 10.0, y: 0.0 }, 5.0)
            .expect("non-degenerate edge");
        assert!(slab.intersects(&Point::new(5.0, 4.9)));
        assert!(slab.intersects(&Point::new(5.0, -4.9)));
        assert!(slab.intersects(&Point::new(5.0, 5.0)));
        assert!(!slab.intersects(&Point::new(5.0, 5.1)));
        assert!(!slab.intersects(&Point::new(10.1, 5.1)));
    }

    #[test]
    fn test_zero_length_edge_has_no_slab() {
        assert!(edge_slab(Coord { x: 1.0, y: 1.0 }, Coord { x: 1.0, y: 1.0 }, 5.0).is_none());
    }

    #[test]
    fn test_square_buffer_membership() {
        let r = region(&[layer("forest", vec![square(0.0, 0.0, 10.0)])], 5.0);

        // Inside the polygon
        assert!(r.covers(&Point::new(5.0, 5.0)));
        // Within distance of an edge
        assert!(r.covers(&Point::new(15.0, 5.0)));
        assert!(r.covers(&Point::new(-4.9, 5.0)));
        // Within distance of the corner, diagonal ~2.83 m
        assert!(r.covers(&Point::new(12.0, 12.0)));
        // Diagonal ~4.24 m, inside the corner disc even with 16 segments
        assert!(r.covers(&Point::new(-3.0, -3.0)));
        // Far outside
        assert!(!r.covers(&Point::new(20.0, 20.0)));
        // Diagonal ~5.66 m from the corner: a true round join excludes it
        assert!(!r.covers(&Point::new(-4.0, -4.0)));
    }

    #[test]
    fn test_boundary_point_at_exact_distance() {
        let r = region(&[layer("forest", vec![square(0.0, 0.0, 10.0)])], 5.0);
        // Exactly on the slab's outer edge
        assert!(r.covers(&Point::new(15.0, 5.0)));
        assert!(!r.covers_interior(&Point::new(15.0, 5.0)));
        assert!(r.covers_interior(&Point::new(14.99, 5.0)));
    }

    #[test]
    fn test_hole_interior_stays_open() {
        // A 20x20 square with a hole from (6,6) to (14,14). The hole's own
        // boundary is buffered inward, but its centre stays out of reach.
        let outer = LineString::from(vec![
            (0.0, 0.0),
            (20.0, 0.0),
            (20.0, 20.0),
            (0.0, 20.0),
            (0.0, 0.0),
        ]);
        let hole = LineString::from(vec![
            (6.0, 6.0),
            (6.0, 14.0),
            (14.0, 14.0),
            (14.0, 6.0),
            (6.0, 6.0),
        ]);
        let donut = Polygon::new(outer, vec![hole]);
        let r = region(&[layer("lake", vec![donut])], 2.0);

        // Solid part of the donut
        assert!(r.covers(&Point::new(10.0, 3.0)));
        // In the hole but within distance of its edge
        assert!(r.covers(&Point::new(10.0, 7.0)));
        // Hole centre is 4 m from the nearest edge
        assert!(!r.covers(&Point::new(10.0, 10.0)));
    }

    #[test]
    fn test_any_layer_excludes() {
        let layers = vec![
            layer("forest", vec![square(0.0, 0.0, 10.0)]),
            layer("wetland", vec![square(100.0, 100.0, 10.0)]),
        ];
        let r = region(&layers, 5.0);
        assert_eq!(r.len(), 2);
        assert!(r.covers(&Point::new(5.0, 5.0)));
        assert!(r.covers(&Point::new(105.0, 113.0)));
        assert!(!r.covers(&Point::new(50.0, 50.0)));
    }

    #[test]
    fn test_no_layers_excludes_nothing() {
        let r = region(&[], 50.0);
        assert!(r.is_empty());
        assert!(!r.covers(&Point::new(0.0, 0.0)));
        assert_eq!(r.crs().epsg(), Some(23700));
    }

    #[test]
    fn test_empty_layer_contributes_nothing() {
        let layers = vec![
            layer("forest", vec![square(0.0, 0.0, 10.0)]),
            layer("crops", Vec::new()),
        ];
        let r = region(&layers, 5.0);
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn test_mixed_crs_rejected() {
        let layers = vec![
            layer("forest", vec![square(0.0, 0.0, 10.0)]),
            PolygonLayer::new("geo", vec![square(0.0, 0.0, 1.0)], CRS::wgs84()),
        ];
        let result = build_exclusion_region(&layers, &BufferParams::default());
        assert!(matches!(result, Err(Error::CrsMismatch(_, _))));
    }

    #[test]
    fn test_feature_bounds_expanded_by_distance() {
        let r = region(&[layer("forest", vec![square(0.0, 0.0, 10.0)])], 5.0);
        let bounds = r.features()[0].bounds();
        assert_eq!(bounds.min_x, -5.0);
        assert_eq!(bounds.max_y, 15.0);
    }
}
