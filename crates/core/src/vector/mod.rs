//! Vector data structures for the well screening pipeline

use crate::crs::CRS;
use geo_types::{coord, Point, Polygon};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding rectangle in planar coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Create bounds from explicit extents
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest bounds covering an iterator of `(x, y)` pairs.
    ///
    /// Returns `None` for an empty iterator.
    pub fn from_coords(coords: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut iter = coords.into_iter();
        let (x, y) = iter.next()?;
        let mut bounds = Self::new(x, y, x, y);
        for (x, y) in iter {
            bounds.min_x = bounds.min_x.min(x);
            bounds.min_y = bounds.min_y.min(y);
            bounds.max_x = bounds.max_x.max(x);
            bounds.max_y = bounds.max_y.max(y);
        }
        Some(bounds)
    }

    /// Grow the rectangle outward by `margin` on every side
    pub fn expand(&self, margin: f64) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }

    /// Union with another rectangle
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Width of the rectangle
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the rectangle
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Centre point as (x, y)
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Whether a point lies inside or on the rectangle
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// A well location in planar (EOV) coordinates.
///
/// `x` is the EOV easting and `y` the EOV northing, both in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Well {
    pub x: f64,
    pub y: f64,
}

impl Well {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The well as a geo point geometry
    pub fn point(&self) -> Point<f64> {
        Point(coord! { x: self.x, y: self.y })
    }
}

/// A geographic position in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// An ordered collection of wells sharing one coordinate system.
///
/// Row order is load order and is preserved by every pipeline stage.
#[derive(Debug, Clone)]
pub struct WellSet {
    name: String,
    wells: Vec<Well>,
    crs: CRS,
}

impl WellSet {
    /// Create a well set from already-parsed wells
    pub fn new(name: impl Into<String>, wells: Vec<Well>, crs: CRS) -> Self {
        Self {
            name: name.into(),
            wells,
            crs,
        }
    }

    /// Source name, usually the file stem
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wells in load order
    pub fn wells(&self) -> &[Well] {
        &self.wells
    }

    /// Coordinate system of the wells
    pub fn crs(&self) -> &CRS {
        &self.crs
    }

    /// Number of wells
    pub fn len(&self) -> usize {
        self.wells.len()
    }

    /// Whether the set holds no wells
    pub fn is_empty(&self) -> bool {
        self.wells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Well> {
        self.wells.iter()
    }
}

/// A named collection of polygons sharing one coordinate system.
///
/// One layer corresponds to one protection category (forest, waterbody,
/// wetland, crops). Polygons keep their interior rings; a hole in a
/// polygon is genuinely outside it.
#[derive(Debug, Clone)]
pub struct PolygonLayer {
    name: String,
    polygons: Vec<Polygon<f64>>,
    crs: CRS,
}

impl PolygonLayer {
    /// Create a layer from already-assembled polygons
    pub fn new(name: impl Into<String>, polygons: Vec<Polygon<f64>>, crs: CRS) -> Self {
        Self {
            name: name.into(),
            polygons,
            crs,
        }
    }

    /// Layer name, usually the file stem
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The polygons in record order
    pub fn polygons(&self) -> &[Polygon<f64>] {
        &self.polygons
    }

    /// Coordinate system of the polygons
    pub fn crs(&self) -> &CRS {
        &self.crs
    }

    /// Number of polygons
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    /// Whether the layer holds no polygons
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Polygon<f64>> {
        self.polygons.iter()
    }

    /// Bounds over all exterior rings, `None` for an empty layer
    pub fn bounds(&self) -> Option<Bounds> {
        let mut merged: Option<Bounds> = None;
        for polygon in &self.polygons {
            let coords = polygon.exterior().coords().map(|c| (c.x, c.y));
            if let Some(b) = Bounds::from_coords(coords) {
                merged = Some(match merged {
                    Some(m) => m.merge(&b),
                    None => b,
                });
            }
        }
        merged
    }
}
