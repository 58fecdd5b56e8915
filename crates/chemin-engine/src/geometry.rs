//! Geometry normalization and geodesic measures.
//!
//! Road geometry arrives from storage in several historical shapes
//! (flat GeoJSON-style coordinate lists, ESRI-style path containers,
//! and ad-hoc single-key wrappers). Storage adapters normalize each
//! record into [`Geometry`] exactly once; everything downstream works
//! with coordinate slices and never re-sniffs raw documents.

use geo::line_measures::Distance;
use geo::{Haversine, Point};
use serde::{Deserialize, Serialize};

use crate::types::Coord;

const METERS_PER_KM: f64 = 1000.0;

/// Normalized road geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// A flat coordinate sequence (GeoJSON `LineString` style).
    Flat(Vec<Coord>),
    /// An ESRI-style container of one or more paths; the first non-empty
    /// path is the one that counts.
    Paths(Vec<Vec<Coord>>),
    /// No recognized shape yielded any coordinates.
    Unknown,
}

impl Geometry {
    /// First non-empty coordinate sequence, or `None` when the geometry
    /// is unusable. Callers treat `None` as "exclude from all graph
    /// operations"; it is never an error.
    #[must_use]
    pub fn coordinates(&self) -> Option<&[Coord]> {
        match self {
            Self::Flat(coords) if !coords.is_empty() => Some(coords),
            Self::Paths(paths) => paths.iter().find(|p| !p.is_empty()).map(Vec::as_slice),
            Self::Flat(_) | Self::Unknown => None,
        }
    }
}

fn to_point(c: Coord) -> Point<f64> {
    Point::new(c.lon, c.lat)
}

/// Great-circle distance between two coordinates in kilometers.
#[must_use]
pub fn haversine_km(a: Coord, b: Coord) -> f64 {
    Haversine.distance(to_point(a), to_point(b)) / METERS_PER_KM
}

/// Geodesic polyline length in kilometers. Zero for fewer than two points.
#[must_use]
pub fn polyline_length_km(coords: &[Coord]) -> f64 {
    coords.windows(2).map(|w| haversine_km(w[0], w[1])).sum()
}

/// Center of the coordinate sequence's bounding box.
///
/// Deliberately the box center rather than a vertex average, so dense
/// vertex clusters at one end do not pull the reference point around.
#[must_use]
pub fn center(coords: &[Coord]) -> Option<Coord> {
    let first = *coords.first()?;
    let mut min_lon = first.lon;
    let mut max_lon = first.lon;
    let mut min_lat = first.lat;
    let mut max_lat = first.lat;
    for c in &coords[1..] {
        min_lon = min_lon.min(c.lon);
        max_lon = max_lon.max(c.lon);
        min_lat = min_lat.min(c.lat);
        max_lat = max_lat.max(c.lat);
    }
    Some(Coord::new(
        (min_lon + max_lon) / 2.0,
        (min_lat + max_lat) / 2.0,
    ))
}
