//! Core domain types: identifiers, coordinates, road segments, waypoints.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{self, Geometry};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Opaque identifier of a road segment.
///
/// Identifiers come straight from storage and are never parsed or
/// interpreted; equality and hashing are all the engine needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(String);

impl SegmentId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SegmentId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for SegmentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Opaque identifier of a collection waypoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaypointId(String);

impl WaypointId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WaypointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WaypointId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for WaypointId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Coordinates and segments
// ---------------------------------------------------------------------------

/// A WGS84 coordinate, longitude first (GeoJSON axis order).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lon: f64,
    pub lat: f64,
}

impl Coord {
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// A road segment: an identifier plus its normalized polyline geometry.
///
/// Geometry normalization happens once at load time; past that point a
/// segment either yields a coordinate sequence or is excluded from every
/// graph operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub geometry: Geometry,
    /// Length in kilometers when the source record carries one; absent
    /// lengths are derived from the geometry on demand.
    pub stored_length_km: Option<f64>,
}

impl Segment {
    #[must_use]
    pub fn new(id: impl Into<SegmentId>, geometry: Geometry) -> Self {
        Self {
            id: id.into(),
            geometry,
            stored_length_km: None,
        }
    }

    /// Attach a stored length, overriding the derived one.
    #[must_use]
    pub fn with_length_km(mut self, km: f64) -> Self {
        self.stored_length_km = Some(km);
        self
    }

    /// First usable coordinate sequence, or `None` for unusable geometry.
    #[must_use]
    pub fn coordinates(&self) -> Option<&[Coord]> {
        self.geometry.coordinates()
    }

    /// Length in kilometers: the stored value when present, otherwise the
    /// geodesic length of the polyline. Zero for unusable geometry.
    ///
    /// Stored values that are negative or non-finite are ignored and the
    /// derived length is used instead; a negative traversal cost would
    /// break termination of the shortest-path search.
    #[must_use]
    pub fn length_km(&self) -> f64 {
        self.stored_length_km
            .filter(|km| km.is_finite() && *km >= 0.0)
            .unwrap_or_else(|| self.coordinates().map_or(0.0, geometry::polyline_length_km))
    }

    /// Center of the geometry's bounding box, or `None` for unusable geometry.
    #[must_use]
    pub fn center(&self) -> Option<Coord> {
        self.coordinates().and_then(geometry::center)
    }
}

/// A collection point bound to exactly one hosting road segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: WaypointId,
    /// The road segment this waypoint sits on.
    pub segment_id: SegmentId,
}

impl Waypoint {
    #[must_use]
    pub fn new(id: impl Into<WaypointId>, segment_id: impl Into<SegmentId>) -> Self {
        Self {
            id: id.into(),
            segment_id: segment_id.into(),
        }
    }
}
