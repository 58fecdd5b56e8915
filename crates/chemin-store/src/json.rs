//! JSON-file-backed gateway.
//!
//! The store is a directory holding two document arrays: `roads.json`
//! and `collecting_points.json`, mirroring the legacy collections.
//! Documents are kept as raw JSON values so unknown fields survive the
//! flag rewrite untouched. Geometry arrives in three historical shapes
//! and is normalized here, once, at load time.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use chemin_engine::gateway::{RouteStore, StoreError};
use chemin_engine::{Coord, Geometry, Segment, SegmentId, Waypoint};

pub const ROADS_FILE: &str = "roads.json";
pub const WAYPOINTS_FILE: &str = "collecting_points.json";

/// Attribute that carries the on-route flag, nested under `attributes`.
const FLAG_KEY: &str = "on_optimal_route";

/// Waypoint fields that may reference the hosting segment, in lookup
/// order. Checked inside `attributes` first, then at the top level.
const HOST_KEYS: [&str; 3] = ["route", "road", "segment"];

/// Directory-of-JSON-files implementation of [`RouteStore`].
///
/// Road documents are cached on first read so the flag rewrite works on
/// exactly what was loaded; each write serializes the whole array back
/// in one operation.
#[derive(Debug)]
pub struct JsonStore {
    dir: PathBuf,
    roads: Option<Vec<Value>>,
}

impl JsonStore {
    /// Open a store rooted at `dir`. No I/O happens until the first read.
    #[must_use]
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            roads: None,
        }
    }

    fn roads_path(&self) -> PathBuf {
        self.dir.join(ROADS_FILE)
    }

    fn roads_docs(&mut self) -> Result<&mut Vec<Value>, StoreError> {
        if self.roads.is_none() {
            self.roads = Some(load_docs(&self.roads_path())?);
        }
        match self.roads.as_mut() {
            Some(docs) => Ok(docs),
            None => Err(StoreError::Backend("road cache vanished".into())),
        }
    }

    fn write_roads(&self) -> Result<(), StoreError> {
        let path = self.roads_path();
        let Some(docs) = self.roads.as_ref() else {
            return Err(StoreError::Backend(
                "flag write before roads were loaded".into(),
            ));
        };
        let rendered = serde_json::to_string_pretty(docs)
            .map_err(|e| StoreError::Malformed(e.to_string()))?;
        fs::write(&path, rendered).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

impl RouteStore for JsonStore {
    fn load_segments(&mut self) -> Result<Vec<Segment>, StoreError> {
        let docs = self.roads_docs()?;
        let mut segments = Vec::with_capacity(docs.len());
        for doc in docs.iter() {
            let Some(id) = doc_id(doc) else {
                return Err(StoreError::Malformed("road document without id".into()));
            };
            let geometry = normalize_geometry(doc.get("geometry"));
            let mut segment = Segment::new(id, geometry);
            // Negative or non-finite stored lengths are data entry noise;
            // dropping them here falls back to the derived geodesic length.
            if let Some(km) = doc
                .get("length_km")
                .and_then(Value::as_f64)
                .filter(|km| km.is_finite() && *km >= 0.0)
            {
                segment = segment.with_length_km(km);
            }
            segments.push(segment);
        }
        Ok(segments)
    }

    fn load_waypoints(&mut self) -> Result<Vec<Waypoint>, StoreError> {
        let docs = load_docs(&self.dir.join(WAYPOINTS_FILE))?;
        let mut waypoints = Vec::with_capacity(docs.len());
        for (index, doc) in docs.iter().enumerate() {
            // Waypoints without a host reference carry no routing
            // information; they are skipped, not rejected.
            let Some(host) = host_reference(doc) else {
                continue;
            };
            let id = doc_id(doc).unwrap_or_else(|| format!("waypoint-{index}"));
            waypoints.push(Waypoint::new(id, host));
        }
        Ok(waypoints)
    }

    fn reset_route_flags(&mut self) -> Result<(), StoreError> {
        for doc in self.roads_docs()? {
            set_flag(doc, false);
        }
        self.write_roads()
    }

    fn mark_on_route(&mut self, ids: &[SegmentId]) -> Result<(), StoreError> {
        let wanted: HashSet<&str> = ids.iter().map(SegmentId::as_str).collect();
        for doc in self.roads_docs()? {
            if doc_id(doc).is_some_and(|id| wanted.contains(id.as_str())) {
                set_flag(doc, true);
            }
        }
        self.write_roads()
    }
}

// ---------------------------------------------------------------------------
// Document helpers
// ---------------------------------------------------------------------------

fn load_docs(path: &Path) -> Result<Vec<Value>, StoreError> {
    let raw = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let value: Value =
        serde_json::from_str(&raw).map_err(|e| StoreError::Malformed(e.to_string()))?;
    match value {
        Value::Array(docs) => Ok(docs),
        _ => Err(StoreError::Malformed(format!(
            "{} must hold a top-level array",
            path.display()
        ))),
    }
}

/// Document id: `_id` preferred, `id` tolerated, numbers stringified.
fn doc_id(doc: &Value) -> Option<String> {
    match doc.get("_id").or_else(|| doc.get("id"))? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Hosting-segment reference of a waypoint document.
fn host_reference(doc: &Value) -> Option<String> {
    let scopes = [doc.get("attributes"), Some(doc)];
    for scope in scopes.into_iter().flatten() {
        for key in HOST_KEYS {
            match scope.get(key) {
                Some(Value::String(s)) => return Some(s.clone()),
                Some(Value::Number(n)) => return Some(n.to_string()),
                _ => {}
            }
        }
    }
    None
}

/// Normalize the legacy geometry shapes: a flat `coordinates` list, an
/// ESRI-style `paths` container, then any single key holding a
/// coordinate array. Anything else is `Unknown`.
fn normalize_geometry(geometry: Option<&Value>) -> Geometry {
    let Some(Value::Object(map)) = geometry else {
        return Geometry::Unknown;
    };
    if let Some(coords) = map.get("coordinates").and_then(parse_coord_list) {
        return Geometry::Flat(coords);
    }
    if let Some(paths) = map.get("paths").and_then(parse_paths) {
        return Geometry::Paths(paths);
    }
    for value in map.values() {
        if let Some(coords) = parse_coord_list(value) {
            return Geometry::Flat(coords);
        }
    }
    Geometry::Unknown
}

fn parse_coord(value: &Value) -> Option<Coord> {
    let pair = value.as_array()?;
    let lon = pair.first()?.as_f64()?;
    let lat = pair.get(1)?.as_f64()?;
    Some(Coord::new(lon, lat))
}

fn parse_coord_list(value: &Value) -> Option<Vec<Coord>> {
    let items = value.as_array()?;
    if items.is_empty() {
        return None;
    }
    items.iter().map(parse_coord).collect()
}

fn parse_paths(value: &Value) -> Option<Vec<Vec<Coord>>> {
    let items = value.as_array()?;
    let paths: Vec<Vec<Coord>> = items.iter().filter_map(parse_coord_list).collect();
    if paths.is_empty() { None } else { Some(paths) }
}

fn set_flag(doc: &mut Value, value: bool) {
    if let Value::Object(map) = doc {
        let attrs = map
            .entry("attributes")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(attrs) = attrs {
            attrs.insert(FLAG_KEY.to_owned(), Value::Bool(value));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_coordinates_shape_is_recognized() {
        let g = normalize_geometry(Some(&json!({
            "coordinates": [[2.5, 48.8], [2.501, 48.8]]
        })));
        assert!(matches!(g, Geometry::Flat(ref c) if c.len() == 2));
    }

    #[test]
    fn paths_shape_is_recognized() {
        let g = normalize_geometry(Some(&json!({
            "paths": [[], [[2.5, 48.8], [2.501, 48.8]]]
        })));
        let Geometry::Paths(paths) = g else {
            panic!("expected Paths, got {g:?}");
        };
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].len(), 2);
    }

    #[test]
    fn single_keyed_array_shape_is_recognized() {
        let g = normalize_geometry(Some(&json!({
            "points": [[2.5, 48.8], [2.501, 48.8]]
        })));
        assert!(matches!(g, Geometry::Flat(ref c) if c.len() == 2));
    }

    #[test]
    fn junk_geometry_is_unknown() {
        assert_eq!(normalize_geometry(None), Geometry::Unknown);
        assert_eq!(normalize_geometry(Some(&json!(null))), Geometry::Unknown);
        assert_eq!(normalize_geometry(Some(&json!("wat"))), Geometry::Unknown);
        assert_eq!(
            normalize_geometry(Some(&json!({"coordinates": []}))),
            Geometry::Unknown
        );
        assert_eq!(
            normalize_geometry(Some(&json!({"coordinates": ["a", "b"]}))),
            Geometry::Unknown
        );
    }

    #[test]
    fn doc_id_prefers_underscore_id_and_stringifies_numbers() {
        assert_eq!(doc_id(&json!({"_id": "r1", "id": "other"})).unwrap(), "r1");
        assert_eq!(doc_id(&json!({"id": 42})).unwrap(), "42");
        assert!(doc_id(&json!({"name": "r1"})).is_none());
    }

    #[test]
    fn host_reference_checks_attributes_then_top_level() {
        assert_eq!(
            host_reference(&json!({"attributes": {"route": "r1"}, "road": "r2"})).unwrap(),
            "r1"
        );
        assert_eq!(host_reference(&json!({"segment": 7})).unwrap(), "7");
        assert!(host_reference(&json!({"attributes": {}})).is_none());
    }

    #[test]
    fn set_flag_creates_the_attributes_bag() {
        let mut doc = json!({"_id": "r1"});
        set_flag(&mut doc, true);
        assert_eq!(doc["attributes"][FLAG_KEY], json!(true));
        set_flag(&mut doc, false);
        assert_eq!(doc["attributes"][FLAG_KEY], json!(false));
    }
}
