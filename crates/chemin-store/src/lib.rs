//! Storage gateways for the chemin route engine.
//!
//! Two [`chemin_engine::RouteStore`] implementations: [`JsonStore`]
//! over a directory of JSON document files mirroring the legacy
//! collections, and [`MemoryStore`] for tests and embedding. All
//! geometry-shape tolerance lives here; the engine only ever sees
//! normalized [`chemin_engine::Geometry`].

pub mod json;
pub mod memory;

pub use json::JsonStore;
pub use memory::{FailPoint, MemoryStore};
