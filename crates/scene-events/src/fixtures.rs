//! Sample data fixtures for testing.
//!
//! This module provides a ready-made scene for other crates to use.
//! Enable the `test-fixtures` feature to access these helpers.
//!
//! # Example
//!
//! ```ignore
//! // In your Cargo.toml:
//! // [dev-dependencies]
//! // scene-events = { path = "../scene-events", features = ["test-fixtures"] }
//!
//! use scene_events::fixtures;
//!
//! let scene = fixtures::sample_scene();
//! ```

use crate::{DataSourceId, Entity, SceneDescription, SourceDescription};

/// Returns the sample scene from the fixtures file.
///
/// Contains:
/// - 1 default entity (ground station: billboard + label)
/// - "satellites" source: a moving satellite with point, model and path,
///   and a static one with point and label; loads for 1 frame
/// - "regions" source: an asynchronous geometry, a polyline and a hidden point
pub fn sample_scene() -> SceneDescription {
    let json = include_str!("../tests/fixtures/sample_scene.json");
    SceneDescription::from_json(json).expect("Failed to parse sample_scene.json")
}

/// Returns a source from the sample scene by name.
pub fn sample_source(name: &str) -> Option<SourceDescription> {
    sample_scene().sources.into_iter().find(|s| s.name == name)
}

/// Returns a specific entity by id from anywhere in the sample scene.
pub fn get_entity(entity_id: &str) -> Option<Entity> {
    let scene = sample_scene();
    scene
        .default_entities
        .into_iter()
        .chain(scene.sources.into_iter().flat_map(|s| s.entities))
        .find(|e| e.id.as_str() == entity_id)
}

/// Identifier of the "satellites" source.
pub fn satellites_id() -> DataSourceId {
    DataSourceId::from_u128(1)
}

/// Identifier of the "regions" source.
pub fn regions_id() -> DataSourceId {
    DataSourceId::from_u128(2)
}
