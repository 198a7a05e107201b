//! Shared scene types for the data source display.
//!
//! This crate contains pure data structures with no display logic.
//! It is a dependency for all other crates in the workspace.

pub mod bounds;
pub mod entity;
pub mod scene;
pub mod source;
pub mod time;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

// Re-export time types
pub use time::{JulianDate, ParseTimeError, TimeInterval, J2000_DAY_NUMBER, SECONDS_PER_DAY};

// Re-export bounding volume types
pub use bounds::{BoundingSphere, BoundingSphereState};

// Re-export entity types
pub use entity::{Entity, EntityCollection, EntityId, Graphics, GraphicsKind};

// Re-export data source types
pub use source::{CollectionChange, DataSourceId};

// Re-export scene description types
pub use scene::{SceneDescription, SourceDescription};

// Vector type used for positions
pub use glam::DVec3;
