//! Scene Description
//!
//! The JSON document a driver loads to populate a display: a start time,
//! the entities of the default data source, and any number of named data
//! sources with their own entities.

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityCollection, EntityId};
use crate::source::DataSourceId;
use crate::time::JulianDate;

/// One data source in a scene file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescription {
    pub name: String,
    /// Fixed identifier; a random one is generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DataSourceId>,
    /// Frames the source reports itself as still loading
    #[serde(default)]
    pub loading_frames: u32,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

impl SourceDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            loading_frames: 0,
            entities: Vec::new(),
        }
    }

    /// Collects the entities into a collection.
    pub fn entity_collection(&self) -> EntityCollection {
        self.entities.iter().cloned().collect()
    }
}

/// A complete scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    #[serde(default)]
    pub start: JulianDate,
    /// Entities placed in the display's default data source
    #[serde(default)]
    pub default_entities: Vec<Entity>,
    #[serde(default)]
    pub sources: Vec<SourceDescription>,
}

impl SceneDescription {
    /// Parses a scene from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the scene to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Every entity id in the scene, default entities first.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.default_entities
            .iter()
            .chain(self.sources.iter().flat_map(|s| s.entities.iter()))
            .map(|e| e.id.clone())
            .collect()
    }

    /// Total number of entities across all sources.
    pub fn entity_count(&self) -> usize {
        self.default_entities.len() + self.sources.iter().map(|s| s.entities.len()).sum::<usize>()
    }
}
