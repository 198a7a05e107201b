//! Data sources: owners of entity collections.

use scene_events::{DataSourceId, EntityCollection, JulianDate, SourceDescription};

/// A named collection of entities that the display visualizes.
pub trait DataSource {
    fn id(&self) -> DataSourceId;

    fn name(&self) -> &str;

    fn entities(&self) -> &EntityCollection;

    fn entities_mut(&mut self) -> &mut EntityCollection;

    /// Advances the source's own domain state to `time`.
    ///
    /// Returns `None` for sources without a per-frame update, otherwise
    /// whether the source is fully up to date.
    fn update(&mut self, _time: &JulianDate) -> Option<bool> {
        None
    }
}

/// A data source whose entities are managed by hand.
#[derive(Debug, Clone)]
pub struct CustomDataSource {
    id: DataSourceId,
    name: String,
    entities: EntityCollection,
}

impl CustomDataSource {
    /// Creates an empty source with a random id.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(DataSourceId::generate(), name)
    }

    /// Creates an empty source with a fixed id.
    pub fn with_id(id: DataSourceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            entities: EntityCollection::new(),
        }
    }

    /// Replaces the entity collection.
    pub fn with_entities(mut self, entities: EntityCollection) -> Self {
        self.entities = entities;
        self
    }
}

impl DataSource for CustomDataSource {
    fn id(&self) -> DataSourceId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn entities(&self) -> &EntityCollection {
        &self.entities
    }

    fn entities_mut(&mut self) -> &mut EntityCollection {
        &mut self.entities
    }
}

/// A source that reports itself as still loading for its first few updates.
///
/// Stands in for sources that stream their entities in over several frames.
#[derive(Debug, Clone)]
pub struct ScriptedDataSource {
    inner: CustomDataSource,
    loading_frames: u32,
    updates: u64,
}

impl ScriptedDataSource {
    pub fn new(inner: CustomDataSource, loading_frames: u32) -> Self {
        Self {
            inner,
            loading_frames,
            updates: 0,
        }
    }

    /// Number of updates received so far.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Returns true once the loading frames have elapsed.
    pub fn is_loaded(&self) -> bool {
        self.updates > u64::from(self.loading_frames)
    }
}

impl DataSource for ScriptedDataSource {
    fn id(&self) -> DataSourceId {
        self.inner.id()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn entities(&self) -> &EntityCollection {
        self.inner.entities()
    }

    fn entities_mut(&mut self) -> &mut EntityCollection {
        self.inner.entities_mut()
    }

    fn update(&mut self, _time: &JulianDate) -> Option<bool> {
        self.updates += 1;
        Some(self.is_loaded())
    }
}

/// Builds a boxed source from a scene file entry.
///
/// Entries with loading frames become [`ScriptedDataSource`]s.
pub fn from_description(description: &SourceDescription) -> Box<dyn DataSource> {
    let id = description.id.unwrap_or_else(DataSourceId::generate);
    let custom = CustomDataSource::with_id(id, description.name.clone())
        .with_entities(description.entity_collection());

    if description.loading_frames > 0 {
        Box::new(ScriptedDataSource::new(custom, description.loading_frames))
    } else {
        Box::new(custom)
    }
}
