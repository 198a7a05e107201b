//! Ownership table from data sources to their renderable groups and visualizers.

use scene_events::DataSourceId;
use std::collections::HashMap;
use std::fmt;

use crate::render::{GroupHandle, RenderContext, RenderableGroup};
use crate::source::DataSource;
use crate::visualizer::{Visualizer, VisualizerFactory};
use crate::DisplayError;

/// Everything the display owns on behalf of one registered data source.
pub struct RegistryEntry {
    pub(crate) group: RenderableGroup,
    pub(crate) visualizers: Vec<Box<dyn Visualizer>>,
}

impl RegistryEntry {
    pub fn group(&self) -> &RenderableGroup {
        &self.group
    }

    pub fn visualizers(&self) -> &[Box<dyn Visualizer>] {
        &self.visualizers
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("group", &self.group.handle())
            .field(
                "visualizers",
                &self.visualizers.iter().map(|v| v.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Registered data sources and the visualizers built for them.
#[derive(Debug, Default)]
pub struct VisualizerRegistry {
    entries: HashMap<DataSourceId, RegistryEntry>,
    next_handle: u64,
}

impl VisualizerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a data source.
    ///
    /// Creates its renderable group, attaches the group to the scene, then
    /// asks the factory for the source's visualizers.
    pub fn on_added(
        &mut self,
        scene: &mut dyn RenderContext,
        factory: &dyn VisualizerFactory,
        source: &dyn DataSource,
    ) -> Result<GroupHandle, DisplayError> {
        let id = source.id();
        if self.entries.contains_key(&id) {
            return Err(DisplayError::AlreadyRegistered(id));
        }

        self.next_handle += 1;
        let handle = GroupHandle(self.next_handle);
        let group = RenderableGroup::new(handle, id);

        scene.attach_group(&group);
        let visualizers = factory.create(&*scene, &group, source);

        tracing::debug!(
            "Attached {} for data source '{}' ({}) with {} visualizers",
            handle,
            source.name(),
            id,
            visualizers.len()
        );

        self.entries.insert(id, RegistryEntry { group, visualizers });
        Ok(handle)
    }

    /// Unregisters a data source.
    ///
    /// Detaches its group from the scene and destroys each of its
    /// visualizers once. Returns how many visualizers were destroyed.
    pub fn on_removed(
        &mut self,
        scene: &mut dyn RenderContext,
        id: DataSourceId,
    ) -> Result<usize, DisplayError> {
        let RegistryEntry {
            mut group,
            visualizers,
        } = self
            .entries
            .remove(&id)
            .ok_or(DisplayError::NotRegistered(id))?;

        let handle = group.handle();
        scene.detach_group(handle);

        let count = visualizers.len();
        for visualizer in visualizers {
            visualizer.destroy(&mut group);
        }

        tracing::debug!(
            "Detached {} for data source {} and destroyed {} visualizers",
            handle,
            id,
            count
        );
        Ok(count)
    }

    pub fn contains(&self, id: DataSourceId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn entry(&self, id: DataSourceId) -> Option<&RegistryEntry> {
        self.entries.get(&id)
    }

    pub(crate) fn entry_mut(&mut self, id: DataSourceId) -> Option<&mut RegistryEntry> {
        self.entries.get_mut(&id)
    }

    pub fn group(&self, id: DataSourceId) -> Option<&RenderableGroup> {
        self.entries.get(&id).map(|e| &e.group)
    }

    /// Number of visualizers registered for `id`.
    pub fn visualizer_count(&self, id: DataSourceId) -> Option<usize> {
        self.entries.get(&id).map(|e| e.visualizers.len())
    }

    /// Number of live visualizers across every entry.
    pub fn total_visualizers(&self) -> usize {
        self.entries.values().map(|e| e.visualizers.len()).sum()
    }

    /// Registered data source ids, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = DataSourceId> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
