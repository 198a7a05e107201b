//! The visualizer contract and the factory that builds visualizer sets.

use scene_events::{BoundingSphereState, Entity, EntityCollection, JulianDate};

use crate::render::{RenderContext, RenderableGroup};
use crate::source::DataSource;

/// Turns one data source's entities into one category of primitives.
///
/// A visualizer is bound to a single data source for its whole life. The
/// display passes that source's entities and renderable group into every
/// call; visualizers of different sources never share state.
pub trait Visualizer {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Brings the visualizer's primitives up to `time`.
    ///
    /// Returns true when everything this visualizer draws is fully built.
    fn update(
        &mut self,
        time: &JulianDate,
        entities: &EntityCollection,
        group: &mut RenderableGroup,
    ) -> bool;

    /// Bounding sphere of what this visualizer draws for `entity`.
    ///
    /// `None` means the visualizer never computes bounding spheres and is
    /// skipped by bounding sphere queries.
    fn bounding_sphere(&self, _entity: &Entity) -> Option<BoundingSphereState> {
        None
    }

    /// Releases everything the visualizer put into `group`.
    fn destroy(self: Box<Self>, _group: &mut RenderableGroup) {}
}

/// Builds the ordered visualizer list for a newly registered data source.
pub trait VisualizerFactory {
    fn create(
        &self,
        scene: &dyn RenderContext,
        group: &RenderableGroup,
        source: &dyn DataSource,
    ) -> Vec<Box<dyn Visualizer>>;
}

impl<F> VisualizerFactory for F
where
    F: Fn(&dyn RenderContext, &RenderableGroup, &dyn DataSource) -> Vec<Box<dyn Visualizer>>,
{
    fn create(
        &self,
        scene: &dyn RenderContext,
        group: &RenderableGroup,
        source: &dyn DataSource,
    ) -> Vec<Box<dyn Visualizer>> {
        self(scene, group, source)
    }
}

/// Pins a closure to the factory signature so its reference arguments are
/// inferred as higher-ranked.
pub fn factory_fn<F>(f: F) -> F
where
    F: Fn(&dyn RenderContext, &RenderableGroup, &dyn DataSource) -> Vec<Box<dyn Visualizer>>,
{
    f
}
