//! Bounding sphere queries across the visualizers of an entity's owner.

use scene_events::{BoundingSphere, BoundingSphereState, EntityId};

use crate::collection::DataSourceCollection;
use crate::registry::VisualizerRegistry;
use crate::render::RenderContext;
use crate::source::DataSource;

/// Finds the source owning `entity`, checking the default source first.
pub(crate) fn find_owner<'a>(
    default_source: &'a dyn DataSource,
    collection: &'a DataSourceCollection,
    entity: &EntityId,
) -> Option<&'a dyn DataSource> {
    if default_source.entities().contains(entity) {
        return Some(default_source);
    }
    collection.iter().find(|s| s.entities().contains(entity))
}

/// Merges the bounding spheres every visualizer of the owner reports for `entity`.
///
/// With `allow_partial` false, any pending visualizer makes the whole query
/// pending. With it true, pending visualizers are left out of the merge.
/// Returns `Failed` when the entity has no owner or nothing contributed.
pub(crate) fn compute_bounding_sphere(
    scene: &dyn RenderContext,
    default_source: &dyn DataSource,
    collection: &DataSourceCollection,
    registry: &VisualizerRegistry,
    entity: &EntityId,
    allow_partial: bool,
) -> BoundingSphereState {
    let Some(owner) = find_owner(default_source, collection, entity) else {
        return BoundingSphereState::Failed;
    };
    let (Some(entry), Some(target)) = (registry.entry(owner.id()), owner.entities().get(entity))
    else {
        return BoundingSphereState::Failed;
    };

    let mut spheres: Vec<BoundingSphere> = Vec::new();
    for visualizer in entry.visualizers() {
        match visualizer.bounding_sphere(target) {
            None | Some(BoundingSphereState::Failed) => {}
            Some(BoundingSphereState::Pending) => {
                if !allow_partial {
                    return BoundingSphereState::Pending;
                }
            }
            Some(BoundingSphereState::Done { sphere }) => spheres.push(sphere),
        }
    }

    if spheres.is_empty() {
        return BoundingSphereState::Failed;
    }
    BoundingSphereState::done(scene.merge_spheres(&spheres))
}
