//! The standard visualizer set.
//!
//! One [`GraphicsVisualizer`] per [`GraphicsKind`]. Billboards, labels and
//! points are built the frame they appear. Geometry, models and polylines
//! are asynchronous: each primitive stays pending for the first
//! `load_frames` updates after its entity shows up. Paths keep a trail of
//! positions and never report bounding spheres.

use scene_events::{
    BoundingSphere, BoundingSphereState, DVec3, Entity, EntityCollection, EntityId, Graphics,
    GraphicsKind, JulianDate,
};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::VisualizerConfig;
use crate::render::{Primitive, RenderContext, RenderableGroup};
use crate::source::DataSource;
use crate::visualizer::{Visualizer, VisualizerFactory};

/// Per-entity state kept between frames.
#[derive(Debug, Clone)]
struct TrackedPrimitive {
    frames_remaining: u32,
    ready: bool,
    sphere: BoundingSphere,
    trail: VecDeque<DVec3>,
}

impl TrackedPrimitive {
    fn new(load_frames: u32) -> Self {
        Self {
            frames_remaining: load_frames,
            ready: false,
            sphere: BoundingSphere::default(),
            trail: VecDeque::new(),
        }
    }

    /// Counts one update toward loading.
    fn advance(&mut self) {
        if self.frames_remaining > 0 {
            self.frames_remaining -= 1;
            self.ready = false;
        } else {
            self.ready = true;
        }
    }
}

/// Visualizer for every entity carrying graphics of one kind.
#[derive(Debug)]
pub struct GraphicsVisualizer {
    kind: GraphicsKind,
    name: String,
    max_path_samples: usize,
    tracked: HashMap<EntityId, TrackedPrimitive>,
}

impl GraphicsVisualizer {
    pub fn new(kind: GraphicsKind) -> Self {
        Self {
            kind,
            name: format!("{}_visualizer", kind),
            max_path_samples: VisualizerConfig::default().max_path_samples,
            tracked: HashMap::new(),
        }
    }

    pub fn with_max_path_samples(mut self, samples: usize) -> Self {
        self.max_path_samples = samples.max(1);
        self
    }

    pub fn kind(&self) -> GraphicsKind {
        self.kind
    }

    /// Number of entities currently drawn.
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    fn sphere_for(&self, graphics: &Graphics, position: DVec3) -> BoundingSphere {
        match self.kind {
            GraphicsKind::Polyline => BoundingSphere::from_points(&graphics.positions)
                .unwrap_or_else(|| BoundingSphere::point(position)),
            _ => BoundingSphere::new(position, graphics.radius),
        }
    }
}

impl Visualizer for GraphicsVisualizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(
        &mut self,
        time: &JulianDate,
        entities: &EntityCollection,
        group: &mut RenderableGroup,
    ) -> bool {
        let mut seen = HashSet::new();
        let mut all_ready = true;

        for entity in entities.iter() {
            let Some(graphics) = entity.graphics_of(self.kind) else {
                continue;
            };
            if !entity.show || !graphics.show || !entity.is_available(time) {
                continue;
            }
            let Some(position) = entity.position_at(time) else {
                continue;
            };

            let load_frames = if self.kind.is_asynchronous() {
                graphics.load_frames
            } else {
                0
            };
            let sphere = self.sphere_for(graphics, position);
            let max_samples = self.max_path_samples;
            let item = self
                .tracked
                .entry(entity.id.clone())
                .or_insert_with(|| TrackedPrimitive::new(load_frames));

            item.advance();
            item.sphere = sphere;
            if self.kind == GraphicsKind::Path {
                item.trail.push_back(position);
                while item.trail.len() > max_samples {
                    item.trail.pop_front();
                }
            }
            all_ready &= item.ready;

            group.upsert(Primitive {
                entity: entity.id.clone(),
                kind: self.kind,
                center: sphere.center,
                radius: sphere.radius,
                ready: item.ready,
                trail: item.trail.iter().copied().collect(),
            });
            seen.insert(entity.id.clone());
        }

        let kind = self.kind;
        self.tracked.retain(|id, _| {
            let keep = seen.contains(id);
            if !keep {
                group.remove(kind, id);
            }
            keep
        });

        all_ready
    }

    fn bounding_sphere(&self, entity: &Entity) -> Option<BoundingSphereState> {
        if self.kind == GraphicsKind::Path {
            return None;
        }
        let state = match self.tracked.get(&entity.id) {
            None => BoundingSphereState::Failed,
            Some(item) if !item.ready => BoundingSphereState::Pending,
            Some(item) => BoundingSphereState::done(item.sphere),
        };
        Some(state)
    }

    fn destroy(self: Box<Self>, group: &mut RenderableGroup) {
        group.clear_kind(self.kind);
    }
}

/// The default factory: one [`GraphicsVisualizer`] per enabled kind.
#[derive(Debug, Clone)]
pub struct StandardVisualizerFactory {
    kinds: Vec<GraphicsKind>,
    max_path_samples: usize,
}

impl StandardVisualizerFactory {
    /// Factory for every graphics kind.
    pub fn new() -> Self {
        Self::from_config(&VisualizerConfig::default())
    }

    pub fn from_config(config: &VisualizerConfig) -> Self {
        Self {
            kinds: config.enabled.clone(),
            max_path_samples: config.max_path_samples,
        }
    }

    /// Kinds this factory builds visualizers for, in order.
    pub fn kinds(&self) -> &[GraphicsKind] {
        &self.kinds
    }
}

impl Default for StandardVisualizerFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl VisualizerFactory for StandardVisualizerFactory {
    fn create(
        &self,
        _scene: &dyn RenderContext,
        _group: &RenderableGroup,
        _source: &dyn DataSource,
    ) -> Vec<Box<dyn Visualizer>> {
        self.kinds
            .iter()
            .map(|kind| {
                Box::new(
                    GraphicsVisualizer::new(*kind).with_max_path_samples(self.max_path_samples),
                ) as Box<dyn Visualizer>
            })
            .collect()
    }
}
