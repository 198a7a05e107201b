//! Rendering collaborator interface.
//!
//! The display never draws anything itself. Each registered data source gets
//! a [`RenderableGroup`] that its visualizers fill with primitives; the group
//! is attached to a [`RenderContext`] while the source is registered.

use scene_events::{BoundingSphere, DVec3, DataSourceId, EntityId, GraphicsKind};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

/// Opaque token for one renderable group, unique within a display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupHandle(pub u64);

impl fmt::Display for GroupHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group_{:04}", self.0)
    }
}

/// One drawable item a visualizer produced for an entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Primitive {
    pub entity: EntityId,
    pub kind: GraphicsKind,
    pub center: DVec3,
    pub radius: f64,
    /// False while the primitive is still being built
    pub ready: bool,
    /// Sampled positions, newest last (paths only)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trail: Vec<DVec3>,
}

/// Batching context for the primitives of one data source.
#[derive(Debug, Clone)]
pub struct RenderableGroup {
    handle: GroupHandle,
    source: DataSourceId,
    primitives: BTreeMap<(GraphicsKind, EntityId), Primitive>,
}

impl RenderableGroup {
    /// Creates an empty group owned by `source`.
    pub fn new(handle: GroupHandle, source: DataSourceId) -> Self {
        Self {
            handle,
            source,
            primitives: BTreeMap::new(),
        }
    }

    pub fn handle(&self) -> GroupHandle {
        self.handle
    }

    /// The data source this group belongs to.
    pub fn source(&self) -> DataSourceId {
        self.source
    }

    /// Inserts or replaces the primitive for its (kind, entity) pair.
    pub fn upsert(&mut self, primitive: Primitive) {
        self.primitives
            .insert((primitive.kind, primitive.entity.clone()), primitive);
    }

    pub fn remove(&mut self, kind: GraphicsKind, entity: &EntityId) -> Option<Primitive> {
        self.primitives.remove(&(kind, entity.clone()))
    }

    pub fn get(&self, kind: GraphicsKind, entity: &EntityId) -> Option<&Primitive> {
        self.primitives.get(&(kind, entity.clone()))
    }

    /// Drops every primitive of `kind`.
    pub fn clear_kind(&mut self, kind: GraphicsKind) {
        self.primitives.retain(|(k, _), _| *k != kind);
    }

    pub fn primitives(&self) -> impl Iterator<Item = &Primitive> {
        self.primitives.values()
    }

    /// Number of primitives of `kind`.
    pub fn count_kind(&self, kind: GraphicsKind) -> usize {
        self.primitives.keys().filter(|(k, _)| *k == kind).count()
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}

/// The scene the display feeds.
///
/// Attach and detach are synchronous and cannot fail at this layer; any
/// failure to draw is the implementor's concern.
pub trait RenderContext {
    /// Starts drawing a group.
    fn attach_group(&mut self, group: &RenderableGroup);

    /// Stops drawing a group. The group itself is dropped by the caller.
    fn detach_group(&mut self, handle: GroupHandle);

    /// Merges partial bounding spheres into one enclosing sphere.
    fn merge_spheres(&self, spheres: &[BoundingSphere]) -> BoundingSphere {
        BoundingSphere::from_bounding_spheres(spheres)
    }

    /// Whether terrain heights are initialized. Frames are skipped until they are.
    fn terrain_heights_initialized(&self) -> bool {
        true
    }
}

/// Something that happened to a [`SceneRecorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SceneEvent {
    Attached {
        handle: GroupHandle,
        source: DataSourceId,
    },
    Detached {
        handle: GroupHandle,
    },
}

/// Shared record of what a [`SceneRecorder`] saw.
#[derive(Debug, Clone, Default)]
pub struct SceneJournal {
    pub events: Vec<SceneEvent>,
    pub attached: BTreeSet<GroupHandle>,
    pub attach_count: usize,
    pub detach_count: usize,
}

impl SceneJournal {
    /// Number of times `handle` was detached.
    pub fn detach_count_for(&self, handle: GroupHandle) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SceneEvent::Detached { handle: h } if *h == handle))
            .count()
    }

    /// Handle attached for `source`, if one was ever attached.
    pub fn handle_for(&self, source: DataSourceId) -> Option<GroupHandle> {
        self.events.iter().rev().find_map(|e| match e {
            SceneEvent::Attached { handle, source: s } if *s == source => Some(*handle),
            _ => None,
        })
    }
}

/// In-memory render context that records attach and detach calls.
///
/// The journal is shared, so a driver can keep inspecting it after the
/// display that owns the recorder has been destroyed.
#[derive(Debug)]
pub struct SceneRecorder {
    journal: Rc<RefCell<SceneJournal>>,
    terrain_ready: bool,
}

impl SceneRecorder {
    /// Creates a recorder with terrain heights already initialized.
    pub fn new() -> Self {
        Self {
            journal: Rc::new(RefCell::new(SceneJournal::default())),
            terrain_ready: true,
        }
    }

    /// Creates a recorder whose terrain heights are not initialized yet.
    pub fn without_terrain() -> Self {
        Self {
            terrain_ready: false,
            ..Self::new()
        }
    }

    pub fn set_terrain_heights_initialized(&mut self, ready: bool) {
        self.terrain_ready = ready;
    }

    /// A shared handle to the journal.
    pub fn journal(&self) -> Rc<RefCell<SceneJournal>> {
        Rc::clone(&self.journal)
    }
}

impl Default for SceneRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderContext for SceneRecorder {
    fn attach_group(&mut self, group: &RenderableGroup) {
        let mut journal = self.journal.borrow_mut();
        journal.events.push(SceneEvent::Attached {
            handle: group.handle(),
            source: group.source(),
        });
        journal.attached.insert(group.handle());
        journal.attach_count += 1;
    }

    fn detach_group(&mut self, handle: GroupHandle) {
        let mut journal = self.journal.borrow_mut();
        journal.events.push(SceneEvent::Detached { handle });
        journal.attached.remove(&handle);
        journal.detach_count += 1;
    }

    fn terrain_heights_initialized(&self) -> bool {
        self.terrain_ready
    }
}
