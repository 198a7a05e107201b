//! Entity Types
//!
//! Domain objects owned by data sources. An entity has an optional
//! time-dependent position and any number of graphics descriptors, one per
//! kind of drawable representation it wants.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::time::{JulianDate, TimeInterval};

/// Unique identifier of an entity within its collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Category of drawable representation.
///
/// Each kind is handled by its own visualizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphicsKind {
    Billboard,
    Geometry,
    Label,
    Model,
    Point,
    Path,
    Polyline,
}

impl GraphicsKind {
    /// Every kind, in the order the standard visualizer set is built.
    pub const ALL: [GraphicsKind; 7] = [
        GraphicsKind::Billboard,
        GraphicsKind::Geometry,
        GraphicsKind::Label,
        GraphicsKind::Model,
        GraphicsKind::Point,
        GraphicsKind::Path,
        GraphicsKind::Polyline,
    ];

    /// Returns true for kinds whose primitives take several frames to build.
    pub fn is_asynchronous(self) -> bool {
        matches!(
            self,
            GraphicsKind::Geometry | GraphicsKind::Model | GraphicsKind::Polyline
        )
    }
}

impl fmt::Display for GraphicsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GraphicsKind::Billboard => "billboard",
            GraphicsKind::Geometry => "geometry",
            GraphicsKind::Label => "label",
            GraphicsKind::Model => "model",
            GraphicsKind::Point => "point",
            GraphicsKind::Path => "path",
            GraphicsKind::Polyline => "polyline",
        };
        f.write_str(name)
    }
}

fn default_show() -> bool {
    true
}

/// One drawable representation requested by an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graphics {
    pub kind: GraphicsKind,
    /// Whether this representation is drawn
    #[serde(default = "default_show")]
    pub show: bool,
    /// Extent around the entity position (model scale, geometry radius, point size)
    #[serde(default)]
    pub radius: f64,
    /// Frames needed before the primitive is built (asynchronous kinds only)
    #[serde(default)]
    pub load_frames: u32,
    /// Polyline vertices in the fixed frame
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positions: Vec<DVec3>,
}

impl Graphics {
    /// Creates a shown graphics descriptor with no extent.
    pub fn new(kind: GraphicsKind) -> Self {
        Self {
            kind,
            show: true,
            radius: 0.0,
            load_frames: 0,
            positions: Vec::new(),
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_load_frames(mut self, frames: u32) -> Self {
        self.load_frames = frames;
        self
    }

    pub fn with_positions(mut self, positions: Vec<DVec3>) -> Self {
        self.positions = positions;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.show = false;
        self
    }
}

/// A domain object that visualizers turn into primitives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_show")]
    pub show: bool,
    /// Position at `epoch`, in the scene's fixed frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<DVec3>,
    /// Constant velocity in metres per second
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<DVec3>,
    /// Reference time for `velocity`; J2000 when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch: Option<JulianDate>,
    /// When the entity exists; always when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<TimeInterval>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub graphics: Vec<Graphics>,
}

impl Entity {
    /// Creates a shown entity with no position or graphics.
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            show: true,
            position: None,
            velocity: None,
            epoch: None,
            availability: None,
            graphics: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_position(mut self, position: DVec3) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_velocity(mut self, velocity: DVec3, epoch: JulianDate) -> Self {
        self.velocity = Some(velocity);
        self.epoch = Some(epoch);
        self
    }

    pub fn with_availability(mut self, availability: TimeInterval) -> Self {
        self.availability = Some(availability);
        self
    }

    pub fn with_graphics(mut self, graphics: Graphics) -> Self {
        self.graphics.push(graphics);
        self
    }

    /// Returns true if the entity exists at `time`.
    pub fn is_available(&self, time: &JulianDate) -> bool {
        self.availability
            .as_ref()
            .map_or(true, |interval| interval.contains(time))
    }

    /// Position at `time`, extrapolated along `velocity`.
    pub fn position_at(&self, time: &JulianDate) -> Option<DVec3> {
        let position = self.position?;
        match self.velocity {
            Some(velocity) => {
                let epoch = self.epoch.unwrap_or_default();
                Some(position + velocity * time.seconds_since(&epoch))
            }
            None => Some(position),
        }
    }

    /// First graphics descriptor of `kind`, if any.
    pub fn graphics_of(&self, kind: GraphicsKind) -> Option<&Graphics> {
        self.graphics.iter().find(|g| g.kind == kind)
    }
}

/// The entities owned by one data source.
///
/// Iteration is ordered by entity id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityCollection {
    entities: BTreeMap<EntityId, Entity>,
}

impl EntityCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an entity. Returns the previous one with the same id.
    pub fn add(&mut self, entity: Entity) -> Option<Entity> {
        self.entities.insert(entity.id.clone(), entity)
    }

    pub fn remove(&mut self, id: &EntityId) -> Option<Entity> {
        self.entities.remove(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }
}

impl FromIterator<Entity> for EntityCollection {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        let mut collection = Self::new();
        for entity in iter {
            collection.add(entity);
        }
        collection
    }
}
