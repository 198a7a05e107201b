//! Bounding Volume Types
//!
//! Bounding spheres in the scene's fixed frame, and the tri-state result a
//! visualizer reports when asked for one.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A sphere enclosing some part of the scene.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingSphere {
    pub center: DVec3,
    pub radius: f64,
}

impl BoundingSphere {
    /// Creates a new bounding sphere.
    pub fn new(center: DVec3, radius: f64) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
        }
    }

    /// A zero-radius sphere at `center`.
    pub fn point(center: DVec3) -> Self {
        Self::new(center, 0.0)
    }

    /// Computes a sphere enclosing every point.
    ///
    /// Centered on the axis-aligned box of the points, so it is not minimal.
    /// Returns `None` for an empty slice.
    pub fn from_points(points: &[DVec3]) -> Option<Self> {
        let first = *points.first()?;
        let (min, max) = points
            .iter()
            .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p)));

        let center = (min + max) * 0.5;
        let radius = points
            .iter()
            .map(|p| p.distance(center))
            .fold(0.0_f64, f64::max);

        Some(Self::new(center, radius))
    }

    /// Computes a sphere enclosing every sphere in the slice.
    ///
    /// Returns the default (zero) sphere for an empty slice.
    pub fn from_bounding_spheres(spheres: &[BoundingSphere]) -> Self {
        let mut iter = spheres.iter();
        let Some(first) = iter.next() else {
            return Self::default();
        };
        iter.fold(*first, |acc, sphere| acc.union(sphere))
    }

    /// Smallest sphere enclosing both `self` and `other`.
    pub fn union(&self, other: &BoundingSphere) -> Self {
        let offset = other.center - self.center;
        let distance = offset.length();

        if distance + other.radius <= self.radius {
            return *self;
        }
        if distance + self.radius <= other.radius {
            return *other;
        }

        let radius = (distance + self.radius + other.radius) * 0.5;
        let center = self.center + offset * ((radius - self.radius) / distance);
        Self::new(center, radius)
    }

    /// Returns true if `point` lies inside or on the sphere, within `epsilon`.
    pub fn contains_point(&self, point: DVec3, epsilon: f64) -> bool {
        self.center.distance(point) <= self.radius + epsilon
    }

    /// Returns true if `other` lies entirely inside this sphere, within `epsilon`.
    pub fn contains_sphere(&self, other: &BoundingSphere, epsilon: f64) -> bool {
        self.center.distance(other.center) + other.radius <= self.radius + epsilon
    }
}

/// Outcome of asking for an entity's bounding sphere.
///
/// `Pending` means the answer is still being computed and the caller should
/// ask again on a later frame. `Failed` means no sphere will ever be
/// available for this input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BoundingSphereState {
    Done { sphere: BoundingSphere },
    Pending,
    Failed,
}

impl BoundingSphereState {
    /// Shorthand for a finished result.
    pub fn done(sphere: BoundingSphere) -> Self {
        BoundingSphereState::Done { sphere }
    }

    /// Returns the sphere if the state is `Done`.
    pub fn sphere(&self) -> Option<&BoundingSphere> {
        match self {
            BoundingSphereState::Done { sphere } => Some(sphere),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, BoundingSphereState::Done { .. })
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, BoundingSphereState::Pending)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, BoundingSphereState::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_from_points() {
        let points = [
            DVec3::new(-1.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.0, 2.0, 0.0),
        ];
        let sphere = BoundingSphere::from_points(&points).unwrap();

        for p in points {
            assert!(sphere.contains_point(p, EPS));
        }
        assert_eq!(sphere.center, DVec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_from_points_empty() {
        assert!(BoundingSphere::from_points(&[]).is_none());
    }

    #[test]
    fn test_union_disjoint() {
        let a = BoundingSphere::new(DVec3::new(-10.0, 0.0, 0.0), 1.0);
        let b = BoundingSphere::new(DVec3::new(10.0, 0.0, 0.0), 1.0);
        let merged = a.union(&b);

        assert!((merged.radius - 11.0).abs() < EPS);
        assert!(merged.center.length() < EPS);
        assert!(merged.contains_sphere(&a, EPS));
        assert!(merged.contains_sphere(&b, EPS));
    }

    #[test]
    fn test_union_nested_keeps_outer() {
        let outer = BoundingSphere::new(DVec3::ZERO, 10.0);
        let inner = BoundingSphere::new(DVec3::new(1.0, 1.0, 1.0), 2.0);

        assert_eq!(outer.union(&inner), outer);
        assert_eq!(inner.union(&outer), outer);
    }

    #[test]
    fn test_union_of_points() {
        let a = BoundingSphere::point(DVec3::new(0.0, 0.0, 0.0));
        let b = BoundingSphere::point(DVec3::new(0.0, 0.0, 4.0));
        let merged = a.union(&b);

        assert!((merged.radius - 2.0).abs() < EPS);
        assert!((merged.center - DVec3::new(0.0, 0.0, 2.0)).length() < EPS);
    }

    #[test]
    fn test_from_bounding_spheres() {
        let spheres = [
            BoundingSphere::new(DVec3::new(5.0, 0.0, 0.0), 1.0),
            BoundingSphere::new(DVec3::new(-5.0, 0.0, 0.0), 1.0),
            BoundingSphere::new(DVec3::new(0.0, 7.0, 0.0), 0.5),
        ];
        let merged = BoundingSphere::from_bounding_spheres(&spheres);

        for s in &spheres {
            assert!(merged.contains_sphere(s, 1e-6));
        }
    }

    #[test]
    fn test_from_bounding_spheres_empty() {
        assert_eq!(
            BoundingSphere::from_bounding_spheres(&[]),
            BoundingSphere::default()
        );
    }

    #[test]
    fn test_state_accessors() {
        let sphere = BoundingSphere::new(DVec3::ONE, 3.0);
        let done = BoundingSphereState::done(sphere);

        assert!(done.is_done());
        assert_eq!(done.sphere(), Some(&sphere));
        assert!(BoundingSphereState::Pending.is_pending());
        assert!(BoundingSphereState::Failed.is_failed());
        assert!(BoundingSphereState::Failed.sphere().is_none());
    }

    #[test]
    fn test_state_serialization() {
        assert_eq!(
            serde_json::to_string(&BoundingSphereState::Pending).unwrap(),
            r#"{"state":"pending"}"#
        );
        let done = BoundingSphereState::done(BoundingSphere::new(DVec3::ZERO, 1.0));
        let json = serde_json::to_string(&done).unwrap();
        assert!(json.starts_with(r#"{"state":"done""#));
    }
}
