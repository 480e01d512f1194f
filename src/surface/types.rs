//! Query and hit types shared by every surface backend.

use bevy::prelude::*;

/// Orientation class of a detected or inferred surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SurfaceAlignment {
    Horizontal,
    Vertical,
    /// No classification; as a query filter this accepts any alignment
    #[default]
    Unknown,
}

impl SurfaceAlignment {
    /// Whether a surface with `alignment` passes this value used as a filter
    pub fn accepts(&self, alignment: SurfaceAlignment) -> bool {
        *self == SurfaceAlignment::Unknown || *self == alignment
    }
}

/// Which surface representation a raycast is allowed to hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RaycastTarget {
    /// Reconstructed plane geometry, bounded by its detected extent
    ExistingPlaneGeometry,
    /// A detected plane extended to infinity
    ExistingPlaneInfinite,
    /// Best-guess plane from depth heuristics (horizontal only)
    EstimatedPlane,
}

impl RaycastTarget {
    pub fn is_estimated(&self) -> bool {
        matches!(self, RaycastTarget::EstimatedPlane)
    }
}

/// A single sensor query: one ray, one target tier, one alignment filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastQuery {
    pub ray: Ray3d,
    pub target: RaycastTarget,
    pub alignment: SurfaceAlignment,
}

/// Intersection of a query ray with a surface.
///
/// The world transform's local Y axis is the surface normal, so a marker laid
/// out in local XZ sits flat on the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub world_transform: Transform,
    pub target: RaycastTarget,
    /// Alignment reported by the sensor for the surface that was hit
    pub alignment: SurfaceAlignment,
    /// Distance along the ray
    pub distance: f32,
}

impl RaycastHit {
    /// Translation component of the hit's world transform
    pub fn position(&self) -> Vec3 {
        self.world_transform.translation
    }
}

/// Sensor-side raycasting against reconstructed scene surfaces.
pub trait SurfaceQuery {
    /// All hits for the query, nearest first
    fn raycast(&self, query: &RaycastQuery) -> Vec<RaycastHit>;
}
