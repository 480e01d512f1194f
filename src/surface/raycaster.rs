//! Tiered surface raycast.
//!
//! Vertical surfaces are tried first and only against known plane
//! representations: the estimation heuristic reports every surface as
//! horizontal, so querying it for walls tags wall hits as floor hits.
//! Estimation is reserved for the last horizontal tier.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::session::DeviceCamera;

use super::simulated::SimulatedSurfaces;
use super::types::{RaycastHit, RaycastQuery, RaycastTarget, SurfaceAlignment, SurfaceQuery};

/// Known-surface tiers tried for walls, in priority order
const VERTICAL_TIERS: [RaycastTarget; 2] = [
    RaycastTarget::ExistingPlaneGeometry,
    RaycastTarget::ExistingPlaneInfinite,
];

/// Tiers tried for floors and tables, in priority order
const HORIZONTAL_TIERS: [RaycastTarget; 3] = [
    RaycastTarget::ExistingPlaneGeometry,
    RaycastTarget::ExistingPlaneInfinite,
    RaycastTarget::EstimatedPlane,
];

/// Every (target, alignment) pass in the order it is attempted
pub fn raycast_passes() -> impl Iterator<Item = (RaycastTarget, SurfaceAlignment)> {
    VERTICAL_TIERS
        .into_iter()
        .map(|target| (target, SurfaceAlignment::Vertical))
        .chain(
            HORIZONTAL_TIERS
                .into_iter()
                .map(|target| (target, SurfaceAlignment::Horizontal)),
        )
}

/// Cast a world-space ray and return the first hit of the first pass that finds one.
pub fn cast_ray(surfaces: &impl SurfaceQuery, ray: Ray3d) -> Option<RaycastHit> {
    for (target, alignment) in raycast_passes() {
        let query = RaycastQuery {
            ray,
            target,
            alignment,
        };

        // An estimated hit claiming to be vertical is never trusted
        let hit = surfaces
            .raycast(&query)
            .into_iter()
            .find(|hit| !(hit.target.is_estimated() && hit.alignment == SurfaceAlignment::Vertical));

        if let Some(hit) = hit {
            debug!(
                "Surface hit: target={:?} alignment={:?} at {:?}",
                hit.target,
                hit.alignment,
                hit.position()
            );
            return Some(hit);
        }
    }

    None
}

/// Screen-space raycasting through the device camera
#[derive(SystemParam)]
pub struct SurfaceRaycaster<'w, 's> {
    pub surfaces: Res<'w, SimulatedSurfaces>,
    pub window: Query<'w, 's, &'static Window, With<PrimaryWindow>>,
    pub camera: Query<'w, 's, (&'static Camera, &'static GlobalTransform), With<DeviceCamera>>,
}

impl SurfaceRaycaster<'_, '_> {
    /// World ray through a screen point (logical pixels, origin top-left)
    pub fn screen_ray(&self, screen_point: Vec2) -> Option<Ray3d> {
        let (camera, transform) = self.camera.single().ok()?;
        camera.viewport_to_world(transform, screen_point).ok()
    }

    pub fn cast(&self, screen_point: Vec2) -> Option<RaycastHit> {
        let ray = self.screen_ray(screen_point)?;
        cast_ray(&*self.surfaces, ray)
    }

    /// Logical size of the primary window
    pub fn viewport_size(&self) -> Vec2 {
        self.window
            .single()
            .map(|window| Vec2::new(window.width(), window.height()))
            .unwrap_or(Vec2::ZERO)
    }
}
