//! Debug overlays: feature points, world origin and detected plane outlines.

use bevy::gizmos::config::{GizmoConfigGroup, GizmoConfigStore};
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::surface::{DetectedPlane, SimulatedSurfaces, SurfaceAlignment};

use super::state::DebugOverlays;

/// Feature points scattered across each plane
const POINTS_PER_PLANE: usize = 48;
const FEATURE_POINT_HALF_SIZE: f32 = 0.01;
const ORIGIN_AXIS_LENGTH: f32 = 0.5;

const FEATURE_POINT_COLOR: Color = Color::srgb(1.0, 0.85, 0.1);
const HORIZONTAL_OUTLINE_COLOR: Color = Color::srgb(0.2, 0.6, 1.0);
const VERTICAL_OUTLINE_COLOR: Color = Color::srgb(1.0, 0.4, 0.8);

#[derive(Default, Reflect, GizmoConfigGroup)]
pub struct DebugGizmoGroup;

/// Fixed feature point cloud derived from the detected planes
#[derive(Resource, Default)]
pub struct FeaturePointCloud {
    pub points: Vec<Vec3>,
}

/// Draw debug lines over the scene and keep them off by default
pub fn configure_debug_gizmos(mut config_store: ResMut<GizmoConfigStore>) {
    let (config, _) = config_store.config_mut::<DebugGizmoGroup>();
    config.line.width = 2.0;
    config.depth_bias = -0.1;
    config.enabled = false;
}

/// Take the initial overlay state from the loaded config
pub fn init_debug_overlays(
    mut overlays: ResMut<DebugOverlays>,
    config: Res<crate::config::ScannerConfig>,
) {
    overlays.enabled = config.data.debug_overlays;
}

pub fn apply_debug_overlays(
    overlays: Res<DebugOverlays>,
    mut config_store: ResMut<GizmoConfigStore>,
) {
    let (config, _) = config_store.config_mut::<DebugGizmoGroup>();
    config.enabled = overlays.enabled;
    debug!("Debug overlays {}", if overlays.enabled { "on" } else { "off" });
}

pub fn rebuild_feature_points(
    surfaces: Res<SimulatedSurfaces>,
    mut cloud: ResMut<FeaturePointCloud>,
) {
    cloud.points = surfaces
        .planes
        .iter()
        .enumerate()
        .flat_map(|(index, plane)| feature_points(plane, index as u64))
        .collect();
}

pub fn overlays_enabled(overlays: Res<DebugOverlays>) -> bool {
    overlays.enabled
}

pub fn draw_debug_overlays(
    mut gizmos: Gizmos<DebugGizmoGroup>,
    surfaces: Res<SimulatedSurfaces>,
    cloud: Res<FeaturePointCloud>,
) {
    gizmos.axes(Transform::IDENTITY, ORIGIN_AXIS_LENGTH);

    for plane in &surfaces.planes {
        let color = match plane.alignment {
            SurfaceAlignment::Vertical => VERTICAL_OUTLINE_COLOR,
            _ => HORIZONTAL_OUTLINE_COLOR,
        };
        let corners = plane_corners(plane);
        gizmos.linestrip(
            [corners[0], corners[1], corners[2], corners[3], corners[0]],
            color,
        );
    }

    for point in &cloud.points {
        for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
            let offset = axis * FEATURE_POINT_HALF_SIZE;
            gizmos.line(*point - offset, *point + offset, FEATURE_POINT_COLOR);
        }
    }
}

/// Corners of a plane's detected extent, in winding order
pub fn plane_corners(plane: &DetectedPlane) -> [Vec3; 4] {
    let rotation = plane.rotation();
    let half = plane.half_extents;
    [
        Vec2::new(-half.x, -half.y),
        Vec2::new(half.x, -half.y),
        Vec2::new(half.x, half.y),
        Vec2::new(-half.x, half.y),
    ]
    .map(|local| plane.center + rotation * Vec3::new(local.x, 0.0, local.y))
}

/// Deterministic scatter of points inside a plane's extent
pub fn feature_points(plane: &DetectedPlane, seed: u64) -> Vec<Vec3> {
    let rotation = plane.rotation();
    let mut rng = StdRng::seed_from_u64(seed);

    (0..POINTS_PER_PLANE)
        .map(|_| {
            let x = rng.gen_range(-1.0f32..=1.0) * plane.half_extents.x;
            let z = rng.gen_range(-1.0f32..=1.0) * plane.half_extents.y;
            plane.center + rotation * Vec3::new(x, 0.0, z)
        })
        .collect()
}
