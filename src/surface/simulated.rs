//! Simulated sensor: a room of detected planes standing in for device tracking.

use bevy::prelude::*;

use super::types::{RaycastHit, RaycastQuery, RaycastTarget, SurfaceAlignment, SurfaceQuery};

const PARALLEL_EPSILON: f32 = 1e-6;
const OCCLUSION_EPSILON: f32 = 1e-4;

/// A plane the tracking session has detected
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedPlane {
    pub center: Vec3,
    /// Unit normal, the plane's local Y axis
    pub normal: Vec3,
    /// Half size along the plane's local X and Z axes
    pub half_extents: Vec2,
    pub alignment: SurfaceAlignment,
}

impl DetectedPlane {
    pub fn horizontal(center: Vec3, half_extents: Vec2) -> Self {
        Self {
            center,
            normal: Vec3::Y,
            half_extents,
            alignment: SurfaceAlignment::Horizontal,
        }
    }

    /// A wall facing `normal`. Local X runs along the wall, local Z is vertical.
    pub fn vertical(center: Vec3, normal: Vec3, half_extents: Vec2) -> Self {
        Self {
            center,
            normal: normal.normalize_or(Vec3::Z),
            half_extents,
            alignment: SurfaceAlignment::Vertical,
        }
    }

    /// Rotation taking local Y to the plane normal
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_arc(Vec3::Y, self.normal)
    }

    /// Ray parameter and point of intersection, optionally limited to the extent
    pub fn intersect(&self, ray: Ray3d, bounded: bool) -> Option<(f32, Vec3)> {
        let t = intersect_plane(ray, self.center, self.normal)?;
        let point = ray.get_point(t);

        if bounded {
            let local = self.rotation().inverse() * (point - self.center);
            if local.x.abs() > self.half_extents.x || local.z.abs() > self.half_extents.y {
                return None;
            }
        }

        Some((t, point))
    }
}

/// Ray parameter where the ray crosses an infinite plane, if in front of the origin
pub fn intersect_plane(ray: Ray3d, point_on_plane: Vec3, normal: Vec3) -> Option<f32> {
    let denom = normal.dot(*ray.direction);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }

    let t = (point_on_plane - ray.origin).dot(normal) / denom;
    (t >= 0.0).then_some(t)
}

/// Surfaces known to the simulated tracking session
#[derive(Resource, Debug, Clone, Default)]
pub struct SimulatedSurfaces {
    pub planes: Vec<DetectedPlane>,
    /// Height of the best-guess floor used by the estimation tier
    pub estimated_floor_height: Option<f32>,
}

impl SimulatedSurfaces {
    /// A 4 m room: floor, back and left walls, and a table
    pub fn sandbox_room() -> Self {
        Self {
            planes: vec![
                DetectedPlane::horizontal(Vec3::ZERO, Vec2::new(2.0, 2.0)),
                DetectedPlane::vertical(
                    Vec3::new(0.0, 1.25, -2.0),
                    Vec3::Z,
                    Vec2::new(2.0, 1.25),
                ),
                DetectedPlane::vertical(
                    Vec3::new(-2.0, 1.25, 0.0),
                    Vec3::X,
                    Vec2::new(1.25, 2.0),
                ),
                DetectedPlane::horizontal(Vec3::new(1.0, 0.75, -1.2), Vec2::new(0.5, 0.3)),
            ],
            estimated_floor_height: Some(0.0),
        }
    }

    /// Nearest ray distance at which real plane geometry blocks the view
    fn nearest_geometry(&self, ray: Ray3d) -> Option<f32> {
        self.planes
            .iter()
            .filter_map(|plane| plane.intersect(ray, true))
            .map(|(t, _)| t)
            .min_by(f32::total_cmp)
    }

    /// Nothing is reported behind the nearest detected geometry
    fn is_occluded(&self, ray: Ray3d, distance: f32) -> bool {
        self.nearest_geometry(ray)
            .is_some_and(|nearest| distance > nearest + OCCLUSION_EPSILON)
    }

    fn estimated_hit(&self, query: &RaycastQuery) -> Option<RaycastHit> {
        // The estimation heuristic only ever finds horizontal planes
        if query.alignment == SurfaceAlignment::Vertical {
            return None;
        }

        let height = self.estimated_floor_height?;
        let t = intersect_plane(query.ray, Vec3::new(0.0, height, 0.0), Vec3::Y)?;

        Some(RaycastHit {
            world_transform: Transform::from_translation(query.ray.get_point(t)),
            target: RaycastTarget::EstimatedPlane,
            alignment: SurfaceAlignment::Horizontal,
            distance: t,
        })
    }
}

impl SurfaceQuery for SimulatedSurfaces {
    fn raycast(&self, query: &RaycastQuery) -> Vec<RaycastHit> {
        let bounded = match query.target {
            RaycastTarget::ExistingPlaneGeometry => true,
            RaycastTarget::ExistingPlaneInfinite => false,
            RaycastTarget::EstimatedPlane => {
                return self
                    .estimated_hit(query)
                    .filter(|hit| !self.is_occluded(query.ray, hit.distance))
                    .into_iter()
                    .collect();
            }
        };

        let mut hits: Vec<RaycastHit> = self
            .planes
            .iter()
            .filter(|plane| query.alignment.accepts(plane.alignment))
            .filter_map(|plane| {
                let (t, point) = plane.intersect(query.ray, bounded)?;
                Some(RaycastHit {
                    world_transform: Transform::from_translation(point)
                        .with_rotation(plane.rotation()),
                    target: query.target,
                    alignment: plane.alignment,
                    distance: t,
                })
            })
            .filter(|hit| !self.is_occluded(query.ray, hit.distance))
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

#[derive(Component)]
pub struct SurfaceVisual;

/// Spawn meshes for the simulated room so the device camera has something to look at
pub fn spawn_surface_visuals(
    mut commands: Commands,
    surfaces: Res<SimulatedSurfaces>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for (index, plane) in surfaces.planes.iter().enumerate() {
        let base_color = match plane.alignment {
            SurfaceAlignment::Vertical => Color::srgb(0.55, 0.52, 0.48),
            _ => Color::srgb(0.35, 0.37, 0.40),
        };

        commands.spawn((
            Mesh3d(meshes.add(Plane3d::new(Vec3::Y, plane.half_extents))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color,
                perceptual_roughness: 0.9,
                ..default()
            })),
            Transform::from_translation(plane.center).with_rotation(plane.rotation()),
            SurfaceVisual,
            Name::new(format!("surface_{}", index)),
        ));
    }

    commands.spawn((
        DirectionalLight {
            illuminance: 8000.0,
            ..default()
        },
        Transform::from_xyz(2.0, 4.0, 3.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ray(origin: Vec3, direction: Vec3) -> Ray3d {
        Ray3d::new(origin, Dir3::new(direction).unwrap())
    }

    fn query(ray: Ray3d, target: RaycastTarget, alignment: SurfaceAlignment) -> RaycastQuery {
        RaycastQuery {
            ray,
            target,
            alignment,
        }
    }

    #[test]
    fn test_ray_parallel_to_plane_misses() {
        let r = ray(Vec3::new(0.0, 1.0, 0.0), Vec3::X);
        assert!(intersect_plane(r, Vec3::ZERO, Vec3::Y).is_none());
    }

    #[test]
    fn test_plane_behind_ray_misses() {
        let r = ray(Vec3::new(0.0, 1.0, 0.0), Vec3::Y);
        assert!(intersect_plane(r, Vec3::ZERO, Vec3::Y).is_none());
    }

    #[test]
    fn test_floor_geometry_hit() {
        let surfaces = SimulatedSurfaces::sandbox_room();
        let r = ray(Vec3::new(0.5, 1.5, 0.5), Vec3::NEG_Y);

        let hits = surfaces.raycast(&query(
            r,
            RaycastTarget::ExistingPlaneGeometry,
            SurfaceAlignment::Horizontal,
        ));

        assert_eq!(hits.len(), 1);
        assert!(hits[0].position().abs_diff_eq(Vec3::new(0.5, 0.0, 0.5), 1e-5));
        assert_eq!(hits[0].alignment, SurfaceAlignment::Horizontal);
        assert!((hits[0].distance - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_geometry_bounded_but_infinite_is_not() {
        let surfaces = SimulatedSurfaces::sandbox_room();
        // Outside the 4 m floor
        let r = ray(Vec3::new(5.0, 1.0, 0.0), Vec3::NEG_Y);

        let bounded = surfaces.raycast(&query(
            r,
            RaycastTarget::ExistingPlaneGeometry,
            SurfaceAlignment::Horizontal,
        ));
        let infinite = surfaces.raycast(&query(
            r,
            RaycastTarget::ExistingPlaneInfinite,
            SurfaceAlignment::Horizontal,
        ));

        assert!(bounded.is_empty());
        assert_eq!(infinite.len(), 1);
    }

    #[test]
    fn test_floor_below_table_is_hidden() {
        let surfaces = SimulatedSurfaces::sandbox_room();
        // Straight down through the table onto the floor
        let r = ray(Vec3::new(1.0, 2.0, -1.2), Vec3::NEG_Y);

        let hits = surfaces.raycast(&query(
            r,
            RaycastTarget::ExistingPlaneGeometry,
            SurfaceAlignment::Horizontal,
        ));

        assert_eq!(hits.len(), 1);
        assert!((hits[0].position().y - 0.75).abs() < 1e-5);
    }

    #[test]
    fn test_wall_behind_table_is_not_reported() {
        let surfaces = SimulatedSurfaces::sandbox_room();
        // From the device camera's starting pose toward the table center
        let origin = Vec3::new(0.0, 1.5, 2.5);
        let table = Vec3::new(1.0, 0.75, -1.2);
        let r = ray(origin, table - origin);

        let walls = surfaces.raycast(&query(
            r,
            RaycastTarget::ExistingPlaneGeometry,
            SurfaceAlignment::Vertical,
        ));
        assert!(walls.is_empty());

        let hit = crate::surface::cast_ray(&surfaces, r).unwrap();
        assert_eq!(hit.alignment, SurfaceAlignment::Horizontal);
        assert!(hit.position().abs_diff_eq(table, 1e-4));
    }

    #[test]
    fn test_wall_hit_is_vertical_and_oriented_to_normal() {
        let surfaces = SimulatedSurfaces::sandbox_room();
        let r = ray(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Z);

        let hits = surfaces.raycast(&query(
            r,
            RaycastTarget::ExistingPlaneGeometry,
            SurfaceAlignment::Vertical,
        ));

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].alignment, SurfaceAlignment::Vertical);
        let up = hits[0].world_transform.rotation * Vec3::Y;
        assert!(up.abs_diff_eq(Vec3::Z, 1e-5));
    }

    #[test]
    fn test_alignment_filter_excludes_floor() {
        let surfaces = SimulatedSurfaces::sandbox_room();
        let r = ray(Vec3::new(0.0, 1.5, 0.0), Vec3::NEG_Y);

        let hits = surfaces.raycast(&query(
            r,
            RaycastTarget::ExistingPlaneInfinite,
            SurfaceAlignment::Vertical,
        ));

        assert!(hits.is_empty());
    }

    #[test]
    fn test_estimated_plane_never_answers_vertical_queries() {
        let surfaces = SimulatedSurfaces::sandbox_room();
        let r = ray(Vec3::new(0.0, 1.5, 0.0), Vec3::new(0.0, -1.0, -1.0));

        let vertical = surfaces.raycast(&query(
            r,
            RaycastTarget::EstimatedPlane,
            SurfaceAlignment::Vertical,
        ));
        let horizontal = surfaces.raycast(&query(
            r,
            RaycastTarget::EstimatedPlane,
            SurfaceAlignment::Horizontal,
        ));

        assert!(vertical.is_empty());
        assert_eq!(horizontal.len(), 1);
        assert_eq!(horizontal[0].alignment, SurfaceAlignment::Horizontal);
    }

    #[test]
    fn test_infinite_wall_is_not_reported_behind_the_floor() {
        let surfaces = SimulatedSurfaces::sandbox_room();
        // Looking down and forward: reaches the floor well before the back wall's plane
        let r = ray(Vec3::new(0.0, 1.5, 1.5), Vec3::new(0.0, -1.0, -1.0));

        let walls = surfaces.raycast(&query(
            r,
            RaycastTarget::ExistingPlaneInfinite,
            SurfaceAlignment::Vertical,
        ));
        assert!(walls.is_empty());

        let hit = crate::surface::cast_ray(&surfaces, r).unwrap();
        assert_eq!(hit.alignment, SurfaceAlignment::Horizontal);
        assert!(hit.position().abs_diff_eq(Vec3::ZERO, 1e-4));
    }

    #[test]
    fn test_infinite_wall_extends_past_detected_edge() {
        let surfaces = SimulatedSurfaces::sandbox_room();
        // Above the 2.5 m detected wall extent, nothing else in the way
        let r = ray(Vec3::new(0.0, 3.0, 0.0), Vec3::NEG_Z);

        let hits = surfaces.raycast(&query(
            r,
            RaycastTarget::ExistingPlaneInfinite,
            SurfaceAlignment::Vertical,
        ));
        assert_eq!(hits.len(), 1);
        assert!(hits[0].position().abs_diff_eq(Vec3::new(0.0, 3.0, -2.0), 1e-4));
    }

    #[test]
    fn test_empty_scene_has_no_hits() {
        let surfaces = SimulatedSurfaces::default();
        let r = ray(Vec3::new(0.0, 1.5, 0.0), Vec3::NEG_Y);

        for target in [
            RaycastTarget::ExistingPlaneGeometry,
            RaycastTarget::ExistingPlaneInfinite,
            RaycastTarget::EstimatedPlane,
        ] {
            assert!(
                surfaces
                    .raycast(&query(r, target, SurfaceAlignment::Horizontal))
                    .is_empty()
            );
        }
    }
}
