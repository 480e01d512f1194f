//! Ray hit-testing against marker footprints.

use bevy::prelude::*;

use crate::constants::MARKER_BASE_SIZE;

/// Thickness of the pick volume around the flat footprint
const PICK_THICKNESS: f32 = 0.02;

/// Unscaled pick box of a marker footprint in its local space
pub fn footprint_pick_size() -> Vec3 {
    Vec3::new(MARKER_BASE_SIZE, PICK_THICKNESS, MARKER_BASE_SIZE)
}

/// Ray parameter where the ray enters an oriented box of `size` centered on `transform`
pub fn ray_hits_obb(ray: Ray3d, transform: &GlobalTransform, size: Vec3) -> Option<f32> {
    let affine = transform.affine();
    if affine.matrix3.determinant().abs() < f32::EPSILON {
        return None;
    }

    let inverse = affine.inverse();
    let origin = inverse.transform_point3(ray.origin);
    let direction = inverse.transform_vector3(*ray.direction);
    let half = size * 0.5;

    // Local t equals world t since the direction is transformed, not renormalized
    ray_aabb_hit_t(origin, direction, -half, half)
}

/// Slab-method ray/AABB intersection
pub fn ray_aabb_hit_t(origin: Vec3, direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;

    for axis in 0..3 {
        let (o, d) = (origin[axis], direction[axis]);

        if d.abs() < f32::EPSILON {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let mut t0 = (min[axis] - o) * inv;
        let mut t1 = (max[axis] - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }

        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }

    if t_max < 0.0 {
        return None;
    }
    Some(if t_min >= 0.0 { t_min } else { t_max })
}

/// Nearest candidate whose pick box the ray crosses
pub fn pick_nearest<'a>(
    ray: Ray3d,
    candidates: impl IntoIterator<Item = (Entity, &'a GlobalTransform)>,
) -> Option<Entity> {
    let size = footprint_pick_size();

    candidates
        .into_iter()
        .filter_map(|(entity, transform)| {
            ray_hits_obb(ray, transform, size).map(|t| (entity, t))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(entity, _)| entity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down_ray(x: f32, z: f32) -> Ray3d {
        Ray3d::new(Vec3::new(x, 2.0, z), Dir3::NEG_Y)
    }

    #[test]
    fn test_aabb_hit_from_outside() {
        let t = ray_aabb_hit_t(
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::NEG_Y,
            Vec3::splat(-1.0),
            Vec3::splat(1.0),
        );
        assert_eq!(t, Some(4.0));
    }

    #[test]
    fn test_aabb_miss_parallel_outside_slab() {
        let t = ray_aabb_hit_t(
            Vec3::new(2.0, 5.0, 0.0),
            Vec3::NEG_Y,
            Vec3::splat(-1.0),
            Vec3::splat(1.0),
        );
        assert!(t.is_none());
    }

    #[test]
    fn test_aabb_behind_origin_misses() {
        let t = ray_aabb_hit_t(
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::Y,
            Vec3::splat(-1.0),
            Vec3::splat(1.0),
        );
        assert!(t.is_none());
    }

    #[test]
    fn test_obb_respects_footprint_scale() {
        let transform = GlobalTransform::from(Transform::from_scale(Vec3::new(3.0, 1.0, 1.0)));
        let size = footprint_pick_size();

        // 0.25 m out on X is outside the base 0.2 m square but inside a 3x footprint
        assert!(ray_hits_obb(down_ray(0.25, 0.0), &transform, size).is_some());
        assert!(ray_hits_obb(down_ray(0.0, 0.25), &transform, size).is_none());
    }

    #[test]
    fn test_obb_on_wall() {
        let transform = GlobalTransform::from(
            Transform::from_xyz(0.0, 1.0, -2.0)
                .with_rotation(Quat::from_rotation_arc(Vec3::Y, Vec3::Z)),
        );
        let ray = Ray3d::new(Vec3::new(0.05, 1.05, 0.0), Dir3::NEG_Z);

        let t = ray_hits_obb(ray, &transform, footprint_pick_size()).unwrap();
        assert!((t - (2.0 - PICK_THICKNESS / 2.0)).abs() < 1e-4);
    }

    #[test]
    fn test_degenerate_scale_never_hits() {
        let transform = GlobalTransform::from(Transform::from_scale(Vec3::ZERO));
        assert!(ray_hits_obb(down_ray(0.0, 0.0), &transform, footprint_pick_size()).is_none());
    }

    #[test]
    fn test_pick_nearest_prefers_closer_marker() {
        let mut world = World::new();
        let low = world.spawn_empty().id();
        let high = world.spawn_empty().id();

        let low_xf = GlobalTransform::from(Transform::from_xyz(0.0, 0.0, 0.0));
        let high_xf = GlobalTransform::from(Transform::from_xyz(0.0, 0.75, 0.0));

        let picked = pick_nearest(down_ray(0.0, 0.0), [(low, &low_xf), (high, &high_xf)]);
        assert_eq!(picked, Some(high));
    }

    #[test]
    fn test_pick_nearest_none_when_missing_everything() {
        let mut world = World::new();
        let entity = world.spawn_empty().id();
        let xf = GlobalTransform::IDENTITY;

        assert!(pick_nearest(down_ray(1.0, 1.0), [(entity, &xf)]).is_none());
    }
}
