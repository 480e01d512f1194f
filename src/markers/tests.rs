//! Unit tests for the marker registry.

#![cfg(test)]

use bevy::prelude::*;

use crate::markers::registry::{MarkerId, MarkerRegistry, MarkerState, MarkerVisual};
use crate::surface::{RaycastHit, RaycastTarget, SurfaceAlignment};

fn hit_at(position: Vec3) -> RaycastHit {
    RaycastHit {
        world_transform: Transform::from_translation(position),
        target: RaycastTarget::ExistingPlaneGeometry,
        alignment: SurfaceAlignment::Horizontal,
        distance: 1.0,
    }
}

fn place_new(registry: &mut MarkerRegistry, position: Vec3) -> MarkerId {
    let id = registry.allocate_id();
    registry.place(&hit_at(position), id);
    id
}

fn spawn_visual(world: &mut World) -> MarkerVisual {
    MarkerVisual {
        root: world.spawn_empty().id(),
        footprint: world.spawn_empty().id(),
        fill: world.spawn_empty().id(),
        borders: [
            world.spawn_empty().id(),
            world.spawn_empty().id(),
            world.spawn_empty().id(),
            world.spawn_empty().id(),
        ],
    }
}

// Placement
#[test]
fn test_allocated_ids_are_unique() {
    let mut registry = MarkerRegistry::default();
    let a = registry.allocate_id();
    let b = registry.allocate_id();
    assert_ne!(a, b);
}

#[test]
fn test_place_uses_default_footprint_and_hit_transform() {
    let mut registry = MarkerRegistry::default();
    let id = place_new(&mut registry, Vec3::new(0.5, 0.0, -1.0));

    let marker = registry.get(id).unwrap();
    assert_eq!(marker.position(), Vec3::new(0.5, 0.0, -1.0));
    assert_eq!(marker.footprint_scale, Vec3::ONE);
    assert!((marker.footprint_size() - Vec2::splat(0.2)).length() < 1e-6);
    assert_eq!(marker.state, MarkerState::Normal);
    assert_eq!(marker.alignment, SurfaceAlignment::Horizontal);
    assert!(!marker.hidden);
}

#[test]
fn test_place_same_id_replaces_marker() {
    let mut registry = MarkerRegistry::default();
    let id = place_new(&mut registry, Vec3::ZERO);
    registry.place(&hit_at(Vec3::X), id);

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get(id).unwrap().position(), Vec3::X);
}

#[test]
fn test_move_keeps_scale_and_state() {
    let mut registry = MarkerRegistry::default();
    let id = place_new(&mut registry, Vec3::ZERO);
    registry.scale(id, 2.0);
    registry.set_state(id, MarkerState::DeleteArmed);

    registry.move_to(id, Transform::from_xyz(1.0, 0.0, 1.0));

    let marker = registry.get(id).unwrap();
    assert_eq!(marker.position(), Vec3::new(1.0, 0.0, 1.0));
    assert_eq!(marker.footprint_scale, Vec3::splat(2.0));
    assert_eq!(marker.state, MarkerState::DeleteArmed);
}

// Scaling
#[test]
fn test_scale_compounds() {
    let mut registry = MarkerRegistry::default();
    let a = place_new(&mut registry, Vec3::ZERO);
    let b = place_new(&mut registry, Vec3::X);

    registry.scale(a, 1.5);
    registry.scale(a, 0.8);
    registry.scale(b, 1.5 * 0.8);

    let sa = registry.get(a).unwrap().footprint_scale;
    let sb = registry.get(b).unwrap().footprint_scale;
    assert!((sa - sb).length() < 1e-5);
}

#[test]
fn test_resize_absolute_sets_physical_size() {
    let mut registry = MarkerRegistry::default();
    let id = place_new(&mut registry, Vec3::ZERO);

    registry.resize_absolute(id, 0.5, 0.3);

    let marker = registry.get(id).unwrap();
    assert!((marker.footprint_size() - Vec2::new(0.5, 0.3)).length() < 1e-5);
    assert_eq!(marker.footprint_scale.y, 1.0);
}

#[test]
fn test_resize_absolute_is_idempotent() {
    let mut registry = MarkerRegistry::default();
    let id = place_new(&mut registry, Vec3::ZERO);

    registry.resize_absolute(id, 0.4, 0.4);
    let once = registry.get(id).unwrap().footprint_scale;
    registry.resize_absolute(id, 0.4, 0.4);
    let twice = registry.get(id).unwrap().footprint_scale;

    assert_eq!(once, twice);
}

// Removal and missing ids
#[test]
fn test_operations_on_removed_id_are_noops() {
    let mut registry = MarkerRegistry::default();
    let id = place_new(&mut registry, Vec3::ZERO);
    let other = place_new(&mut registry, Vec3::X);

    assert!(registry.remove(id));
    assert!(!registry.remove(id));

    registry.move_to(id, Transform::from_xyz(5.0, 5.0, 5.0));
    registry.scale(id, 3.0);
    registry.resize_absolute(id, 1.0, 1.0);
    registry.set_state(id, MarkerState::Highlighted);
    registry.set_hidden_except(id, true);
    registry.highlight_exclusive(id);

    assert!(registry.get(id).is_none());
    assert_eq!(registry.len(), 1);
    // set_hidden_except(removed) still hides everything else
    assert!(registry.get(other).unwrap().hidden);
    assert_eq!(registry.get(other).unwrap().state, MarkerState::Normal);
}

#[test]
fn test_remove_clears_reverse_lookup_and_queues_despawn() {
    let mut world = World::new();
    let mut registry = MarkerRegistry::default();
    let id = place_new(&mut registry, Vec3::ZERO);
    let visual = spawn_visual(&mut world);
    registry.bind_visual(id, visual);

    assert_eq!(registry.find_id(visual.borders[2]), Some(id));

    registry.remove(id);

    for element in visual.elements() {
        assert!(registry.find_id(element).is_none());
    }
    assert_eq!(registry.take_orphaned(), vec![visual.root]);
    assert!(registry.take_orphaned().is_empty());
}

// Visibility and highlight
#[test]
fn test_set_hidden_except_spares_one_marker() {
    let mut registry = MarkerRegistry::default();
    let keep = place_new(&mut registry, Vec3::ZERO);
    let a = place_new(&mut registry, Vec3::X);
    let b = place_new(&mut registry, Vec3::Z);

    registry.set_hidden_except(keep, true);
    assert!(!registry.get(keep).unwrap().hidden);
    assert!(registry.get(a).unwrap().hidden);
    assert!(registry.get(b).unwrap().hidden);

    registry.set_hidden_except(keep, false);
    assert!(registry.iter().all(|marker| !marker.hidden));
}

#[test]
fn test_highlight_exclusive_resets_others() {
    let mut registry = MarkerRegistry::default();
    let a = place_new(&mut registry, Vec3::ZERO);
    let b = place_new(&mut registry, Vec3::X);

    registry.highlight_exclusive(a);
    registry.highlight_exclusive(b);

    assert_eq!(registry.get(a).unwrap().state, MarkerState::Normal);
    assert_eq!(registry.get(b).unwrap().state, MarkerState::Highlighted);
}

#[test]
fn test_state_colors() {
    assert_eq!(MarkerState::Normal.color(), Color::srgb(0.0, 1.0, 1.0));
    assert_eq!(MarkerState::Drawing.color(), Color::srgb(1.0, 1.0, 0.0));
    assert_eq!(MarkerState::DeleteArmed.color(), Color::srgb(1.0, 0.0, 0.0));
}

#[test]
fn test_visibility_restore_skips_removed_markers() {
    let mut registry = MarkerRegistry::default();
    let a = place_new(&mut registry, Vec3::ZERO);
    let b = place_new(&mut registry, Vec3::X);
    let c = place_new(&mut registry, Vec3::Z);
    registry.set_hidden_except(b, true);
    registry.set_hidden_except(c, false);
    // a, b visible, c hidden

    let snapshot = registry.visibility_snapshot();
    registry.set_hidden_except(a, true);
    registry.remove(b);
    registry.restore_visibility(&snapshot);

    assert!(!registry.get(a).unwrap().hidden);
    assert!(registry.get(b).is_none());
    assert!(registry.get(c).unwrap().hidden);
}

// Reverse lookup
#[test]
fn test_find_id_for_every_element() {
    let mut world = World::new();
    let mut registry = MarkerRegistry::default();
    let id = place_new(&mut registry, Vec3::ZERO);
    let visual = spawn_visual(&mut world);
    registry.bind_visual(id, visual);

    for element in visual.elements() {
        assert_eq!(registry.find_id(element), Some(id));
    }
}

#[test]
fn test_find_id_unknown_element_is_none() {
    let mut world = World::new();
    let registry = MarkerRegistry::default();
    let stray = world.spawn_empty().id();
    assert!(registry.find_id(stray).is_none());
}

#[test]
fn test_bind_visual_for_removed_marker_orphans_it() {
    let mut world = World::new();
    let mut registry = MarkerRegistry::default();
    let id = place_new(&mut registry, Vec3::ZERO);
    registry.remove(id);

    let visual = spawn_visual(&mut world);
    registry.bind_visual(id, visual);

    assert!(registry.find_id(visual.fill).is_none());
    assert_eq!(registry.take_orphaned(), vec![visual.root]);
}

#[test]
fn test_markers_without_visual() {
    let mut world = World::new();
    let mut registry = MarkerRegistry::default();
    let a = place_new(&mut registry, Vec3::ZERO);
    let b = place_new(&mut registry, Vec3::X);
    registry.bind_visual(a, spawn_visual(&mut world));

    assert_eq!(registry.markers_without_visual(), vec![b]);
}
