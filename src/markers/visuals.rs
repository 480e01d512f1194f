//! Scene representation of registry markers.
//!
//! Hierarchy per marker: anchor (world transform, visibility) -> footprint
//! (per-axis scale) -> a near-clear fill plane and four border bars. Only the
//! border bars carry the state color.

use bevy::prelude::*;

use crate::constants::{MARKER_BASE_SIZE, MARKER_BORDER_THICKNESS};

use super::registry::{Marker, MarkerId, MarkerRegistry, MarkerState, MarkerVisual};

#[derive(Component, Debug, Clone, Copy)]
pub struct MarkerAnchor {
    pub id: MarkerId,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct MarkerFootprint;

#[derive(Component, Debug, Clone, Copy)]
pub struct MarkerBorder;

/// Shared meshes and one border material per marker state
#[derive(Resource)]
pub struct MarkerMaterials {
    pub fill_mesh: Handle<Mesh>,
    pub horizontal_bar: Handle<Mesh>,
    pub vertical_bar: Handle<Mesh>,
    pub fill: Handle<StandardMaterial>,
    pub normal: Handle<StandardMaterial>,
    pub highlighted: Handle<StandardMaterial>,
    pub drawing: Handle<StandardMaterial>,
    pub delete_armed: Handle<StandardMaterial>,
}

impl MarkerMaterials {
    pub fn border(&self, state: MarkerState) -> Handle<StandardMaterial> {
        match state {
            MarkerState::Normal => self.normal.clone(),
            MarkerState::Highlighted => self.highlighted.clone(),
            MarkerState::Drawing => self.drawing.clone(),
            MarkerState::DeleteArmed => self.delete_armed.clone(),
        }
    }
}

fn border_material(
    materials: &mut Assets<StandardMaterial>,
    state: MarkerState,
) -> Handle<StandardMaterial> {
    materials.add(StandardMaterial {
        base_color: state.color(),
        unlit: true,
        ..default()
    })
}

pub fn setup_marker_materials(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let half = MARKER_BASE_SIZE / 2.0;
    let t = MARKER_BORDER_THICKNESS;

    commands.insert_resource(MarkerMaterials {
        fill_mesh: meshes.add(Plane3d::new(Vec3::Y, Vec2::splat(half))),
        horizontal_bar: meshes.add(Cuboid::new(MARKER_BASE_SIZE, t, t)),
        vertical_bar: meshes.add(Cuboid::new(t, t, MARKER_BASE_SIZE)),
        fill: materials.add(StandardMaterial {
            base_color: Color::srgba(1.0, 1.0, 1.0, 0.01),
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            ..default()
        }),
        normal: border_material(&mut materials, MarkerState::Normal),
        highlighted: border_material(&mut materials, MarkerState::Highlighted),
        drawing: border_material(&mut materials, MarkerState::Drawing),
        delete_armed: border_material(&mut materials, MarkerState::DeleteArmed),
    });
}

fn visibility_for(hidden: bool) -> Visibility {
    if hidden {
        Visibility::Hidden
    } else {
        Visibility::Inherited
    }
}

/// Spawn visuals for new markers and push registry state onto existing ones
pub fn sync_marker_visuals(
    mut commands: Commands,
    mut registry: ResMut<MarkerRegistry>,
    assets: Res<MarkerMaterials>,
    mut anchors: Query<
        (&mut Transform, &mut Visibility),
        (With<MarkerAnchor>, Without<MarkerFootprint>),
    >,
    mut footprints: Query<&mut Transform, (With<MarkerFootprint>, Without<MarkerAnchor>)>,
    mut borders: Query<&mut MeshMaterial3d<StandardMaterial>, With<MarkerBorder>>,
) {
    // Binding visuals must not retrigger this system
    let registry = registry.bypass_change_detection();

    for id in registry.markers_without_visual() {
        let Some(marker) = registry.get(id).cloned() else {
            continue;
        };
        let visual = spawn_marker_visual(&mut commands, &assets, &marker);
        registry.bind_visual(id, visual);
    }

    for marker in registry.iter() {
        let Some(visual) = registry.visual(marker.id) else {
            continue;
        };

        if let Ok((mut transform, mut visibility)) = anchors.get_mut(visual.root) {
            *transform = marker.transform;
            *visibility = visibility_for(marker.hidden);
        }
        if let Ok(mut transform) = footprints.get_mut(visual.footprint) {
            transform.scale = marker.footprint_scale;
        }

        let material = assets.border(marker.state);
        for border in visual.borders {
            let Ok(mut handle) = borders.get_mut(border) else {
                continue;
            };
            if handle.0 != material {
                handle.0 = material.clone();
            }
        }
    }
}

fn spawn_marker_visual(
    commands: &mut Commands,
    assets: &MarkerMaterials,
    marker: &Marker,
) -> MarkerVisual {
    let id = marker.id;
    let half = MARKER_BASE_SIZE / 2.0;
    let border_material = assets.border(marker.state);

    let root = commands
        .spawn((
            marker.transform,
            visibility_for(marker.hidden),
            MarkerAnchor { id },
            Name::new(format!("{}", id)),
        ))
        .id();

    let footprint = commands
        .spawn((
            Transform::from_scale(marker.footprint_scale),
            Visibility::Inherited,
            MarkerFootprint,
            ChildOf(root),
        ))
        .id();

    let fill = commands
        .spawn((
            Mesh3d(assets.fill_mesh.clone()),
            MeshMaterial3d(assets.fill.clone()),
            Transform::default(),
            ChildOf(footprint),
        ))
        .id();

    let bars = [
        (assets.horizontal_bar.clone(), Vec3::new(0.0, 0.0, -half)),
        (assets.horizontal_bar.clone(), Vec3::new(0.0, 0.0, half)),
        (assets.vertical_bar.clone(), Vec3::new(-half, 0.0, 0.0)),
        (assets.vertical_bar.clone(), Vec3::new(half, 0.0, 0.0)),
    ];
    let borders = bars.map(|(mesh, offset)| {
        commands
            .spawn((
                Mesh3d(mesh),
                MeshMaterial3d(border_material.clone()),
                Transform::from_translation(offset),
                MarkerBorder,
                ChildOf(footprint),
            ))
            .id()
    });

    debug!("Spawned visual for {}", id);

    MarkerVisual {
        root,
        footprint,
        fill,
        borders,
    }
}

/// Despawn visuals of removed markers
pub fn despawn_orphaned_visuals(mut commands: Commands, mut registry: ResMut<MarkerRegistry>) {
    for root in registry.bypass_change_detection().take_orphaned() {
        commands.entity(root).try_despawn();
    }
}

pub fn has_orphaned_visuals(registry: Res<MarkerRegistry>) -> bool {
    registry.has_orphaned()
}
