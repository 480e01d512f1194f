use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::markers::MarkerFootprint;
use crate::markers::picking::pick_nearest;
use crate::surface::{RaycastHit, SurfaceRaycaster};

use super::machine::SceneAccess;

/// Live scene access for the gesture machine
#[derive(SystemParam)]
pub struct GestureScene<'w, 's> {
    pub raycaster: SurfaceRaycaster<'w, 's>,
    pub footprints: Query<
        'w,
        's,
        (Entity, &'static GlobalTransform, &'static InheritedVisibility),
        With<MarkerFootprint>,
    >,
}

impl SceneAccess for GestureScene<'_, '_> {
    fn raycast(&self, screen_point: Vec2) -> Option<RaycastHit> {
        self.raycaster.cast(screen_point)
    }

    fn pick_element(&self, screen_point: Vec2) -> Option<Entity> {
        let ray = self.raycaster.screen_ray(screen_point)?;
        pick_nearest(
            ray,
            self.footprints
                .iter()
                .filter(|(_, _, visibility)| visibility.get())
                .map(|(entity, transform, _)| (entity, transform)),
        )
    }

    fn viewport_size(&self) -> Vec2 {
        self.raycaster.viewport_size()
    }
}
