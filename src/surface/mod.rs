pub mod raycaster;
pub mod simulated;
pub mod types;

pub use raycaster::{SurfaceRaycaster, cast_ray};
pub use simulated::{DetectedPlane, SimulatedSurfaces};
pub use types::{RaycastHit, RaycastQuery, RaycastTarget, SurfaceAlignment, SurfaceQuery};

use bevy::prelude::*;

pub struct SurfacePlugin;

impl Plugin for SurfacePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(SimulatedSurfaces::sandbox_room())
            .add_systems(Startup, simulated::spawn_surface_visuals);
    }
}
