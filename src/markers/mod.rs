//! Marker registry and its scene representation.
//!
//! ## Module Structure
//!
//! - [`registry`] - [`MarkerRegistry`], the sole owner of marker state
//! - [`visuals`] - Spawning and syncing marker entities from registry state
//! - [`picking`] - Ray hit-testing against marker footprints
//!
//! Gesture and capture code mutate the registry only. Visuals follow in
//! [`ScannerSet::Visuals`](crate::common::ScannerSet::Visuals) whenever the
//! registry changed.

pub mod picking;
pub mod registry;
mod tests;
pub mod visuals;

pub use registry::{Marker, MarkerId, MarkerRegistry, MarkerState, MarkerVisual};
pub use visuals::{MarkerAnchor, MarkerFootprint};

use bevy::prelude::*;

use crate::common::ScannerSet;

pub struct MarkerPlugin;

impl Plugin for MarkerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MarkerRegistry>()
            .add_systems(Startup, visuals::setup_marker_materials)
            .add_systems(
                Update,
                (
                    visuals::sync_marker_visuals.run_if(resource_changed::<MarkerRegistry>),
                    visuals::despawn_orphaned_visuals.run_if(visuals::has_orphaned_visuals),
                )
                    .chain()
                    .in_set(ScannerSet::Visuals),
            );
    }
}
