//! Gesture handling.
//!
//! ## Module Structure
//!
//! - [`events`] - Gesture kinds, phases and the [`GestureEvent`] message
//! - [`recognizer`] - Mouse input to gesture events
//! - [`machine`] - [`GestureMachine`], the interaction state machine
//! - [`scene`] - Live raycast and picking behind [`machine::SceneAccess`]
//!
//! ## Systems
//!
//! - `recognize_pointer_gestures`: runs while tracking is running
//! - `cancel_interrupted_gestures`: cancels in-progress gestures when tracking
//!   pauses or the user leaves scan mode
//! - `apply_gestures`: feeds events through the machine and applies its effects

pub mod events;
pub mod machine;
pub mod recognizer;
pub mod scene;

pub use events::{GestureEvent, GestureKind, GesturePhase};
pub use machine::{ActiveInteraction, GestureEffect, GestureMachine};
pub use recognizer::GestureRecognizer;

use bevy::prelude::*;

use crate::capture::CaptureCoordinator;
use crate::common::ScannerSet;
use crate::config::ScannerConfig;
use crate::defects::{
    DefectDeleted, DeleteDragModeChanged, FeedbackRequest, ScanMode, ScanModeChanged, in_scan_mode,
};
use crate::markers::MarkerRegistry;
use crate::session::{TrackingState, TrackingStateChanged, session_is_running};

use scene::GestureScene;

/// Cancel whatever the pointer was doing when tracking stops or review starts
fn cancel_interrupted_gestures(
    mut tracking: MessageReader<TrackingStateChanged>,
    mut modes: MessageReader<ScanModeChanged>,
    mut recognizer: ResMut<GestureRecognizer>,
    mut gestures: MessageWriter<GestureEvent>,
) {
    let paused = tracking
        .read()
        .filter(|change| change.state == TrackingState::Paused)
        .count()
        > 0;
    let reviewing = modes
        .read()
        .filter(|change| change.mode == ScanMode::Review)
        .count()
        > 0;

    if paused || reviewing {
        gestures.write_batch(recognizer.cancel());
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_gestures(
    mut events: MessageReader<GestureEvent>,
    mut machine: ResMut<GestureMachine>,
    mut registry: ResMut<MarkerRegistry>,
    mut coordinator: ResMut<CaptureCoordinator>,
    scene: GestureScene,
    config: Res<ScannerConfig>,
    mut deleted: MessageWriter<DefectDeleted>,
    mut feedback: MessageWriter<FeedbackRequest>,
    mut delete_mode: MessageWriter<DeleteDragModeChanged>,
) {
    for event in events.read() {
        for effect in machine.handle(event, &scene, &mut registry, &config.data) {
            match effect {
                GestureEffect::Capture(request) => coordinator.enqueue(request),
                GestureEffect::DefectDeleted(marker) => {
                    deleted.write(DefectDeleted { marker });
                }
                GestureEffect::Feedback(kind) => {
                    feedback.write(FeedbackRequest { kind });
                }
                GestureEffect::DeleteDragChanged(active) => {
                    delete_mode.write(DeleteDragModeChanged { active });
                }
            }
        }
    }
}

pub struct GesturePlugin;

impl Plugin for GesturePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GestureRecognizer>()
            .init_resource::<GestureMachine>()
            .add_message::<GestureEvent>()
            .add_systems(
                Update,
                (
                    recognizer::recognize_pointer_gestures
                        .run_if(session_is_running)
                        .run_if(in_scan_mode),
                    cancel_interrupted_gestures.run_if(
                        on_message::<TrackingStateChanged>.or(on_message::<ScanModeChanged>),
                    ),
                )
                    .in_set(ScannerSet::Input),
            )
            .add_systems(
                Update,
                apply_gestures
                    .run_if(on_message::<GestureEvent>)
                    .in_set(ScannerSet::Interaction),
            );
    }
}
