//! Tracking session lifecycle, the device camera, and debug overlays.

pub mod camera;
mod debug;
pub mod state;

pub use camera::DeviceCamera;
pub use state::{
    DebugOverlays, SensorCapabilities, SessionCommand, TrackingConfiguration, TrackingSession,
    TrackingState, TrackingStateChanged, session_is_running,
};

use bevy::prelude::*;

use crate::common::ScannerSet;
use crate::config::{ConfigLoaded, SetDebugOverlaysRequest};
use crate::surface::SimulatedSurfaces;

/// Result of one command against the session
#[derive(Debug, Default, PartialEq, Eq)]
struct CommandResult {
    state_changed: Option<TrackingState>,
    overlays_changed: Option<bool>,
}

fn apply_command(
    command: SessionCommand,
    session: &mut TrackingSession,
    overlays: &mut DebugOverlays,
) -> CommandResult {
    match command {
        SessionCommand::Start => CommandResult {
            state_changed: session.start(),
            ..default()
        },
        SessionCommand::Pause => CommandResult {
            state_changed: session.pause(),
            ..default()
        },
        SessionCommand::Resume => CommandResult {
            state_changed: session.resume(),
            ..default()
        },
        SessionCommand::SetDebugOverlays(enabled) => {
            if overlays.enabled == enabled {
                return CommandResult::default();
            }
            overlays.enabled = enabled;
            CommandResult {
                overlays_changed: Some(enabled),
                ..default()
            }
        }
    }
}

fn start_session(mut commands: MessageWriter<SessionCommand>) {
    commands.write(SessionCommand::Start);
}

/// P toggles pause, F3 toggles debug overlays
fn handle_session_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    session: Res<TrackingSession>,
    overlays: Res<DebugOverlays>,
    mut commands: MessageWriter<SessionCommand>,
) {
    if keyboard.just_pressed(KeyCode::KeyP) {
        commands.write(if session.is_running() {
            SessionCommand::Pause
        } else {
            SessionCommand::Resume
        });
    }
    if keyboard.just_pressed(KeyCode::F3) {
        commands.write(SessionCommand::SetDebugOverlays(!overlays.enabled));
    }
}

fn apply_session_commands(
    mut commands: MessageReader<SessionCommand>,
    mut session: ResMut<TrackingSession>,
    mut overlays: ResMut<DebugOverlays>,
    mut state_changes: MessageWriter<TrackingStateChanged>,
    mut save_overlays: MessageWriter<SetDebugOverlaysRequest>,
) {
    for command in commands.read() {
        let result = apply_command(*command, &mut session, &mut overlays);

        if let Some(state) = result.state_changed {
            info!("Tracking session {:?}", state);
            state_changes.write(TrackingStateChanged { state });
        }
        if let Some(enabled) = result.overlays_changed {
            save_overlays.write(SetDebugOverlaysRequest { enabled });
        }
    }
}

pub struct SessionPlugin;

impl Plugin for SessionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TrackingSession>()
            .init_resource::<DebugOverlays>()
            .init_resource::<debug::FeaturePointCloud>()
            .add_message::<SessionCommand>()
            .add_message::<TrackingStateChanged>()
            .init_gizmo_group::<debug::DebugGizmoGroup>()
            .add_systems(
                Startup,
                (
                    camera::spawn_device_camera,
                    debug::configure_debug_gizmos,
                    debug::init_debug_overlays.after(ConfigLoaded),
                    start_session,
                ),
            )
            .add_systems(
                Update,
                (
                    handle_session_shortcuts,
                    apply_session_commands.run_if(on_message::<SessionCommand>),
                    camera::move_device_camera.run_if(session_is_running),
                )
                    .chain()
                    .before(ScannerSet::Input),
            )
            .add_systems(
                Update,
                (
                    debug::apply_debug_overlays.run_if(resource_changed::<DebugOverlays>),
                    debug::rebuild_feature_points.run_if(resource_changed::<SimulatedSurfaces>),
                    debug::draw_debug_overlays.run_if(debug::overlays_enabled),
                )
                    .chain()
                    .in_set(ScannerSet::Visuals),
            );
    }
}
