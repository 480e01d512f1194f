//! Engine boundary: outbound defect events and the commands that answer them.
//!
//! A detection opens the [`PendingDefectSlot`]. The user either confirms it,
//! producing a [`DefectRecord`] for the defect store, or discards it, which
//! removes the marker. Enter confirms and Backspace discards in the sandbox.

pub mod messages;
pub mod pending;
pub mod record;

pub use messages::{
    ConfirmPendingDefect, DefectConfirmed, DefectDeleted, DefectDetected, DefectUpdated,
    DeleteDragModeChanged, DiscardPendingDefect, FeedbackKind, FeedbackRequest,
    FocusDefectRequest, ScanMode, ScanModeChanged,
};
pub use pending::PendingDefectSlot;
pub use record::{DefectId, DefectRecord, PendingDefect};

use bevy::prelude::*;
use chrono::Local;

use crate::common::ScannerSet;
use crate::markers::MarkerRegistry;

/// Run condition: gestures only apply while scanning
pub fn in_scan_mode(mode: Res<ScanMode>) -> bool {
    *mode == ScanMode::Scan
}

fn open_pending_defects(
    mut detected: MessageReader<DefectDetected>,
    mut slot: ResMut<PendingDefectSlot>,
    mut registry: ResMut<MarkerRegistry>,
) {
    for event in detected.read() {
        info!("Defect detected at {:?} on {}", event.position, event.marker);
        if let Some(older) = slot.open(event) {
            debug!("Discarding unconfirmed {} for a newer detection", older.marker);
            registry.remove(older.marker);
        }
    }
}

fn refresh_pending_images(
    mut updated: MessageReader<DefectUpdated>,
    mut slot: ResMut<PendingDefectSlot>,
) {
    for event in updated.read() {
        if slot.update_image(event.marker, &event.image) {
            debug!("Pending defect photo refreshed for {}", event.marker);
        } else {
            info!("Defect photo updated for {}", event.marker);
        }
    }
}

fn forget_deleted_defects(
    mut deleted: MessageReader<DefectDeleted>,
    mut slot: ResMut<PendingDefectSlot>,
) {
    for event in deleted.read() {
        info!("Defect deleted: {}", event.marker);
        if slot.forget(event.marker) {
            debug!("Deleted marker was pending confirmation");
        }
    }
}

/// Enter confirms, Backspace discards
fn handle_pending_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    slot: Res<PendingDefectSlot>,
    mut confirm: MessageWriter<ConfirmPendingDefect>,
    mut discard: MessageWriter<DiscardPendingDefect>,
) {
    if !slot.is_open() {
        return;
    }
    if keyboard.just_pressed(KeyCode::Enter) {
        confirm.write(ConfirmPendingDefect::default());
    } else if keyboard.just_pressed(KeyCode::Backspace) {
        discard.write(DiscardPendingDefect);
    }
}

fn confirm_pending_defects(
    mut requests: MessageReader<ConfirmPendingDefect>,
    mut slot: ResMut<PendingDefectSlot>,
    mut confirmed: MessageWriter<DefectConfirmed>,
) {
    for request in requests.read() {
        let Some(record) = slot.confirm(&request.description, Local::now()) else {
            debug!("Confirm requested with no pending defect");
            continue;
        };
        info!(
            "Confirmed {} \"{}\" on {} at {}",
            record.id,
            record.description,
            record.marker,
            record.created_at.format("%Y-%m-%d %H:%M:%S")
        );
        confirmed.write(DefectConfirmed { record });
    }
}

fn discard_pending_defects(
    mut requests: MessageReader<DiscardPendingDefect>,
    mut slot: ResMut<PendingDefectSlot>,
    mut registry: ResMut<MarkerRegistry>,
) {
    for _ in requests.read() {
        if let Some(pending) = slot.discard() {
            info!("Discarded pending defect on {}", pending.marker);
            registry.remove(pending.marker);
        }
    }
}

fn focus_defects(
    mut requests: MessageReader<FocusDefectRequest>,
    mut registry: ResMut<MarkerRegistry>,
    mut mode_changes: MessageWriter<ScanModeChanged>,
) {
    for request in requests.read() {
        if !registry.contains(request.marker) {
            warn!("Focus requested for unknown {}", request.marker);
            continue;
        }
        registry.highlight_exclusive(request.marker);
        mode_changes.write(ScanModeChanged {
            mode: ScanMode::Scan,
        });
    }
}

/// Tab flips between scanning and reviewing
fn handle_mode_shortcut(
    keyboard: Res<ButtonInput<KeyCode>>,
    mode: Res<ScanMode>,
    mut mode_changes: MessageWriter<ScanModeChanged>,
) {
    if keyboard.just_pressed(KeyCode::Tab) {
        let next = match *mode {
            ScanMode::Scan => ScanMode::Review,
            ScanMode::Review => ScanMode::Scan,
        };
        mode_changes.write(ScanModeChanged { mode: next });
    }
}

fn apply_scan_mode(mut changes: MessageReader<ScanModeChanged>, mut mode: ResMut<ScanMode>) {
    for change in changes.read() {
        if *mode != change.mode {
            info!("Scan mode: {:?}", change.mode);
            *mode = change.mode;
        }
    }
}

/// Stand-in for the host's haptics
fn log_feedback(mut requests: MessageReader<FeedbackRequest>) {
    for request in requests.read() {
        debug!("Feedback: {:?}", request.kind);
    }
}

fn log_delete_drag_mode(mut changes: MessageReader<DeleteDragModeChanged>) {
    for change in changes.read() {
        if change.active {
            debug!("Delete-drag armed, trash zone shown");
        } else {
            debug!("Delete-drag released");
        }
    }
}

pub struct DefectFlowPlugin;

impl Plugin for DefectFlowPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PendingDefectSlot>()
            .init_resource::<ScanMode>()
            .add_message::<DefectDetected>()
            .add_message::<DefectDeleted>()
            .add_message::<DefectUpdated>()
            .add_message::<DefectConfirmed>()
            .add_message::<ConfirmPendingDefect>()
            .add_message::<DiscardPendingDefect>()
            .add_message::<FocusDefectRequest>()
            .add_message::<ScanModeChanged>()
            .add_message::<DeleteDragModeChanged>()
            .add_message::<FeedbackRequest>()
            .add_systems(
                Update,
                (handle_pending_shortcuts, handle_mode_shortcut).before(ScannerSet::Input),
            )
            .add_systems(
                Update,
                (
                    log_feedback.run_if(on_message::<FeedbackRequest>),
                    log_delete_drag_mode.run_if(on_message::<DeleteDragModeChanged>),
                )
                    .after(ScannerSet::Interaction)
                    .before(ScannerSet::Capture),
            )
            .add_systems(
                Update,
                (
                    open_pending_defects.run_if(on_message::<DefectDetected>),
                    refresh_pending_images.run_if(on_message::<DefectUpdated>),
                    forget_deleted_defects.run_if(on_message::<DefectDeleted>),
                    confirm_pending_defects.run_if(on_message::<ConfirmPendingDefect>),
                    discard_pending_defects.run_if(on_message::<DiscardPendingDefect>),
                    focus_defects.run_if(on_message::<FocusDefectRequest>),
                    apply_scan_mode.run_if(on_message::<ScanModeChanged>),
                )
                    .chain()
                    .after(ScannerSet::Capture)
                    .before(ScannerSet::Visuals),
            );
    }
}
