//! Isolated evidence capture.
//!
//! The renderer delivers screenshots through an observer that may run outside
//! the frame's system schedule. The observer only converts the image and
//! posts it to [`CaptureInbox`]; registry restore and outbound messages happen
//! in `finish_captures` on the main schedule.

pub mod coordinator;

pub use coordinator::{
    CaptureCoordinator, CaptureOutcome, CapturePurpose, CaptureRequest, CaptureTicket,
    EvidenceImage,
};

use std::sync::Arc;

use bevy::prelude::*;
use bevy::render::view::screenshot::{Screenshot, ScreenshotCaptured};
use crossbeam_channel::{Receiver, Sender};

use crate::common::ScannerSet;
use crate::config::ScannerConfig;
use crate::defects::{DefectDetected, DefectUpdated};
use crate::markers::MarkerRegistry;

/// Snapshot result posted back from the renderer
#[derive(Debug)]
pub struct SnapshotCompletion {
    pub ticket: CaptureTicket,
    pub image: Option<EvidenceImage>,
}

#[derive(Resource)]
pub struct CaptureInbox {
    pub sender: Sender<SnapshotCompletion>,
    pub receiver: Receiver<SnapshotCompletion>,
}

impl Default for CaptureInbox {
    fn default() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }
}

/// Convert a captured frame into evidence
fn to_evidence(image: Image) -> Option<EvidenceImage> {
    match image.try_into_dynamic() {
        Ok(dynamic) => Some(Arc::new(dynamic.to_rgba8())),
        Err(e) => {
            warn!("Snapshot could not be converted: {:?}", e);
            None
        }
    }
}

/// Start the next queued capture once the previous one has finished
fn begin_captures(
    mut commands: Commands,
    mut coordinator: ResMut<CaptureCoordinator>,
    mut registry: ResMut<MarkerRegistry>,
    inbox: Res<CaptureInbox>,
    time: Res<Time>,
) {
    let Some(ticket) = coordinator.begin_next(&mut registry, time.elapsed_secs()) else {
        return;
    };

    let sender = inbox.sender.clone();
    commands
        .spawn(Screenshot::primary_window())
        .observe(move |captured: On<ScreenshotCaptured>| {
            let completion = SnapshotCompletion {
                ticket,
                image: to_evidence(captured.image.clone()),
            };
            if sender.send(completion).is_err() {
                warn!("Capture inbox closed, dropping snapshot {:?}", ticket);
            }
        });
}

/// Deliver completed or expired captures
fn finish_captures(
    mut coordinator: ResMut<CaptureCoordinator>,
    mut registry: ResMut<MarkerRegistry>,
    inbox: Res<CaptureInbox>,
    config: Res<ScannerConfig>,
    time: Res<Time>,
    mut detected: MessageWriter<DefectDetected>,
    mut updated: MessageWriter<DefectUpdated>,
) {
    let mut outcomes = Vec::new();

    while let Ok(completion) = inbox.receiver.try_recv() {
        outcomes.extend(coordinator.complete(completion.ticket, completion.image, &mut registry));
    }
    outcomes.extend(coordinator.expire(
        time.elapsed_secs(),
        config.data.capture.timeout_seconds,
        &mut registry,
    ));

    for outcome in outcomes {
        match outcome {
            CaptureOutcome::Delivered { request, image } => {
                info!("Captured {}", request.marker);
                match request.purpose {
                    CapturePurpose::NewDefect { position } => {
                        detected.write(DefectDetected {
                            position,
                            image,
                            marker: request.marker,
                        });
                    }
                    CapturePurpose::RefreshImage => {
                        updated.write(DefectUpdated {
                            marker: request.marker,
                            image,
                        });
                    }
                }
            }
            CaptureOutcome::Failed { request } => {
                warn!("Capture of {} produced no image", request.marker);
            }
            CaptureOutcome::TimedOut { request } => {
                warn!("Capture of {} timed out, visibility restored", request.marker);
            }
            CaptureOutcome::Discarded { request } => {
                debug!("Capture of {} discarded, marker was removed", request.marker);
            }
        }
    }
}

fn capture_has_work(coordinator: Res<CaptureCoordinator>) -> bool {
    coordinator.has_work()
}

pub struct CapturePlugin;

impl Plugin for CapturePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CaptureCoordinator>()
            .init_resource::<CaptureInbox>()
            .add_systems(
                Update,
                (finish_captures, begin_captures)
                    .chain()
                    .run_if(capture_has_work)
                    .in_set(ScannerSet::Capture),
            );
    }
}
