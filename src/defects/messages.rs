//! Messages crossing the engine boundary.

use bevy::prelude::*;

use crate::capture::EvidenceImage;
use crate::markers::MarkerId;

use super::record::DefectRecord;

/// A new marker was placed and photographed
#[derive(Message, Debug, Clone)]
pub struct DefectDetected {
    pub position: Vec3,
    pub image: EvidenceImage,
    pub marker: MarkerId,
}

/// A marker was dropped on the trash zone
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefectDeleted {
    pub marker: MarkerId,
}

/// A marker was rescaled and photographed again
#[derive(Message, Debug, Clone)]
pub struct DefectUpdated {
    pub marker: MarkerId,
    pub image: EvidenceImage,
}

/// Pending defect accepted by the user
#[derive(Message, Debug, Clone)]
pub struct DefectConfirmed {
    pub record: DefectRecord,
}

/// Accept the pending defect. An empty description falls back to the default.
#[derive(Message, Debug, Clone, Default)]
pub struct ConfirmPendingDefect {
    pub description: String,
}

/// Drop the pending defect and its marker
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct DiscardPendingDefect;

/// Jump to a defect from an external list
#[derive(Message, Debug, Clone, Copy)]
pub struct FocusDefectRequest {
    pub marker: MarkerId,
}

/// Whether the user is scanning the scene or reviewing the defect list
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScanMode {
    #[default]
    Scan,
    Review,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanModeChanged {
    pub mode: ScanMode,
}

/// Delete-drag armed or released, for trash zone display
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteDragModeChanged {
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedbackKind {
    Light,
    Medium,
    Heavy,
    Success,
}

/// Tactile feedback for the host device
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackRequest {
    pub kind: FeedbackKind,
}
