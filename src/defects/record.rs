use std::fmt;

use bevy::prelude::*;
use chrono::{DateTime, Local};

use crate::capture::EvidenceImage;
use crate::markers::MarkerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefectId(pub u64);

impl fmt::Display for DefectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "defect#{}", self.0)
    }
}

/// A confirmed defect as handed to the defect store
#[derive(Debug, Clone)]
pub struct DefectRecord {
    pub id: DefectId,
    pub marker: MarkerId,
    pub position: Vec3,
    pub description: String,
    pub image: EvidenceImage,
    pub created_at: DateTime<Local>,
}

/// A detected defect waiting for confirmation
#[derive(Debug, Clone)]
pub struct PendingDefect {
    pub marker: MarkerId,
    pub position: Vec3,
    pub image: EvidenceImage,
}
