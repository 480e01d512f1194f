use bevy::prelude::*;
use chrono::{DateTime, Local};

use crate::capture::EvidenceImage;
use crate::constants::DEFAULT_DEFECT_DESCRIPTION;
use crate::markers::MarkerId;

use super::messages::DefectDetected;
use super::record::{DefectId, DefectRecord, PendingDefect};

/// The one defect awaiting confirmation, if any
#[derive(Resource, Debug, Default)]
pub struct PendingDefectSlot {
    pending: Option<PendingDefect>,
    next_id: u64,
}

impl PendingDefectSlot {
    pub fn pending(&self) -> Option<&PendingDefect> {
        self.pending.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.pending.is_some()
    }

    /// Open a slot for a detection, returning whatever it replaced
    pub fn open(&mut self, detected: &DefectDetected) -> Option<PendingDefect> {
        let replaced = self.pending.replace(PendingDefect {
            marker: detected.marker,
            position: detected.position,
            image: detected.image.clone(),
        });
        // Re-detection of the same marker is not a replacement
        replaced.filter(|old| old.marker != detected.marker)
    }

    /// Finalize the pending defect into a record
    pub fn confirm(&mut self, description: &str, now: DateTime<Local>) -> Option<DefectRecord> {
        let pending = self.pending.take()?;
        let description = description.trim();

        self.next_id += 1;
        Some(DefectRecord {
            id: DefectId(self.next_id),
            marker: pending.marker,
            position: pending.position,
            description: if description.is_empty() {
                DEFAULT_DEFECT_DESCRIPTION.to_string()
            } else {
                description.to_string()
            },
            image: pending.image,
            created_at: now,
        })
    }

    pub fn discard(&mut self) -> Option<PendingDefect> {
        self.pending.take()
    }

    /// Swap in a fresh photo if `marker` is the pending one
    pub fn update_image(&mut self, marker: MarkerId, image: &EvidenceImage) -> bool {
        match self.pending.as_mut() {
            Some(pending) if pending.marker == marker => {
                pending.image = image.clone();
                true
            }
            _ => false,
        }
    }

    /// Drop the slot without touching the registry, for markers deleted elsewhere
    pub fn forget(&mut self, marker: MarkerId) -> bool {
        if self.pending.as_ref().is_some_and(|p| p.marker == marker) {
            self.pending = None;
            return true;
        }
        false
    }
}
