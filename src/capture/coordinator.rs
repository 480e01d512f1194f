//! Isolate-snapshot-restore sequencing.
//!
//! One capture is in flight at a time. While it is, every marker except the
//! target is hidden; the recorded visibility is put back before any outcome
//! is reported, whether the snapshot arrived, failed or timed out.

use std::collections::VecDeque;
use std::sync::Arc;

use bevy::prelude::*;
use image::RgbaImage;

use crate::markers::registry::VisibilitySnapshot;
use crate::markers::{MarkerId, MarkerRegistry};

/// Photographic evidence of a single marker
pub type EvidenceImage = Arc<RgbaImage>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CapturePurpose {
    /// First photo of a freshly placed marker, reported with its placement position
    NewDefect { position: Vec3 },
    /// Replacement photo after the marker was rescaled
    RefreshImage,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureRequest {
    pub marker: MarkerId,
    pub purpose: CapturePurpose,
}

/// Identifies one snapshot so late or duplicate completions can be told apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureTicket(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Delivered {
        request: CaptureRequest,
        image: EvidenceImage,
    },
    /// Snapshot produced no usable image
    Failed { request: CaptureRequest },
    TimedOut { request: CaptureRequest },
    /// Target marker was removed while the snapshot was pending
    Discarded { request: CaptureRequest },
}

#[derive(Debug)]
struct InFlightCapture {
    ticket: CaptureTicket,
    request: CaptureRequest,
    restore: VisibilitySnapshot,
    started_at: f32,
}

#[derive(Resource, Default, Debug)]
pub struct CaptureCoordinator {
    queue: VecDeque<CaptureRequest>,
    in_flight: Option<InFlightCapture>,
    next_ticket: u64,
}

impl CaptureCoordinator {
    pub fn enqueue(&mut self, request: CaptureRequest) {
        debug!("Queued capture of {} ({:?})", request.marker, request.purpose);
        self.queue.push_back(request);
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn has_work(&self) -> bool {
        self.in_flight.is_some() || !self.queue.is_empty()
    }

    pub fn in_flight(&self) -> Option<(CaptureTicket, CaptureRequest)> {
        self.in_flight
            .as_ref()
            .map(|capture| (capture.ticket, capture.request))
    }

    /// Isolate the next queued marker and hand out the ticket for its snapshot.
    ///
    /// Requests whose marker no longer exists are dropped. Returns `None` while
    /// a capture is already in flight or nothing is queued.
    pub fn begin_next(
        &mut self,
        registry: &mut MarkerRegistry,
        now: f32,
    ) -> Option<CaptureTicket> {
        if self.in_flight.is_some() {
            return None;
        }

        while let Some(request) = self.queue.pop_front() {
            if !registry.contains(request.marker) {
                debug!("Dropped capture of removed {}", request.marker);
                continue;
            }

            let restore = registry.visibility_snapshot();
            registry.set_hidden_except(request.marker, true);

            self.next_ticket += 1;
            let ticket = CaptureTicket(self.next_ticket);
            self.in_flight = Some(InFlightCapture {
                ticket,
                request,
                restore,
                started_at: now,
            });

            info!("Capturing {} isolated", request.marker);
            return Some(ticket);
        }

        None
    }

    /// Finish the in-flight capture with whatever the renderer delivered.
    ///
    /// Completions for any other ticket are ignored.
    pub fn complete(
        &mut self,
        ticket: CaptureTicket,
        image: Option<EvidenceImage>,
        registry: &mut MarkerRegistry,
    ) -> Option<CaptureOutcome> {
        if self.in_flight.as_ref().map(|capture| capture.ticket) != Some(ticket) {
            debug!("Ignoring stale snapshot {:?}", ticket);
            return None;
        }
        let capture = self.in_flight.take()?;
        registry.restore_visibility(&capture.restore);

        let request = capture.request;
        let outcome = if !registry.contains(request.marker) {
            CaptureOutcome::Discarded { request }
        } else {
            match image {
                Some(image) => CaptureOutcome::Delivered { request, image },
                None => CaptureOutcome::Failed { request },
            }
        };
        Some(outcome)
    }

    /// Abandon the in-flight capture once it has waited `timeout` seconds
    pub fn expire(
        &mut self,
        now: f32,
        timeout: f32,
        registry: &mut MarkerRegistry,
    ) -> Option<CaptureOutcome> {
        let started_at = self.in_flight.as_ref()?.started_at;
        if now - started_at < timeout {
            return None;
        }

        let capture = self.in_flight.take()?;
        registry.restore_visibility(&capture.restore);
        Some(CaptureOutcome::TimedOut {
            request: capture.request,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{RaycastHit, RaycastTarget, SurfaceAlignment};

    fn place(registry: &mut MarkerRegistry, x: f32) -> MarkerId {
        let id = registry.allocate_id();
        let hit = RaycastHit {
            world_transform: Transform::from_xyz(x, 0.0, 0.0),
            target: RaycastTarget::ExistingPlaneGeometry,
            alignment: SurfaceAlignment::Horizontal,
            distance: 1.0,
        };
        registry.place(&hit, id);
        id
    }

    fn new_defect(marker: MarkerId) -> CaptureRequest {
        CaptureRequest {
            marker,
            purpose: CapturePurpose::NewDefect {
                position: Vec3::ZERO,
            },
        }
    }

    fn image() -> EvidenceImage {
        Arc::new(RgbaImage::new(4, 4))
    }

    #[test]
    fn test_begin_isolates_target() {
        let mut registry = MarkerRegistry::default();
        let target = place(&mut registry, 0.0);
        let other = place(&mut registry, 1.0);
        let mut coordinator = CaptureCoordinator::default();

        coordinator.enqueue(new_defect(target));
        assert!(coordinator.begin_next(&mut registry, 0.0).is_some());

        assert!(!registry.get(target).unwrap().hidden);
        assert!(registry.get(other).unwrap().hidden);
        assert!(coordinator.is_busy());
    }

    #[test]
    fn test_complete_restores_before_delivering() {
        let mut registry = MarkerRegistry::default();
        let target = place(&mut registry, 0.0);
        let other = place(&mut registry, 1.0);
        let mut coordinator = CaptureCoordinator::default();

        coordinator.enqueue(new_defect(target));
        let ticket = coordinator.begin_next(&mut registry, 0.0).unwrap();
        let outcome = coordinator.complete(ticket, Some(image()), &mut registry);

        assert!(matches!(outcome, Some(CaptureOutcome::Delivered { .. })));
        assert!(!registry.get(other).unwrap().hidden);
        assert!(!coordinator.is_busy());
    }

    #[test]
    fn test_restore_matches_pre_capture_visibility() {
        let mut registry = MarkerRegistry::default();
        let a = place(&mut registry, 0.0);
        let b = place(&mut registry, 1.0);
        let c = place(&mut registry, 2.0);
        // c hidden before the capture starts
        registry.set_hidden_except(a, true);
        registry.set_hidden_except(c, false);
        let before = registry.visibility_snapshot();

        let mut coordinator = CaptureCoordinator::default();
        coordinator.enqueue(new_defect(b));
        let ticket = coordinator.begin_next(&mut registry, 0.0).unwrap();
        coordinator.complete(ticket, Some(image()), &mut registry);

        assert_eq!(registry.visibility_snapshot(), before);
    }

    #[test]
    fn test_failed_snapshot_still_restores() {
        let mut registry = MarkerRegistry::default();
        let target = place(&mut registry, 0.0);
        let other = place(&mut registry, 1.0);
        let mut coordinator = CaptureCoordinator::default();

        coordinator.enqueue(new_defect(target));
        let ticket = coordinator.begin_next(&mut registry, 0.0).unwrap();
        let outcome = coordinator.complete(ticket, None, &mut registry);

        assert!(matches!(outcome, Some(CaptureOutcome::Failed { .. })));
        assert!(!registry.get(other).unwrap().hidden);
    }

    #[test]
    fn test_target_removed_mid_flight_is_discarded() {
        let mut registry = MarkerRegistry::default();
        let target = place(&mut registry, 0.0);
        let other = place(&mut registry, 1.0);
        let mut coordinator = CaptureCoordinator::default();

        coordinator.enqueue(new_defect(target));
        let ticket = coordinator.begin_next(&mut registry, 0.0).unwrap();
        registry.remove(target);
        let outcome = coordinator.complete(ticket, Some(image()), &mut registry);

        assert!(matches!(outcome, Some(CaptureOutcome::Discarded { .. })));
        assert!(!registry.get(other).unwrap().hidden);
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut registry = MarkerRegistry::default();
        let target = place(&mut registry, 0.0);
        let mut coordinator = CaptureCoordinator::default();

        coordinator.enqueue(new_defect(target));
        let ticket = coordinator.begin_next(&mut registry, 0.0).unwrap();

        let stale = CaptureTicket(ticket.0 + 100);
        assert!(coordinator.complete(stale, Some(image()), &mut registry).is_none());
        assert!(coordinator.is_busy());
    }

    #[test]
    fn test_one_capture_in_flight_at_a_time() {
        let mut registry = MarkerRegistry::default();
        let a = place(&mut registry, 0.0);
        let b = place(&mut registry, 1.0);
        let mut coordinator = CaptureCoordinator::default();

        coordinator.enqueue(new_defect(a));
        coordinator.enqueue(new_defect(b));

        let first = coordinator.begin_next(&mut registry, 0.0).unwrap();
        assert!(coordinator.begin_next(&mut registry, 0.0).is_none());
        assert_eq!(coordinator.queued(), 1);

        coordinator.complete(first, Some(image()), &mut registry);
        let second = coordinator.begin_next(&mut registry, 0.1).unwrap();
        assert_ne!(first, second);
        assert_eq!(coordinator.in_flight().map(|(_, r)| r.marker), Some(b));
        assert!(registry.get(a).unwrap().hidden);
    }

    #[test]
    fn test_queued_request_for_removed_marker_is_skipped() {
        let mut registry = MarkerRegistry::default();
        let a = place(&mut registry, 0.0);
        let b = place(&mut registry, 1.0);
        let mut coordinator = CaptureCoordinator::default();

        coordinator.enqueue(new_defect(a));
        coordinator.enqueue(new_defect(b));
        registry.remove(a);

        coordinator.begin_next(&mut registry, 0.0).unwrap();
        assert_eq!(coordinator.in_flight().map(|(_, r)| r.marker), Some(b));
    }

    #[test]
    fn test_timeout_restores_and_late_completion_is_dropped() {
        let mut registry = MarkerRegistry::default();
        let target = place(&mut registry, 0.0);
        let other = place(&mut registry, 1.0);
        let mut coordinator = CaptureCoordinator::default();

        coordinator.enqueue(new_defect(target));
        let ticket = coordinator.begin_next(&mut registry, 10.0).unwrap();

        assert!(coordinator.expire(12.0, 5.0, &mut registry).is_none());
        assert!(registry.get(other).unwrap().hidden);

        let outcome = coordinator.expire(15.0, 5.0, &mut registry);
        assert!(matches!(outcome, Some(CaptureOutcome::TimedOut { .. })));
        assert!(!registry.get(other).unwrap().hidden);

        assert!(coordinator.complete(ticket, Some(image()), &mut registry).is_none());
    }

    #[test]
    fn test_capture_on_empty_registry_does_nothing() {
        let mut registry = MarkerRegistry::default();
        let mut coordinator = CaptureCoordinator::default();

        coordinator.enqueue(new_defect(MarkerId(7)));
        assert!(coordinator.has_work());

        assert!(coordinator.begin_next(&mut registry, 0.0).is_none());
        assert!(!coordinator.has_work());
        assert!(!coordinator.is_busy());
        assert!(coordinator.expire(100.0, 5.0, &mut registry).is_none());
        assert!(
            coordinator
                .complete(CaptureTicket(1), Some(image()), &mut registry)
                .is_none()
        );
        assert!(registry.is_empty());
        assert!(registry.visibility_snapshot().is_empty());
    }

    #[test]
    fn test_capture_with_single_marker() {
        let mut registry = MarkerRegistry::default();
        let only = place(&mut registry, 0.0);
        let mut coordinator = CaptureCoordinator::default();

        coordinator.enqueue(new_defect(only));
        let ticket = coordinator.begin_next(&mut registry, 0.0).unwrap();
        coordinator.complete(ticket, Some(image()), &mut registry);

        assert!(!registry.get(only).unwrap().hidden);
    }
}
