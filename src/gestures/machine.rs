//! Gesture state machine driving marker creation, sizing, deletion and scaling.
//!
//! Exactly one interaction is active at a time. Each gesture family may only
//! begin from [`ActiveInteraction::Idle`], and later phases of a family are
//! ignored unless that family owns the current interaction. The machine holds
//! marker ids only; markers themselves stay in the [`MarkerRegistry`].

use bevy::prelude::*;

use crate::capture::{CapturePurpose, CaptureRequest};
use crate::config::{ScannerConfigData, TrashZoneSettings};
use crate::constants::{MAX_DRAWN_MARKER_SIZE, MIN_DRAWN_MARKER_SIZE};
use crate::defects::FeedbackKind;
use crate::markers::{MarkerId, MarkerRegistry, MarkerState};
use crate::surface::RaycastHit;

use super::events::{GestureEvent, GestureKind, GesturePhase};

/// Scene queries the machine needs, kept behind a trait so it runs without a renderer
pub trait SceneAccess {
    /// Surface hit under a screen point
    fn raycast(&self, screen_point: Vec2) -> Option<RaycastHit>;
    /// Nearest visible marker element under a screen point
    fn pick_element(&self, screen_point: Vec2) -> Option<Entity>;
    fn viewport_size(&self) -> Vec2;
}

/// Marker created by a drag-to-size gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawnMarker {
    pub id: MarkerId,
    /// World position of the raycast at the drag start
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ActiveInteraction {
    #[default]
    Idle,
    /// Drag-to-size; no marker until the drag passes the minimum distance
    Drawing {
        start: Vec2,
        marker: Option<DrawnMarker>,
    },
    /// Long-press drag toward the trash zone
    DeleteDragging { marker: MarkerId },
    Scaling { marker: MarkerId },
}

impl ActiveInteraction {
    pub fn is_idle(&self) -> bool {
        matches!(self, ActiveInteraction::Idle)
    }

    /// Marker the interaction currently holds
    pub fn marker(&self) -> Option<MarkerId> {
        match self {
            ActiveInteraction::Idle => None,
            ActiveInteraction::Drawing { marker, .. } => marker.map(|drawn| drawn.id),
            ActiveInteraction::DeleteDragging { marker }
            | ActiveInteraction::Scaling { marker } => Some(*marker),
        }
    }
}

/// Side effects the host applies after a gesture was handled
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEffect {
    Capture(CaptureRequest),
    DefectDeleted(MarkerId),
    Feedback(FeedbackKind),
    DeleteDragChanged(bool),
}

#[derive(Resource, Debug, Default)]
pub struct GestureMachine {
    interaction: ActiveInteraction,
}

/// Trash drop zone: centered horizontally, flush with the bottom edge
pub fn trash_zone_rect(viewport: Vec2, zone: &TrashZoneSettings) -> Rect {
    let left = viewport.x / 2.0 - zone.width / 2.0;
    Rect::from_corners(
        Vec2::new(left, viewport.y - zone.height),
        Vec2::new(left + zone.width, viewport.y),
    )
}

/// Side length of a drawn marker from the screen-space drag
pub fn drawn_marker_size(start: Vec2, current: Vec2, screen_to_world: f32) -> f32 {
    (start.distance(current) * screen_to_world)
        .clamp(MIN_DRAWN_MARKER_SIZE, MAX_DRAWN_MARKER_SIZE)
}

impl GestureMachine {
    pub fn interaction(&self) -> &ActiveInteraction {
        &self.interaction
    }

    pub fn is_delete_dragging(&self) -> bool {
        matches!(self.interaction, ActiveInteraction::DeleteDragging { .. })
    }

    pub fn handle(
        &mut self,
        event: &GestureEvent,
        scene: &impl SceneAccess,
        registry: &mut MarkerRegistry,
        config: &ScannerConfigData,
    ) -> Vec<GestureEffect> {
        let mut effects = Vec::new();

        match event.kind {
            GestureKind::Tap => self.on_tap(event, scene, registry, &mut effects),
            GestureKind::Pan => self.on_pan(event, scene, registry, config, &mut effects),
            GestureKind::LongPress => {
                self.on_long_press(event, scene, registry, config, &mut effects)
            }
            GestureKind::Pinch => self.on_pinch(event, scene, registry, &mut effects),
        }

        effects
    }

    /// Resolve the marker under a screen point, skipping hidden ones
    fn pick_marker(
        scene: &impl SceneAccess,
        registry: &MarkerRegistry,
        point: Vec2,
    ) -> Option<MarkerId> {
        let element = scene.pick_element(point)?;
        let id = registry.find_id(element)?;
        let marker = registry.get(id)?;
        (!marker.hidden).then_some(id)
    }

    fn on_tap(
        &mut self,
        event: &GestureEvent,
        scene: &impl SceneAccess,
        registry: &mut MarkerRegistry,
        effects: &mut Vec<GestureEffect>,
    ) {
        if event.phase != GesturePhase::Ended {
            return;
        }
        if !self.interaction.is_idle() {
            debug!("Tap ignored during {:?}", self.interaction);
            return;
        }
        let Some(hit) = scene.raycast(event.position) else {
            return;
        };

        let id = registry.allocate_id();
        registry.place(&hit, id);
        info!("Tap placed {} at {:?}", id, hit.position());

        effects.push(GestureEffect::Feedback(FeedbackKind::Medium));
        effects.push(GestureEffect::Capture(CaptureRequest {
            marker: id,
            purpose: CapturePurpose::NewDefect {
                position: hit.position(),
            },
        }));
    }

    fn on_pan(
        &mut self,
        event: &GestureEvent,
        scene: &impl SceneAccess,
        registry: &mut MarkerRegistry,
        config: &ScannerConfigData,
        effects: &mut Vec<GestureEffect>,
    ) {
        if event.phase == GesturePhase::Began {
            if self.interaction.is_idle() {
                self.interaction = ActiveInteraction::Drawing {
                    start: event.position,
                    marker: None,
                };
            }
            return;
        }

        let ActiveInteraction::Drawing { start, marker } = self.interaction else {
            return;
        };
        let settings = &config.gestures;

        match event.phase {
            GesturePhase::Began => {}
            GesturePhase::Changed => {
                if start.distance(event.position) <= settings.min_drag_distance {
                    return;
                }

                let drawn = match marker {
                    Some(drawn) => drawn,
                    None => {
                        // Anchor at the drag start, not the current point
                        let Some(hit) = scene.raycast(start) else {
                            return;
                        };
                        let id = registry.allocate_id();
                        registry.place(&hit, id);
                        registry.set_state(id, MarkerState::Drawing);
                        effects.push(GestureEffect::Feedback(FeedbackKind::Light));
                        info!("Drawing {} at {:?}", id, hit.position());

                        let drawn = DrawnMarker {
                            id,
                            position: hit.position(),
                        };
                        self.interaction = ActiveInteraction::Drawing {
                            start,
                            marker: Some(drawn),
                        };
                        drawn
                    }
                };

                let size =
                    drawn_marker_size(start, event.position, settings.screen_to_world_factor);
                registry.resize_absolute(drawn.id, size, size);
            }
            GesturePhase::Ended => {
                self.interaction = ActiveInteraction::Idle;
                let Some(drawn) = marker else {
                    return;
                };

                registry.set_state(drawn.id, MarkerState::Normal);
                effects.push(GestureEffect::Capture(CaptureRequest {
                    marker: drawn.id,
                    purpose: CapturePurpose::NewDefect {
                        position: drawn.position,
                    },
                }));
            }
            GesturePhase::Cancelled => {
                self.interaction = ActiveInteraction::Idle;
                if let Some(drawn) = marker {
                    registry.remove(drawn.id);
                    debug!("Drawing of {} cancelled", drawn.id);
                }
            }
        }
    }

    fn on_long_press(
        &mut self,
        event: &GestureEvent,
        scene: &impl SceneAccess,
        registry: &mut MarkerRegistry,
        config: &ScannerConfigData,
        effects: &mut Vec<GestureEffect>,
    ) {
        match event.phase {
            GesturePhase::Began => {
                if !self.interaction.is_idle() {
                    return;
                }
                let Some(id) = Self::pick_marker(scene, registry, event.position) else {
                    return;
                };

                self.interaction = ActiveInteraction::DeleteDragging { marker: id };
                registry.set_state(id, MarkerState::DeleteArmed);
                effects.push(GestureEffect::DeleteDragChanged(true));
                effects.push(GestureEffect::Feedback(FeedbackKind::Heavy));
                debug!("Delete-drag armed for {}", id);
            }
            GesturePhase::Changed => {
                let ActiveInteraction::DeleteDragging { marker } = self.interaction else {
                    return;
                };
                if let Some(hit) = scene.raycast(event.position) {
                    registry.move_to(marker, hit.world_transform);
                }
            }
            GesturePhase::Ended | GesturePhase::Cancelled => {
                let ActiveInteraction::DeleteDragging { marker } = self.interaction else {
                    return;
                };
                self.interaction = ActiveInteraction::Idle;

                let zone = trash_zone_rect(scene.viewport_size(), &config.trash_zone);
                if zone.contains(event.position) {
                    registry.remove(marker);
                    effects.push(GestureEffect::DefectDeleted(marker));
                    effects.push(GestureEffect::Feedback(FeedbackKind::Success));
                    info!("Deleted {} via trash zone", marker);
                } else {
                    registry.set_state(marker, MarkerState::Normal);
                }
                effects.push(GestureEffect::DeleteDragChanged(false));
            }
        }
    }

    fn on_pinch(
        &mut self,
        event: &GestureEvent,
        scene: &impl SceneAccess,
        registry: &mut MarkerRegistry,
        effects: &mut Vec<GestureEffect>,
    ) {
        if event.phase == GesturePhase::Began {
            if !self.interaction.is_idle() {
                return;
            }
            if let Some(id) = Self::pick_marker(scene, registry, event.position) {
                self.interaction = ActiveInteraction::Scaling { marker: id };
            }
            return;
        }

        let ActiveInteraction::Scaling { marker } = self.interaction else {
            return;
        };

        match event.phase {
            GesturePhase::Began => {}
            GesturePhase::Changed => registry.scale(marker, event.scale),
            GesturePhase::Ended => {
                self.interaction = ActiveInteraction::Idle;
                if registry.contains(marker) {
                    effects.push(GestureEffect::Capture(CaptureRequest {
                        marker,
                        purpose: CapturePurpose::RefreshImage,
                    }));
                }
            }
            GesturePhase::Cancelled => self.interaction = ActiveInteraction::Idle,
        }
    }
}
