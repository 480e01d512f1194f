//! Mouse input to gesture events.
//!
//! Left button: a click is a tap, a drag past the slop is a pan, a press held
//! still for the long-press time becomes a long-press that then follows the
//! pointer. The wheel acts as a pinch that ends after a short idle period.
//! Escape cancels whatever is in progress.

use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::config::{GestureSettings, ScannerConfig};

use super::events::{GestureEvent, GesturePhase};

/// Lower bound for a single wheel step's scale factor
const MIN_WHEEL_FACTOR: f32 = 0.1;
/// Pixel-unit scroll deltas per line
const PIXELS_PER_LINE: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum PointerState {
    #[default]
    Released,
    /// Down but not yet classified
    Pressed { origin: Vec2, held: f32 },
    Panning,
    LongPressing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PinchState {
    position: Vec2,
    idle: f32,
}

#[derive(Resource, Debug, Default)]
pub struct GestureRecognizer {
    pointer: PointerState,
    pinch: Option<PinchState>,
    last_position: Vec2,
}

impl GestureRecognizer {
    pub fn last_position(&self) -> Vec2 {
        self.last_position
    }

    pub fn press(&mut self, position: Vec2) {
        self.last_position = position;
        if self.pointer == PointerState::Released {
            self.pointer = PointerState::Pressed {
                origin: position,
                held: 0.0,
            };
        }
    }

    pub fn pointer_moved(
        &mut self,
        position: Vec2,
        settings: &GestureSettings,
    ) -> Vec<GestureEvent> {
        if position == self.last_position {
            return Vec::new();
        }
        self.last_position = position;

        match self.pointer {
            PointerState::Released => Vec::new(),
            PointerState::Pressed { origin, .. } => {
                if origin.distance(position) <= settings.pan_slop {
                    return Vec::new();
                }
                self.pointer = PointerState::Panning;
                vec![
                    GestureEvent::pan(GesturePhase::Began, origin),
                    GestureEvent::pan(GesturePhase::Changed, position),
                ]
            }
            PointerState::Panning => vec![GestureEvent::pan(GesturePhase::Changed, position)],
            PointerState::LongPressing => {
                vec![GestureEvent::long_press(GesturePhase::Changed, position)]
            }
        }
    }

    /// Advance hold and idle timers
    pub fn tick(&mut self, delta: f32, settings: &GestureSettings) -> Vec<GestureEvent> {
        let mut events = Vec::new();

        if let PointerState::Pressed { origin, held } = self.pointer {
            let held = held + delta;
            if held >= settings.long_press_seconds {
                self.pointer = PointerState::LongPressing;
                events.push(GestureEvent::long_press(GesturePhase::Began, origin));
            } else {
                self.pointer = PointerState::Pressed { origin, held };
            }
        }

        if let Some(pinch) = self.pinch.as_mut() {
            pinch.idle += delta;
            if pinch.idle >= settings.pinch_idle_seconds {
                events.push(GestureEvent::pinch(GesturePhase::Ended, pinch.position, 1.0));
                self.pinch = None;
            }
        }

        events
    }

    pub fn release(&mut self, position: Vec2) -> Vec<GestureEvent> {
        self.last_position = position;
        let event = match std::mem::take(&mut self.pointer) {
            PointerState::Released => None,
            PointerState::Pressed { .. } => Some(GestureEvent::tap(position)),
            PointerState::Panning => Some(GestureEvent::pan(GesturePhase::Ended, position)),
            PointerState::LongPressing => {
                Some(GestureEvent::long_press(GesturePhase::Ended, position))
            }
        };
        event.into_iter().collect()
    }

    /// One wheel step of `lines`; positive grows the marker
    pub fn wheel(
        &mut self,
        position: Vec2,
        lines: f32,
        settings: &GestureSettings,
    ) -> Vec<GestureEvent> {
        let factor = (1.0 + settings.wheel_pinch_step * lines).max(MIN_WHEEL_FACTOR);
        let mut events = Vec::new();

        if self.pinch.is_none() {
            events.push(GestureEvent::pinch(GesturePhase::Began, position, 1.0));
        }
        let pinch = self.pinch.get_or_insert(PinchState {
            position,
            idle: 0.0,
        });
        pinch.idle = 0.0;
        events.push(GestureEvent::pinch(GesturePhase::Changed, pinch.position, factor));

        events
    }

    /// Cancel every gesture in progress
    pub fn cancel(&mut self) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        let position = self.last_position;

        match std::mem::take(&mut self.pointer) {
            PointerState::Panning => {
                events.push(GestureEvent::pan(GesturePhase::Cancelled, position))
            }
            PointerState::LongPressing => {
                events.push(GestureEvent::long_press(GesturePhase::Cancelled, position))
            }
            PointerState::Released | PointerState::Pressed { .. } => {}
        }
        if let Some(pinch) = self.pinch.take() {
            events.push(GestureEvent::pinch(GesturePhase::Cancelled, pinch.position, 1.0));
        }

        events
    }
}

/// Feed mouse input through the recognizer and publish the gestures it produces
#[allow(clippy::too_many_arguments)]
pub fn recognize_pointer_gestures(
    mut recognizer: ResMut<GestureRecognizer>,
    mouse: Res<ButtonInput<MouseButton>>,
    keyboard: Res<ButtonInput<KeyCode>>,
    mut scroll_events: MessageReader<MouseWheel>,
    window_query: Query<&Window, With<PrimaryWindow>>,
    time: Res<Time>,
    config: Res<ScannerConfig>,
    mut gestures: MessageWriter<GestureEvent>,
) {
    let settings = &config.data.gestures;
    let cursor = window_query
        .single()
        .ok()
        .and_then(|window| window.cursor_position());
    let position = cursor.unwrap_or(recognizer.last_position());

    let mut events = Vec::new();

    if keyboard.just_pressed(KeyCode::Escape) {
        events.extend(recognizer.cancel());
    }

    if mouse.just_pressed(MouseButton::Left) && cursor.is_some() {
        recognizer.press(position);
    }
    if cursor.is_some() {
        events.extend(recognizer.pointer_moved(position, settings));
    }
    events.extend(recognizer.tick(time.delta_secs(), settings));
    if mouse.just_released(MouseButton::Left) {
        events.extend(recognizer.release(position));
    }

    for event in scroll_events.read() {
        let lines = match event.unit {
            MouseScrollUnit::Line => event.y,
            MouseScrollUnit::Pixel => event.y / PIXELS_PER_LINE,
        };
        if lines != 0.0 && cursor.is_some() {
            events.extend(recognizer.wheel(position, lines, settings));
        }
    }

    for event in events {
        debug!("Gesture {:?} {:?} at {:?}", event.kind, event.phase, event.position);
        gestures.write(event);
    }
}
