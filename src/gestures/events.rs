use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    Tap,
    Pan,
    LongPress,
    Pinch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GesturePhase {
    Began,
    Changed,
    Ended,
    Cancelled,
}

/// A recognized gesture in screen space (logical pixels, origin top-left)
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct GestureEvent {
    pub kind: GestureKind,
    pub phase: GesturePhase,
    pub position: Vec2,
    /// Incremental pinch factor since the previous event; 1.0 for other kinds
    pub scale: f32,
}

impl GestureEvent {
    pub fn new(kind: GestureKind, phase: GesturePhase, position: Vec2) -> Self {
        Self {
            kind,
            phase,
            position,
            scale: 1.0,
        }
    }

    /// Taps are only ever reported once recognized
    pub fn tap(position: Vec2) -> Self {
        Self::new(GestureKind::Tap, GesturePhase::Ended, position)
    }

    pub fn pan(phase: GesturePhase, position: Vec2) -> Self {
        Self::new(GestureKind::Pan, phase, position)
    }

    pub fn long_press(phase: GesturePhase, position: Vec2) -> Self {
        Self::new(GestureKind::LongPress, phase, position)
    }

    pub fn pinch(phase: GesturePhase, position: Vec2, scale: f32) -> Self {
        Self {
            kind: GestureKind::Pinch,
            phase,
            position,
            scale,
        }
    }
}
