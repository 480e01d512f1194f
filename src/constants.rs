//! Centralized constants used across the application.
//!
//! Physical sizes are in meters, screen distances in logical pixels.

/// Default window width in pixels
pub const DEFAULT_WINDOW_WIDTH: f32 = 1280.0;

/// Default window height in pixels
pub const DEFAULT_WINDOW_HEIGHT: f32 = 800.0;

/// Side length of a freshly placed marker footprint (20 cm square)
pub const MARKER_BASE_SIZE: f32 = 0.2;

/// Thickness of the marker border bars
pub const MARKER_BORDER_THICKNESS: f32 = 0.005;

/// Smallest footprint side a drag-to-size gesture can produce
pub const MIN_DRAWN_MARKER_SIZE: f32 = 0.1;

/// Largest footprint side a drag-to-size gesture can produce
pub const MAX_DRAWN_MARKER_SIZE: f32 = 1.0;

/// Pan distance a drag-to-size gesture must exceed before a marker is created
pub const DEFAULT_MIN_DRAG_DISTANCE: f32 = 20.0;

/// Empirical meters-per-pixel factor for drag-to-size.
/// Assumes the surface is roughly 1.5 m from the camera.
pub const DEFAULT_SCREEN_TO_WORLD_FACTOR: f32 = 0.002;

/// Hold time before a press is recognized as a long-press
pub const DEFAULT_LONG_PRESS_SECONDS: f32 = 0.5;

/// Pointer movement tolerated before a press turns into a pan
pub const DEFAULT_PAN_SLOP: f32 = 8.0;

/// Idle time after the last wheel tick before a pinch ends
pub const DEFAULT_PINCH_IDLE_SECONDS: f32 = 0.25;

/// Scale change per wheel line when the wheel emulates a pinch
pub const DEFAULT_WHEEL_PINCH_STEP: f32 = 0.1;

/// Trash drop zone width, centered horizontally
pub const DEFAULT_TRASH_ZONE_WIDTH: f32 = 100.0;

/// Trash drop zone height, anchored to the bottom edge
pub const DEFAULT_TRASH_ZONE_HEIGHT: f32 = 150.0;

/// A capture still in flight after this long is abandoned
pub const DEFAULT_CAPTURE_TIMEOUT_SECONDS: f32 = 5.0;

/// Shortest capture timeout accepted from the config file
pub const MIN_CAPTURE_TIMEOUT_SECONDS: f32 = 0.5;

/// Description used when a defect is confirmed without one
pub const DEFAULT_DEFECT_DESCRIPTION: &str = "New Defect";
