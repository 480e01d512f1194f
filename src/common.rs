//! Types shared across the scanner plugins.

use bevy::prelude::*;

/// Frame ordering of the scanner systems.
///
/// Pointer input is turned into gesture events, gestures mutate the marker
/// registry and queue captures, captures are started or completed, and
/// finally the scene is brought in line with the registry.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScannerSet {
    Input,
    Interaction,
    Capture,
    Visuals,
}

pub fn configure_scanner_sets(app: &mut App) {
    app.configure_sets(
        Update,
        (
            ScannerSet::Input,
            ScannerSet::Interaction,
            ScannerSet::Capture,
            ScannerSet::Visuals,
        )
            .chain(),
    );
}

