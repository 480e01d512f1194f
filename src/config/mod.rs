use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_CAPTURE_TIMEOUT_SECONDS, DEFAULT_LONG_PRESS_SECONDS, DEFAULT_MIN_DRAG_DISTANCE,
    DEFAULT_PAN_SLOP, DEFAULT_PINCH_IDLE_SECONDS, DEFAULT_SCREEN_TO_WORLD_FACTOR,
    DEFAULT_TRASH_ZONE_HEIGHT, DEFAULT_TRASH_ZONE_WIDTH, DEFAULT_WHEEL_PINCH_STEP,
    MIN_CAPTURE_TIMEOUT_SECONDS,
};

/// System set for config loading (other plugins can run after this)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigLoaded;

/// Tuning for gesture recognition and drag-to-size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureSettings {
    /// Pan distance (px) before a drag-to-size marker is created
    pub min_drag_distance: f32,
    /// Meters per screen pixel when sizing a drawn marker
    pub screen_to_world_factor: f32,
    pub long_press_seconds: f32,
    pub pan_slop: f32,
    pub pinch_idle_seconds: f32,
    pub wheel_pinch_step: f32,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            min_drag_distance: DEFAULT_MIN_DRAG_DISTANCE,
            screen_to_world_factor: DEFAULT_SCREEN_TO_WORLD_FACTOR,
            long_press_seconds: DEFAULT_LONG_PRESS_SECONDS,
            pan_slop: DEFAULT_PAN_SLOP,
            pinch_idle_seconds: DEFAULT_PINCH_IDLE_SECONDS,
            wheel_pinch_step: DEFAULT_WHEEL_PINCH_STEP,
        }
    }
}

/// Size of the drop zone that deletes a dragged marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrashZoneSettings {
    pub width: f32,
    pub height: f32,
}

impl Default for TrashZoneSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_TRASH_ZONE_WIDTH,
            height: DEFAULT_TRASH_ZONE_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Seconds before an unanswered snapshot is abandoned and visibility restored
    pub timeout_seconds: f32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_CAPTURE_TIMEOUT_SECONDS,
        }
    }
}

/// Scanner configuration persisted to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScannerConfigData {
    #[serde(default)]
    pub gestures: GestureSettings,

    #[serde(default)]
    pub trash_zone: TrashZoneSettings,

    #[serde(default)]
    pub capture: CaptureSettings,

    /// Whether feature point / origin / plane overlays start enabled
    #[serde(default)]
    pub debug_overlays: bool,
}

impl ScannerConfigData {
    /// Pull loaded values back into their usable range
    pub fn clamp_to_limits(&mut self) {
        let timeout = self.capture.timeout_seconds;
        self.capture.timeout_seconds = timeout.max(MIN_CAPTURE_TIMEOUT_SECONDS);
        if self.capture.timeout_seconds != timeout {
            warn!(
                "capture.timeout_seconds {} is too short, using {}",
                timeout, self.capture.timeout_seconds
            );
        }
    }
}

/// Runtime configuration resource
#[derive(Resource)]
pub struct ScannerConfig {
    /// The persisted configuration data
    pub data: ScannerConfigData,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Whether config needs to be saved (dirty flag)
    pub dirty: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            data: ScannerConfigData::default(),
            config_path: crate::paths::config_file(),
            dirty: false,
        }
    }
}

/// Resource to notify the user when config was reset to defaults
#[derive(Resource, Default)]
pub struct ConfigResetNotification {
    pub show: bool,
    /// The reason for the reset (parse error, read error, etc.)
    pub reason: Option<String>,
}

/// Message to trigger config save
#[derive(Message)]
pub struct SaveConfigRequest;

/// Message to remember the debug overlay toggle across runs
#[derive(Message)]
pub struct SetDebugOverlaysRequest {
    pub enabled: bool,
}

/// Result of loading config from disk
struct LoadConfigResult {
    data: ScannerConfigData,
    /// Error message if config was reset to defaults due to an error
    reset_reason: Option<String>,
}

/// Parse config JSON, falling back to defaults on error
fn parse_config(json: &str) -> LoadConfigResult {
    match serde_json::from_str::<ScannerConfigData>(json) {
        Ok(mut data) => {
            data.clamp_to_limits();
            LoadConfigResult {
                data,
                reset_reason: None,
            }
        }
        Err(e) => {
            warn!("Failed to parse config file: {}", e);
            LoadConfigResult {
                data: ScannerConfigData::default(),
                reset_reason: Some(format!("Configuration file was corrupted: {}", e)),
            }
        }
    }
}

/// Load configuration from disk
fn load_config(config_path: &std::path::Path) -> LoadConfigResult {
    if !config_path.exists() {
        info!("No config file found, using defaults");
        return LoadConfigResult {
            data: ScannerConfigData::default(),
            reset_reason: None,
        };
    }

    match std::fs::read_to_string(config_path) {
        Ok(json) => {
            let result = parse_config(&json);
            if result.reset_reason.is_none() {
                info!("Loaded config from {:?}", config_path);
            }
            result
        }
        Err(e) => {
            warn!("Failed to read config file: {}", e);
            LoadConfigResult {
                data: ScannerConfigData::default(),
                reset_reason: Some(format!("Could not read configuration file: {}", e)),
            }
        }
    }
}

/// Save configuration to disk
fn save_config(config: &ScannerConfig) {
    match serde_json::to_string_pretty(&config.data) {
        Ok(json) => {
            if let Some(dir) = config.config_path.parent() {
                if !dir.as_os_str().is_empty() {
                    if let Err(e) = std::fs::create_dir_all(dir) {
                        error!("Failed to create config directory {:?}: {}", dir, e);
                        return;
                    }
                }
            }
            if let Err(e) = std::fs::write(&config.config_path, json) {
                error!("Failed to save config: {}", e);
            } else {
                info!("Config saved to {:?}", config.config_path);
            }
        }
        Err(e) => {
            error!("Failed to serialize config: {}", e);
        }
    }
}

/// Startup system to load config from disk into the existing resource
fn load_config_system(
    mut config: ResMut<ScannerConfig>,
    mut reset_notification: ResMut<ConfigResetNotification>,
) {
    let result = load_config(&config.config_path);
    config.data = result.data;
    config.dirty = false;

    if let Some(reason) = result.reset_reason {
        reset_notification.show = true;
        reset_notification.reason = Some(reason);
    }
}

/// Log a config reset once
fn report_config_reset(mut notification: ResMut<ConfigResetNotification>) {
    if !notification.show {
        return;
    }
    notification.show = false;
    warn!(
        "Running with default configuration: {}",
        notification.reason.as_deref().unwrap_or("unknown error")
    );
}

/// System to save config when requested
fn save_config_system(
    mut events: MessageReader<SaveConfigRequest>,
    mut config: ResMut<ScannerConfig>,
) {
    for _ in events.read() {
        if config.dirty {
            save_config(&config);
            config.dirty = false;
        }
    }
}

fn set_debug_overlays_system(
    mut events: MessageReader<SetDebugOverlaysRequest>,
    mut config: ResMut<ScannerConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) {
    for event in events.read() {
        if config.data.debug_overlays != event.enabled {
            config.data.debug_overlays = event.enabled;
            config.dirty = true;
            save_events.write(SaveConfigRequest);
        }
    }
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ScannerConfig>()
            .init_resource::<ConfigResetNotification>()
            .add_message::<SaveConfigRequest>()
            .add_message::<SetDebugOverlaysRequest>()
            .add_systems(
                Startup,
                (
                    load_config_system.in_set(ConfigLoaded),
                    report_config_reset.after(ConfigLoaded),
                ),
            )
            .add_systems(
                Update,
                (
                    set_debug_overlays_system.run_if(on_message::<SetDebugOverlaysRequest>),
                    save_config_system.run_if(on_message::<SaveConfigRequest>),
                )
                    .chain(),
            );
    }
}
