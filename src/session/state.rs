use bevy::prelude::*;

/// Lifecycle of the world-tracking session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrackingState {
    #[default]
    NotStarted,
    Running,
    Paused,
}

/// What the tracking hardware can do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorCapabilities {
    pub mesh_reconstruction: bool,
    pub scene_depth: bool,
}

impl SensorCapabilities {
    /// The simulated sensor supports everything
    pub fn simulated() -> Self {
        Self {
            mesh_reconstruction: true,
            scene_depth: true,
        }
    }
}

impl Default for SensorCapabilities {
    fn default() -> Self {
        Self::simulated()
    }
}

/// Settings the session was started with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingConfiguration {
    pub detect_horizontal_planes: bool,
    pub detect_vertical_planes: bool,
    pub mesh_reconstruction: bool,
    pub scene_depth: bool,
}

impl TrackingConfiguration {
    /// Plane detection in both orientations, plus whatever the sensor supports
    pub fn for_capabilities(capabilities: SensorCapabilities) -> Self {
        Self {
            detect_horizontal_planes: true,
            detect_vertical_planes: true,
            mesh_reconstruction: capabilities.mesh_reconstruction,
            scene_depth: capabilities.scene_depth,
        }
    }
}

/// The world-tracking session.
///
/// The configuration is built once on the first start and reused by every
/// later start or resume.
#[derive(Resource, Debug, Default)]
pub struct TrackingSession {
    state: TrackingState,
    capabilities: SensorCapabilities,
    configuration: Option<TrackingConfiguration>,
}

impl TrackingSession {
    pub fn with_capabilities(capabilities: SensorCapabilities) -> Self {
        Self {
            capabilities,
            ..default()
        }
    }

    pub fn state(&self) -> TrackingState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TrackingState::Running
    }

    pub fn configuration(&self) -> Option<TrackingConfiguration> {
        self.configuration
    }

    /// Start or restart tracking. Returns the new state if it changed.
    pub fn start(&mut self) -> Option<TrackingState> {
        if self.configuration.is_none() {
            let configuration = TrackingConfiguration::for_capabilities(self.capabilities);
            info!("Tracking configured: {:?}", configuration);
            self.configuration = Some(configuration);
        }
        self.transition(TrackingState::Running)
    }

    pub fn pause(&mut self) -> Option<TrackingState> {
        if self.state != TrackingState::Running {
            return None;
        }
        self.transition(TrackingState::Paused)
    }

    /// Resume after a pause; a session that never started is started instead
    pub fn resume(&mut self) -> Option<TrackingState> {
        match self.state {
            TrackingState::Paused | TrackingState::NotStarted => self.start(),
            TrackingState::Running => None,
        }
    }

    /// Pause when running, otherwise resume
    pub fn toggle_pause(&mut self) -> Option<TrackingState> {
        if self.is_running() {
            self.pause()
        } else {
            self.resume()
        }
    }

    fn transition(&mut self, state: TrackingState) -> Option<TrackingState> {
        if self.state == state {
            return None;
        }
        self.state = state;
        Some(state)
    }
}

/// Whether debug overlays are drawn
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DebugOverlays {
    pub enabled: bool,
}

/// Commands accepted by the session
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Start,
    Pause,
    Resume,
    SetDebugOverlays(bool),
}

/// Sent whenever the tracking state changes
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingStateChanged {
    pub state: TrackingState,
}

/// Run condition: tracking is live
pub fn session_is_running(session: Res<TrackingSession>) -> bool {
    session.is_running()
}
