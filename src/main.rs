mod capture;
mod common;
mod config;
mod constants;
mod defects;
mod gestures;
mod markers;
mod paths;
mod session;
mod surface;

use bevy::prelude::*;

use constants::{DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};

/// Set up file logging for debug builds
#[cfg(debug_assertions)]
fn setup_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use std::fs::OpenOptions;
    use std::io::Write;
    use tracing_subscriber::prelude::*;

    if let Err(e) = paths::ensure_directories() {
        eprintln!("Failed to create data directories: {}", e);
        return None;
    }

    let logs_dir = paths::logs_dir();
    let log_file_path = logs_dir.join("defectscan.log");

    // Append session separator to existing log file
    if let Ok(mut file) = OpenOptions::new().append(true).open(&log_file_path) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let separator = "=".repeat(80);
        let _ = writeln!(
            file,
            "\n\n{}\n=== Scan Session Started at {} ===\n{}\n",
            separator, timestamp, separator
        );
    }

    let file_appender = tracing_appender::rolling::never(&logs_dir, "defectscan.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // No ANSI colors in the file
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(true)
        .with_level(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,defectscan=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Some(guard)
}

#[cfg(not(debug_assertions))]
fn setup_logging() -> Option<()> {
    None
}

fn main() {
    // Keep the guard alive for the duration of the program
    let _log_guard = setup_logging();

    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "DefectScan".into(),
            resolution: (DEFAULT_WINDOW_WIDTH as u32, DEFAULT_WINDOW_HEIGHT as u32).into(),
            ..default()
        }),
        ..default()
    }));

    common::configure_scanner_sets(&mut app);

    app.add_plugins(config::ConfigPlugin)
        .add_plugins(surface::SurfacePlugin)
        .add_plugins(markers::MarkerPlugin)
        .add_plugins(session::SessionPlugin)
        .add_plugins(gestures::GesturePlugin)
        .add_plugins(capture::CapturePlugin)
        .add_plugins(defects::DefectFlowPlugin)
        .run();
}
