//! Where the scanner keeps its config and logs.
//!
//! Development runs keep everything in the working directory. Installed
//! builds use the platform config directory for `defectscan.json` and the
//! platform data directory for `logs/`.

use std::path::PathBuf;

const APP_DIR_NAME: &str = "defectscan";
const CONFIG_FILE_NAME: &str = "defectscan.json";

/// `cargo run` or a debug build
pub fn is_dev_mode() -> bool {
    std::env::var("CARGO").is_ok() || cfg!(debug_assertions)
}

fn installed_dir(base: Option<PathBuf>) -> Option<PathBuf> {
    if is_dev_mode() {
        Some(PathBuf::from("."))
    } else {
        base.map(|dir| dir.join(APP_DIR_NAME))
    }
}

pub fn config_dir() -> Option<PathBuf> {
    installed_dir(dirs::config_dir())
}

pub fn data_dir() -> Option<PathBuf> {
    installed_dir(dirs::data_dir())
}

pub fn config_file() -> PathBuf {
    config_dir()
        .unwrap_or_default()
        .join(CONFIG_FILE_NAME)
}

pub fn logs_dir() -> PathBuf {
    data_dir().unwrap_or_default().join("logs")
}

/// Create the config and log directories if missing
pub fn ensure_directories() -> std::io::Result<()> {
    if let Some(dir) = config_dir() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::create_dir_all(logs_dir())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dev_mode_keeps_files_local() {
        // Tests build with debug assertions
        assert!(is_dev_mode());
        assert_eq!(config_file(), PathBuf::from("./defectscan.json"));
        assert_eq!(logs_dir(), PathBuf::from("./logs"));
    }
}
