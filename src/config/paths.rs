use std::path::Path;

/// Returns the platform-specific path for the config file.
///
/// # Notes
/// - Uses platform-specific config directory (e.g., ~/.config on Linux)
/// - Falls back to current directory if config directory is unavailable
pub fn get_config_path() -> String {
    dirs::config_dir()
        .unwrap_or_else(|| Path::new(".").to_path_buf())
        .join("hoopsnap")
        .join("config.toml")
        .to_string_lossy()
        .to_string()
}

/// Returns the platform-specific path for the log directory.
pub fn get_log_dir_path() -> String {
    dirs::config_dir()
        .unwrap_or_else(|| Path::new(".").to_path_buf())
        .join("hoopsnap")
        .join("logs")
        .to_string_lossy()
        .to_string()
}

/// Returns the default path for the snapshot database file.
///
/// Lives in the platform data directory so repeated ingestion runs find the
/// same store without any flags.
pub fn get_default_database_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| Path::new(".").to_path_buf())
        .join("hoopsnap")
        .join("hoopsnap.db")
        .to_string_lossy()
        .to_string()
}
