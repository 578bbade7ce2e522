use clap::Parser;
use clap::builder::styling::{AnsiColor, Effects, Styles};

fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
        .usage(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Yellow.on_default())
        .error(AnsiColor::Red.on_default().effects(Effects::BOLD))
        .valid(AnsiColor::Green.on_default())
        .invalid(AnsiColor::Red.on_default())
}

/// NBA Season Snapshot Loader
///
/// Fetches statistics tables for one season from the upstream provider,
/// normalizes them into the snapshot data model, and loads them into the
/// snapshot database. Re-running a season replaces that season's rows.
///
/// By default the run fetches, assembles, and loads in one go. Use
/// --get-only to stop after writing fixture files, or --load-only to bulk
/// load previously written fixtures without touching the network.
#[derive(Parser, Debug)]
#[command(author = "Larry Shi", about, long_about = None)]
#[command(version)]
#[command(styles = get_styles())]
pub struct Args {
    /// Season to ingest, e.g. 2018-19
    #[arg(short, long, default_value = "2018-19")]
    pub season: String,

    /// Only run the API to get data and write fixture files; do not load
    /// them into the database.
    #[arg(short = 'g', long = "get-only", help_heading = "Run Mode")]
    pub get_only: bool,

    /// Only load existing fixture files into the database; no API calls.
    #[arg(short = 'l', long = "load-only", help_heading = "Run Mode")]
    pub load_only: bool,

    /// Directory for fixture files.
    #[arg(long = "fixtures-dir", default_value = "fixtures", help_heading = "Run Mode")]
    pub fixtures_dir: String,

    /// Override the snapshot database path from config.
    #[arg(long = "db", help_heading = "Run Mode")]
    pub database_path: Option<String>,

    /// Update API domain in config.
    #[arg(
        long = "config",
        help_heading = "Configuration",
        value_name = "API_DOMAIN"
    )]
    pub new_api_domain: Option<String>,

    /// Update log file path in config. This sets a persistent custom log file location.
    #[arg(long = "set-log-file", help_heading = "Configuration")]
    pub new_log_file_path: Option<String>,

    /// Clear the custom log file path from config. This reverts to using the default log location.
    #[arg(long = "clear-log-file", help_heading = "Configuration")]
    pub clear_log_file_path: bool,

    /// List current configuration settings
    #[arg(long = "list-config", help_heading = "Configuration")]
    pub list_config: bool,

    /// Enable debug mode: progress logs are echoed to the terminal in
    /// addition to the log file.
    #[arg(long = "debug", help_heading = "Debug")]
    pub debug: bool,

    /// Specify a custom log file path. If not provided, logs will be written to the default location.
    #[arg(long = "log-file", help_heading = "Debug")]
    pub log_file: Option<String>,
}
