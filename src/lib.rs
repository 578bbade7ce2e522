//! NBA Season Snapshot Ingestion Library
//!
//! This library fetches statistics tables from the upstream basketball
//! statistics provider, normalizes them through fixed per-kind projection
//! rules, assembles them into a season snapshot (teams, players, games,
//! game logs, standings, season and career totals), and persists the
//! snapshot into an embedded relational store for display.
//!
//! # Examples
//!
//! ```rust,no_run
//! use hoopsnap::config::Config;
//! use hoopsnap::error::AppError;
//! use hoopsnap::ingest::IngestPipeline;
//! use hoopsnap::store::DomainStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), AppError> {
//!     let config = Config::load().await?;
//!     let store = DomainStore::connect(&config.database_path).await?;
//!
//!     let pipeline = IngestPipeline::new(config, "2018-19")?;
//!     let report = pipeline.run(&store).await?;
//!
//!     for table in &report.tables {
//!         println!("{table}");
//!     }
//!     println!("{} rows persisted", report.persisted.total());
//!
//!     Ok(())
//! }
//! ```

pub mod assemble;
pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod normalize;
pub mod snapshot;
pub mod store;
pub mod upstream;

// Re-export commonly used types for convenience
pub use config::Config;
pub use domain::{SeasonSnapshot, SeasonType};
pub use error::AppError;
pub use ingest::{IngestPipeline, IngestReport};
pub use normalize::{NormalizeMode, TableKind, normalize};
pub use snapshot::SnapshotWriter;
pub use store::DomainStore;
pub use upstream::StatsClient;

/// Current version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
