//! Upstream statistics provider boundary
//!
//! The provider serves every table as a JSON document of named result sets
//! (`headers` + `rowSet`). This module owns request construction, pacing,
//! bounded retries, and the raw table model; it knows nothing about the
//! projection rules applied downstream.

pub mod client;
pub mod models;
pub mod urls;

pub use client::StatsClient;
pub use models::{RawTable, ResultSet, StatsResponse};
pub use urls::*;
