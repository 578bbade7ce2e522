//! Table normalization
//!
//! Turns raw upstream tables into column-pruned, type-coerced, renamed
//! record sets. Each table kind has a fixed projection rule: an allow-list
//! of retained columns, per-column coercions, and a rename map. Storage
//! mode keeps internal field names and raw fractions; display mode uses
//! human-facing names and 0-100 percentages. The two modes are never mixed.

pub mod kind;
pub mod projection;

pub use kind::{NormalizeMode, TableKind};
pub use projection::{Row, display_percent, normalize};
