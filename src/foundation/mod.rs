//! Shared value types and the crate error taxonomy.

/// Canvas, margins and colours.
pub mod core;
/// Error enum and result alias.
pub mod error;
