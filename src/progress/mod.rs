//! The durable cursor over the source text.

/// Remote + local persistence of the cursor.
pub mod store;
/// Cursor arithmetic.
pub mod tracker;
