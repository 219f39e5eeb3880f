//! Text layout: measuring, wrapping and splitting chapters into slides.
//!
//! Wrapping and pagination only see a [`wrap::TextMeasure`], so they run unchanged against real
//! font metrics or a fixed-width stand-in.

/// Parley-backed text shaping and measurement.
pub mod measure;
/// Chapter-to-slide pagination.
pub mod paginate;
/// Greedy word wrap.
pub mod wrap;
