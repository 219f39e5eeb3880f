/// Slide rasterization.
pub mod slide;
