/// Per-slide padded narration.
pub mod assembler;
