//! Audio/video tooling.
//!
//! Uses the system `ffmpeg`/`ffprobe` binaries rather than linking FFmpeg.

/// `ffmpeg`/`ffprobe` subprocess toolchain.
pub mod ffmpeg;
