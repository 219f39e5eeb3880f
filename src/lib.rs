//! Versecast turns chapters of verses into narrated vertical videos.
//!
//! Each run processes exactly one chapter and resumes from persisted progress:
//!
//! - Load a [`Scripture`] and the [`ProgressState`] cursor
//! - Paginate the next chapter into [`Slide`]s that fit the screen
//! - Narrate every slide through a [`CredentialRotator`] over rate-limited accounts
//! - Compose one MP4, upload it, and only then advance the cursor
//!
//! Every external collaborator sits behind a capability trait ([`SpeechProvider`],
//! [`MediaToolchain`], [`SlideRenderer`], [`BlobStore`], [`TextMeasure`]) so a [`Session`] can be
//! assembled from real adapters or test doubles.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Run configuration.
pub mod config;
/// Final video assembly.
pub mod encode;
/// Text measuring, wrapping and pagination.
pub mod layout;
/// Audio/video toolchain.
pub mod media;
/// Per-slide narration.
pub mod narration;
/// Session orchestration.
pub mod pipeline;
/// Durable progress.
pub mod progress;
/// Slide drawing.
pub mod render;
/// Source text.
pub mod source;
/// Speech synthesis and credential rotation.
pub mod speech;
/// Object stores.
pub mod storage;

pub use crate::config::VersecastConfig;
pub use crate::foundation::core::{Canvas, Rgba8, SafeArea};
pub use crate::foundation::error::{VersecastError, VersecastResult};

pub use crate::encode::compose::{ComposedVideo, VideoComposer, output_file_name};
pub use crate::layout::measure::{FontFace, FontMeasure, TextLayoutEngine};
pub use crate::layout::paginate::{Slide, SlideLayout, paginate};
pub use crate::layout::wrap::{TextMeasure, wrap};
pub use crate::media::ffmpeg::{FfmpegToolchain, ImageSpan, MediaToolchain, MuxOptions};
pub use crate::narration::assembler::{
    NarratedAudio, NarrationAssembler, NarrationSettings, SlideArtifact,
};
pub use crate::pipeline::run::{
    ChapterReport, RunOutcome, Session, SessionParts, SessionSettings, StatusReport,
    render_chapter_slides, status_report,
};
pub use crate::progress::store::{ProgressLedger, ProgressStore};
pub use crate::progress::tracker::{ProgressState, ProgressTracker};
pub use crate::render::slide::{RasterSlideRenderer, SlideRenderer, SlideStyle};
pub use crate::source::scripture::{Book, ChapterUnit, Scripture};
pub use crate::speech::elevenlabs::ElevenLabsClient;
pub use crate::speech::provider::{Quota, SpeechError, SpeechProvider, SpeechRequest, VoiceSettings};
pub use crate::speech::rotator::{
    Credential, CredentialIndexSink, CredentialRotator, CredentialSet, RotationPolicy,
};
pub use crate::storage::blob::{BlobStore, DirBlobStore, HttpBlobStore, MemoryBlobStore};
pub use crate::storage::s3::S3BlobStore;
