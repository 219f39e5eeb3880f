use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::encode::compose::VideoComposer;
use crate::foundation::error::{VersecastError, VersecastResult};
use crate::layout::paginate::paginate;
use crate::media::ffmpeg::{MediaToolchain, MuxOptions};
use crate::narration::assembler::{NarrationAssembler, NarrationSettings, SlideArtifact};
use crate::progress::store::{ProgressLedger, ProgressStore};
use crate::progress::tracker::{ProgressState, ProgressTracker};
use crate::render::slide::SlideRenderer;
use crate::source::scripture::{ChapterUnit, Scripture};
use crate::speech::provider::SpeechProvider;
use crate::speech::rotator::{CredentialRotator, CredentialSet, RotationPolicy};
use crate::storage::blob::{BlobStore, MP4_CONTENT_TYPE};

/// Per-run settings that are not capabilities.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSettings {
    /// Scratch directory for slide images and audio.
    pub work_dir: PathBuf,
    /// Where finished videos are written.
    pub output_dir: PathBuf,
    /// Key prefix for uploaded videos.
    pub artifact_prefix: String,
    /// Voice and padding.
    pub narration: NarrationSettings,
    /// Final encode.
    pub mux: MuxOptions,
    /// Credential retry behaviour.
    pub rotation: RotationPolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("./tmp"),
            output_dir: PathBuf::from("./output"),
            artifact_prefix: "biblia/videos/prontos/".to_owned(),
            narration: NarrationSettings::default(),
            mux: MuxOptions::default(),
            rotation: RotationPolicy::default(),
        }
    }
}

/// Capabilities and data a [`Session`] is built from.
pub struct SessionParts {
    /// Loaded source text.
    pub source: Scripture,
    /// Durable progress.
    pub progress: ProgressStore,
    /// Destination of finished videos.
    pub artifacts: Arc<dyn BlobStore>,
    /// Speech synthesis.
    pub provider: Box<dyn SpeechProvider>,
    /// Narration credentials.
    pub credentials: CredentialSet,
    /// Audio/video tools.
    pub toolchain: Box<dyn MediaToolchain>,
    /// Slide drawing and text measurement.
    pub renderer: Box<dyn SlideRenderer>,
    /// Everything else.
    pub settings: SessionSettings,
}

/// What one successful chapter produced.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChapterReport {
    /// Book name.
    pub book_name: String,
    /// 1-based chapter number.
    pub chapter_number: usize,
    /// Number of slides.
    pub slides: usize,
    /// Local video file.
    pub video_path: PathBuf,
    /// Key the video was uploaded under.
    pub artifact_key: String,
    /// Video length in seconds.
    pub duration_seconds: f64,
    /// Credential the run ended on.
    pub credential_index: usize,
    /// Cursor saved after the chapter.
    pub next: ProgressState,
}

/// Result of [`Session::run_once`].
#[derive(Clone, Debug, PartialEq)]
pub enum RunOutcome {
    /// A chapter was produced, uploaded and committed.
    Completed(ChapterReport),
    /// The chapter had no verses; the cursor moved past it without producing a video.
    SkippedEmpty {
        /// Title of the skipped chapter.
        title: String,
        /// Cursor saved after it.
        next: ProgressState,
    },
    /// Every chapter is done. Nothing was changed.
    SourceExhausted,
}

/// Read-only view of where the pipeline stands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// Persisted cursor.
    pub state: ProgressState,
    /// Title of the next chapter, or `None` once the source is exhausted.
    pub next_chapter: Option<String>,
    /// Chapters already processed.
    pub completed: usize,
    /// Chapters in the source.
    pub total: usize,
    /// Number of discovered credentials.
    pub credentials: usize,
}

/// A configured pipeline: owns every capability handle, reads nothing from global state.
pub struct Session {
    source: Scripture,
    progress: ProgressStore,
    artifacts: Arc<dyn BlobStore>,
    provider: Box<dyn SpeechProvider>,
    credentials: CredentialSet,
    toolchain: Box<dyn MediaToolchain>,
    renderer: Box<dyn SlideRenderer>,
    settings: SessionSettings,
    clock: fn() -> DateTime<Utc>,
}

impl Session {
    /// Assemble a session.
    pub fn new(parts: SessionParts) -> VersecastResult<Self> {
        parts.settings.narration.validate()?;
        parts.settings.mux.validate()?;
        Ok(Self {
            source: parts.source,
            progress: parts.progress,
            artifacts: parts.artifacts,
            provider: parts.provider,
            credentials: parts.credentials,
            toolchain: parts.toolchain,
            renderer: parts.renderer,
            settings: parts.settings,
            clock: Utc::now,
        })
    }

    /// Replace the wall clock used for artifact names.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Source text.
    pub fn source(&self) -> &Scripture {
        &self.source
    }

    /// Progress store.
    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    /// Where the pipeline stands, without side effects.
    pub fn status(&self) -> StatusReport {
        status_report(&self.source, &self.progress, self.credentials.len())
    }

    /// Start the next run with the first credential again.
    pub fn reset_credentials(&self) -> VersecastResult<ProgressState> {
        let state = self.progress.record_credential_index(0)?;
        tracing::info!("credential index reset to 0");
        Ok(state)
    }

    /// Process exactly one chapter and commit it.
    ///
    /// The cursor only moves once the video is uploaded. Any earlier failure leaves it where it
    /// was; only credential rotations are persisted along the way.
    #[tracing::instrument(skip(self))]
    pub fn run_once(&mut self) -> VersecastResult<RunOutcome> {
        let state = self.progress.load();
        let tracker = ProgressTracker::new(&self.source);
        let unit = match tracker.next(&state) {
            Ok(u) => u,
            Err(e) if e.is_end_of_source() => {
                tracing::info!("source exhausted, nothing to do");
                return Ok(RunOutcome::SourceExhausted);
            }
            Err(e) => return Err(e),
        };
        tracing::info!(
            book = %unit.book_name,
            chapter = unit.chapter_number,
            verses = unit.verses.len(),
            "processing chapter"
        );

        if unit.verses.is_empty() {
            let next = tracker.advance(&unit, state.credential_index);
            self.commit(&next);
            tracing::warn!(chapter = %unit.title(), "chapter has no verses, skipped");
            return Ok(RunOutcome::SkippedEmpty {
                title: unit.title(),
                next,
            });
        }
        if self.credentials.is_empty() {
            return Err(VersecastError::validation(format!(
                "no narration credentials found (set {})",
                crate::speech::rotator::CREDENTIAL_ENV_PREFIX
            )));
        }

        prepare_work_dir(&self.settings.work_dir)?;
        let report = self.produce(&unit, state)?;

        let next = ProgressTracker::new(&self.source).advance(&unit, report.credential_index);
        self.commit(&next);

        if let Err(e) = clear_scratch(&self.settings.work_dir) {
            tracing::debug!(error = %e, "scratch files not removed");
        }
        tracing::info!(
            key = %report.artifact_key,
            next_book = next.book,
            next_chapter = next.chapter,
            "chapter committed"
        );
        Ok(RunOutcome::Completed(ChapterReport { next, ..report }))
    }

    // A cursor that cannot be written is logged; the chapter is then processed again next run.
    fn commit(&self, next: &ProgressState) {
        if let Err(e) = self.progress.save(next) {
            tracing::warn!(error = %e, "progress not persisted, chapter will be repeated");
        }
    }

    fn produce(
        &mut self,
        unit: &ChapterUnit,
        state: ProgressState,
    ) -> VersecastResult<ChapterReport> {
        let layout = self.renderer.layout();
        let slides = paginate(unit, &layout, &mut *self.renderer);
        tracing::info!(slides = slides.len(), "chapter paginated");

        let work_dir = self.settings.work_dir.as_path();
        let mut ledger = ProgressLedger::new(&self.progress, state);
        let mut rotator = CredentialRotator::new(
            &*self.provider,
            &self.credentials,
            &mut ledger,
            self.settings.rotation,
            state.credential_index,
        );
        let narrator =
            NarrationAssembler::new(&*self.toolchain, work_dir, &self.settings.narration);

        let mut artifacts = Vec::with_capacity(slides.len());
        for (i, slide) in slides.iter().enumerate() {
            let image_path = work_dir.join(format!("slide_{i}.png"));
            self.renderer.render(slide, &image_path)?;

            let audio = narrator.narrate(&mut rotator, &slide.narration_text(i), i)?;
            tracing::info!(
                slide = i + 1,
                of = slides.len(),
                seconds = audio.duration_seconds,
                "slide ready"
            );
            artifacts.push(SlideArtifact {
                image_path,
                audio_path: audio.path,
                duration_seconds: audio.duration_seconds,
            });
        }
        let credential_index = rotator.index();
        drop(rotator);

        let composer = VideoComposer::new(
            &*self.toolchain,
            work_dir,
            &self.settings.output_dir,
            &self.settings.mux,
        );
        let video = composer.compose(
            &unit.book_name,
            unit.chapter_number,
            &artifacts,
            (self.clock)(),
        )?;

        let artifact_key = format!("{}{}", self.settings.artifact_prefix, video.file_name);
        let bytes = std::fs::read(&video.path).map_err(|e| {
            VersecastError::media(format!("read video '{}': {e}", video.path.display()))
        })?;
        tracing::info!(key = %artifact_key, store = %self.artifacts.describe(), "uploading video");
        self.artifacts.put(&artifact_key, bytes, MP4_CONTENT_TYPE)?;

        Ok(ChapterReport {
            book_name: unit.book_name.clone(),
            chapter_number: unit.chapter_number,
            slides: slides.len(),
            video_path: video.path,
            artifact_key,
            duration_seconds: video.duration_seconds,
            credential_index,
            next: state,
        })
    }
}

/// Where the pipeline stands for `source` and the cursor in `progress`.
pub fn status_report(
    source: &Scripture,
    progress: &ProgressStore,
    credentials: usize,
) -> StatusReport {
    let state = progress.load();
    let tracker = ProgressTracker::new(source);
    let (completed, total) = tracker.position(&state);
    StatusReport {
        state,
        next_chapter: tracker.next(&state).ok().map(|u| u.title()),
        completed,
        total,
        credentials,
    }
}

/// Render the slides of the chapter `state` points at into `out_dir`, without narration.
pub fn render_chapter_slides(
    source: &Scripture,
    state: &ProgressState,
    renderer: &mut dyn SlideRenderer,
    out_dir: &Path,
) -> VersecastResult<Vec<PathBuf>> {
    let unit = ProgressTracker::new(source).next(state)?;
    let layout = renderer.layout();
    let slides = paginate(&unit, &layout, &mut *renderer);

    let mut paths = Vec::with_capacity(slides.len());
    for (i, slide) in slides.iter().enumerate() {
        let path = out_dir.join(format!("slide_{i}.png"));
        renderer.render(slide, &path)?;
        paths.push(path);
    }
    Ok(paths)
}

/// Files a run leaves in its work directory, as `(prefix, suffix)` pairs.
const SCRATCH_FILES: [(&str, &str); 9] = [
    ("slide_", ".png"),
    ("audio_", ".mp3"),
    ("raw_", ".mp3"),
    ("sil_ini_", ".mp3"),
    ("sil_fin_", ".mp3"),
    ("list_", ".txt"),
    ("final_audio", ".mp3"),
    ("final_audio_list", ".txt"),
    ("images", ".txt"),
];

fn is_scratch_file(name: &str) -> bool {
    SCRATCH_FILES
        .iter()
        .any(|(prefix, suffix)| name.starts_with(prefix) && name.ends_with(suffix))
}

fn prepare_work_dir(dir: &Path) -> VersecastResult<()> {
    std::fs::create_dir_all(dir).map_err(|e| {
        VersecastError::media(format!("create work dir '{}': {e}", dir.display()))
    })?;
    clear_scratch(dir)
}

/// Delete the scratch files of earlier runs from `dir`. Anything else in it is left alone.
fn clear_scratch(dir: &Path) -> VersecastResult<()> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| VersecastError::media(format!("read work dir '{}': {e}", dir.display())))?;
    for entry in entries {
        let entry = entry.map_err(|e| {
            VersecastError::media(format!("read work dir '{}': {e}", dir.display()))
        })?;
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        let name = entry.file_name();
        if !is_file || !name.to_str().is_some_and(is_scratch_file) {
            continue;
        }
        std::fs::remove_file(entry.path()).map_err(|e| {
            VersecastError::media(format!("remove '{}': {e}", entry.path().display()))
        })?;
    }
    Ok(())
}
