use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::foundation::error::{VersecastError, VersecastResult};
use crate::media::ffmpeg::{ImageSpan, MediaToolchain, MuxOptions};
use crate::narration::assembler::SlideArtifact;

/// `<book>_<chapter>_<unix-millis>.mp4`, with whitespace runs collapsed to `_` and characters
/// that are unsafe in file names or object keys replaced.
pub fn output_file_name(book: &str, chapter_number: usize, at: DateTime<Utc>) -> String {
    let mut safe = String::with_capacity(book.len());
    let mut in_space = false;
    for ch in book.trim().chars() {
        if ch.is_whitespace() {
            if !in_space {
                safe.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\'' => safe.push('-'),
            c if c.is_control() => {}
            c => safe.push(c),
        }
    }
    if safe.is_empty() {
        safe.push_str("chapter");
    }
    format!("{safe}_{chapter_number}_{}.mp4", at.timestamp_millis())
}

/// A finished chapter video on local disk.
#[derive(Clone, Debug, PartialEq)]
pub struct ComposedVideo {
    /// Local file.
    pub path: PathBuf,
    /// File name, also used as the artifact key suffix.
    pub file_name: String,
    /// Sum of the slide durations.
    pub duration_seconds: f64,
}

/// Joins per-slide images and narration into one video.
pub struct VideoComposer<'a> {
    toolchain: &'a dyn MediaToolchain,
    work_dir: &'a Path,
    output_dir: &'a Path,
    opts: &'a MuxOptions,
}

impl<'a> VideoComposer<'a> {
    /// Scratch files go to `work_dir`, the video to `output_dir`.
    pub fn new(
        toolchain: &'a dyn MediaToolchain,
        work_dir: &'a Path,
        output_dir: &'a Path,
        opts: &'a MuxOptions,
    ) -> Self {
        Self {
            toolchain,
            work_dir,
            output_dir,
            opts,
        }
    }

    /// Show each slide image for its narration's duration over the concatenated narration.
    #[tracing::instrument(skip(self, slides), fields(slides = slides.len()))]
    pub fn compose(
        &self,
        book: &str,
        chapter_number: usize,
        slides: &[SlideArtifact],
        at: DateTime<Utc>,
    ) -> VersecastResult<ComposedVideo> {
        if slides.is_empty() {
            return Err(VersecastError::validation("no slides to compose"));
        }
        for (i, s) in slides.iter().enumerate() {
            if !s.duration_seconds.is_finite() || s.duration_seconds <= 0.0 {
                return Err(VersecastError::validation(format!(
                    "slide {i} has invalid duration {}",
                    s.duration_seconds
                )));
            }
        }

        let audio_parts = slides
            .iter()
            .map(|s| s.audio_path.clone())
            .collect::<Vec<_>>();
        let final_audio = self.work_dir.join("final_audio.mp3");
        self.toolchain.concat_audio(
            &audio_parts,
            &self.work_dir.join("final_audio_list.txt"),
            &final_audio,
        )?;

        let timeline = slides
            .iter()
            .map(|s| ImageSpan {
                path: s.image_path.clone(),
                seconds: s.duration_seconds,
            })
            .collect::<Vec<_>>();

        let file_name = output_file_name(book, chapter_number, at);
        let path = self.output_dir.join(&file_name);
        self.toolchain.mux(
            &timeline,
            &final_audio,
            &self.work_dir.join("images.txt"),
            &path,
            self.opts,
        )?;

        let duration_seconds = slides.iter().map(|s| s.duration_seconds).sum();
        tracing::info!(file = %path.display(), duration_seconds, "video composed");
        Ok(ComposedVideo {
            path,
            file_name,
            duration_seconds,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/compose.rs"]
mod tests;
