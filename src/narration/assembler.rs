use std::path::{Path, PathBuf};

use crate::foundation::error::{VersecastError, VersecastResult};
use crate::media::ffmpeg::MediaToolchain;
use crate::speech::provider::{SpeechRequest, VoiceSettings};
use crate::speech::rotator::CredentialRotator;

/// Voice and padding parameters for slide narration.
#[derive(Clone, Debug, PartialEq)]
pub struct NarrationSettings {
    /// Provider voice id.
    pub voice_id: String,
    /// Provider model id.
    pub model_id: String,
    /// Provider output format.
    pub output_format: String,
    /// Optional voice tuning.
    pub voice_settings: Option<VoiceSettings>,
    /// Silence before the narration, in seconds.
    pub lead_silence: f64,
    /// Silence after the narration, in seconds.
    pub trail_silence: f64,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            voice_id: "CwhRBWXzGAHq8TQ4Fs17".to_owned(),
            model_id: "eleven_multilingual_v2".to_owned(),
            output_format: "mp3_44100_128".to_owned(),
            voice_settings: None,
            lead_silence: 0.5,
            trail_silence: 1.0,
        }
    }
}

impl NarrationSettings {
    /// Reject empty ids and negative padding.
    pub fn validate(&self) -> VersecastResult<()> {
        for (name, v) in [
            ("voice_id", &self.voice_id),
            ("model_id", &self.model_id),
            ("output_format", &self.output_format),
        ] {
            if v.trim().is_empty() {
                return Err(VersecastError::validation(format!(
                    "narration {name} must be non-empty"
                )));
            }
        }
        for (name, v) in [
            ("lead_silence", self.lead_silence),
            ("trail_silence", self.trail_silence),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(VersecastError::validation(format!(
                    "narration {name} must be finite and >= 0"
                )));
            }
        }
        Ok(())
    }

    /// Synthesis request for `text` with these voice parameters.
    pub fn request(&self, text: &str) -> SpeechRequest {
        SpeechRequest {
            text: text.to_owned(),
            voice_id: self.voice_id.clone(),
            model_id: self.model_id.clone(),
            output_format: self.output_format.clone(),
            voice_settings: self.voice_settings,
        }
    }
}

/// A padded narration file and its probed length.
#[derive(Clone, Debug, PartialEq)]
pub struct NarratedAudio {
    /// Padded audio file.
    pub path: PathBuf,
    /// Exact duration in seconds.
    pub duration_seconds: f64,
}

/// Everything the composer needs for one slide.
#[derive(Clone, Debug, PartialEq)]
pub struct SlideArtifact {
    /// Rendered slide image.
    pub image_path: PathBuf,
    /// Padded narration.
    pub audio_path: PathBuf,
    /// Time the slide stays on screen.
    pub duration_seconds: f64,
}

/// Files removed when dropped, whether or not the step that made them succeeded.
struct Scratch(Vec<PathBuf>);

impl Scratch {
    fn track(&mut self, path: PathBuf) -> PathBuf {
        self.0.push(path.clone());
        path
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        for p in &self.0 {
            if let Err(e) = std::fs::remove_file(p)
                && e.kind() != std::io::ErrorKind::NotFound
            {
                tracing::debug!(path = %p.display(), error = %e, "scratch file not removed");
            }
        }
    }
}

/// Turns slide text into padded, timed narration files inside a work directory.
pub struct NarrationAssembler<'a> {
    toolchain: &'a dyn MediaToolchain,
    work_dir: &'a Path,
    settings: &'a NarrationSettings,
}

impl<'a> NarrationAssembler<'a> {
    /// Write into `work_dir` using `toolchain`.
    pub fn new(
        toolchain: &'a dyn MediaToolchain,
        work_dir: &'a Path,
        settings: &'a NarrationSettings,
    ) -> Self {
        Self {
            toolchain,
            work_dir,
            settings,
        }
    }

    /// Synthesize `text`, pad it with silence, and measure it.
    ///
    /// Produces `audio_<index>.mp3` in the work directory; the raw narration, silence clips and
    /// concat list are removed before returning.
    #[tracing::instrument(skip(self, rotator, text), fields(chars = text.chars().count()))]
    pub fn narrate(
        &self,
        rotator: &mut CredentialRotator<'_>,
        text: &str,
        index: usize,
    ) -> VersecastResult<NarratedAudio> {
        if text.trim().is_empty() {
            return Err(VersecastError::validation(format!(
                "slide {index} has no text to narrate"
            )));
        }

        let mut scratch = Scratch(Vec::new());
        let audio = rotator.synthesize(&self.settings.request(text))?;

        let raw = scratch.track(self.work_dir.join(format!("raw_{index}.mp3")));
        crate::media::ffmpeg::ensure_parent_dir(&raw)?;
        std::fs::write(&raw, audio)
            .map_err(|e| VersecastError::media(format!("write '{}': {e}", raw.display())))?;

        let mut parts = Vec::with_capacity(3);
        if self.settings.lead_silence > 0.0 {
            let lead = scratch.track(self.work_dir.join(format!("sil_ini_{index}.mp3")));
            self.toolchain.silence(self.settings.lead_silence, &lead)?;
            parts.push(lead);
        }
        parts.push(raw);
        if self.settings.trail_silence > 0.0 {
            let trail = scratch.track(self.work_dir.join(format!("sil_fin_{index}.mp3")));
            self.toolchain.silence(self.settings.trail_silence, &trail)?;
            parts.push(trail);
        }

        let list = scratch.track(self.work_dir.join(format!("list_{index}.txt")));
        let out = self.work_dir.join(format!("audio_{index}.mp3"));
        self.toolchain.concat_audio(&parts, &list, &out)?;

        let duration_seconds = self.toolchain.probe_duration(&out)?;
        if duration_seconds <= 0.0 {
            return Err(VersecastError::media(format!(
                "narration '{}' has no duration",
                out.display()
            )));
        }
        tracing::debug!(duration_seconds, "narration ready");
        Ok(NarratedAudio {
            path: out,
            duration_seconds,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/narration/assembler.rs"]
mod tests;
