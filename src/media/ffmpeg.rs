use std::{
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
};

use crate::foundation::error::{VersecastError, VersecastResult};

/// One still image and how long it stays on screen.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageSpan {
    /// Image file.
    pub path: PathBuf,
    /// Display time in seconds.
    pub seconds: f64,
}

/// Final encode settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MuxOptions {
    /// Output frame rate.
    pub fps: u32,
    /// Video encoder.
    pub video_codec: String,
    /// Output pixel format.
    pub pixel_format: String,
    /// Audio encoder.
    pub audio_codec: String,
    /// Audio bitrate, ffmpeg syntax (`192k`).
    pub audio_bitrate: String,
}

impl Default for MuxOptions {
    fn default() -> Self {
        Self {
            fps: 30,
            video_codec: "libx264".to_owned(),
            pixel_format: "yuv420p".to_owned(),
            audio_codec: "aac".to_owned(),
            audio_bitrate: "192k".to_owned(),
        }
    }
}

impl MuxOptions {
    /// Reject settings ffmpeg would fail on late.
    pub fn validate(&self) -> VersecastResult<()> {
        if self.fps == 0 {
            return Err(VersecastError::validation("mux fps must be non-zero"));
        }
        for (name, v) in [
            ("video_codec", &self.video_codec),
            ("pixel_format", &self.pixel_format),
            ("audio_codec", &self.audio_codec),
            ("audio_bitrate", &self.audio_bitrate),
        ] {
            if v.trim().is_empty() {
                return Err(VersecastError::validation(format!(
                    "mux {name} must be non-empty"
                )));
            }
        }
        Ok(())
    }
}

/// Media toolchain capability: silence, lossless concat, probing, final mux.
pub trait MediaToolchain {
    /// Write `seconds` of silent stereo audio to `out`.
    fn silence(&self, seconds: f64, out: &Path) -> VersecastResult<()>;

    /// Concatenate `parts` in order into `out` without re-encoding, using `list_path` as the
    /// demuxer list file.
    fn concat_audio(&self, parts: &[PathBuf], list_path: &Path, out: &Path)
    -> VersecastResult<()>;

    /// Duration of a media file in seconds.
    fn probe_duration(&self, path: &Path) -> VersecastResult<f64>;

    /// Encode `timeline` over `audio` into `out`, ending with the shorter of the two.
    fn mux(
        &self,
        timeline: &[ImageSpan],
        audio: &Path,
        list_path: &Path,
        out: &Path,
        opts: &MuxOptions,
    ) -> VersecastResult<()>;
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> VersecastResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Quote a path for the concat demuxer: single quotes, embedded quotes as `'\''`.
pub fn quote_concat_path(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', r"'\''"))
}

/// Concat demuxer list playing `parts` back to back.
pub fn concat_list(parts: &[PathBuf]) -> String {
    parts
        .iter()
        .map(|p| format!("file {}", quote_concat_path(p)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Concat demuxer list showing each image for its duration.
///
/// The demuxer ignores the duration of the final entry, so the last image is listed once more.
pub fn image_timeline_list(timeline: &[ImageSpan]) -> String {
    let mut out = String::new();
    for span in timeline {
        out.push_str(&format!(
            "file {}\nduration {}\n",
            quote_concat_path(&span.path),
            span.seconds
        ));
    }
    if let Some(last) = timeline.last() {
        out.push_str(&format!("file {}\n", quote_concat_path(&last.path)));
    }
    out
}

/// Parse ffprobe's bare `format=duration` output.
pub fn parse_duration(stdout: &str) -> VersecastResult<f64> {
    let s = stdout.trim();
    let secs: f64 = s
        .parse()
        .map_err(|_| VersecastError::media(format!("unparseable duration {s:?}")))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(VersecastError::media(format!("invalid duration {secs}")));
    }
    Ok(secs)
}

/// [`MediaToolchain`] backed by the system `ffmpeg`/`ffprobe` binaries.
#[derive(Clone, Debug)]
pub struct FfmpegToolchain {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    sample_rate: u32,
}

impl Default for FfmpegToolchain {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl FfmpegToolchain {
    /// Use the given binaries.
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            sample_rate: 44_100,
        }
    }

    /// Fail early when ffmpeg cannot be started.
    pub fn check_available(&self) -> VersecastResult<()> {
        let ok = Command::new(&self.ffmpeg)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false);
        if !ok {
            return Err(VersecastError::media(format!(
                "'{}' was not found or does not run",
                self.ffmpeg.display()
            )));
        }
        Ok(())
    }

    fn ffmpeg(&self) -> Command {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .args(["-y", "-loglevel", "error"]);
        cmd
    }
}

fn run(mut cmd: Command, what: &str) -> VersecastResult<Output> {
    tracing::debug!(command = ?cmd, "running {what}");
    let out = cmd
        .output()
        .map_err(|e| VersecastError::media(format!("failed to spawn {what}: {e}")))?;
    if !out.status.success() {
        return Err(VersecastError::media(format!(
            "{what} exited with status {}: {}",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    Ok(out)
}

fn absolute(path: &Path) -> VersecastResult<PathBuf> {
    std::path::absolute(path).map_err(|e| {
        VersecastError::media(format!("cannot resolve path '{}': {e}", path.display()))
    })
}

fn write_list(list_path: &Path, contents: &str) -> VersecastResult<()> {
    ensure_parent_dir(list_path)?;
    std::fs::write(list_path, contents).map_err(|e| {
        VersecastError::media(format!("write list '{}': {e}", list_path.display()))
    })
}

impl MediaToolchain for FfmpegToolchain {
    fn silence(&self, seconds: f64, out: &Path) -> VersecastResult<()> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(VersecastError::validation(
                "silence duration must be finite and > 0",
            ));
        }
        ensure_parent_dir(out)?;
        let mut cmd = self.ffmpeg();
        cmd.args([
            "-f",
            "lavfi",
            "-i",
            &format!("anullsrc=r={}:cl=stereo", self.sample_rate),
            "-t",
            &seconds.to_string(),
            "-q:a",
            "9",
        ])
        .arg(out);
        run(cmd, "ffmpeg silence").map(|_| ())
    }

    fn concat_audio(
        &self,
        parts: &[PathBuf],
        list_path: &Path,
        out: &Path,
    ) -> VersecastResult<()> {
        if parts.is_empty() {
            return Err(VersecastError::validation("nothing to concatenate"));
        }
        let parts = parts
            .iter()
            .map(|p| absolute(p))
            .collect::<VersecastResult<Vec<_>>>()?;
        write_list(list_path, &concat_list(&parts))?;
        ensure_parent_dir(out)?;

        let mut cmd = self.ffmpeg();
        cmd.args(["-f", "concat", "-safe", "0", "-i"])
            .arg(list_path)
            .args(["-c", "copy"])
            .arg(out);
        run(cmd, "ffmpeg concat").map(|_| ())
    }

    fn probe_duration(&self, path: &Path) -> VersecastResult<f64> {
        let mut cmd = Command::new(&self.ffprobe);
        cmd.stdin(Stdio::null())
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path);
        let out = run(cmd, "ffprobe")?;
        parse_duration(&String::from_utf8_lossy(&out.stdout))
    }

    #[tracing::instrument(skip(self, timeline, opts), fields(images = timeline.len()))]
    fn mux(
        &self,
        timeline: &[ImageSpan],
        audio: &Path,
        list_path: &Path,
        out: &Path,
        opts: &MuxOptions,
    ) -> VersecastResult<()> {
        opts.validate()?;
        if timeline.is_empty() {
            return Err(VersecastError::validation("video needs at least one image"));
        }
        let timeline = timeline
            .iter()
            .map(|s| {
                Ok(ImageSpan {
                    path: absolute(&s.path)?,
                    seconds: s.seconds,
                })
            })
            .collect::<VersecastResult<Vec<_>>>()?;
        write_list(list_path, &image_timeline_list(&timeline))?;
        ensure_parent_dir(out)?;

        let mut cmd = self.ffmpeg();
        cmd.args(["-f", "concat", "-safe", "0", "-i"])
            .arg(list_path)
            .arg("-i")
            .arg(audio)
            .args([
                "-c:v",
                &opts.video_codec,
                "-pix_fmt",
                &opts.pixel_format,
                "-r",
                &opts.fps.to_string(),
                "-c:a",
                &opts.audio_codec,
                "-b:a",
                &opts.audio_bitrate,
                "-shortest",
                "-movflags",
                "+faststart",
            ])
            .arg(out);
        run(cmd, "ffmpeg mux").map(|_| ())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/ffmpeg.rs"]
mod tests;
