use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::foundation::core::{Canvas, Rgba8, SafeArea};
use crate::foundation::error::{VersecastError, VersecastResult};
use crate::media::ffmpeg::MuxOptions;
use crate::narration::assembler::NarrationSettings;
use crate::progress::store::DEFAULT_STATE_KEY;
use crate::render::slide::SlideStyle;
use crate::speech::provider::VoiceSettings;
use crate::speech::rotator::RotationPolicy;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "versecast.json";

/// Complete run configuration. Every field has a default, so `{}` is a valid file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VersecastConfig {
    /// Source text (JSON books).
    pub source: PathBuf,
    /// Local directories and files.
    pub paths: PathsConfig,
    /// Output canvas.
    pub canvas: Canvas,
    /// Safe margins; derived from the canvas when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safe_area: Option<SafeArea>,
    /// Text sizes and colours.
    pub text: TextConfig,
    /// Font files.
    pub fonts: FontsConfig,
    /// Voice and padding.
    pub narration: NarrationConfig,
    /// Final encode.
    pub video: VideoConfig,
    /// Progress and artifact storage.
    pub store: StoreConfig,
    /// Credential retry behaviour.
    pub rotation: RotationConfig,
    /// Outbound HTTP.
    pub http: HttpConfig,
}

/// Local filesystem layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Scratch directory, cleared at the start and end of each run.
    pub work_dir: PathBuf,
    /// Where finished videos are written.
    pub output_dir: PathBuf,
    /// Local progress cache.
    pub local_state: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("./tmp"),
            output_dir: PathBuf::from("./output"),
            local_state: PathBuf::from("./state.json"),
        }
    }
}

/// Typography.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextConfig {
    /// Body font size, px.
    pub font_size: f32,
    /// Body line height, px.
    pub line_height: f32,
    /// Title font size, px.
    pub title_font_size: f32,
    /// Gap below the title, px.
    pub title_spacing: f32,
    /// Background colour.
    pub background: Rgba8,
    /// Body colour.
    pub text_color: Rgba8,
    /// Title colour.
    pub title_color: Rgba8,
}

impl Default for TextConfig {
    fn default() -> Self {
        let s = SlideStyle::default();
        Self {
            font_size: s.font_size,
            line_height: s.line_height,
            title_font_size: s.title_font_size,
            title_spacing: s.title_spacing,
            background: s.background,
            text_color: s.text_color,
            title_color: s.title_color,
        }
    }
}

/// Font files for body and title text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontsConfig {
    /// Regular body face.
    pub body: PathBuf,
    /// Bold title face.
    pub title: PathBuf,
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            body: PathBuf::from("fonts/DejaVuSans.ttf"),
            title: PathBuf::from("fonts/DejaVuSans-Bold.ttf"),
        }
    }
}

/// Voice parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NarrationConfig {
    /// Provider voice id.
    pub voice_id: String,
    /// Provider model id.
    pub model_id: String,
    /// Provider output format.
    pub output_format: String,
    /// Leading silence, seconds.
    pub lead_silence: f64,
    /// Trailing silence, seconds.
    pub trail_silence: f64,
    /// Voice stability; sent only together with `similarity_boost`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stability: Option<f32>,
    /// Voice similarity boost.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_boost: Option<f32>,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        let n = NarrationSettings::default();
        Self {
            voice_id: n.voice_id,
            model_id: n.model_id,
            output_format: n.output_format,
            lead_silence: n.lead_silence,
            trail_silence: n.trail_silence,
            stability: None,
            similarity_boost: None,
        }
    }
}

/// Final encode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VideoConfig {
    /// Frames per second.
    pub fps: u32,
    /// Video encoder.
    pub video_codec: String,
    /// Pixel format.
    pub pixel_format: String,
    /// Audio encoder.
    pub audio_codec: String,
    /// Audio bitrate.
    pub audio_bitrate: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        let m = MuxOptions::default();
        Self {
            fps: m.fps,
            video_codec: m.video_codec,
            pixel_format: m.pixel_format,
            audio_codec: m.audio_codec,
            audio_bitrate: m.audio_bitrate,
        }
    }
}

/// Progress and artifact storage.
///
/// With `url` set, objects go to an HTTP store; else with `bucket` set, to S3; otherwise to `dir`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Base URL of an HTTP object store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// S3 bucket name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    /// S3 region; `AWS_REGION` or `us-east-1` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Directory used as the object store when neither URL nor bucket is set.
    pub dir: PathBuf,
    /// Key of the progress record.
    pub state_key: String,
    /// Key prefix of uploaded videos.
    pub artifact_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            bucket: None,
            region: None,
            dir: PathBuf::from("./store"),
            state_key: DEFAULT_STATE_KEY.to_owned(),
            artifact_prefix: "biblia/videos/prontos/".to_owned(),
        }
    }
}

/// Credential retry behaviour.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RotationConfig {
    /// Extra attempts on one credential after a transient failure.
    pub same_credential_retries: u32,
    /// Pause between those attempts, ms.
    pub retry_delay_ms: u64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        let p = RotationPolicy::default();
        Self {
            same_credential_retries: p.same_credential_retries,
            retry_delay_ms: u64::try_from(p.retry_delay.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Outbound HTTP.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    /// Per-request timeout, seconds.
    pub timeout_secs: u64,
    /// Speech API root.
    pub speech_base_url: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            speech_base_url: crate::speech::elevenlabs::DEFAULT_BASE_URL.to_owned(),
        }
    }
}

impl Default for VersecastConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("./nvi.json"),
            paths: PathsConfig::default(),
            canvas: Canvas::default(),
            safe_area: None,
            text: TextConfig::default(),
            fonts: FontsConfig::default(),
            narration: NarrationConfig::default(),
            video: VideoConfig::default(),
            store: StoreConfig::default(),
            rotation: RotationConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl VersecastConfig {
    /// Parse a JSON configuration string and validate it.
    pub fn from_json_str(raw: &str) -> VersecastResult<Self> {
        let cfg: Self = serde_json::from_str(raw)
            .map_err(|e| VersecastError::serde(format!("config parse: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read a configuration file.
    pub fn from_path(path: &Path) -> VersecastResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            VersecastError::validation(format!("read config '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    /// Read `path` if given, else `versecast.json` when present, else defaults.
    pub fn load(path: Option<&Path>) -> VersecastResult<Self> {
        match path {
            Some(p) => Self::from_path(p),
            None => {
                let p = Path::new(DEFAULT_CONFIG_FILE);
                if p.is_file() {
                    Self::from_path(p)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Check every section.
    pub fn validate(&self) -> VersecastResult<()> {
        self.slide_style().validate()?;
        self.narration_settings().validate()?;
        self.mux_options().validate()?;
        if self.store.state_key.trim().is_empty() {
            return Err(VersecastError::validation("store state_key must be non-empty"));
        }
        if self.store.bucket.as_deref().is_some_and(|b| b.trim().is_empty()) {
            return Err(VersecastError::validation("store bucket must be non-empty when set"));
        }
        if self.http.timeout_secs == 0 {
            return Err(VersecastError::validation("http timeout_secs must be > 0"));
        }
        if self.narration.stability.is_some() != self.narration.similarity_boost.is_some() {
            return Err(VersecastError::validation(
                "narration stability and similarity_boost must be set together",
            ));
        }
        Ok(())
    }

    /// Slide drawing parameters.
    pub fn slide_style(&self) -> SlideStyle {
        SlideStyle {
            canvas: self.canvas,
            safe: self
                .safe_area
                .unwrap_or_else(|| SafeArea::social(self.canvas)),
            font_size: self.text.font_size,
            line_height: self.text.line_height,
            title_font_size: self.text.title_font_size,
            title_spacing: self.text.title_spacing,
            background: self.text.background,
            text_color: self.text.text_color,
            title_color: self.text.title_color,
        }
    }

    /// Narration parameters.
    pub fn narration_settings(&self) -> NarrationSettings {
        let voice_settings = match (self.narration.stability, self.narration.similarity_boost) {
            (Some(stability), Some(similarity_boost)) => Some(VoiceSettings {
                stability,
                similarity_boost,
            }),
            _ => None,
        };
        NarrationSettings {
            voice_id: self.narration.voice_id.clone(),
            model_id: self.narration.model_id.clone(),
            output_format: self.narration.output_format.clone(),
            voice_settings,
            lead_silence: self.narration.lead_silence,
            trail_silence: self.narration.trail_silence,
        }
    }

    /// Encode settings.
    pub fn mux_options(&self) -> MuxOptions {
        MuxOptions {
            fps: self.video.fps,
            video_codec: self.video.video_codec.clone(),
            pixel_format: self.video.pixel_format.clone(),
            audio_codec: self.video.audio_codec.clone(),
            audio_bitrate: self.video.audio_bitrate.clone(),
        }
    }

    /// Credential retry policy.
    pub fn rotation_policy(&self) -> RotationPolicy {
        RotationPolicy {
            same_credential_retries: self.rotation.same_credential_retries,
            retry_delay: Duration::from_millis(self.rotation.retry_delay_ms),
        }
    }

    /// HTTP request timeout.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
