use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{VersecastError, VersecastResult};
use crate::speech::provider::{Quota, SpeechError, SpeechProvider, SpeechRequest, VoiceSettings};
use crate::speech::rotator::Credential;

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";

const API_KEY_HEADER: &str = "xi-api-key";

#[derive(Deserialize)]
struct SubscriptionInfo {
    character_limit: u64,
    character_count: u64,
}

#[derive(Serialize)]
struct TextToSpeechBody<'a> {
    text: &'a str,
    model_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice_settings: Option<VoiceSettings>,
}

/// ElevenLabs speech provider over the blocking HTTP client.
#[derive(Debug)]
pub struct ElevenLabsClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl ElevenLabsClient {
    /// Client for `base_url` with a per-request `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> VersecastResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VersecastError::provider(format!("build http client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    /// Client for the production API.
    pub fn with_timeout(timeout: Duration) -> VersecastResult<Self> {
        Self::new(DEFAULT_BASE_URL, timeout)
    }

    /// API root this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl SpeechProvider for ElevenLabsClient {
    #[tracing::instrument(skip_all, fields(credential = %credential.label()))]
    fn quota(&self, credential: &Credential) -> Result<Quota, SpeechError> {
        let url = format!("{}/v1/user/subscription", self.base_url);
        let resp = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, credential.secret())
            .send()
            .map_err(transport_error)?;

        let resp = check_status(resp)?;
        let info: SubscriptionInfo = resp
            .json()
            .map_err(|e| SpeechError::Transient(format!("decode subscription: {e}")))?;
        Ok(Quota {
            limit: info.character_limit,
            used: info.character_count,
        })
    }

    #[tracing::instrument(skip_all, fields(credential = %credential.label(), chars = request.text.chars().count()))]
    fn synthesize(
        &self,
        credential: &Credential,
        request: &SpeechRequest,
    ) -> Result<Vec<u8>, SpeechError> {
        let url = format!("{}/v1/text-to-speech/{}", self.base_url, request.voice_id);
        let body = TextToSpeechBody {
            text: &request.text,
            model_id: &request.model_id,
            voice_settings: request.voice_settings,
        };
        let resp = self
            .http
            .post(&url)
            .query(&[("output_format", request.output_format.as_str())])
            .header(API_KEY_HEADER, credential.secret())
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&body)
            .send()
            .map_err(transport_error)?;

        let resp = check_status(resp)?;
        let bytes = resp
            .bytes()
            .map_err(|e| SpeechError::Transient(format!("read audio body: {e}")))?;
        if bytes.is_empty() {
            return Err(SpeechError::Transient("empty audio body".to_owned()));
        }
        Ok(bytes.to_vec())
    }
}

fn transport_error(e: reqwest::Error) -> SpeechError {
    SpeechError::Transient(format!("request failed: {e}"))
}

fn check_status(
    resp: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, SpeechError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(classify(status.as_u16(), &body))
}

/// Map a failed response to a [`SpeechError`] class.
pub fn classify(status: u16, body: &str) -> SpeechError {
    let detail = format!("status {status}: {}", body.trim());
    if body.contains("quota_exceeded") {
        return SpeechError::Quota(detail);
    }
    match status {
        401 | 403 => SpeechError::Credential(detail),
        408 | 409 | 425 | 429 => SpeechError::Transient(detail),
        500..=599 => SpeechError::Transient(detail),
        _ => SpeechError::Rejected(detail),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/speech/elevenlabs.rs"]
mod tests;
