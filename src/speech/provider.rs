use serde::Serialize;

use crate::speech::rotator::Credential;

/// Remaining-character budget of one credential.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Quota {
    /// Characters allowed in the current period.
    pub limit: u64,
    /// Characters already used in the current period.
    pub used: u64,
}

impl Quota {
    /// `limit - used`, saturating at zero.
    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.used)
    }

    /// `true` when `chars` more characters fit in the budget.
    pub fn covers(&self, chars: usize) -> bool {
        u64::try_from(chars).map_or(false, |c| self.remaining() >= c)
    }
}

/// Voice tuning forwarded to the provider.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct VoiceSettings {
    /// Lower is more expressive, higher is more monotone.
    pub stability: f32,
    /// How closely to track the reference voice.
    pub similarity_boost: f32,
}

/// One synthesis request.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeechRequest {
    /// Text to speak.
    pub text: String,
    /// Provider voice id.
    pub voice_id: String,
    /// Provider model id.
    pub model_id: String,
    /// Provider output format (e.g. `mp3_44100_128`).
    pub output_format: String,
    /// Optional voice tuning; provider defaults apply when absent.
    pub voice_settings: Option<VoiceSettings>,
}

/// Failure classes of a speech provider call.
///
/// The class decides what the credential rotator does next.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SpeechError {
    /// The credential's quota is used up.
    #[error("quota exhausted: {0}")]
    Quota(String),

    /// The credential was refused (unknown, revoked, or not allowed to use the endpoint).
    #[error("credential refused: {0}")]
    Credential(String),

    /// A failure that may succeed if the same request is sent again.
    #[error("transient failure: {0}")]
    Transient(String),

    /// A request the provider will never accept, whatever credential sends it.
    #[error("request rejected: {0}")]
    Rejected(String),
}

impl SpeechError {
    /// `true` when the next credential should be tried straight away.
    pub fn rotates_credential(&self) -> bool {
        matches!(self, Self::Quota(_) | Self::Credential(_))
    }
}

/// Speech synthesis capability.
pub trait SpeechProvider {
    /// Current quota of `credential`.
    fn quota(&self, credential: &Credential) -> Result<Quota, SpeechError>;

    /// Synthesize `request` with `credential`, returning encoded audio bytes.
    fn synthesize(
        &self,
        credential: &Credential,
        request: &SpeechRequest,
    ) -> Result<Vec<u8>, SpeechError>;
}

impl<T: SpeechProvider + ?Sized> SpeechProvider for &T {
    fn quota(&self, credential: &Credential) -> Result<Quota, SpeechError> {
        (**self).quota(credential)
    }

    fn synthesize(
        &self,
        credential: &Credential,
        request: &SpeechRequest,
    ) -> Result<Vec<u8>, SpeechError> {
        (**self).synthesize(credential, request)
    }
}

impl<T: SpeechProvider + ?Sized> SpeechProvider for Box<T> {
    fn quota(&self, credential: &Credential) -> Result<Quota, SpeechError> {
        (**self).quota(credential)
    }

    fn synthesize(
        &self,
        credential: &Credential,
        request: &SpeechRequest,
    ) -> Result<Vec<u8>, SpeechError> {
        (**self).synthesize(credential, request)
    }
}
