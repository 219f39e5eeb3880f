use std::time::Duration;

use crate::foundation::error::{VersecastError, VersecastResult};
use crate::speech::provider::{SpeechError, SpeechProvider, SpeechRequest};

/// Primary credential variable; numbered spares follow as `ELEVENLABS_API_KEY1`, `…2`, ….
pub const CREDENTIAL_ENV_PREFIX: &str = "ELEVENLABS_API_KEY";

/// One opaque provider credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    index: usize,
    secret: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("index", &self.index)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl Credential {
    /// Credential at position `index` of its set.
    pub fn new(index: usize, secret: impl Into<String>) -> Self {
        Self {
            index,
            secret: secret.into(),
        }
    }

    /// Position in the set.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Raw token, for request headers only.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Log-safe label, `#<index>`.
    pub fn label(&self) -> String {
        format!("#{}", self.index)
    }
}

/// Ordered credentials, discovered once at startup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CredentialSet {
    credentials: Vec<Credential>,
}

impl CredentialSet {
    /// Set from raw tokens in order; blank tokens are skipped.
    pub fn from_secrets<I, S>(secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let credentials = secrets
            .into_iter()
            .map(Into::into)
            .filter(|s: &String| !s.trim().is_empty())
            .enumerate()
            .map(|(i, s)| Credential::new(i, s))
            .collect();
        Self { credentials }
    }

    /// Discover credentials through `lookup`: `PREFIX`, then `PREFIX1`, `PREFIX2`, … up to the
    /// first missing number.
    pub fn from_lookup(prefix: &str, mut lookup: impl FnMut(&str) -> Option<String>) -> Self {
        let mut secrets = Vec::new();
        if let Some(s) = lookup(prefix) {
            secrets.push(s);
        }
        let mut n = 1usize;
        while let Some(s) = lookup(&format!("{prefix}{n}")) {
            secrets.push(s);
            n += 1;
        }
        Self::from_secrets(secrets)
    }

    /// Discover credentials from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(CREDENTIAL_ENV_PREFIX, |name| {
            std::env::var(name).ok().filter(|v| !v.is_empty())
        })
    }

    /// Number of credentials.
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// `true` when no credential was found.
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Credential at `index`.
    pub fn get(&self, index: usize) -> Option<&Credential> {
        self.credentials.get(index)
    }
}

/// Where a rotation writes the new credential index.
pub trait CredentialIndexSink {
    /// Durably record `index` as the credential to start with.
    fn persist_index(&mut self, index: usize) -> VersecastResult<()>;
}

impl<F> CredentialIndexSink for F
where
    F: FnMut(usize) -> VersecastResult<()>,
{
    fn persist_index(&mut self, index: usize) -> VersecastResult<()> {
        self(index)
    }
}

/// Retry limits for one credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Extra attempts on the same credential after a transient failure.
    pub same_credential_retries: u32,
    /// Pause before each of those attempts.
    pub retry_delay: Duration,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            same_credential_retries: 2,
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// Walks a [`CredentialSet`] forward as credentials run dry.
///
/// The index only ever moves forward, so every call terminates after at most `len` rotations.
/// Each rotation is offered to the sink before the next credential is used; a sink failure is
/// logged and does not stop narration.
pub struct CredentialRotator<'r> {
    provider: &'r dyn SpeechProvider,
    credentials: &'r CredentialSet,
    sink: &'r mut dyn CredentialIndexSink,
    policy: RotationPolicy,
    index: usize,
}

impl<'r> CredentialRotator<'r> {
    /// Start at `start_index`.
    pub fn new(
        provider: &'r dyn SpeechProvider,
        credentials: &'r CredentialSet,
        sink: &'r mut dyn CredentialIndexSink,
        policy: RotationPolicy,
        start_index: usize,
    ) -> Self {
        if let Some(c) = credentials.get(start_index) {
            tracing::info!(credential = %c.label(), "using credential");
        }
        Self {
            provider,
            credentials,
            sink,
            policy,
            index: start_index,
        }
    }

    /// Index of the active credential (may equal the set length once exhausted).
    pub fn index(&self) -> usize {
        self.index
    }

    fn current(&self) -> VersecastResult<&'r Credential> {
        self.credentials
            .get(self.index)
            .ok_or(VersecastError::CredentialsExhausted {
                tried: self.credentials.len(),
            })
    }

    fn rotate(&mut self, reason: &str) -> VersecastResult<()> {
        let next = self.index + 1;
        self.index = next;
        if next >= self.credentials.len() {
            tracing::error!(reason, "all credentials exhausted");
            return Err(VersecastError::CredentialsExhausted {
                tried: self.credentials.len(),
            });
        }
        tracing::warn!(credential = %format!("#{next}"), reason, "rotating to spare credential");
        // Narration carries on with the new credential even if the index could not be recorded.
        if let Err(e) = self.sink.persist_index(next) {
            tracing::warn!(credential = %format!("#{next}"), error = %e, "credential index not persisted");
        }
        Ok(())
    }

    /// Move to the first credential, starting at the active one, whose remaining quota covers
    /// `chars` characters. A failing quota query counts as exhausted.
    #[tracing::instrument(skip(self))]
    pub fn ensure_quota(&mut self, chars: usize) -> VersecastResult<&'r Credential> {
        loop {
            let credential = self.current()?;
            match self.provider.quota(credential) {
                Ok(q) if q.covers(chars) => return Ok(credential),
                Ok(q) => {
                    tracing::warn!(
                        credential = %credential.label(),
                        remaining = q.remaining(),
                        "insufficient quota"
                    );
                    self.rotate("insufficient quota")?;
                }
                Err(e) => {
                    tracing::warn!(credential = %credential.label(), error = %e, "quota check failed");
                    self.rotate("quota check failed")?;
                }
            }
        }
    }

    /// Synthesize `request`, rotating on quota and credential failures.
    ///
    /// Transient failures are retried on the same credential up to
    /// [`RotationPolicy::same_credential_retries`] times before rotating. A rejected request fails
    /// at once with [`VersecastError::Provider`] and leaves the index where it is.
    pub fn synthesize(&mut self, request: &SpeechRequest) -> VersecastResult<Vec<u8>> {
        let chars = request.text.chars().count();
        loop {
            let credential = self.ensure_quota(chars)?;
            let mut retries = 0u32;
            loop {
                match self.provider.synthesize(credential, request) {
                    Ok(audio) => return Ok(audio),
                    Err(e) if e.rotates_credential() => {
                        tracing::warn!(credential = %credential.label(), error = %e, "credential unusable");
                        self.rotate("credential unusable")?;
                        break;
                    }
                    Err(SpeechError::Rejected(msg)) => {
                        return Err(VersecastError::provider(msg));
                    }
                    Err(SpeechError::Transient(msg))
                        if retries < self.policy.same_credential_retries =>
                    {
                        retries += 1;
                        tracing::warn!(
                            credential = %credential.label(),
                            attempt = retries,
                            error = %msg,
                            "transient synthesis failure, retrying"
                        );
                        if !self.policy.retry_delay.is_zero() {
                            std::thread::sleep(self.policy.retry_delay);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(credential = %credential.label(), error = %e, "retries used up");
                        self.rotate("transient failures")?;
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/speech/rotator.rs"]
mod tests;
