/// Convenience result type used across versecast.
pub type VersecastResult<T> = Result<T, VersecastError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum VersecastError {
    /// The source text could not be read or parsed.
    #[error("source load error: {0}")]
    SourceLoad(String),

    /// Every chapter of the source has been processed.
    #[error("end of source: every chapter has been processed")]
    EndOfSource,

    /// The speech provider failed for a reason other than quota.
    #[error("provider error: {0}")]
    Provider(String),

    /// Every configured credential has been tried and none can serve the request.
    #[error("credentials exhausted: tried {tried} credential(s)")]
    CredentialsExhausted {
        /// Number of credentials in the set.
        tried: usize,
    },

    /// Neither the remote nor the local copy of the progress state could be written.
    #[error("progress persist error: {0}")]
    StorePersist(String),

    /// A blob store read or write failed.
    #[error("store error: {0}")]
    Store(String),

    /// Invalid user-provided configuration or data.
    #[error("validation error: {0}")]
    Validation(String),

    /// The media toolchain (ffmpeg/ffprobe) or rasterizer failed.
    #[error("media error: {0}")]
    Media(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VersecastError {
    /// Build a [`VersecastError::SourceLoad`] value.
    pub fn source_load(msg: impl Into<String>) -> Self {
        Self::SourceLoad(msg.into())
    }

    /// Build a [`VersecastError::Provider`] value.
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Build a [`VersecastError::StorePersist`] value.
    pub fn store_persist(msg: impl Into<String>) -> Self {
        Self::StorePersist(msg.into())
    }

    /// Build a [`VersecastError::Store`] value.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Build a [`VersecastError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`VersecastError::Media`] value.
    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    /// Build a [`VersecastError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` for the clean terminal condition: nothing is left to process.
    pub fn is_end_of_source(&self) -> bool {
        matches!(self, Self::EndOfSource)
    }

    /// `true` when a run hitting this error must stop without advancing progress.
    ///
    /// Provider errors are recoverable inside the credential rotator and only surface here if a
    /// caller bypasses it. A progress record that could not be written degrades the run but does
    /// not stop it.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::EndOfSource | Self::Provider(_) | Self::StorePersist(_)
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
