//! Speech synthesis: the provider capability, the ElevenLabs client and credential rotation.

/// ElevenLabs HTTP client.
pub mod elevenlabs;
/// Provider capability and error classes.
pub mod provider;
/// Credential discovery and rotation.
pub mod rotator;
