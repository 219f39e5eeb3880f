use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use super::*;
use crate::speech::provider::Quota;

#[derive(Default)]
struct FakeProvider {
    remaining: HashMap<String, u64>,
    quota_down: Vec<String>,
    synth: RefCell<HashMap<String, VecDeque<Result<Vec<u8>, SpeechError>>>>,
    calls: RefCell<Vec<String>>,
}

impl FakeProvider {
    fn with_remaining(pairs: &[(&str, u64)]) -> Self {
        Self {
            remaining: pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            ..Self::default()
        }
    }

    fn script(&self, secret: &str, results: Vec<Result<Vec<u8>, SpeechError>>) {
        self.synth
            .borrow_mut()
            .insert(secret.to_string(), results.into());
    }
}

impl SpeechProvider for FakeProvider {
    fn quota(&self, credential: &Credential) -> Result<Quota, SpeechError> {
        if self.quota_down.iter().any(|s| s == credential.secret()) {
            return Err(SpeechError::Transient("timeout".into()));
        }
        let remaining = self.remaining.get(credential.secret()).copied().unwrap_or(0);
        Ok(Quota {
            limit: 10_000,
            used: 10_000 - remaining,
        })
    }

    fn synthesize(
        &self,
        credential: &Credential,
        _request: &SpeechRequest,
    ) -> Result<Vec<u8>, SpeechError> {
        self.calls.borrow_mut().push(credential.secret().to_string());
        self.synth
            .borrow_mut()
            .get_mut(credential.secret())
            .and_then(|q| q.pop_front())
            .unwrap_or_else(|| Ok(credential.secret().as_bytes().to_vec()))
    }
}

fn request(text: &str) -> SpeechRequest {
    SpeechRequest {
        text: text.to_string(),
        voice_id: "voice".into(),
        model_id: "model".into(),
        output_format: "mp3_44100_128".into(),
        voice_settings: None,
    }
}

fn no_delay(retries: u32) -> RotationPolicy {
    RotationPolicy {
        same_credential_retries: retries,
        retry_delay: Duration::ZERO,
    }
}

#[test]
fn discovery_stops_at_first_gap() {
    let vars: HashMap<&str, &str> = [
        ("ELEVENLABS_API_KEY", "k0"),
        ("ELEVENLABS_API_KEY1", "k1"),
        ("ELEVENLABS_API_KEY2", "k2"),
        ("ELEVENLABS_API_KEY4", "k4"),
    ]
    .into_iter()
    .collect();
    let set = CredentialSet::from_lookup(CREDENTIAL_ENV_PREFIX, |n| {
        vars.get(n).map(|v| v.to_string())
    });
    assert_eq!(set.len(), 3);
    assert_eq!(set.get(2).unwrap().secret(), "k2");
    assert_eq!(set.get(2).unwrap().index(), 2);
}

#[test]
fn discovery_uses_numbered_keys_without_primary() {
    let set = CredentialSet::from_lookup("K", |n| (n == "K1").then(|| "one".to_string()));
    assert_eq!(set.len(), 1);
    assert_eq!(set.get(0).unwrap().secret(), "one");
}

#[test]
fn debug_never_prints_secret() {
    let set = CredentialSet::from_secrets(["super-secret"]);
    let dbg = format!("{set:?}");
    assert!(!dbg.contains("super-secret"));
    assert!(dbg.contains("redacted"));
}

#[test]
fn exhausted_credentials_rotate_to_first_with_quota() {
    let provider = FakeProvider::with_remaining(&[("a", 0), ("b", 3), ("c", 500)]);
    let set = CredentialSet::from_secrets(["a", "b", "c"]);
    let mut persisted = Vec::new();
    let mut sink = |i: usize| -> VersecastResult<()> {
        persisted.push(i);
        Ok(())
    };

    let mut rotator = CredentialRotator::new(&provider, &set, &mut sink, no_delay(0), 0);
    let audio = rotator.synthesize(&request("hello")).unwrap();
    assert_eq!(audio, b"c");
    assert_eq!(rotator.index(), 2);
    drop(rotator);
    assert_eq!(persisted, vec![1, 2]);
}

#[test]
fn all_exhausted_fails_without_looping() {
    let provider = FakeProvider::with_remaining(&[("a", 0), ("b", 0)]);
    let set = CredentialSet::from_secrets(["a", "b"]);
    let mut persisted = Vec::new();
    let mut sink = |i: usize| -> VersecastResult<()> {
        persisted.push(i);
        Ok(())
    };

    let mut rotator = CredentialRotator::new(&provider, &set, &mut sink, no_delay(0), 0);
    let err = rotator.synthesize(&request("hello")).unwrap_err();
    assert!(matches!(err, VersecastError::CredentialsExhausted { tried: 2 }));
    assert!(provider.calls.borrow().is_empty());
    drop(rotator);
    assert_eq!(persisted, vec![1]);
}

#[test]
fn failing_quota_check_counts_as_exhausted() {
    let mut provider = FakeProvider::with_remaining(&[("a", 900), ("b", 900)]);
    provider.quota_down = vec!["a".to_string()];
    let set = CredentialSet::from_secrets(["a", "b"]);
    let mut sink = |_: usize| -> VersecastResult<()> { Ok(()) };

    let mut rotator = CredentialRotator::new(&provider, &set, &mut sink, no_delay(0), 0);
    assert_eq!(rotator.ensure_quota(10).unwrap().secret(), "b");
}

#[test]
fn start_index_past_set_is_exhausted() {
    let provider = FakeProvider::with_remaining(&[("a", 900)]);
    let set = CredentialSet::from_secrets(["a"]);
    let mut sink = |_: usize| -> VersecastResult<()> { Ok(()) };

    let mut rotator = CredentialRotator::new(&provider, &set, &mut sink, no_delay(0), 5);
    assert!(matches!(
        rotator.ensure_quota(1).unwrap_err(),
        VersecastError::CredentialsExhausted { tried: 1 }
    ));
}

#[test]
fn transient_failure_retries_same_credential() {
    let provider = FakeProvider::with_remaining(&[("a", 900), ("b", 900)]);
    provider.script(
        "a",
        vec![
            Err(SpeechError::Transient("502".into())),
            Ok(b"audio".to_vec()),
        ],
    );
    let set = CredentialSet::from_secrets(["a", "b"]);
    let mut persisted = Vec::new();
    let mut sink = |i: usize| -> VersecastResult<()> {
        persisted.push(i);
        Ok(())
    };

    let mut rotator = CredentialRotator::new(&provider, &set, &mut sink, no_delay(1), 0);
    assert_eq!(rotator.synthesize(&request("x")).unwrap(), b"audio");
    drop(rotator);
    assert_eq!(*provider.calls.borrow(), vec!["a", "a"]);
    assert!(persisted.is_empty());
}

#[test]
fn repeated_transient_failures_rotate_after_retries() {
    let provider = FakeProvider::with_remaining(&[("a", 900), ("b", 900)]);
    provider.script(
        "a",
        vec![
            Err(SpeechError::Transient("timeout".into())),
            Err(SpeechError::Transient("timeout".into())),
        ],
    );
    let set = CredentialSet::from_secrets(["a", "b"]);
    let mut sink = |_: usize| -> VersecastResult<()> { Ok(()) };

    let mut rotator = CredentialRotator::new(&provider, &set, &mut sink, no_delay(1), 0);
    assert_eq!(rotator.synthesize(&request("x")).unwrap(), b"b");
    assert_eq!(rotator.index(), 1);
    drop(rotator);
    assert_eq!(*provider.calls.borrow(), vec!["a", "a", "b"]);
}

#[test]
fn credential_failure_rotates_immediately() {
    let provider = FakeProvider::with_remaining(&[("a", 900), ("b", 900)]);
    provider.script("a", vec![Err(SpeechError::Credential("401".into()))]);
    let set = CredentialSet::from_secrets(["a", "b"]);
    let mut sink = |_: usize| -> VersecastResult<()> { Ok(()) };

    let mut rotator = CredentialRotator::new(&provider, &set, &mut sink, no_delay(3), 0);
    assert_eq!(rotator.synthesize(&request("x")).unwrap(), b"b");
    drop(rotator);
    assert_eq!(*provider.calls.borrow(), vec!["a", "b"]);
}

#[test]
fn rejected_request_does_not_burn_credentials() {
    let provider = FakeProvider::with_remaining(&[("a", 900), ("b", 900)]);
    provider.script("a", vec![Err(SpeechError::Rejected("422".into()))]);
    let set = CredentialSet::from_secrets(["a", "b"]);
    let mut persisted = Vec::new();
    let mut sink = |i: usize| -> VersecastResult<()> {
        persisted.push(i);
        Ok(())
    };

    let mut rotator = CredentialRotator::new(&provider, &set, &mut sink, no_delay(3), 0);
    let err = rotator.synthesize(&request("x")).unwrap_err();
    assert!(matches!(err, VersecastError::Provider(_)));
    assert_eq!(rotator.index(), 0);
    drop(rotator);
    assert!(persisted.is_empty());
}

#[test]
fn failed_index_persist_keeps_narrating() {
    let provider = FakeProvider::with_remaining(&[("a", 0), ("b", 900)]);
    let set = CredentialSet::from_secrets(["a", "b"]);
    let mut attempts = Vec::new();
    let mut sink = |i: usize| -> VersecastResult<()> {
        attempts.push(i);
        Err(VersecastError::store_persist("local: disk full; remote: 503"))
    };

    let mut rotator = CredentialRotator::new(&provider, &set, &mut sink, no_delay(0), 0);
    assert_eq!(rotator.synthesize(&request("hello")).unwrap(), b"b");
    assert_eq!(rotator.index(), 1);
    drop(rotator);
    assert_eq!(*provider.calls.borrow(), vec!["b"]);
    assert_eq!(attempts, vec![1]);
}
