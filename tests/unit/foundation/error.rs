use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        VersecastError::source_load("x")
            .to_string()
            .contains("source load error:")
    );
    assert!(
        VersecastError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        VersecastError::media("x")
            .to_string()
            .contains("media error:")
    );
    assert!(
        VersecastError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
    assert!(
        VersecastError::CredentialsExhausted { tried: 3 }
            .to_string()
            .contains("tried 3")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = VersecastError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn fatal_classification_matches_taxonomy() {
    assert!(!VersecastError::EndOfSource.is_fatal());
    assert!(VersecastError::EndOfSource.is_end_of_source());
    assert!(!VersecastError::provider("503").is_fatal());
    assert!(!VersecastError::store_persist("disk full").is_fatal());

    assert!(VersecastError::source_load("missing").is_fatal());
    assert!(VersecastError::CredentialsExhausted { tried: 2 }.is_fatal());
    assert!(VersecastError::store("PUT video: 503").is_fatal());
}
