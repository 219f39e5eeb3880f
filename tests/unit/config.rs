use super::*;

#[test]
fn empty_object_is_the_default_config() {
    let cfg = VersecastConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg, VersecastConfig::default());

    let layout = cfg.slide_style().layout().unwrap();
    assert_eq!(layout.max_width, 852.0);
    assert_eq!(layout.content_height, 1233.0);
    assert_eq!(cfg.http_timeout(), Duration::from_secs(120));
    assert_eq!(cfg.store.state_key, "biblia/state.json");
    assert_eq!(cfg.store.artifact_prefix, "biblia/videos/prontos/");
}

#[test]
fn partial_sections_keep_other_defaults() {
    let cfg = VersecastConfig::from_json_str(
        r##"{
            "text": {"title_color": "#ff0000"},
            "narration": {"lead_silence": 0.25},
            "rotation": {"same_credential_retries": 0, "retry_delay_ms": 10}
        }"##,
    )
    .unwrap();
    assert_eq!(cfg.slide_style().title_color, Rgba8::opaque(255, 0, 0));
    assert_eq!(cfg.slide_style().font_size, 52.0);
    assert_eq!(cfg.narration_settings().lead_silence, 0.25);
    assert_eq!(cfg.narration_settings().trail_silence, 1.0);
    assert_eq!(
        cfg.rotation_policy(),
        RotationPolicy {
            same_credential_retries: 0,
            retry_delay: Duration::from_millis(10),
        }
    );
}

#[test]
fn explicit_safe_area_overrides_derived_one() {
    let cfg = VersecastConfig::from_json_str(
        r#"{"safe_area": {"top": 0, "left": 40, "right": 40, "bottom": 0}}"#,
    )
    .unwrap();
    let layout = cfg.slide_style().layout().unwrap();
    assert_eq!(layout.max_width, 1000.0);
}

#[test]
fn unknown_fields_and_bad_values_are_rejected() {
    assert!(VersecastConfig::from_json_str(r#"{"sorce": "x.json"}"#).is_err());
    assert!(VersecastConfig::from_json_str(r#"{"video": {"fps": 0}}"#).is_err());
    assert!(VersecastConfig::from_json_str(r#"{"http": {"timeout_secs": 0}}"#).is_err());
    assert!(VersecastConfig::from_json_str(r#"{"canvas": {"width": 1081, "height": 1920}}"#).is_err());
    assert!(VersecastConfig::from_json_str(r#"{"narration": {"stability": 0.5}}"#).is_err());
    assert!(VersecastConfig::from_json_str(r#"{"store": {"bucket": " "}}"#).is_err());
}

#[test]
fn s3_bucket_and_region_are_read() {
    let cfg = VersecastConfig::from_json_str(
        r#"{"store": {"bucket": "biblia-videos", "region": "sa-east-1"}}"#,
    )
    .unwrap();
    assert_eq!(cfg.store.bucket.as_deref(), Some("biblia-videos"));
    assert_eq!(cfg.store.region.as_deref(), Some("sa-east-1"));
    assert_eq!(cfg.store.url, None);
}

#[test]
fn voice_settings_need_both_values() {
    let cfg = VersecastConfig::from_json_str(
        r#"{"narration": {"stability": 0.4, "similarity_boost": 0.8}}"#,
    )
    .unwrap();
    assert_eq!(
        cfg.narration_settings().voice_settings,
        Some(VoiceSettings {
            stability: 0.4,
            similarity_boost: 0.8,
        })
    );
}

#[test]
fn from_path_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(VersecastConfig::from_path(&dir.path().join("nope.json")).is_err());

    let p = dir.path().join("versecast.json");
    std::fs::write(&p, r#"{"source": "bible.json"}"#).unwrap();
    assert_eq!(
        VersecastConfig::from_path(&p).unwrap().source,
        PathBuf::from("bible.json")
    );
}
