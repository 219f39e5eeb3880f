use super::*;

#[test]
fn concat_list_quotes_each_part() {
    let parts = vec![
        PathBuf::from("/tmp/sil_ini_0.mp3"),
        PathBuf::from("/tmp/raw_0.mp3"),
        PathBuf::from("/tmp/sil_fin_0.mp3"),
    ];
    assert_eq!(
        concat_list(&parts),
        "file '/tmp/sil_ini_0.mp3'\nfile '/tmp/raw_0.mp3'\nfile '/tmp/sil_fin_0.mp3'"
    );
}

#[test]
fn quotes_inside_paths_are_escaped() {
    assert_eq!(
        quote_concat_path(Path::new("/tmp/João's/a.mp3")),
        r"'/tmp/João'\''s/a.mp3'"
    );
}

#[test]
fn image_timeline_repeats_last_image() {
    let timeline = vec![
        ImageSpan {
            path: PathBuf::from("/w/slide_0.png"),
            seconds: 4.5,
        },
        ImageSpan {
            path: PathBuf::from("/w/slide_1.png"),
            seconds: 3.25,
        },
    ];
    assert_eq!(
        image_timeline_list(&timeline),
        "file '/w/slide_0.png'\nduration 4.5\n\
         file '/w/slide_1.png'\nduration 3.25\n\
         file '/w/slide_1.png'\n"
    );
    assert_eq!(image_timeline_list(&[]), "");
}

#[test]
fn parse_duration_accepts_ffprobe_output() {
    assert!((parse_duration("12.345000\n").unwrap() - 12.345).abs() < 1e-9);
    assert!(parse_duration("N/A").is_err());
    assert!(parse_duration("-1").is_err());
}

#[test]
fn mux_options_default_and_validate() {
    let opts = MuxOptions::default();
    assert_eq!(opts.fps, 30);
    assert_eq!(opts.audio_bitrate, "192k");
    opts.validate().unwrap();

    let bad = MuxOptions {
        fps: 0,
        ..MuxOptions::default()
    };
    assert!(bad.validate().is_err());
}

#[test]
fn ensure_parent_dir_creates_nested_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("a").join("b").join("c.png");
    ensure_parent_dir(&target).unwrap();
    assert!(dir.path().join("a").join("b").is_dir());
    ensure_parent_dir(Path::new("bare.txt")).unwrap();
}

#[test]
fn silence_rejects_non_positive_duration() {
    let dir = tempfile::tempdir().unwrap();
    let tc = FfmpegToolchain::default();
    assert!(tc.silence(0.0, &dir.path().join("s.mp3")).is_err());
}

#[test]
fn silence_and_probe_with_system_ffmpeg() {
    let tc = FfmpegToolchain::default();
    if tc.check_available().is_err() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.mp3");
    let b = dir.path().join("b.mp3");
    tc.silence(0.5, &a).unwrap();
    tc.silence(1.0, &b).unwrap();

    let joined = dir.path().join("joined.mp3");
    tc.concat_audio(&[a, b], &dir.path().join("list.txt"), &joined)
        .unwrap();
    let secs = tc.probe_duration(&joined).unwrap();
    assert!((secs - 1.5).abs() < 0.2, "duration was {secs}");
}

#[test]
fn check_available_reports_missing_binary() {
    let tc = FfmpegToolchain::new("/nonexistent/ffmpeg", "/nonexistent/ffprobe");
    let err = tc.check_available().unwrap_err();
    assert!(err.to_string().contains("/nonexistent/ffmpeg"));
}
