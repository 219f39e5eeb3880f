use super::*;

#[test]
fn normalize_key_rejects_traversal_and_absolute() {
    assert_eq!(
        normalize_key("biblia//videos/./a.mp4").unwrap(),
        "biblia/videos/a.mp4"
    );
    assert_eq!(normalize_key("a\\b.json").unwrap(), "a/b.json");
    assert!(normalize_key("/etc/passwd").is_err());
    assert!(normalize_key("biblia/../../x").is_err());
    assert!(normalize_key("./").is_err());
}

#[test]
fn dir_store_roundtrips_and_reports_missing() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirBlobStore::new(dir.path());

    assert!(store.get("biblia/state.json").unwrap().is_none());
    store
        .put("biblia/state.json", b"{}".to_vec(), JSON_CONTENT_TYPE)
        .unwrap();
    assert_eq!(store.get("biblia/state.json").unwrap().unwrap(), b"{}");
    assert!(dir.path().join("biblia").join("state.json").is_file());
}

#[test]
fn memory_store_records_content_type() {
    let store = MemoryBlobStore::new();
    store
        .put("biblia/videos/a.mp4", vec![1, 2, 3], MP4_CONTENT_TYPE)
        .unwrap();
    assert_eq!(store.keys(), vec!["biblia/videos/a.mp4".to_string()]);
    assert_eq!(
        store.content_type("biblia/videos/a.mp4").as_deref(),
        Some(MP4_CONTENT_TYPE)
    );
    assert!(store.get("other").unwrap().is_none());
}

#[test]
fn http_store_maps_not_found_to_none() {
    let mut server = mockito::Server::new();
    let missing = server
        .mock("GET", "/bucket/biblia/state.json")
        .with_status(404)
        .create();

    let store = HttpBlobStore::new(
        format!("{}/bucket/", server.url()),
        None,
        Duration::from_secs(5),
    )
    .unwrap();
    assert!(store.get("biblia/state.json").unwrap().is_none());
    missing.assert();
}

#[test]
fn http_store_sends_bearer_and_content_type() {
    let mut server = mockito::Server::new();
    let put = server
        .mock("PUT", "/biblia/videos/G_1_1.mp4")
        .match_header("authorization", "Bearer secret")
        .match_header("content-type", MP4_CONTENT_TYPE)
        .match_body(mockito::Matcher::Exact("mp4".to_string()))
        .with_status(200)
        .create();
    let get = server
        .mock("GET", "/biblia/state.json")
        .match_header("authorization", "Bearer secret")
        .with_status(200)
        .with_body(r#"{"book":1}"#)
        .create();

    let store = HttpBlobStore::new(
        server.url(),
        Some("secret".to_string()),
        Duration::from_secs(5),
    )
    .unwrap();
    store
        .put("biblia/videos/G_1_1.mp4", b"mp4".to_vec(), MP4_CONTENT_TYPE)
        .unwrap();
    assert_eq!(
        store.get("biblia/state.json").unwrap().unwrap(),
        br#"{"book":1}"#
    );
    put.assert();
    get.assert();
}

#[test]
fn http_store_surfaces_server_errors() {
    let mut server = mockito::Server::new();
    let _m = server.mock("GET", "/k").with_status(500).create();
    let store = HttpBlobStore::new(server.url(), None, Duration::from_secs(5)).unwrap();
    let err = store.get("k").unwrap_err();
    assert!(matches!(err, VersecastError::Store(_)));
}

#[test]
fn http_store_rejects_non_http_urls() {
    assert!(HttpBlobStore::new("s3://bucket", None, Duration::from_secs(1)).is_err());
}

#[test]
fn debug_redacts_bearer_token() {
    let store = HttpBlobStore::new(
        "http://localhost:9",
        Some("secret".to_string()),
        Duration::from_secs(1),
    )
    .unwrap();
    let dbg = format!("{store:?}");
    assert!(!dbg.contains("secret"));
}
