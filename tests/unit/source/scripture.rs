use super::*;

const SAMPLE: &str = r#"[
  {"abbrev": "gn", "name": "Gênesis", "chapters": [["No princípio", "Era a terra"], ["Assim foram"]]},
  {"name": "Êxodo", "chapters": [["Estes são os nomes"]]}
]"#;

#[test]
fn parses_books_and_tolerates_bom() {
    let with_bom = format!("\u{feff}{SAMPLE}");
    let src = Scripture::from_json_str(&with_bom).unwrap();
    assert_eq!(src.len(), 2);
    assert_eq!(src.total_chapters(), 3);
    assert_eq!(src.book(0).unwrap().abbrev.as_deref(), Some("gn"));
    assert_eq!(src.book(1).unwrap().abbrev, None);
}

#[test]
fn chapter_unit_carries_one_based_number_and_title() {
    let src = Scripture::from_json_str(SAMPLE).unwrap();
    let unit = src.chapter(0, 1).unwrap();
    assert_eq!(unit.chapter_number, 2);
    assert_eq!(unit.title(), "Gênesis 2");
    assert_eq!(unit.verses, vec!["Assim foram".to_string()]);
    assert!(src.chapter(0, 2).is_none());
    assert!(src.chapter(5, 0).is_none());
}

#[test]
fn malformed_source_is_a_source_load_error() {
    let err = Scripture::from_json_str("{not json").unwrap_err();
    assert!(matches!(err, VersecastError::SourceLoad(_)));

    let err = Scripture::from_path("definitely/missing/source.json").unwrap_err();
    assert!(matches!(err, VersecastError::SourceLoad(_)));
    assert!(err.is_fatal());
}
