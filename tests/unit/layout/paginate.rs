use super::*;

fn mono(s: &str) -> f32 {
    s.chars().count() as f32
}

fn chapter(verses: &[&str]) -> ChapterUnit {
    ChapterUnit {
        book_index: 0,
        chapter_index: 2,
        book_name: "Genesis".to_string(),
        chapter_number: 3,
        verses: verses.iter().map(|v| v.to_string()).collect(),
    }
}

fn three_line_layout() -> SlideLayout {
    SlideLayout {
        max_width: 20.0,
        content_height: 30.0,
        line_height: 10.0,
    }
}

#[test]
fn short_chapter_fits_on_one_slide() {
    let ch = chapter(&["In the beginning", "was light", "and dark"]);
    let mut m = mono;
    let slides = paginate(&ch, &three_line_layout(), &mut m);

    assert_eq!(slides.len(), 1);
    let s = &slides[0];
    assert_eq!(s.title, "Genesis 3");
    assert_eq!(
        s.display_text,
        "(1) In the beginning (2) was light (3) and dark"
    );
    assert_eq!(s.read_text, "In the beginning was light and dark");
    assert_eq!((s.first_verse, s.last_verse), (1, 3));
}

#[test]
fn small_overflow_yields_exactly_two_slides() {
    // Three verses fill three lines exactly; the fourth pushes to a fourth line.
    let ch = chapter(&["aaaa bbbb cccc", "dddd eeee ffff", "gggg hhhh iiii", "jj"]);
    let mut m = mono;
    let layout = three_line_layout();

    let first_three = format!(
        "(1) {} (2) {} (3) {}",
        ch.verses[0], ch.verses[1], ch.verses[2]
    );
    assert_eq!(wrap(&first_three, layout.max_width, &mut m).len(), 3);

    let slides = paginate(&ch, &layout, &mut m);
    assert_eq!(slides.len(), 2);
    assert_eq!((slides[0].first_verse, slides[0].last_verse), (1, 3));
    assert_eq!((slides[1].first_verse, slides[1].last_verse), (4, 4));
    assert_eq!(slides[1].display_text, "(4) jj");
    assert!(slides.iter().all(|s| s.title == "Genesis 3"));
}

#[test]
fn oversized_verse_gets_its_own_slide() {
    let long = "word ".repeat(40);
    let ch = chapter(&["short", long.trim(), "tail"]);
    let mut m = mono;
    let slides = paginate(&ch, &three_line_layout(), &mut m);

    assert_eq!(slides.len(), 3);
    assert_eq!(slides[0].read_text, "short");
    assert_eq!(slides[1].read_text, long.trim());
    assert_eq!(slides[2].read_text, "tail");
}

#[test]
fn preserves_every_verse_once_in_order_and_is_deterministic() {
    let verses: Vec<String> = (0..37)
        .map(|i| format!("verse{i} ").repeat(i % 5 + 1).trim().to_string())
        .collect();
    let refs: Vec<&str> = verses.iter().map(String::as_str).collect();
    let ch = chapter(&refs);
    let layout = SlideLayout {
        max_width: 24.0,
        content_height: 50.0,
        line_height: 10.0,
    };

    let mut m = mono;
    let slides = paginate(&ch, &layout, &mut m);
    let again = paginate(&ch, &layout, &mut m);
    assert_eq!(slides, again);

    let mut next_verse = 1;
    for s in &slides {
        assert!(!s.display_text.is_empty());
        assert!(!s.read_text.is_empty());
        assert_eq!(s.first_verse, next_verse);
        assert!(s.last_verse >= s.first_verse);
        next_verse = s.last_verse + 1;
    }
    assert_eq!(next_verse, verses.len() + 1);

    let joined: Vec<String> = slides.iter().map(|s| s.read_text.clone()).collect();
    assert_eq!(joined.join(" "), verses.join(" "));
}

#[test]
fn empty_chapter_yields_no_slides() {
    let ch = chapter(&[]);
    let mut m = mono;
    assert!(paginate(&ch, &three_line_layout(), &mut m).is_empty());
}

#[test]
fn narration_speaks_title_on_first_slide_only() {
    let ch = chapter(&["aaaa bbbb cccc", "dddd eeee ffff", "gggg hhhh iiii", "jj"]);
    let mut m = mono;
    let slides = paginate(&ch, &three_line_layout(), &mut m);
    assert_eq!(
        slides[0].narration_text(0),
        format!("Genesis 3. {}", slides[0].read_text)
    );
    assert_eq!(slides[1].narration_text(1), "jj");
}

#[test]
fn layout_from_default_canvas_matches_reference_budget() {
    let layout =
        SlideLayout::from_canvas(Canvas::VERTICAL_HD, SafeArea::default(), 72.0, 64.0, 80.0)
            .unwrap();
    assert_eq!(layout.max_width, 852.0);
    assert_eq!(layout.content_height, 1233.0);
    assert_eq!(layout.lines_per_slide(), 17);
}

#[test]
fn layout_rejects_margins_that_leave_no_room() {
    let safe = SafeArea {
        top: 0,
        left: 600,
        right: 600,
        bottom: 0,
    };
    assert!(SlideLayout::from_canvas(Canvas::VERTICAL_HD, safe, 72.0, 64.0, 80.0).is_err());
}
