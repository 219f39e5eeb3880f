use super::*;

fn mono(s: &str) -> f32 {
    s.chars().count() as f32
}

#[test]
fn fills_lines_greedily() {
    let mut m = mono;
    let lines = wrap("aaa bbb ccc ddd", 7.0, &mut m);
    assert_eq!(lines, vec!["aaa bbb", "ccc ddd"]);

    let lines = wrap("aaa bbb ccc ddd", 11.0, &mut m);
    assert_eq!(lines, vec!["aaa bbb ccc", "ddd"]);
}

#[test]
fn never_rebalances_earlier_lines() {
    let mut m = mono;
    // Optimal breaking would give "a bb" / "cccc"; greedy keeps "a bb c" on line one.
    let lines = wrap("a bb c cccc", 6.0, &mut m);
    assert_eq!(lines, vec!["a bb c", "cccc"]);
}

#[test]
fn oversized_word_sits_alone() {
    let mut m = mono;
    let lines = wrap("hi extraordinarily ok", 5.0, &mut m);
    assert_eq!(lines, vec!["hi", "extraordinarily", "ok"]);
}

#[test]
fn empty_and_whitespace_input_produce_no_lines() {
    let mut m = mono;
    assert!(wrap("", 10.0, &mut m).is_empty());
    assert!(wrap("   \n\t ", 10.0, &mut m).is_empty());
}

#[test]
fn collapses_runs_of_whitespace() {
    let mut m = mono;
    let lines = wrap("one   two\nthree", 100.0, &mut m);
    assert_eq!(lines, vec!["one two three"]);
}

#[test]
fn lines_fit_unless_single_unsplittable_word() {
    let text = "the quick brown fox jumps over the lazy dog while an incomprehensibilities \
                marker appears amid ordinary words of varied length";
    for max in [4.0f32, 9.0, 13.0, 20.0, 37.0] {
        let mut m = mono;
        for line in wrap(text, max, &mut m) {
            assert!(!line.is_empty());
            let fits = mono(&line) <= max;
            let single_word = !line.contains(' ');
            assert!(fits || single_word, "line {line:?} exceeds {max}");
        }
    }
}
