use super::*;

fn word(text: &str, start: f64, end: f64) -> LyricWord {
    LyricWord {
        text: text.to_string(),
        start,
        end,
    }
}

fn two_word_line() -> LyricLine {
    LyricLine::from_words(vec![word("hello", 0.0, 1.0), word("world", 1.0, 2.0)]).unwrap()
}

#[test]
fn mid_line_word_progress_is_staggered() {
    let line = two_word_line();
    assert_eq!(line.progress_at(1.0), 0.5);
    assert_eq!(line.word_progress(0, 1.0, 0.1), 1.0);
    assert!((line.word_progress(1, 1.0, 0.1) - 0.4).abs() < 1e-12);
}

#[test]
fn word_progress_is_clamped() {
    let line = two_word_line();
    assert_eq!(line.word_progress(1, 0.05, 0.5), 0.0);
    assert_eq!(line.word_progress(1, 5.0, 0.1), 1.0);
}

#[test]
fn containment_is_half_open() {
    let line = two_word_line();
    assert!(line.contains(0.0));
    assert!(line.contains(1.999));
    assert!(!line.contains(2.0));
}

#[test]
fn first_overlapping_line_wins() {
    let a = LyricLine::from_words(vec![word("a", 0.0, 3.0)]).unwrap();
    let b = LyricLine::from_words(vec![word("b", 1.0, 2.0)]).unwrap();
    let lines = vec![a, b];
    assert_eq!(active_line(&lines, 1.5), Some(0));
    assert_eq!(active_line(&lines, 3.5), None);
}

#[test]
fn filter_drops_out_of_range_and_empty_lines() {
    let keep = two_word_line();
    let late = LyricLine::from_words(vec![word("late", 20.0, 21.0)]).unwrap();
    let empty = LyricLine {
        start: 0.0,
        end: 1.0,
        words: Vec::new(),
    };
    let inverted = LyricLine {
        start: 2.0,
        end: 1.0,
        words: vec![word("x", 2.0, 1.0)],
    };
    let kept = filter_lines(&[keep.clone(), late, empty, inverted], 12.0);
    assert_eq!(kept, vec![keep]);
}

#[test]
fn from_words_rejects_empty() {
    assert!(LyricLine::from_words(Vec::new()).is_err());
    assert_eq!(two_word_line().text(), "hello world");
}
