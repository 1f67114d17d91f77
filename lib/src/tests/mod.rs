/*! End-to-end tests that compile patterns and run them against subjects. */

use pretty_assertions::assert_eq;

use crate::{
    Ast, BoundaryKind, CharClass, Pattern, SerializationError, VariableError,
};

macro_rules! assert_matches {
    ($pattern:expr, $subject:expr) => {{
        assert!(
            $pattern.matcher($subject).matches(),
            "`{}` should match {:?}",
            $pattern.source(),
            $subject
        );
    }};
}

macro_rules! assert_rejects {
    ($pattern:expr, $subject:expr) => {{
        assert!(
            !$pattern.matcher($subject).matches(),
            "`{}` should not match {:?}",
            $pattern.source(),
            $subject
        );
    }};
}

/// (?<x>a*)b\k<x>
fn backref_pattern() -> Pattern {
    crate::compile(&Ast::seq([
        Ast::capture("x", Ast::star(Ast::literal('a'))),
        Ast::literal('b'),
        Ast::backref("x"),
    ]))
    .unwrap()
}

#[test]
fn backreference_binding() {
    let pattern = backref_pattern();

    assert_matches!(pattern, "b");
    assert_matches!(pattern, "aba");
    assert_matches!(pattern, "aabaa");

    assert_rejects!(pattern, "");
    assert_rejects!(pattern, "ab");
    assert_rejects!(pattern, "ba");
    assert_rejects!(pattern, "aaba");
    assert_rejects!(pattern, "abaa");

    let mut matcher = pattern.matcher("aabaa");
    assert!(matcher.matches());
    assert_eq!(matcher.variable_content("x").unwrap(), "aa");
}

#[test]
fn backreference_doubles_the_consumed_prefix() {
    // (?<x>a(\k<x>)+): each iteration consumes everything captured so
    // far and the capture keeps growing, so exactly the powers of two
    // are accepted.
    let pattern = crate::compile(&Ast::capture(
        "x",
        Ast::concat(Ast::literal('a'), Ast::plus(Ast::backref("x"))),
    ))
    .unwrap();

    for len in 1..=16 {
        let subject = "a".repeat(len);
        if len.is_power_of_two() && len > 1 {
            assert_matches!(pattern, subject.as_str());
        } else {
            assert_rejects!(pattern, subject.as_str());
        }
    }
}

#[test]
fn mutually_bound_variables() {
    // (?<all>(?<x>\k<y>)((?<y>\k<x>a))+): `x` and `y` feed each other
    // while `all` spans the whole ride.
    let inner = Ast::concat(
        Ast::capture("x", Ast::backref("y")),
        Ast::plus(Ast::capture(
            "y",
            Ast::concat(Ast::backref("x"), Ast::literal('a')),
        )),
    );
    let pattern = crate::compile(&Ast::capture("all", inner)).unwrap();

    assert_matches!(pattern, "a");
    assert_matches!(pattern, "aa");
    assert_matches!(pattern, "aaaa");
    assert_rejects!(pattern, "");
    assert_rejects!(pattern, "ab");

    let mut matcher = pattern.matcher("aaaa");
    assert!(matcher.matches());
    assert_eq!(matcher.variable_content("all").unwrap(), "aaaa");
}

#[test]
fn searching() {
    let pattern = backref_pattern();
    let mut matcher = pattern.matcher("zabaz");

    assert!(matcher.next_match());
    assert_eq!(matcher.span(), Some(1..4));
    assert_eq!(matcher.matched_text().unwrap(), "aba");
    assert_eq!(matcher.variable_content("x").unwrap(), "a");

    assert!(!matcher.next_match());
    assert_eq!(matcher.match_count(), 1);
}

#[test]
fn searching_finds_the_leftmost_match() {
    // (?<x>a+)b\k<x>: the attempt at 1 captures "aa" and fails only at
    // its very end; the scan must restart at 2, not at the position
    // where the failure was detected.
    let pattern = crate::compile(&Ast::seq([
        Ast::capture("x", Ast::plus(Ast::literal('a'))),
        Ast::literal('b'),
        Ast::backref("x"),
    ]))
    .unwrap();
    let mut matcher = pattern.matcher("xaabyabaz");

    assert!(matcher.next_match());
    assert_eq!(matcher.span(), Some(5..8));
    assert!(!matcher.next_match());
}

#[test]
fn empty_pattern_matches_everywhere() {
    let pattern = crate::compile(&Ast::empty()).unwrap();

    assert_matches!(pattern, "");
    assert_rejects!(pattern, "a");

    let mut matcher = pattern.matcher("ab");
    let mut spans = Vec::new();
    while matcher.next_match() {
        spans.push(matcher.span().unwrap());
    }
    assert_eq!(spans, vec![0..0, 1..1, 2..2]);
    assert_eq!(matcher.match_count(), 3);
}

#[test]
fn matches_agrees_with_search() {
    let subjects =
        ["", "b", "ab", "aba", "abaa", "aabaa", "zabaz", "baba"];
    let pattern = backref_pattern();

    for subject in subjects {
        let whole = pattern.matcher(subject).matches();
        let mut matcher = pattern.matcher(subject);
        let mut spanning = false;
        while matcher.next_match() {
            if matcher.span() == Some(0..subject.chars().count()) {
                spanning = true;
            }
        }
        assert_eq!(whole, spanning, "disagreement on {subject:?}");
    }
}

#[test]
fn replacing() {
    let pattern = crate::compile(&Ast::text("aa")).unwrap();

    let mut matcher = pattern.matcher("aabaabaabaabaa");
    assert_eq!(matcher.replace_all(""), "bbbb");
    assert_eq!(matcher.replace_all("cc"), "ccbccbccbccbcc");
    assert_eq!(matcher.replace_first("X"), "Xbaabaabaabaa");

    let mut matcher = pattern.matcher("zzz");
    assert_eq!(matcher.replace_all("x"), "zzz");
    assert_eq!(matcher.replace_first("x"), "zzz");
}

#[test]
fn serialization_round_trip() {
    let pattern = backref_pattern();
    let bytes = pattern.serialize().unwrap();
    let loaded = Pattern::deserialize(&bytes).unwrap();

    assert_eq!(loaded.source(), pattern.source());

    assert_matches!(loaded, "aba");
    assert_matches!(loaded, "b");
    assert_rejects!(loaded, "abaa");

    let mut matcher = loaded.matcher("aabaa");
    assert!(matcher.matches());
    assert_eq!(matcher.variable_content("x").unwrap(), "aa");
}

#[test]
fn deserializing_garbage_fails() {
    assert!(matches!(
        Pattern::deserialize(b"not a pattern"),
        Err(SerializationError::InvalidFormat)
    ));
    // Too short to even hold the header.
    assert!(Pattern::deserialize(b"MOA").is_err());
    // Valid header, invalid payload.
    assert!(matches!(
        Pattern::deserialize(b"MOA-RX\xff\xff\xff\xff"),
        Err(SerializationError::InvalidEncoding(_))
    ));
}

#[test]
fn line_anchors() {
    // ^a$
    let pattern = crate::compile(&Ast::seq([
        Ast::boundary(BoundaryKind::StartOfLine),
        Ast::literal('a'),
        Ast::boundary(BoundaryKind::EndOfLine),
    ]))
    .unwrap();

    assert_matches!(pattern, "a");
    assert_rejects!(pattern, "ba");

    let mut matcher = pattern.matcher("b\na\nc");
    assert!(matcher.next_match());
    assert_eq!(matcher.span(), Some(2..3));
    assert!(!matcher.next_match());
}

#[test]
fn input_anchors() {
    // a\z matches only when `a` is the last code point.
    let pattern = crate::compile(&Ast::concat(
        Ast::literal('a'),
        Ast::boundary(BoundaryKind::EndOfInput),
    ))
    .unwrap();

    assert_matches!(pattern, "a");
    let mut matcher = pattern.matcher("aba");
    assert!(matcher.next_match());
    assert_eq!(matcher.span(), Some(2..3));

    // \Aa never matches past the start of the input.
    let pattern = crate::compile(&Ast::concat(
        Ast::boundary(BoundaryKind::StartOfInput),
        Ast::literal('a'),
    ))
    .unwrap();

    let mut matcher = pattern.matcher("ba");
    assert!(!matcher.next_match());
}

#[test]
fn last_match_end_anchor() {
    // \Ga finds contiguous matches only.
    let pattern = crate::compile(&Ast::concat(
        Ast::boundary(BoundaryKind::LastMatchEnd),
        Ast::literal('a'),
    ))
    .unwrap();

    let mut matcher = pattern.matcher("aab");
    assert!(matcher.next_match());
    assert_eq!(matcher.span(), Some(0..1));
    assert!(matcher.next_match());
    assert_eq!(matcher.span(), Some(1..2));
    assert!(!matcher.next_match());
    assert_eq!(matcher.match_count(), 2);
}

#[test]
fn character_classes() {
    // (?<n>\d+)-\k<n>
    let pattern = crate::compile(&Ast::seq([
        Ast::capture("n", Ast::plus(Ast::class(CharClass::Digit))),
        Ast::literal('-'),
        Ast::backref("n"),
    ]))
    .unwrap();

    assert_matches!(pattern, "12-12");
    assert_matches!(pattern, "0-0");
    assert_rejects!(pattern, "12-1");
    assert_rejects!(pattern, "12-13");
    assert_rejects!(pattern, "a-a");
    assert_rejects!(pattern, "-");
}

#[test]
fn variable_queries() {
    let pattern = backref_pattern();
    let mut matcher = pattern.matcher("aba");
    assert!(matcher.matches());

    assert_eq!(matcher.variable_content("x").unwrap(), "a");
    assert_eq!(matcher.variable_content_by_index(1).unwrap(), "a");

    assert_eq!(
        matcher.variable_content("nope"),
        Err(VariableError::UnknownName("nope".to_string()))
    );
    assert_eq!(
        matcher.variable_content_by_index(9),
        Err(VariableError::UnknownIndex(9))
    );
}

#[test]
fn token_length_bounds() {
    let pattern = backref_pattern();
    let matcher = pattern.matcher("aba");
    assert_eq!(matcher.max_next_token_len(), 1);

    let pattern = crate::compile(&Ast::empty()).unwrap();
    let matcher = pattern.matcher("aba");
    assert_eq!(matcher.max_next_token_len(), 0);

    let pattern = crate::compile(&Ast::concat(
        Ast::boundary(BoundaryKind::StartOfInput),
        Ast::literal('a'),
    ))
    .unwrap();
    let matcher = pattern.matcher("aba");
    assert_eq!(matcher.max_next_token_len(), 0);
}

#[test]
fn unbound_backreference_matches_empty() {
    // \k<z>+ with `z` never captured: the reference always matches the
    // empty string, and only the empty subject is accepted.
    let pattern =
        crate::compile(&Ast::plus(Ast::backref("z"))).unwrap();

    assert_matches!(pattern, "");
    assert_rejects!(pattern, "a");
}
