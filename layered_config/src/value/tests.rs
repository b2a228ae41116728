//! Coercion behaviour for the built-in field types.
#![allow(
    unfulfilled_lint_expectations,
    reason = "clippy::expect_used is denied globally; tests may not hit those branches"
)]
#![expect(
    clippy::expect_used,
    reason = "tests panic to surface configuration mistakes"
)]

use std::path::PathBuf;

use rstest::rstest;

use super::*;

#[rstest]
#[case("42", 42)]
#[case(" 7 ", 7)]
#[case("-3", -3)]
fn integers_parse(#[case] raw: &str, #[case] expected: i64) {
    let mut value = 0_i64;
    value.set(RawValue::scalar(raw)).expect("integer parses");
    assert_eq!(value, expected);
}

#[rstest]
#[case("abc")]
#[case("4.5")]
#[case("")]
fn malformed_integers_leave_field_untouched(#[case] raw: &str) {
    let mut value = 11_u32;
    let err = value.set(RawValue::scalar(raw)).expect_err("parse must fail");
    assert!(
        matches!(err, CoerceError::Parse { expected: FieldKind::Integer, .. }),
        "unexpected error: {err:?}"
    );
    assert_eq!(value, 11);
}

#[rstest]
#[case("true", true)]
#[case("TRUE", true)]
#[case("1", true)]
#[case("f", false)]
#[case("False", false)]
#[case("0", false)]
fn booleans_parse(#[case] raw: &str, #[case] expected: bool) {
    let mut value = !expected;
    value.set(RawValue::scalar(raw)).expect("boolean parses");
    assert_eq!(value, expected);
}

#[test]
fn boolean_rejects_words() {
    let mut value = false;
    assert!(value.set(RawValue::scalar("yes please")).is_err());
}

#[test]
fn floats_parse() {
    let mut value = 0.0_f64;
    value.set(RawValue::scalar("2.5")).expect("float parses");
    assert!((value - 2.5).abs() < f64::EPSILON);
}

#[rstest]
#[case("a,b,c", &["a", "b", "c"])]
#[case("a, b , c", &["a", "b", "c"])]
#[case("single", &["single"])]
#[case("[one, 'two three']", &["one", "two three"])]
#[case("", &[])]
fn lists_split_from_scalars(#[case] raw: &str, #[case] expected: &[&str]) {
    let mut value: Vec<String> = vec![String::from("stale")];
    value.set(RawValue::scalar(raw)).expect("list parses");
    assert_eq!(value, expected);
}

#[test]
fn lists_accept_native_sequences() {
    let mut value: Vec<String> = Vec::new();
    value
        .set(RawValue::List(vec![String::from("one"), String::from("two")]))
        .expect("list assigns");
    assert_eq!(value, ["one", "two"]);
}

#[test]
fn scalars_reject_lists_and_maps() {
    let mut text = String::from("keep");
    assert!(matches!(
        text.set(RawValue::List(vec![String::from("x")])),
        Err(CoerceError::Shape { expected: FieldKind::String, .. })
    ));
    assert!(text.set(RawValue::Map).is_err());
    assert_eq!(text, "keep");
}

#[rstest]
#[case::nested(RawValue::NestedList)]
#[case::map(RawValue::Map)]
#[case::not_unicode(RawValue::NotUnicode(String::from("a\u{fffd}")))]
fn lists_reject_values_they_cannot_hold(#[case] raw: RawValue) {
    let mut value = vec![String::from("keep")];
    assert!(value.set(raw).is_err());
    assert_eq!(value, ["keep"]);
}

#[test]
fn non_unicode_text_is_reported_as_such() {
    let mut port: u16 = 7;
    assert!(matches!(
        port.set(RawValue::NotUnicode(String::from("8\u{fffd}"))),
        Err(CoerceError::NotUnicode { .. })
    ));
    assert_eq!(port, 7);
}

#[test]
fn optional_fields_become_some() {
    let mut port: Option<u16> = None;
    port.set(RawValue::scalar("8080")).expect("port parses");
    assert_eq!(port, Some(8080));
    assert_eq!(port.render(), "8080");

    let mut path: Option<PathBuf> = None;
    assert_eq!(path.render(), "<unset>");
    path.set(RawValue::scalar("/etc/app")).expect("path assigns");
    assert_eq!(path, Some(PathBuf::from("/etc/app")));
}

#[test]
fn optional_field_survives_failed_parse() {
    let mut port: Option<u16> = Some(1);
    assert!(port.set(RawValue::scalar("99999")).is_err());
    assert_eq!(port, Some(1));
}
