//! Comparison values and the equality rules assertions are built on.
//!
//! Loose mode mirrors the coercions test authors expect from a dynamic host
//! (`1 == "1"`, `true == 1`, `null` only equal to `null`). Strict mode is plain
//! structural equality of the tagged value.

use crate::host::ElementRef;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EqualityMode {
    #[default]
    Loose,
    Strict,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Element(ElementRef),
    Seq(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    pub fn seq<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Seq(items.into_iter().map(Into::into).collect())
    }

    pub fn object<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_seq(&self) -> bool {
        matches!(self, Self::Seq(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Self::Seq(_) | Self::Object(_) | Self::Element(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Self::Str(_))
    }

    /// True for containers without entries and for every non-container value.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Seq(items) => items.is_empty(),
            Self::Object(map) => map.is_empty(),
            Self::Element(_) => false,
            _ => true,
        }
    }

    /// Indexable view: sequences, and non-empty strings as a sequence of characters.
    pub fn as_sequence(&self) -> Option<Cow<'_, [Value]>> {
        match self {
            Self::Seq(items) => Some(Cow::Borrowed(items.as_slice())),
            Self::Str(s) if !s.is_empty() => Some(Cow::Owned(
                s.chars().map(|c| Self::Str(c.to_string())).collect(),
            )),
            _ => None,
        }
    }

    fn entries(&self) -> Option<BTreeMap<String, &Value>> {
        match self {
            Self::Object(map) => Some(map.iter().map(|(k, v)| (k.clone(), v)).collect()),
            Self::Seq(items) => Some(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), v))
                    .collect(),
            ),
            _ => None,
        }
    }

    fn to_number(&self) -> f64 {
        match self {
            Self::Null => 0.0,
            Self::Bool(b) => bool_to_number(*b),
            Self::Number(n) => *n,
            Self::Str(s) => string_to_number(s),
            other => string_to_number(&other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::Str(s) => f.write_str(s),
            Self::Element(el) => f.write_str(&el.label()),
            Self::Seq(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|v| match v {
                        Self::Null => String::new(),
                        other => other.to_string(),
                    })
                    .collect();
                f.write_str(&parts.join(","))
            }
            Self::Object(_) => f.write_str("[object Object]"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Self::Number(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<ElementRef> for Value {
    fn from(v: ElementRef) -> Self {
        Self::Element(v)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(v: Vec<V>) -> Self {
        Self::seq(v)
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(v: Option<V>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

pub fn values_equal(a: &Value, b: &Value, mode: EqualityMode) -> bool {
    match mode {
        EqualityMode::Loose => loose_equals(a, b),
        EqualityMode::Strict => strict_equals(a, b),
    }
}

pub fn strict_equals(a: &Value, b: &Value) -> bool {
    a == b
}

pub fn loose_equals(a: &Value, b: &Value) -> bool {
    use Value::*;
    match (a, b) {
        (Null, Null) => true,
        (Null, _) | (_, Null) => false,
        (Bool(x), Bool(y)) => x == y,
        (Number(x), Number(y)) => x == y,
        (Str(x), Str(y)) => x == y,
        (Element(x), Element(y)) => x == y,
        (Seq(x), Seq(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| loose_equals(l, r))
        }
        (Object(x), Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, l)| y.get(k).is_some_and(|r| loose_equals(l, r)))
        }
        (Bool(x), other) => loose_equals(&Number(bool_to_number(*x)), other),
        (other, Bool(y)) => loose_equals(other, &Number(bool_to_number(*y))),
        (Number(x), Str(_)) => *x == b.to_number(),
        (Str(_), Number(y)) => a.to_number() == *y,
        (Seq(_) | Object(_) | Element(_), Number(_) | Str(_)) => {
            loose_equals(&Str(a.to_string()), b)
        }
        (Number(_) | Str(_), Seq(_) | Object(_) | Element(_)) => {
            loose_equals(a, &Str(b.to_string()))
        }
        _ => false,
    }
}

/// Both sides indexable, same length, every element equal under `mode`.
pub fn sequence_equals(a: &Value, b: &Value, mode: EqualityMode) -> bool {
    match (a.as_sequence(), b.as_sequence()) {
        (Some(left), Some(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .zip(right.iter())
                    .all(|(l, r)| values_equal(l, r, mode))
        }
        _ => false,
    }
}

/// Shallow structural equality over the union of both sides' keys.
///
/// A key missing on one side only matches an explicit `null` on the other, and only in
/// loose mode.
pub fn structurally_equivalent(a: &Value, b: &Value, mode: EqualityMode) -> bool {
    if let (Value::Element(x), Value::Element(y)) = (a, b) {
        return x == y;
    }
    let (Some(left), Some(right)) = (a.entries(), b.entries()) else {
        return false;
    };
    let keys: BTreeSet<&String> = left.keys().chain(right.keys()).collect();
    let equivalent = keys.into_iter().all(|key| match (left.get(key), right.get(key)) {
        (Some(l), Some(r)) => values_equal(l, r, mode),
        (Some(v), None) | (None, Some(v)) => {
            mode == EqualityMode::Loose && matches!(v, Value::Null)
        }
        (None, None) => true,
    });
    equivalent
}

/// `[ a, b, c ]` with elements rendered as `tag#id`.
pub fn serialize_sequence(value: &Value) -> String {
    let parts: Vec<String> = value
        .as_sequence()
        .map(|items| {
            items
                .iter()
                .map(|item| match item {
                    Value::Element(el) => el.label(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();
    format!("[ {} ]", parts.join(", "))
}

fn bool_to_number(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    let numeric = trimmed
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if numeric {
        trimmed.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".into();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.into();
    }
    if n == 0.0 {
        return "0".into();
    }
    if n.fract() == 0.0 && n.abs() < 1e21 {
        return format!("{n:.0}");
    }
    format!("{n}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(node: usize, tag: &str, id: Option<&str>) -> Value {
        Value::Element(ElementRef::new(node, tag, id.map(str::to_string)))
    }

    #[test]
    fn sequence_equals_matches_equal_sequences() {
        let a = Value::seq([1, 2, 3]);
        let b = Value::seq([1, 2, 3]);
        assert!(sequence_equals(&a, &b, EqualityMode::Loose));
        assert!(sequence_equals(&a, &b, EqualityMode::Strict));
    }

    #[test]
    fn sequence_equals_rejects_length_mismatch() {
        let a = Value::seq([1, 2]);
        let b = Value::seq([1, 2, 3]);
        assert!(!sequence_equals(&a, &b, EqualityMode::Loose));
    }

    #[test]
    fn sequence_equals_coerces_only_in_loose_mode() {
        let a = Value::Seq(vec![1.into(), "2".into(), 3.into()]);
        let b = Value::seq([1, 2, 3]);
        assert!(sequence_equals(&a, &b, EqualityMode::Loose));
        assert!(!sequence_equals(&a, &b, EqualityMode::Strict));
    }

    #[test]
    fn sequence_equals_requires_indexable_values() {
        assert!(!sequence_equals(&Value::Null, &Value::Null, EqualityMode::Loose));
        assert!(!sequence_equals(
            &Value::from(3),
            &Value::seq([3]),
            EqualityMode::Loose
        ));
        assert!(sequence_equals(
            &Value::from("ab"),
            &Value::seq(["a", "b"]),
            EqualityMode::Strict
        ));
        assert!(sequence_equals(
            &Value::seq(Vec::<Value>::new()),
            &Value::seq(Vec::<Value>::new()),
            EqualityMode::Strict
        ));
    }

    #[test]
    fn loose_equality_coercions() {
        assert!(loose_equals(&Value::from(1), &Value::from("1")));
        assert!(loose_equals(&Value::from(" 2 "), &Value::from(2)));
        assert!(loose_equals(&Value::from(true), &Value::from(1)));
        assert!(loose_equals(&Value::from(false), &Value::from("0")));
        assert!(loose_equals(&Value::from(""), &Value::from(0)));
        assert!(!loose_equals(&Value::Null, &Value::from(0)));
        assert!(!loose_equals(&Value::Null, &Value::from(false)));
        assert!(!loose_equals(&Value::from(f64::NAN), &Value::from(f64::NAN)));
        assert!(!loose_equals(&Value::from("abc"), &Value::from(0)));
        assert!(loose_equals(&Value::seq([1, 2]), &Value::from("1,2")));
    }

    #[test]
    fn elements_compare_by_node_identity() {
        let a = el(4, "div", Some("main"));
        let b = el(4, "div", Some("main"));
        let c = el(5, "div", Some("main"));
        assert!(loose_equals(&a, &b));
        assert!(!loose_equals(&a, &c));
        assert!(!strict_equals(&a, &c));
    }

    #[test]
    fn structural_equivalence_covers_keys_from_both_sides() {
        let a = Value::object([("x", Value::from(1)), ("y", Value::from("2"))]);
        let b = Value::object([("x", Value::from("1")), ("y", Value::from(2))]);
        assert!(structurally_equivalent(&a, &b, EqualityMode::Loose));
        assert!(!structurally_equivalent(&a, &b, EqualityMode::Strict));

        let extra = Value::object([
            ("x", Value::from(1)),
            ("y", Value::from(2)),
            ("z", Value::from(3)),
        ]);
        assert!(!structurally_equivalent(&a, &extra, EqualityMode::Loose));
        assert!(!structurally_equivalent(&extra, &a, EqualityMode::Loose));
    }

    #[test]
    fn structural_equivalence_missing_key_matches_null_only_loosely() {
        let a = Value::object([("x", Value::from(1))]);
        let b = Value::object([("x", Value::from(1)), ("y", Value::Null)]);
        assert!(structurally_equivalent(&a, &b, EqualityMode::Loose));
        assert!(!structurally_equivalent(&a, &b, EqualityMode::Strict));
    }

    #[test]
    fn structural_equivalence_rejects_non_objects() {
        assert!(!structurally_equivalent(
            &Value::Null,
            &Value::object([("x", 1)]),
            EqualityMode::Loose
        ));
        assert!(!structurally_equivalent(
            &Value::from("x"),
            &Value::from("x"),
            EqualityMode::Loose
        ));
    }

    #[test]
    fn structural_equivalence_is_shallow() {
        let inner = Value::object([("k", 1)]);
        let a = Value::object([("nested", inner.clone())]);
        let b = Value::object([("nested", inner)]);
        assert!(structurally_equivalent(&a, &b, EqualityMode::Strict));
    }

    #[test]
    fn serialize_sequence_renders_elements_and_values() {
        let v = Value::Seq(vec![
            el(1, "DIV", Some("main")),
            el(2, "span", None),
            Value::from(3),
            Value::from("x"),
        ]);
        assert_eq!(serialize_sequence(&v), "[ div#main, span, 3, x ]");
        assert_eq!(serialize_sequence(&Value::Null), "[  ]");
    }

    #[test]
    fn display_formats_numbers_like_host_strings() {
        assert_eq!(Value::from(3).to_string(), "3");
        assert_eq!(Value::from(0.5).to_string(), "0.5");
        assert_eq!(Value::from(-0.0).to_string(), "0");
        assert_eq!(Value::from(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(Value::Seq(vec![1.into(), Value::Null, 2.into()]).to_string(), "1,,2");
    }

    #[test]
    fn type_predicates() {
        assert!(Value::seq([1]).is_seq());
        assert!(Value::object([("a", 1)]).is_object());
        assert!(el(1, "p", None).is_object());
        assert!(Value::from("s").is_string());
        assert!(Value::object(Vec::<(String, Value)>::new()).is_empty());
        assert!(!Value::seq([1]).is_empty());
        assert!(Value::from(5).is_empty());
    }
}
