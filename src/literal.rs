//! Scalar literal classification and schema-guided coercion.

use crate::schema::MemberKind;
use crate::value::Value;
use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("number pattern"));

pub(crate) static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern"));

/// Is `raw` a bracket-delimited literal `[...]`?
pub fn is_bracketed(raw: &str) -> bool {
    raw.len() >= 2 && raw.starts_with('[') && raw.ends_with(']')
}

/// Strip `[...]` and unescape `\]`. Anything else passes through.
pub fn unwrap_literal(raw: &str) -> String {
    if is_bracketed(raw) {
        raw[1..raw.len() - 1].replace("\\]", "]")
    } else {
        raw.to_string()
    }
}

/// Classify a raw atom. Numbers win; bracketed literals are unwrapped and
/// become a Date when the inner text has the `YYYY-MM-DD` shape, text
/// otherwise; everything else is text.
pub fn atom_to_value(raw: &str) -> Value {
    if NUMBER_RE.is_match(raw) {
        if let Ok(n) = raw.parse::<f64>() {
            return Value::Number(n);
        }
    }
    if is_bracketed(raw) {
        let inner = unwrap_literal(raw);
        if DATE_RE.is_match(&inner) {
            return Value::Date(inner);
        }
        return Value::Text(inner);
    }
    Value::Text(raw.to_string())
}

/// Coerce a raw atom to a member kind. Never fails: shapes that do not fit
/// fall back to text.
pub fn coerce(raw: &str, kind: Option<&MemberKind>, choices: &[String]) -> Value {
    match kind {
        Some(MemberKind::Number | MemberKind::Float) => {
            let text = unwrap_literal(raw);
            match text.trim().parse::<f64>() {
                Ok(n) => Value::Number(n),
                Err(_) => {
                    trace!(raw, "number coercion fell back to text");
                    Value::Text(text)
                }
            }
        }
        Some(MemberKind::Date | MemberKind::DateTime) => Value::Date(unwrap_literal(raw)),
        Some(MemberKind::Bool) => {
            let text = unwrap_literal(raw).to_lowercase();
            Value::Bool(matches!(text.as_str(), "true" | "1" | "yes" | "t"))
        }
        Some(MemberKind::Enum) => Value::Enum {
            value: unwrap_literal(raw),
            choices: choices.to_vec(),
        },
        _ => atom_to_value(raw),
    }
}
