//! Filter extraction: raw `(key, value)` pairs from path segments, query
//! parameters and embedded JSON state.

use serde_json::Value;

/// A raw filter token before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFilter {
    pub key: String,
    /// `None` for presence-only flags.
    pub value: Option<String>,
}

impl RawFilter {
    pub fn flag(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }

    pub fn pair(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// Split `key=value` or `key:value` on the first separator found.
    /// A token without one is a flag.
    pub fn parse(token: &str, separators: &[char]) -> Self {
        let token = token.trim();
        match token.find(|c| separators.contains(&c)) {
            Some(idx) => Self::pair(&token[..idx], token[idx + 1..].trim()),
            None => Self::flag(token),
        }
    }
}

/// Keys dropped before normalization: UI state, sort, paging, telemetry.
pub struct IgnoreList {
    pub exact: &'static [&'static str],
    pub prefixes: &'static [&'static str],
}

impl IgnoreList {
    pub fn is_ignored(&self, key: &str) -> bool {
        let key = key.trim();
        self.exact.contains(&key) || self.prefixes.iter().any(|p| key.starts_with(p))
    }
}

/// Split a compound segment like `condos-for-sale` into `("condos", "for-sale")`.
pub fn split_category_suffix<'a>(
    segment: &'a str,
    suffixes: &[&'static str],
) -> Option<(&'a str, &'static str)> {
    suffixes.iter().find_map(|suffix| {
        segment
            .strip_suffix(suffix)
            .and_then(|head| head.strip_suffix('-'))
            .filter(|head| !head.is_empty())
            .map(|head| (head, *suffix))
    })
}

/// Pure digits, e.g. a zip code.
pub fn is_numeric_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Split a delimited value into trimmed, non-empty tokens.
pub fn split_tokens<'a>(value: &'a str, delimiters: &'a [char]) -> impl Iterator<Item = &'a str> {
    value
        .split(move |c| delimiters.contains(&c))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// One leaf found while walking an embedded JSON filter state.
#[derive(Debug, Clone, PartialEq)]
pub enum StateEntry {
    /// `{value: true|false|null}` or a bare boolean. `None` is JSON null.
    Toggle(Option<bool>),
    /// `{value: x}` with a non-boolean `x`, or a bare scalar.
    Scalar(String),
    /// One side of a `{min, max}` object.
    Bound { min: Option<String>, max: Option<String> },
    /// `{exact: x}`.
    Exact(String),
}

/// Render a JSON scalar as a string token. Objects and arrays yield `None`.
pub fn json_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Walk a filter-state object into `(key, entry)` leaves.
///
/// Nested objects that are not value/min/max/exact shaped are flattened
/// with `parent_child` keys.
pub fn flatten_state(state: &serde_json::Map<String, Value>) -> Vec<(String, StateEntry)> {
    let mut out = Vec::new();
    for (key, value) in state {
        walk(key, value, &mut out);
    }
    out
}

fn walk(key: &str, value: &Value, out: &mut Vec<(String, StateEntry)>) {
    match value {
        Value::Object(obj) => {
            if let Some(v) = obj.get("value") {
                let entry = match v {
                    Value::Bool(b) => StateEntry::Toggle(Some(*b)),
                    Value::Null => StateEntry::Toggle(None),
                    other => match json_scalar(other) {
                        Some(s) if !s.is_empty() => StateEntry::Scalar(s),
                        _ => return,
                    },
                };
                out.push((key.to_string(), entry));
            } else if obj.contains_key("min") || obj.contains_key("max") {
                let min = obj.get("min").and_then(json_scalar);
                let max = obj.get("max").and_then(json_scalar);
                if min.is_some() || max.is_some() {
                    out.push((key.to_string(), StateEntry::Bound { min, max }));
                }
            } else if let Some(exact) = obj.get("exact").and_then(json_scalar) {
                out.push((key.to_string(), StateEntry::Exact(exact)));
            } else {
                for (sub_key, sub_value) in obj {
                    walk(&format!("{key}_{sub_key}"), sub_value, out);
                }
            }
        }
        Value::Bool(b) => out.push((key.to_string(), StateEntry::Toggle(Some(*b)))),
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                if let Some(s) = json_scalar(item) {
                    out.push((key.to_string(), StateEntry::Scalar(s)));
                }
            }
        }
        other => {
            if let Some(s) = json_scalar(other).filter(|s| !s.is_empty()) {
                out.push((key.to_string(), StateEntry::Scalar(s)));
            }
        }
    }
}
