//! Core data types for canonical search records and verification results.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Search category resolved from a URL path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Sale,
    Rent,
    Sold,
    OpenHouses,
    /// A single listing page rather than a search.
    Detail,
    /// The site does not encode a category in the URL.
    #[default]
    Unspecified,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Sale => "sale",
            Category::Rent => "rent",
            Category::Sold => "sold",
            Category::OpenHouses => "open_houses",
            Category::Detail => "detail",
            Category::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Region plus optional sub-region, both separator-normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_region: Option<String>,
}

impl Location {
    /// Build a location from a raw region token.
    pub fn region(raw: &str) -> Self {
        Self {
            region: non_empty(crate::location::normalize_location(raw)),
            sub_region: None,
        }
    }

    /// Attach a raw sub-region token.
    pub fn with_sub_region(mut self, raw: &str) -> Self {
        self.sub_region = non_empty(crate::location::normalize_location(raw));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.region.is_none() && self.sub_region.is_none()
    }

    /// The most specific place named: sub-region when present, else region.
    pub fn effective(&self) -> Option<&str> {
        self.sub_region.as_deref().or(self.region.as_deref())
    }

    /// Region and sub-region joined with a space.
    pub fn flattened(&self) -> String {
        match (&self.region, &self.sub_region) {
            (Some(r), Some(s)) => format!("{r} {s}"),
            (Some(r), None) => r.clone(),
            (None, Some(s)) => s.clone(),
            (None, None) => String::new(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.region, &self.sub_region) {
            (Some(r), Some(s)) => write!(f, "{r}/{s}"),
            (Some(r), None) => f.write_str(r),
            (None, Some(s)) => write!(f, "/{s}"),
            (None, None) => Ok(()),
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Numeric interval; `None` on either side means unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub min: Option<String>,
    pub max: Option<String>,
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let min = self.min.as_deref().unwrap_or("na");
        let max = self.max.as_deref().unwrap_or("na");
        write!(f, "{min}-{max}")
    }
}

/// A normalized filter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FilterValue {
    Scalar(String),
    Range(Range),
    Set(BTreeSet<String>),
    Boolean(bool),
}

impl FilterValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        FilterValue::Scalar(value.into())
    }

    /// Build a range, collapsing `min == max` to an exact scalar.
    pub fn range(min: Option<String>, max: Option<String>) -> Self {
        match (min, max) {
            (Some(lo), Some(hi)) if lo == hi => FilterValue::Scalar(lo),
            (min, max) => FilterValue::Range(Range { min, max }),
        }
    }

    /// Build a set from tokens; blanks are dropped.
    pub fn set<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterValue::Set(
            items
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        )
    }

    pub fn flag() -> Self {
        FilterValue::Boolean(true)
    }

    /// View as an unordered set. Scalars are singletons.
    pub fn as_set(&self) -> Option<BTreeSet<&str>> {
        match self {
            FilterValue::Set(items) => Some(items.iter().map(String::as_str).collect()),
            FilterValue::Scalar(s) => Some(std::iter::once(s.as_str()).collect()),
            _ => None,
        }
    }

    /// Re-apply structural invariants. A no-op on parser output.
    pub fn normalized(&self) -> Self {
        match self {
            FilterValue::Range(r) => FilterValue::range(r.min.clone(), r.max.clone()),
            FilterValue::Set(items) => FilterValue::set(items.iter().cloned()),
            other => other.clone(),
        }
    }

    /// Union two values into a set. Non-set-like values are replaced.
    pub fn merged_with(self, other: FilterValue) -> FilterValue {
        match (self.as_set(), other.as_set()) {
            (Some(a), Some(b)) => {
                FilterValue::set(a.into_iter().chain(b).map(str::to_string).collect::<Vec<_>>())
            }
            _ => other,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Scalar(s) => f.write_str(s),
            FilterValue::Range(r) => write!(f, "{r}"),
            FilterValue::Set(items) => {
                let joined: Vec<&str> = items.iter().map(String::as_str).collect();
                f.write_str(&joined.join(","))
            }
            FilterValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// The canonical, comparable form of a parsed search URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub category: Category,
    pub location: Location,
    pub filters: BTreeMap<String, FilterValue>,
}

impl SearchRecord {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            ..Self::default()
        }
    }

    /// Insert a filter, unioning with an existing set-like value under the same key.
    pub fn merge_filter(&mut self, key: impl Into<String>, value: FilterValue) {
        let key = key.into();
        let merged = match self.filters.remove(&key) {
            Some(existing) => existing.merged_with(value),
            None => value,
        };
        self.filters.insert(key, merged);
    }

    /// Re-normalize every filter value.
    pub fn normalized(&self) -> Self {
        Self {
            category: self.category,
            location: self.location.clone(),
            filters: self
                .filters
                .iter()
                .map(|(k, v)| (k.clone(), v.normalized()))
                .collect(),
        }
    }
}

/// What kind of disagreement a mismatch records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    Category,
    Location,
    MissingFilter,
    WrongValue,
    ExtraFilter,
    ParseError,
    NoAgentUrl,
}

/// A single field-level mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mismatch {
    pub kind: MismatchKind,
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Mismatch {
    pub fn new(kind: MismatchKind, field: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            agent_value: None,
            expected_value: None,
            message: None,
        }
    }

    pub fn values(mut self, agent: Option<String>, expected: Option<String>) -> Self {
        self.agent_value = agent;
        self.expected_value = expected;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// One field the match engine looked at, pass or fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldCheck {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_value: Option<String>,
    pub passed: bool,
}

/// Structured diagnostic produced alongside a verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetails {
    /// Ground-truth alternative these details were computed against.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ground_truth_url: String,
    pub checks: Vec<FieldCheck>,
    pub mismatches: Vec<Mismatch>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_filters: Vec<String>,
}

impl MatchDetails {
    pub fn has_mismatch(&self, kind: MismatchKind) -> bool {
        self.mismatches.iter().any(|m| m.kind == kind)
    }

    /// First mismatch on the given field, if any.
    pub fn mismatch_for(&self, field: &str) -> Option<&Mismatch> {
        self.mismatches.iter().find(|m| m.field == field)
    }
}

/// Result of `Verifier::compute`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub score: f64,
    #[serde(rename = "match")]
    pub is_match: bool,
    pub agent_url: String,
    pub matched_ground_truth_url: String,
    pub details: MatchDetails,
}

/// Errors that can occur while building a verifier.
#[derive(thiserror::Error, Debug)]
pub enum VerifyError {
    #[error("Ground truth set is empty")]
    EmptyGroundTruth,

    #[error("Ground truth #{index} is blank")]
    BlankGroundTruth { index: usize },

    #[error("Malformed URL {url:?}: {reason}")]
    MalformedUrl { url: String, reason: String },

    #[error("Unknown site: {0}")]
    UnknownSite(String),

    #[error("Invalid match policy: {0}")]
    InvalidPolicy(String),
}

/// A normalization step that could not interpret its input.
///
/// Never escapes the parser: callers keep the raw token or drop the field.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("not a number: {0:?}")]
    NotNumeric(String),

    #[error("not a range: {0:?}")]
    NotRange(String),

    #[error("invalid embedded state: {0}")]
    InvalidState(String),
}

/// Convenience result type.
pub type VerifyResult<T> = Result<T, VerifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_collapses_when_bounds_equal() {
        let v = FilterValue::range(Some("3".into()), Some("3".into()));
        assert_eq!(v, FilterValue::scalar("3"));
    }

    #[test]
    fn test_range_keeps_open_side() {
        let v = FilterValue::range(Some("500000".into()), None);
        assert_eq!(v.to_string(), "500000-na");
    }

    #[test]
    fn test_set_is_sorted_and_deduplicated() {
        let v = FilterValue::set(["house", "condo", "house", ""]);
        assert_eq!(v.to_string(), "condo,house");
    }

    #[test]
    fn test_merge_unions_sets() {
        let merged = FilterValue::scalar("d1").merged_with(FilterValue::set(["p1", "d1"]));
        assert_eq!(merged, FilterValue::set(["d1", "p1"]));
    }

    #[test]
    fn test_location_effective_prefers_sub_region() {
        let loc = Location::region("manhattan").with_sub_region("upper-west-side");
        assert_eq!(loc.effective(), Some("upper west side"));
        assert_eq!(loc.to_string(), "manhattan/upper west side");
    }

    #[test]
    fn test_result_serializes_match_key() {
        let result = VerificationResult {
            score: 1.0,
            is_match: true,
            agent_url: "a".into(),
            matched_ground_truth_url: "g".into(),
            details: MatchDetails::default(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["match"], true);
        assert_eq!(json["matchedGroundTruthUrl"], "g");
    }
}
