//! Alias and value normalization shared by every site dialect.
//!
//! Each step returns `Result<_, ParseFailure>`; callers decide whether a
//! failure keeps the raw token or drops the field.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::OnceLock;

use regex::Regex;

use crate::types::{Category, FilterValue, ParseFailure, SearchRecord};

/// Tokens every dialect treats as "true".
pub const TRUTHY: &[&str] = &["1", "true", "yes", "on", "allowed"];

/// True when `value` is one of [`TRUTHY`] or one of the dialect's `extra` words.
pub fn is_truthy(value: &str, extra: &[&str]) -> bool {
    let v = value.trim();
    TRUTHY.contains(&v) || extra.contains(&v)
}

/// Render a number without a trailing `.0`.
pub fn canonical_number(raw: &str) -> Result<String, ParseFailure> {
    let trimmed = raw.trim();
    let n: f64 = trimmed
        .parse()
        .map_err(|_| ParseFailure::NotNumeric(trimmed.to_string()))?;
    if !n.is_finite() {
        return Err(ParseFailure::NotNumeric(trimmed.to_string()));
    }
    Ok(format_number(n))
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Expand `500k` to `500000` and `2.5m` to `2500000`.
///
/// Commas, `$` and whitespace are stripped first. Plain numbers are
/// canonicalized; anything else is a [`ParseFailure::NotNumeric`].
pub fn expand_abbreviation(raw: &str) -> Result<String, ParseFailure> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '$') && !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    let (digits, factor) = if let Some(d) = cleaned.strip_suffix('k') {
        (d, 1_000.0)
    } else if let Some(d) = cleaned.strip_suffix('m') {
        (d, 1_000_000.0)
    } else {
        (cleaned.as_str(), 1.0)
    };

    let n: f64 = digits
        .parse()
        .map_err(|_| ParseFailure::NotNumeric(raw.to_string()))?;
    if !n.is_finite() {
        return Err(ParseFailure::NotNumeric(raw.to_string()));
    }
    Ok(format_number((n * factor).round()))
}

/// Fail-soft wrapper around [`expand_abbreviation`].
pub fn expand_or_keep(raw: &str) -> String {
    expand_abbreviation(raw).unwrap_or_else(|_| raw.trim().to_string())
}

/// Keep only digits and the decimal point, then canonicalize. Slug numbers
/// like `$500,000+` or `3000sf` come out bare; non-numbers are kept trimmed.
pub fn clean_number(raw: &str) -> String {
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    canonical_number(&digits).unwrap_or_else(|_| raw.trim().to_string())
}

fn bound_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\$?[0-9][0-9,]*(?:\.[0-9]+)?[km]?$").expect("bound regex is valid")
    })
}

/// True when `raw` looks like one side of a numeric range.
pub fn is_bound(raw: &str) -> bool {
    bound_regex().is_match(raw.trim())
}

/// Split `min-max` into optional bounds. `na` or an empty side is unbounded.
///
/// Both present sides must look numeric, otherwise the token is not a range
/// (`single-family-home` is a word, not an interval).
pub fn split_range(raw: &str) -> Result<(Option<String>, Option<String>), ParseFailure> {
    let value = raw.trim();
    let (lo, hi) = value
        .split_once('-')
        .ok_or_else(|| ParseFailure::NotRange(value.to_string()))?;

    let side = |s: &str| -> Result<Option<String>, ParseFailure> {
        let s = s.trim();
        if s.is_empty() || s == "na" || s == "any" {
            Ok(None)
        } else if is_bound(s) {
            expand_abbreviation(s).map(Some)
        } else {
            Err(ParseFailure::NotRange(value.to_string()))
        }
    };

    let bounds = (side(lo)?, side(hi)?);
    if bounds == (None, None) && !value.contains("na") {
        return Err(ParseFailure::NotRange(value.to_string()));
    }
    Ok(bounds)
}

/// Parse a single numeric token or a range into a filter value.
///
/// Falls back to the raw token as a scalar.
pub fn numeric_value(raw: &str) -> FilterValue {
    let value = raw.trim();
    if value.contains('-') {
        if let Ok((min, max)) = split_range(value) {
            return FilterValue::range(min, max);
        }
    }
    FilterValue::Scalar(expand_or_keep(value))
}

/// Rewrite a `key>=N` comparator into `(key, "N-")`.
pub fn comparator(token: &str) -> Option<(&str, String)> {
    token
        .split_once(">=")
        .map(|(key, value)| (key.trim(), format!("{}-", value.trim())))
}

/// Infer the selected members of a closed set from explicitly-false flags.
///
/// Only answers when nothing is explicitly true and the complement is a
/// strict, non-empty subset of the closed set.
pub fn infer_negative(
    closed: &[&'static str],
    explicit_true: &BTreeSet<String>,
    explicit_false: &BTreeSet<String>,
) -> Vec<&'static str> {
    if explicit_false.is_empty() || !explicit_true.is_empty() {
        return Vec::new();
    }
    let selected: Vec<&'static str> = closed
        .iter()
        .copied()
        .filter(|member| !explicit_false.contains(*member))
        .collect();
    if selected.is_empty() || selected.len() == closed.len() {
        return Vec::new();
    }
    selected
}

/// Many-to-one lookup from raw tokens to canonical ones.
pub struct AliasTable {
    map: HashMap<&'static str, &'static str>,
}

impl AliasTable {
    pub fn new(pairs: &[(&'static str, &'static str)]) -> Self {
        Self {
            map: pairs.iter().copied().collect(),
        }
    }

    /// Canonical form if known, trying `-`/`_` variants.
    pub fn get(&self, raw: &str) -> Option<&'static str> {
        let key = raw.trim();
        self.map
            .get(key)
            .or_else(|| self.map.get(key.replace('-', "_").as_str()))
            .or_else(|| self.map.get(key.replace('_', "-").as_str()))
            .copied()
    }

    /// Canonical form, or the input unchanged. Unknown tokens are never dropped.
    pub fn resolve(&self, raw: &str) -> String {
        self.get(raw)
            .map(str::to_string)
            .unwrap_or_else(|| raw.trim().to_string())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Two keys holding the lower and upper bound of one concept.
#[derive(Debug, Clone, Copy)]
pub struct BoundPair {
    pub min_key: &'static str,
    pub max_key: &'static str,
    /// Key the merged range lands on.
    pub merged: &'static str,
    /// Key a lone lower bound is renamed to.
    pub lone_min: &'static str,
    /// Key a lone upper bound is renamed to.
    pub lone_max: &'static str,
}

impl BoundPair {
    /// Merge the pair into one range when both bounds are scalars.
    ///
    /// `min == max` collapses to an exact scalar, so `beds=3` and
    /// `min-beds=3,max-beds=3` land on the same value.
    pub fn consolidate(&self, filters: &mut BTreeMap<String, FilterValue>) {
        let min = filters.remove(self.min_key);
        let max = filters.remove(self.max_key);
        match (min, max) {
            (Some(FilterValue::Scalar(lo)), Some(FilterValue::Scalar(hi))) => {
                filters.insert(self.merged.to_string(), FilterValue::range(Some(lo), Some(hi)));
            }
            (Some(lo), Some(hi)) => {
                filters.insert(self.min_key.to_string(), lo);
                filters.insert(self.max_key.to_string(), hi);
            }
            (Some(lo), None) => {
                filters.insert(self.lone_min.to_string(), lo);
            }
            (None, Some(hi)) => {
                filters.insert(self.lone_max.to_string(), hi);
            }
            (None, None) => {}
        }
    }
}

/// A legacy endpoint that means the canonical endpoint plus a flag.
#[derive(Debug, Clone, Copy)]
pub struct Equivalence {
    pub category: Category,
    pub canonical: Category,
    pub flag: &'static str,
}

/// Rewrite legacy categories into their canonical category plus flag.
pub fn apply_equivalences(record: &mut SearchRecord, table: &[Equivalence]) {
    for eq in table {
        if record.category == eq.category {
            record.category = eq.canonical;
            record
                .filters
                .insert(eq.flag.to_string(), FilterValue::flag());
        }
    }
}
