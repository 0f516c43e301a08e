//! Location resolution: category prefix, region and optional sub-region.

use serde::{Deserialize, Serialize};

use crate::types::{Category, Location};

/// How two locations are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationRule {
    /// Region and sub-region must both be equal.
    #[default]
    Exact,
    /// Equal when the effective sub-regions agree, so
    /// `borough/neighborhood` matches a bare `neighborhood`.
    SubRegion,
    /// Either flattened location contains the other. Skipped when the
    /// expected location is empty.
    Substring,
}

/// Lower-case, turn separators into spaces, drop commas, collapse whitespace.
pub fn normalize_location(raw: &str) -> String {
    let replaced: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| *c != ',')
        .map(|c| match c {
            '-' | '_' | '+' => ' ',
            other => other,
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Output of [`LocationResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<'a> {
    pub category: Category,
    pub location: Location,
    /// Segments left over for the filter extractor.
    pub rest: &'a [String],
}

/// Walks leading path segments: an optional category keyword, then a
/// location unless the next segment is already filter-shaped.
pub struct LocationResolver<'t> {
    pub categories: &'t [(&'static str, Category)],
    pub default_category: Category,
    pub is_filter: fn(&str) -> bool,
    /// Consume a second non-filter segment as the sub-region.
    pub take_sub_region: bool,
}

impl<'t> LocationResolver<'t> {
    /// Look up a category keyword.
    pub fn category_of(&self, segment: &str) -> Option<Category> {
        self.categories
            .iter()
            .find(|(keyword, _)| *keyword == segment)
            .map(|(_, category)| *category)
    }

    pub fn resolve<'a>(&self, segments: &'a [String]) -> Resolved<'a> {
        let mut rest = segments;
        let mut category = self.default_category;

        if let Some(first) = rest.first() {
            if let Some(found) = self.category_of(first) {
                category = found;
                rest = &rest[1..];
            }
        }

        let mut location = Location::default();
        if let Some(seg) = rest.first() {
            if !(self.is_filter)(seg) {
                location = Location::region(seg);
                rest = &rest[1..];

                if self.take_sub_region {
                    if let Some(sub) = rest.first() {
                        if !(self.is_filter)(sub) {
                            location = location.with_sub_region(sub);
                            rest = &rest[1..];
                        }
                    }
                }
            }
        }

        Resolved {
            category,
            location,
            rest,
        }
    }
}

/// Compare an agent location against the expected one under `rule`.
pub fn locations_match(agent: &Location, expected: &Location, rule: LocationRule) -> bool {
    match rule {
        LocationRule::Exact => agent == expected,
        LocationRule::SubRegion => {
            agent == expected
                || (agent.effective().is_some() && agent.effective() == expected.effective())
        }
        LocationRule::Substring => {
            let gt = expected.flattened();
            if gt.is_empty() {
                return true;
            }
            let ag = agent.flattened();
            !ag.is_empty() && (ag.contains(&gt) || gt.contains(&ag))
        }
    }
}
