//! Rent.com: `/<state>/<city>[-apartments]/<chunk>_<chunk>_...` URLs.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use super::{Dialect, Site};
use crate::extract::split_tokens;
use crate::location::LocationRule;
use crate::matcher::{ExtraPolicy, MatchPolicy, SetPolicy};
use crate::normalize::clean_number;
use crate::tokenizer::TokenizedUrl;
use crate::types::{Category, FilterValue, Location, SearchRecord};

pub struct Rent;

const PROPERTY_TYPES: &[&str] = &["apartments", "townhouses", "condos", "houses"];

fn city_type_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(.+?)-(apartments|houses|townhouses|condos)$").expect("city regex is valid")
    })
}

fn count_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)-(bedroom|bathroom)s?$").expect("count regex is valid"))
}

/// Value after the last `-` in a chunk like `max-price-2000`.
fn trailing_number(chunk: &str) -> String {
    clean_number(chunk.rsplit('-').next().unwrap_or(chunk))
}

#[derive(Default)]
struct Sets {
    property_types: BTreeSet<String>,
    beds: BTreeSet<String>,
    baths: BTreeSet<String>,
    amenities: BTreeSet<String>,
}

impl Sets {
    fn store(self, record: &mut SearchRecord) {
        for (key, set) in [
            ("property_types", self.property_types),
            ("beds", self.beds),
            ("baths", self.baths),
            ("amenities", self.amenities),
        ] {
            if !set.is_empty() {
                record.filters.insert(key.to_string(), FilterValue::set(set));
            }
        }
    }
}

fn parse_chunk(record: &mut SearchRecord, sets: &mut Sets, chunk: &str) {
    if PROPERTY_TYPES.contains(&chunk) {
        sets.property_types.insert(chunk.to_string());
    } else if chunk.starts_with("max-price-") {
        record
            .filters
            .insert("price_max".into(), FilterValue::Scalar(trailing_number(chunk)));
    } else if chunk.starts_with("min-price-") {
        record
            .filters
            .insert("price_min".into(), FilterValue::Scalar(trailing_number(chunk)));
    } else if chunk.starts_with("sqft-min-") {
        record
            .filters
            .insert("sqft_min".into(), FilterValue::Scalar(trailing_number(chunk)));
    } else if chunk == "studio" {
        sets.beds.insert("0".into());
    } else if let Some(caps) = count_regex().captures(chunk) {
        let n = caps[1].to_string();
        if &caps[2] == "bedroom" {
            sets.beds.insert(n);
        } else {
            sets.baths.insert(n);
        }
    } else if chunk.starts_with("sort-") {
        tracing::debug!(chunk, "ignoring sort order");
    } else {
        sets.amenities.insert(chunk.to_string());
    }
}

impl Dialect for Rent {
    fn site(&self) -> Site {
        Site::Rent
    }

    fn parse(&self, url: &TokenizedUrl) -> SearchRecord {
        let mut record = SearchRecord::new(Category::Rent);
        let mut sets = Sets::default();
        let segments = &url.segments;

        let state = segments.first().map(String::as_str).unwrap_or_default();
        match segments.get(1) {
            Some(city) => {
                let city = match city_type_regex().captures(city) {
                    Some(caps) => {
                        sets.property_types.insert(caps[2].to_string());
                        caps[1].to_string()
                    }
                    None => city.clone(),
                };
                record.location = Location::region(&format!("{state} {city}"));
            }
            None if !state.is_empty() => record.location = Location::region(state),
            None => {}
        }

        if let Some(chunks) = segments.get(2) {
            for chunk in split_tokens(chunks, &['_']) {
                parse_chunk(&mut record, &mut sets, chunk);
            }
        }

        for (param, key) in [("min_price", "price_min"), ("max_price", "price_max")] {
            if let Some(value) = url.query_first(param) {
                record
                    .filters
                    .insert(key.to_string(), FilterValue::Scalar(clean_number(value)));
            }
        }
        if let Some(types) = url.query_first("property-type") {
            sets.property_types
                .extend(split_tokens(types, &[',']).map(str::to_string));
        }

        sets.store(&mut record);
        record
    }

    fn default_policy(&self) -> MatchPolicy {
        MatchPolicy::default()
            .with_sets(SetPolicy::Covering)
            .with_extras(ExtraPolicy::Permissive)
            .with_location(LocationRule::Substring)
    }
}
