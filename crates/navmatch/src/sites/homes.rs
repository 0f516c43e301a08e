//! Homes.com: slug paths (`/austin-tx/condos-for-sale/p-500k-1m/3-bed/`)
//! plus query parameters.

use std::sync::OnceLock;

use regex::Regex;

use super::{Dialect, Site};
use crate::extract::{is_numeric_segment, split_category_suffix, split_tokens};
use crate::location::LocationRule;
use crate::matcher::{ExtraPolicy, MatchPolicy, SetPolicy};
use crate::normalize::{clean_number, expand_or_keep};
use crate::tokenizer::TokenizedUrl;
use crate::types::{Category, FilterValue, Location, SearchRecord};

pub struct Homes;

const TRANSACTIONS: &[&str] = &["for-sale", "for-rent", "sold"];

const LISTING_CATEGORIES: &[&str] = &["new-homes", "new-construction", "foreclosures", "open-house"];

/// Query parameters holding a single number.
const NUMERIC_PARAMS: &[(&str, &str)] = &[
    ("price-min", "price_min"),
    ("price-max", "price_max"),
    ("beds-min", "beds_min"),
    ("beds-max", "beds_max"),
    ("bed-min", "beds_min"),
    ("bed-max", "beds_max"),
    ("baths-min", "baths_min"),
    ("bath-min", "baths_min"),
    ("baths-max", "baths_max"),
    ("bath-max", "baths_max"),
    ("sfmin", "sqft_min"),
    ("sfmax", "sqft_max"),
    ("yb-min", "year_built_min"),
    ("yb-max", "year_built_max"),
    ("gsr-min", "school_rating_min"),
    ("gsr-max", "school_rating_max"),
    ("st-min", "stories_min"),
    ("parking", "parking_spots"),
    ("ls-min", "lot_size_min"),
    ("pp-min", "price_per_sqft_min"),
    ("pp-max", "price_per_sqft_max"),
];

/// Query parameters holding comma-separated ids.
const SET_PARAMS: &[(&str, &str)] = &[
    ("property_type", "property_type_id"),
    ("listing_type", "listing_type_id"),
    ("am", "am"),
];

const SCALAR_PARAMS: &[&str] = &["sk", "bb"];

fn bed_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(studio|\d+)(?:-to-(\d+))?-bed").expect("bed regex is valid"))
}

fn bath_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)-ba").expect("bath regex is valid"))
}

fn style_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+?)-style-homes$").expect("style regex is valid"))
}

/// Keep digits and dots, then canonicalize (`$500,000+` → `500000`).
fn set_scalar(record: &mut SearchRecord, key: &str, value: String) {
    record.filters.insert(key.to_string(), FilterValue::Scalar(value));
}

/// Handle price, bed and bath slugs. Returns false when the segment is none of them.
fn parse_metric(record: &mut SearchRecord, segment: &str) -> bool {
    let mut matched = false;

    if segment == "studio" {
        set_scalar(record, "beds_min", "0".into());
        set_scalar(record, "beds_max", "0".into());
        matched = true;
    }

    if let Some(price) = segment.strip_prefix("p-") {
        let price = price.replace('+', "");
        match price.split_once('-') {
            Some((lo, hi)) => {
                set_scalar(record, "price_min", expand_or_keep(lo));
                set_scalar(record, "price_max", expand_or_keep(hi));
            }
            None => set_scalar(record, "price_min", expand_or_keep(&price)),
        }
        matched = true;
    } else if let Some(caps) = bed_regex().captures(segment) {
        let min = caps.get(1).map_or("0", |m| m.as_str());
        let min = if min == "studio" { "0" } else { min };
        set_scalar(record, "beds_min", clean_number(min));
        if let Some(max) = caps.get(2) {
            set_scalar(record, "beds_max", clean_number(max.as_str()));
        }
        matched = true;
    }

    if let Some(caps) = bath_regex().captures(segment) {
        if let Some(baths) = caps.get(1) {
            set_scalar(record, "baths_min", clean_number(baths.as_str()));
            matched = true;
        }
    }

    matched
}

fn parse_path(record: &mut SearchRecord, segments: &[String]) {
    let mut keywords: Vec<String> = Vec::new();

    for segment in segments {
        let segment = segment.as_str();

        if TRANSACTIONS.contains(&segment) {
            set_scalar(record, "transaction_type", segment.to_string());
            continue;
        }
        if let Some((property, transaction)) = split_category_suffix(segment, TRANSACTIONS) {
            set_scalar(record, "property_type_slug", property.to_string());
            set_scalar(record, "transaction_type", transaction.to_string());
            continue;
        }
        if LISTING_CATEGORIES.contains(&segment) {
            set_scalar(record, "listing_category", segment.to_string());
            continue;
        }
        if parse_metric(record, segment) {
            continue;
        }

        if is_numeric_segment(segment) {
            if record.location.is_empty() {
                record.location = Location::region(segment);
            }
            continue;
        }

        if record.location.is_empty() {
            record.location = Location::region(segment);
        } else if let Some(caps) = style_regex().captures(segment) {
            if let Some(style) = caps.get(1) {
                set_scalar(record, "architectural_style", style.as_str().to_string());
            }
        } else {
            keywords.push(segment.to_string());
        }
    }

    if !keywords.is_empty() {
        record.filters.insert("keywords".to_string(), FilterValue::set(keywords));
    }
}

fn parse_query(record: &mut SearchRecord, url: &TokenizedUrl) {
    for (param, key) in NUMERIC_PARAMS {
        if let Some(value) = url.query_first(param) {
            set_scalar(record, key, clean_number(value));
        }
    }
    for (param, key) in SET_PARAMS {
        if let Some(value) = url.query_first(param) {
            let items: Vec<&str> = split_tokens(value, &[',']).collect();
            record.filters.insert(key.to_string(), FilterValue::set(items));
        }
    }
    for param in SCALAR_PARAMS {
        if let Some(value) = url.query_first(param) {
            set_scalar(record, param, value.trim().to_string());
        }
    }
}

impl Dialect for Homes {
    fn site(&self) -> Site {
        Site::Homes
    }

    fn parse(&self, url: &TokenizedUrl) -> SearchRecord {
        let mut record = SearchRecord::new(Category::Unspecified);
        parse_path(&mut record, &url.segments);
        // Query parameters override path slugs.
        parse_query(&mut record, url);
        record
    }

    fn default_policy(&self) -> MatchPolicy {
        MatchPolicy::default()
            .with_sets(SetPolicy::Exact)
            .with_set_override("keywords", SetPolicy::Covering)
            .with_extras(ExtraPolicy::Permissive)
            .with_location(LocationRule::Substring)
    }
}
