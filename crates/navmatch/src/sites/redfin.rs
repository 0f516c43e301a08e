//! Redfin: `/city/<id>/<ST>/<City>/filter/k=v,k=v` URLs.

use std::sync::OnceLock;

use regex::Regex;

use super::{Dialect, Site};
use crate::extract::{IgnoreList, RawFilter};
use crate::location::LocationRule;
use crate::matcher::{ExtraPolicy, MatchPolicy, SetPolicy};
use crate::normalize::{expand_or_keep, AliasTable, BoundPair};
use crate::tokenizer::TokenizedUrl;
use crate::types::{Category, FilterValue, Location, SearchRecord};

pub struct Redfin;

const IGNORED: IgnoreList = IgnoreList {
    exact: &[
        "viewport",
        "no-outline",
        "redirect",
        "map_zoom",
        "zoomlevel",
        "v",
        "android_merchant_id",
        "myapp_param",
        "referrer",
        "sort",
    ],
    prefixes: &["utm_"],
};

const KEY_ALIASES: &[(&str, &str)] = &[
    ("max-days-on-market", "time-on-market"),
    ("days-on-market", "time-on-market"),
    ("min-stories", "num-stories-min"),
    ("max-stories", "num-stories-max"),
    ("num-stories", "num-stories-min"),
    ("has-waterfront", "water-front"),
    ("waterfront", "water-front"),
    ("has-water-front", "water-front"),
    ("view", "has-view"),
    ("has-pool", "pool-type"),
    ("pool", "pool-type"),
    ("garage", "has-garage"),
    ("elevator", "has-elevator"),
    ("parking", "has-parking"),
    ("has-washer-dryer", "washer-dryer"),
    ("washer-dryer-hookup", "washer-dryer"),
    ("has-fireplace", "fireplace"),
    ("has-basement", "basement-type"),
    ("basement", "basement-type"),
    ("allows-pets", "pets-allowed"),
    ("pet-friendly", "pets-allowed"),
    ("allows-dogs", "dogs-allowed"),
    ("dog-friendly", "dogs-allowed"),
    ("allows-cats", "cats-allowed"),
    ("cat-friendly", "cats-allowed"),
    ("furnished", "is-furnished"),
    ("fixer-upper", "is-fixer"),
    ("fixer", "is-fixer"),
    ("green", "is-green"),
    ("green-home", "is-green"),
    ("has-guest-house", "guest-house"),
    ("primary-bedroom-on-main", "primary-bed-on-main"),
    ("master-on-main", "primary-bed-on-main"),
    ("dishwasher", "has-dishwasher"),
    ("att-fiber", "has-att-fiber"),
    ("special-deal", "has-deal"),
    ("deal", "has-deal"),
];

const PROPERTY_TYPES: &[(&str, &str)] = &[
    ("house", "house"),
    ("houses", "house"),
    ("single-family", "house"),
    ("single-family-home", "house"),
    ("condo", "condo"),
    ("condos", "condo"),
    ("condominium", "condo"),
    ("townhouse", "townhouse"),
    ("townhouses", "townhouse"),
    ("townhome", "townhouse"),
    ("townhomes", "townhouse"),
    ("multifamily", "multifamily"),
    ("multi-family", "multifamily"),
    ("land", "land"),
    ("lot", "land"),
    ("lots", "land"),
    ("manufactured", "manufactured"),
    ("mobile", "manufactured"),
    ("co-op", "co-op"),
    ("coop", "co-op"),
    ("other", "other"),
];

/// Keys whose value is always a `+`-joined set, even with one member.
const SET_KEYS: &[&str] = &["property-type"];

const TIME_ON_MARKET: &[(&str, &str)] = &[
    ("1wk", "7days"),
    ("2wk", "14days"),
    ("3wk", "21days"),
    ("4wk", "28days"),
    ("1mo", "30days"),
    ("2mo", "60days"),
    ("3mo", "90days"),
    ("6mo", "180days"),
    ("1yr", "365days"),
];

const BOUNDS: &[BoundPair] = &[
    BoundPair {
        min_key: "min-beds",
        max_key: "max-beds",
        merged: "beds",
        lone_min: "min-beds",
        lone_max: "max-beds",
    },
    BoundPair {
        min_key: "min-baths",
        max_key: "max-baths",
        merged: "baths",
        lone_min: "min-baths",
        lone_max: "max-baths",
    },
    // A lone upper bound on stories means an exact story count.
    BoundPair {
        min_key: "num-stories-min",
        max_key: "num-stories-max",
        merged: "stories",
        lone_min: "min-stories",
        lone_max: "stories",
    },
];

fn key_aliases() -> &'static AliasTable {
    static TABLE: OnceLock<AliasTable> = OnceLock::new();
    TABLE.get_or_init(|| AliasTable::new(KEY_ALIASES))
}

fn property_types() -> &'static AliasTable {
    static TABLE: OnceLock<AliasTable> = OnceLock::new();
    TABLE.get_or_init(|| AliasTable::new(PROPERTY_TYPES))
}

fn digit_comma() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d),(\d)").expect("digit comma regex is valid"))
}

fn normalize_value(key: &str, value: &str) -> String {
    let value = value.trim();

    if key == "property-type" {
        return property_types().resolve(value);
    }
    if key.contains("price") && !key.contains("sqft") {
        return expand_or_keep(value);
    }
    if key.contains("sqft") || key.contains("lot-size") {
        let stripped = value.replace("-sqft", "").replace("sqft", "");
        return expand_or_keep(&stripped);
    }
    if key.contains("time") || key.contains("market") || key.contains("days") {
        if let Some((_, days)) = TIME_ON_MARKET.iter().find(|(raw, _)| *raw == value) {
            return days.to_string();
        }
        return value.to_string();
    }
    if key.contains("move-in-date") {
        let parts: Vec<&str> = value.split('/').collect();
        if let [month, day, year] = parts.as_slice() {
            if let (Ok(m), Ok(d)) = (month.parse::<u32>(), day.parse::<u32>()) {
                return format!("{m}/{d}/{year}");
            }
        }
    }
    value.to_string()
}

fn location_of(segments: &[String]) -> Location {
    let find = |kind: &str| segments.iter().position(|s| s == kind);

    if let Some(i) = find("neighborhood") {
        if let (Some(state), Some(city), Some(nbhd)) =
            (segments.get(i + 2), segments.get(i + 3), segments.get(i + 4))
        {
            return Location::region(&format!("{state} {city}")).with_sub_region(nbhd);
        }
    }
    if let Some(i) = find("city") {
        if let (Some(state), Some(city)) = (segments.get(i + 2), segments.get(i + 3)) {
            return Location::region(&format!("{state} {city}"));
        }
    }
    if let Some(i) = find("zipcode") {
        if let Some(zip) = segments.get(i + 1) {
            return Location::region(zip);
        }
    }
    Location::default()
}

fn is_rental(segments: &[String]) -> bool {
    segments
        .iter()
        .any(|s| s == "rentals" || s.starts_with("apartments-for-rent"))
}

impl Dialect for Redfin {
    fn site(&self) -> Site {
        Site::Redfin
    }

    fn parse(&self, url: &TokenizedUrl) -> SearchRecord {
        let segments = &url.segments;
        let category = if is_rental(segments) {
            Category::Rent
        } else {
            Category::Sale
        };
        let mut record = SearchRecord::new(category);
        record.location = location_of(segments);

        let Some(start) = segments.iter().position(|s| s == "filter") else {
            return record;
        };
        let joined = segments[start + 1..]
            .iter()
            .filter(|s| s.as_str() != "rentals")
            .cloned()
            .collect::<Vec<_>>()
            .join("/");
        let joined = digit_comma().replace_all(&joined, "${1}${2}");

        for token in joined.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let raw = RawFilter::parse(token, &['=']);
            if IGNORED.is_ignored(&raw.key) {
                continue;
            }
            let key = key_aliases().resolve(&raw.key);
            match raw.value {
                Some(value) if value.is_empty() => continue,
                Some(value) if value.contains('+') || SET_KEYS.contains(&key.as_str()) => {
                    let parts: Vec<String> = value
                        .split('+')
                        .map(str::trim)
                        .filter(|part| !part.is_empty())
                        .map(|part| normalize_value(&key, part))
                        .collect();
                    record.filters.insert(key, FilterValue::set(parts));
                }
                Some(value) => {
                    let normalized = normalize_value(&key, &value);
                    record.filters.insert(key, FilterValue::Scalar(normalized));
                }
                None => {
                    record.filters.insert(key, FilterValue::flag());
                }
            }
        }

        for pair in BOUNDS {
            pair.consolidate(&mut record.filters);
        }
        record
    }

    fn default_policy(&self) -> MatchPolicy {
        MatchPolicy::default()
            .with_sets(SetPolicy::Exact)
            .with_extras(ExtraPolicy::Strict)
            .with_location(LocationRule::Exact)
    }
}
