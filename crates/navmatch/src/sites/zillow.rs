//! Zillow: filters live in a JSON blob under the `searchQueryState` query
//! parameter.

use std::collections::BTreeSet;

use serde_json::Value;

use super::{Dialect, Site};
use crate::extract::{flatten_state, StateEntry};
use crate::location::LocationRule;
use crate::matcher::{ExtraPolicy, MatchPolicy, SetPolicy};
use crate::normalize::{canonical_number, infer_negative};
use crate::tokenizer::TokenizedUrl;
use crate::types::{Category, FilterValue, Location, ParseFailure, SearchRecord};

pub struct Zillow;

const STATE_PARAM: &str = "searchquerystate";

const IGNORED: &[&str] = &[
    "pagination",
    "mapbounds",
    "ismapvisible",
    "islistvisible",
    "mapzoom",
    "customregionid",
    "sort",
    "fr",
];

const INVALID_PATHS: &[&str] = &[
    "/error",
    "/captcha",
    "/404",
    "/login",
    "/register",
    "/user/",
    "/myzillow",
    "/profile",
];

const RENT_PATTERNS: &[&str] = &["/homes/for_rent/", "for_rent", "/rentals/", "/apartments-for-rent/"];
const SOLD_PATTERNS: &[&str] = &["/homes/recently_sold/", "recently_sold", "/sold/"];

/// Path segments that carry no location.
const STRUCTURAL: &[&str] = &[
    "homes",
    "for_sale",
    "for_rent",
    "recently_sold",
    "rentals",
    "apartments-for-rent",
    "sold",
];

const PROPERTY_ABBREVIATIONS: &[(&str, &str)] = &[
    ("sf", "ishouse"),
    ("tow", "istownhouse"),
    ("mf", "ismultifamily"),
    ("con", "iscondo"),
    ("land", "islotland"),
    ("apa", "isapartment"),
    ("apco", "isapartment"),
    ("manu", "ismanufactured"),
];

const PROPERTY_TYPES: &[&str] = &[
    "ishouse",
    "istownhouse",
    "ismultifamily",
    "iscondo",
    "islotland",
    "isapartment",
    "ismanufactured",
];

const LISTING_TYPES: &[&str] = &["fsba", "fsbo", "nc", "fore", "auc"];

fn canonical_property(key: &str) -> Option<&'static str> {
    PROPERTY_ABBREVIATIONS
        .iter()
        .find(|(abbr, _)| *abbr == key)
        .map(|(_, canonical)| *canonical)
        .or_else(|| PROPERTY_TYPES.iter().copied().find(|t| *t == key))
}

fn is_ignored(key: &str) -> bool {
    IGNORED
        .iter()
        .any(|ignored| key == *ignored || key.starts_with(&format!("{ignored}_")))
}

/// Numbers are canonicalized, anything else is kept lower-cased.
fn normalize_value(raw: &str) -> String {
    let value = raw.trim().to_lowercase();
    canonical_number(&value).unwrap_or(value)
}

fn category_of(path: &str) -> Category {
    if RENT_PATTERNS.iter().any(|p| path.contains(p)) {
        Category::Rent
    } else if SOLD_PATTERNS.iter().any(|p| path.contains(p)) {
        Category::Sold
    } else {
        Category::Sale
    }
}

fn location_of(segments: &[String]) -> Location {
    segments
        .iter()
        .find(|s| !STRUCTURAL.contains(&s.as_str()) && !s.ends_with("_p"))
        .map(|s| Location::region(s.trim_end_matches("_rb")))
        .unwrap_or_default()
}

fn decode_state(raw: &str) -> Result<serde_json::Map<String, Value>, ParseFailure> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ParseFailure::InvalidState("not an object".to_string())),
        Err(e) => Err(ParseFailure::InvalidState(e.to_string())),
    }
}

#[derive(Default)]
struct Toggles {
    property_true: BTreeSet<String>,
    property_false: BTreeSet<String>,
    listing_true: BTreeSet<String>,
    listing_false: BTreeSet<String>,
}

fn apply_filter_state(record: &mut SearchRecord, filter_state: &serde_json::Map<String, Value>) {
    let mut toggles = Toggles::default();

    for (key, entry) in flatten_state(filter_state) {
        if is_ignored(&key) {
            continue;
        }
        let property = canonical_property(&key);
        let listing = LISTING_TYPES.contains(&key.as_str());

        match entry {
            StateEntry::Toggle(Some(true)) => {
                let canonical = property.map(str::to_string).unwrap_or_else(|| key.clone());
                if property.is_some() {
                    toggles.property_true.insert(canonical.clone());
                }
                if listing {
                    toggles.listing_true.insert(key.clone());
                }
                record.filters.insert(canonical, FilterValue::flag());
            }
            StateEntry::Toggle(_) => {
                if let Some(canonical) = property {
                    toggles.property_false.insert(canonical.to_string());
                }
                if listing {
                    toggles.listing_false.insert(key);
                }
            }
            StateEntry::Scalar(value) => {
                record
                    .filters
                    .insert(key, FilterValue::Scalar(normalize_value(&value)));
            }
            StateEntry::Bound { min, max } => {
                if let Some(min) = min {
                    record
                        .filters
                        .insert(format!("{key}_min"), FilterValue::Scalar(normalize_value(&min)));
                }
                if let Some(max) = max {
                    record
                        .filters
                        .insert(format!("{key}_max"), FilterValue::Scalar(normalize_value(&max)));
                }
            }
            StateEntry::Exact(value) => {
                record
                    .filters
                    .insert(format!("{key}_exact"), FilterValue::Scalar(normalize_value(&value)));
            }
        }
    }

    let inferred = infer_negative(PROPERTY_TYPES, &toggles.property_true, &toggles.property_false)
        .into_iter()
        .chain(infer_negative(
            LISTING_TYPES,
            &toggles.listing_true,
            &toggles.listing_false,
        ));
    for key in inferred {
        tracing::debug!(key, "inferred from negative encoding");
        record.filters.insert(key.to_string(), FilterValue::flag());
    }
}

impl Dialect for Zillow {
    fn site(&self) -> Site {
        Site::Zillow
    }

    fn parse(&self, url: &TokenizedUrl) -> SearchRecord {
        let mut record = SearchRecord::new(category_of(&url.path()));
        record.location = location_of(&url.segments);

        let Some(raw_state) = url.query_first(STATE_PARAM) else {
            return record;
        };
        let state = match decode_state(raw_state) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable search state");
                return record;
            }
        };

        if let Some(term) = state
            .get("userssearchterm")
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
        {
            record.location = Location::region(term);
        }

        if let Some(Value::Object(filter_state)) = state.get("filterstate") {
            apply_filter_state(&mut record, filter_state);
        }

        record
    }

    fn default_policy(&self) -> MatchPolicy {
        MatchPolicy::default()
            .with_sets(SetPolicy::Exact)
            .with_extras(ExtraPolicy::Permissive)
            .with_location(LocationRule::Substring)
    }

    fn accepts(&self, url: &TokenizedUrl) -> bool {
        let path = url.path();
        url.host == "zillow.com" && !INVALID_PATHS.iter().any(|p| path.contains(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::compare;
    use crate::tokenizer::tokenize;

    fn state_url(state: &str) -> String {
        format!("https://www.zillow.com/austin-tx/?searchQueryState={state}")
    }

    fn parse(url: &str) -> SearchRecord {
        Site::Zillow.parse_url(url).unwrap()
    }

    #[test]
    fn test_category_from_path() {
        assert_eq!(parse("https://www.zillow.com/homes/for_rent/").category, Category::Rent);
        assert_eq!(parse("https://www.zillow.com/austin-tx/sold/").category, Category::Sold);
        assert_eq!(parse("https://www.zillow.com/homes/Austin-TX_rb/").category, Category::Sale);
    }

    #[test]
    fn test_location_slug_and_search_term() {
        let r = parse("https://www.zillow.com/homes/Austin-TX_rb/");
        assert_eq!(r.location.region.as_deref(), Some("austin tx"));

        let r = parse(
            r#"https://www.zillow.com/homes/for_sale/?searchQueryState={"usersSearchTerm":"Los Angeles CA"}"#,
        );
        assert_eq!(r.location.region.as_deref(), Some("los angeles ca"));
    }

    #[test]
    fn test_bounds_and_values() {
        let r = parse(&state_url(
            r#"{"filterState":{"price":{"min":500000,"max":750000.0},"beds":{"min":3},"doz":{"value":"7"}}}"#,
        ));
        assert_eq!(r.filters["price_min"], FilterValue::scalar("500000"));
        assert_eq!(r.filters["price_max"], FilterValue::scalar("750000"));
        assert_eq!(r.filters["beds_min"], FilterValue::scalar("3"));
        assert_eq!(r.filters["doz"], FilterValue::scalar("7"));
    }

    #[test]
    fn test_encoded_ampersand_inside_state() {
        let url_with_beds = |beds: u32| {
            let state = format!(
                r#"{{"usersSearchTerm":"Bed & Breakfast TX","filterState":{{"beds":{{"min":{beds}}}}}}}"#
            );
            state_url(&urlencoding::encode(&state))
        };

        let gt = parse(&url_with_beds(3));
        assert_eq!(gt.location.region.as_deref(), Some("bed & breakfast tx"));
        assert_eq!(gt.filters["beds_min"], FilterValue::scalar("3"));

        let (ok, details) = compare(&parse(&url_with_beds(2)), &gt, &Zillow.default_policy());
        assert!(!ok);
        assert!(details.mismatch_for("beds_min").is_some());
    }

    #[test]
    fn test_abbreviated_property_types() {
        let a = parse(&state_url(r#"{"filterState":{"con":{"value":true}}}"#));
        let b = parse(&state_url(r#"{"filterState":{"isCondo":{"value":true}}}"#));
        assert_eq!(a.filters, b.filters);
        assert_eq!(a.filters["iscondo"], FilterValue::flag());
    }

    #[test]
    fn test_negative_encoding_infers_houses() {
        let r = parse(&state_url(
            r#"{"filterState":{"tow":{"value":false},"mf":{"value":false},"land":{"value":false},"con":{"value":false},"apa":{"value":false},"apco":{"value":false},"manu":{"value":false}}}"#,
        ));
        assert_eq!(r.filters.get("ishouse"), Some(&FilterValue::flag()));
        assert_eq!(r.filters.len(), 1);
    }

    #[test]
    fn test_negative_encoding_two_types() {
        let r = parse(&state_url(
            r#"{"filterState":{"mf":{"value":false},"land":{"value":false},"con":{"value":false},"apa":{"value":false},"manu":{"value":false}}}"#,
        ));
        assert!(r.filters.contains_key("ishouse"));
        assert!(r.filters.contains_key("istownhouse"));
    }

    #[test]
    fn test_listing_status_inference_and_rental_escape() {
        let r = parse(&state_url(
            r#"{"filterState":{"fsba":{"value":false},"fsbo":{"value":false},"fore":{"value":false},"auc":{"value":false}}}"#,
        ));
        assert_eq!(r.filters.get("nc"), Some(&FilterValue::flag()));

        let r = parse(&state_url(
            r#"{"filterState":{"fsba":{"value":false},"fsbo":{"value":false},"nc":{"value":false},"fore":{"value":false},"auc":{"value":false}}}"#,
        ));
        assert!(r.filters.is_empty());
    }

    #[test]
    fn test_ignored_keys_and_sort() {
        let r = parse(&state_url(
            r#"{"pagination":{},"mapBounds":{"west":-98.1,"east":-97.5},"isMapVisible":true,"filterState":{"sort":{"value":"globalrelevanceex"},"fr":{"value":true}},"sortSelection":{"value":"days"}}"#,
        ));
        assert!(r.filters.is_empty());
    }

    #[test]
    fn test_invalid_json_fails_soft() {
        let r = parse(&state_url("{not json"));
        assert!(r.filters.is_empty());
        assert_eq!(r.location.region.as_deref(), Some("austin tx"));
    }

    #[test]
    fn test_accepts_rejects_foreign_and_error_pages() {
        assert!(Zillow.accepts(&tokenize("https://www.zillow.com/austin-tx/").unwrap()));
        assert!(!Zillow.accepts(&tokenize("https://fake-zillow.com/austin-tx/").unwrap()));
        assert!(!Zillow.accepts(&tokenize("https://www.zillow.com/captcha/").unwrap()));
    }

    #[test]
    fn test_extra_filters_allowed() {
        let gt = parse(&state_url(r#"{"filterState":{"beds":{"min":3}}}"#));
        let agent = parse(&state_url(
            r#"{"filterState":{"beds":{"min":3},"hasPool":{"value":true}}}"#,
        ));
        let (ok, details) = compare(&agent, &gt, &Zillow.default_policy());
        assert!(ok);
        assert_eq!(details.extra_filters, vec!["haspool".to_string()]);
    }
}
