//! StreetEasy: `/for-rent/<borough>[/<neighborhood>]/price:-3000|beds>=2|amenities:doorman`.

use std::sync::OnceLock;

use super::{Dialect, Site};
use crate::extract::{split_tokens, RawFilter};
use crate::location::{LocationResolver, LocationRule};
use crate::matcher::{ExtraPolicy, MatchPolicy, SetPolicy};
use crate::normalize::{comparator, is_truthy, numeric_value, AliasTable};
use crate::tokenizer::TokenizedUrl;
use crate::types::{Category, FilterValue, SearchRecord};

pub struct StreetEasy;

const CATEGORIES: &[(&str, Category)] = &[
    ("for-sale", Category::Sale),
    ("for-rent", Category::Rent),
    ("sold", Category::Sold),
    ("past-sales", Category::Sold),
];

const IGNORED_FILTERS: &[&str] = &["in_rect"];

/// Extra words StreetEasy uses for "true".
const TRUTHY_WORDS: &[&str] = &["new development", "pre-war", "pre_war", "prewar"];

const FILTER_ALIASES: &[(&str, &str)] = &[
    ("bedrooms", "beds"),
    ("bed", "beds"),
    ("bedroom", "beds"),
    ("bathrooms", "baths"),
    ("bath", "baths"),
    ("bathroom", "baths"),
    ("sq_ft", "sqft"),
    ("square_feet", "sqft"),
    ("pet", "pets"),
    ("no_fee", "no_fee"),
    ("nofee", "no_fee"),
    ("short_term", "short_term"),
    ("by_owner", "owner"),
    ("pre_war", "prewar"),
    ("new_development", "new_development"),
    ("new_developments", "new_development"),
    ("new_dev", "new_development"),
    ("income_restricted", "income_restricted"),
    ("sale_type", "sale_type"),
    ("common_charges", "common_charges"),
    ("days_on_market", "days_on_market"),
    ("transit_lines", "subway"),
    ("transit", "subway"),
    ("transit_line", "subway"),
    ("3d_tour", "virtual_tour"),
    ("video_tour", "virtual_tour"),
];

const AMENITY_ALIASES: &[(&str, &str)] = &[
    ("fitness", "gym"),
    ("swimming_pool", "pool"),
    ("laundry_in_building", "laundry"),
    ("garage_parking", "garage"),
    ("bike_room", "bike_room"),
    ("roof_deck", "roof_deck"),
    ("common_outdoor_space", "common_outdoor"),
    ("shared_outdoor_space", "common_outdoor"),
    ("live_in_super", "live_in_super"),
    ("central_air", "central_air"),
    ("in_unit_laundry", "in_unit_laundry"),
    ("washer_dryer", "in_unit_laundry"),
    ("outdoor_space", "outdoor_space"),
    ("private_outdoor_space", "outdoor_space"),
    ("pied_a_terre", "pied_a_terre"),
    ("home_office", "home_office"),
    ("eat_in_kitchen", "eat_in_kitchen"),
    ("walk_in_closet", "walk_in_closet"),
    ("no_fee", "no_fee"),
];

/// Property type names to StreetEasy building codes.
const TYPE_CODES: &[(&str, &str)] = &[
    ("condo", "D1"),
    ("condos", "D1"),
    ("condominium", "D1"),
    ("coop", "P1"),
    ("coops", "P1"),
    ("co-op", "P1"),
    ("co_op", "P1"),
    ("cooperative", "P1"),
    ("condop", "D2"),
    ("condops", "D2"),
    ("cond-op", "D2"),
    ("condo-op", "D2"),
    ("condo_op", "D2"),
    ("townhouse", "D3"),
    ("townhouses", "D3"),
    ("house", "D4"),
    ("houses", "D4"),
    ("single_family", "D4"),
    ("single-family", "D4"),
    ("multi_family", "D5"),
    ("multi-family", "D5"),
    ("multifamily", "D5"),
];

const STATUS_ALIASES: &[(&str, &str)] = &[
    ("active", "open"),
    ("unavailable", "closed"),
    ("in-contract", "in_contract"),
    ("contract", "in_contract"),
];

const PRICE_KEYS: &[&str] = &["price", "maintenance", "taxes", "common_charges", "ppsf"];

const BOOLEAN_KEYS: &[&str] = &[
    "no_fee",
    "furnished",
    "short_term",
    "owner",
    "guarantors_accepted",
    "prewar",
    "new_development",
    "income_restricted",
    "virtual_tour",
    "open_house",
];

fn filter_aliases() -> &'static AliasTable {
    static TABLE: OnceLock<AliasTable> = OnceLock::new();
    TABLE.get_or_init(|| AliasTable::new(FILTER_ALIASES))
}

fn amenity_aliases() -> &'static AliasTable {
    static TABLE: OnceLock<AliasTable> = OnceLock::new();
    TABLE.get_or_init(|| AliasTable::new(AMENITY_ALIASES))
}

fn type_codes() -> &'static AliasTable {
    static TABLE: OnceLock<AliasTable> = OnceLock::new();
    TABLE.get_or_init(|| AliasTable::new(TYPE_CODES))
}

fn status_aliases() -> &'static AliasTable {
    static TABLE: OnceLock<AliasTable> = OnceLock::new();
    TABLE.get_or_init(|| AliasTable::new(STATUS_ALIASES))
}

fn is_filter_segment(segment: &str) -> bool {
    segment.contains(':') || segment.contains(">=") || segment.contains('|')
}

const RESOLVER: LocationResolver<'static> = LocationResolver {
    categories: CATEGORIES,
    default_category: Category::Sale,
    is_filter: is_filter_segment,
    take_sub_region: true,
};

fn type_code(raw: &str) -> String {
    match type_codes().get(raw) {
        Some(code) => code.to_string(),
        None => raw.to_uppercase(),
    }
}

/// Normalize one raw filter into a canonical key and value.
fn normalize(key: &str, value: &str) -> (String, FilterValue) {
    let key = key.trim();
    let value = value.trim();

    if key == "amenities" || key == "opt_amenities" {
        let items: Vec<String> = split_tokens(value, &[','])
            .map(|a| amenity_aliases().resolve(&a.replace('-', "_")))
            .collect();
        return ("amenities".to_string(), FilterValue::set(items));
    }

    let key = filter_aliases().resolve(&key.replace('-', "_"));
    let value = match key.as_str() {
        "type" => FilterValue::set(split_tokens(value, &[',']).map(type_code).collect::<Vec<_>>()),
        "status" => FilterValue::Scalar(status_aliases().resolve(value)),
        k if PRICE_KEYS.contains(&k) => numeric_value(&value.replace(',', "")),
        "pets" if is_truthy(value, TRUTHY_WORDS) => FilterValue::flag(),
        "sqft" | "beds" | "baths" => numeric_value(&value.replace(',', "")),
        k if BOOLEAN_KEYS.contains(&k) => {
            if is_truthy(value, TRUTHY_WORDS) {
                FilterValue::flag()
            } else {
                FilterValue::Scalar(value.to_string())
            }
        }
        "subway" => FilterValue::set(
            split_tokens(value, &[','])
                .map(str::to_uppercase)
                .collect::<Vec<_>>(),
        ),
        _ => FilterValue::Scalar(value.to_string()),
    };
    (key, value)
}

fn split_filter(token: &str) -> Option<RawFilter> {
    if let Some((key, value)) = comparator(token) {
        return Some(RawFilter::pair(key, value));
    }
    match RawFilter::parse(token, &[':']) {
        raw @ RawFilter { value: Some(_), .. } => Some(raw),
        _ => None,
    }
}

impl Dialect for StreetEasy {
    fn site(&self) -> Site {
        Site::Streeteasy
    }

    fn parse(&self, url: &TokenizedUrl) -> SearchRecord {
        let resolved = RESOLVER.resolve(&url.segments);
        let mut record = SearchRecord::new(resolved.category);
        record.location = resolved.location;

        let joined = resolved.rest.join("/");
        for token in split_tokens(&joined, &['|']) {
            let Some(raw) = split_filter(token) else {
                tracing::debug!(token, "unparseable filter token");
                continue;
            };
            let key = raw.key.replace('-', "_");
            if IGNORED_FILTERS.contains(&key.as_str()) {
                continue;
            }
            let (key, value) = normalize(&key, raw.value.as_deref().unwrap_or_default());
            record.merge_filter(key, value);
        }
        record
    }

    fn default_policy(&self) -> MatchPolicy {
        MatchPolicy::default()
            .with_sets(SetPolicy::Exact)
            .with_extras(ExtraPolicy::Permissive)
            .with_location(LocationRule::SubRegion)
    }
}
