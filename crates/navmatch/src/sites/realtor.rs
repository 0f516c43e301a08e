//! Realtor.com: `/realestateandhomes-search/<City_ST>/beds-3/price-na-500000`.

use std::sync::OnceLock;

use super::{Dialect, Site};
use crate::location::{LocationResolver, LocationRule};
use crate::matcher::{ExtraPolicy, MatchPolicy, SetPolicy};
use crate::normalize::{apply_equivalences, numeric_value, AliasTable, Equivalence};
use crate::tokenizer::TokenizedUrl;
use crate::types::{Category, FilterValue, SearchRecord};

pub struct Realtor;

const CATEGORIES: &[(&str, Category)] = &[
    ("realestateandhomes-search", Category::Sale),
    ("apartments", Category::Rent),
    ("rentals", Category::Rent),
    ("apartments-for-rent", Category::Rent),
    ("houses-for-rent", Category::Rent),
    ("sold-homes", Category::Sold),
    ("open-houses", Category::OpenHouses),
    ("realestateandhomes-detail", Category::Detail),
];

const FILTER_PREFIXES: &[&str] = &[
    "beds-",
    "baths-",
    "price-",
    "type-",
    "sqft-",
    "show-",
    "sby-",
    "pg-",
    "lot-",
    "age-",
    "year-built-",
    "garage-",
    "pool-",
    "stories-",
    "hoa-",
    "radius-",
    "dom-",
    "days-",
    "commute-",
    "sold-within-",
    "features-",
    "with_",
];

/// Rental filters that appear as bare segments.
const STANDALONE_FLAGS: &[&str] = &[
    "dog-friendly",
    "cat-friendly",
    "pet-friendly",
    "laundry",
    "dishwasher",
    "parking",
    "furnished",
    "income-restricted",
    "senior-living",
    "short-term",
];

const IGNORED_PREFIXES: &[&str] = &["sby-", "pg-"];

/// Prefixes whose value is a plain number or numeric range.
const NUMERIC_PREFIXES: &[(&str, &str)] = &[
    ("beds-", "beds"),
    ("baths-", "baths"),
    ("sqft-", "sqft"),
    ("lot-", "lot"),
    ("age-", "age"),
    ("year-built-", "year-built"),
    ("stories-", "stories"),
    ("garage-", "garage"),
    ("dom-", "days-on-market"),
    ("days-", "days-on-market"),
    ("radius-", "radius"),
    ("commute-", "commute"),
    ("sold-within-", "sold-within"),
];

const PROPERTY_TYPES: &[(&str, &str)] = &[
    ("single-family-home", "single-family-home"),
    ("house", "single-family-home"),
    ("houses", "single-family-home"),
    ("single-family", "single-family-home"),
    ("sfh", "single-family-home"),
    ("single_family_home", "single-family-home"),
    ("condo", "condo"),
    ("condos", "condo"),
    ("condominium", "condo"),
    ("condominiums", "condo"),
    ("townhome", "townhome"),
    ("townhomes", "townhome"),
    ("townhouse", "townhome"),
    ("townhouses", "townhome"),
    ("multi-family-home", "multi-family-home"),
    ("multi-family", "multi-family-home"),
    ("multifamily", "multi-family-home"),
    ("multi_family", "multi-family-home"),
    ("multi_family_home", "multi-family-home"),
    ("land", "land"),
    ("lot", "land"),
    ("lots", "land"),
    ("lots-land", "land"),
    ("farm", "farm"),
    ("farms", "farm"),
    ("ranch", "farm"),
    ("ranches", "farm"),
    ("mobile-home", "mobile-home"),
    ("mobile", "mobile-home"),
    ("mobile_home", "mobile-home"),
    ("manufactured", "mobile-home"),
    ("co-op", "co-op"),
    ("coop", "co-op"),
    ("co_op", "co-op"),
    ("cooperative", "co-op"),
    ("apartment", "apartments"),
    ("apartments", "apartments"),
];

const SHOW_FLAGS: &[(&str, &str)] = &[
    ("open-house", "open-house"),
    ("open-houses", "open-house"),
    ("openhouse", "open-house"),
    ("recently-sold", "recently-sold"),
    ("sold", "recently-sold"),
    ("new-construction", "new-construction"),
    ("new-homes", "new-construction"),
    ("price-reduced", "price-reduced"),
    ("price-drop", "price-reduced"),
    ("foreclosure", "foreclosure"),
    ("foreclosures", "foreclosure"),
];

/// Legacy endpoints that equal the search endpoint plus a show flag.
const EQUIVALENCES: &[Equivalence] = &[
    Equivalence {
        category: Category::Sold,
        canonical: Category::Sale,
        flag: "show-recently-sold",
    },
    Equivalence {
        category: Category::OpenHouses,
        canonical: Category::Sale,
        flag: "show-open-house",
    },
];

fn property_types() -> &'static AliasTable {
    static TABLE: OnceLock<AliasTable> = OnceLock::new();
    TABLE.get_or_init(|| AliasTable::new(PROPERTY_TYPES))
}

fn show_flags() -> &'static AliasTable {
    static TABLE: OnceLock<AliasTable> = OnceLock::new();
    TABLE.get_or_init(|| AliasTable::new(SHOW_FLAGS))
}

fn is_filter_segment(segment: &str) -> bool {
    FILTER_PREFIXES.iter().any(|p| segment.starts_with(p)) || STANDALONE_FLAGS.contains(&segment)
}

const RESOLVER: LocationResolver<'static> = LocationResolver {
    categories: CATEGORIES,
    default_category: Category::Sale,
    is_filter: is_filter_segment,
    take_sub_region: false,
};

/// Multi-value segments use either separator: `type-condo,house` or `type-condo+house`.
const LIST_SEPARATORS: [char; 2] = [',', '+'];

/// Parse one filter segment into a canonical key and value.
fn parse_segment(segment: &str) -> Option<(String, FilterValue)> {
    if IGNORED_PREFIXES.iter().any(|p| segment.starts_with(p)) {
        return None;
    }
    if let Some(flag) = segment.strip_prefix("show-") {
        return Some((format!("show-{}", show_flags().resolve(flag)), FilterValue::flag()));
    }
    if let Some(kind) = segment.strip_prefix("type-") {
        let types: Vec<String> = kind
            .split(LIST_SEPARATORS)
            .filter(|t| !t.is_empty())
            .map(|t| property_types().resolve(t))
            .collect();
        return Some(("type".to_string(), FilterValue::set(types)));
    }
    if let Some(features) = segment.strip_prefix("features-") {
        let items: Vec<&str> = features
            .split(LIST_SEPARATORS)
            .filter(|t| !t.is_empty())
            .collect();
        return Some(("features".to_string(), FilterValue::set(items)));
    }
    for prefix in ["price-", "hoa-"] {
        if let Some(value) = segment.strip_prefix(prefix) {
            return Some((prefix.trim_end_matches('-').to_string(), numeric_value(value)));
        }
    }
    for (prefix, key) in NUMERIC_PREFIXES {
        if let Some(value) = segment.strip_prefix(prefix) {
            return Some((key.to_string(), numeric_value(&value.replace(',', ""))));
        }
    }
    if segment.starts_with("with_") {
        return Some((segment.to_string(), FilterValue::flag()));
    }
    tracing::debug!(segment, "unrecognized segment kept as flag");
    Some((segment.to_string(), FilterValue::flag()))
}

impl Dialect for Realtor {
    fn site(&self) -> Site {
        Site::Realtor
    }

    fn parse(&self, url: &TokenizedUrl) -> SearchRecord {
        let resolved = RESOLVER.resolve(&url.segments);
        let mut record = SearchRecord::new(resolved.category);
        record.location = resolved.location;

        for segment in resolved.rest {
            if let Some((key, value)) = parse_segment(segment) {
                record.merge_filter(key, value);
            }
        }

        apply_equivalences(&mut record, EQUIVALENCES);
        record
    }

    fn default_policy(&self) -> MatchPolicy {
        MatchPolicy::default()
            .with_sets(SetPolicy::Exact)
            .with_extras(ExtraPolicy::Permissive)
            .with_location(LocationRule::Exact)
    }

    fn accepts(&self, url: &TokenizedUrl) -> bool {
        url.host == "realtor.com"
    }
}
