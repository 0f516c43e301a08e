//! Match engine: compares two canonical search records under a policy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::location::{locations_match, LocationRule};
use crate::normalize::is_truthy;
use crate::types::{FieldCheck, FilterValue, MatchDetails, Mismatch, MismatchKind, SearchRecord};

/// How set-valued filters are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetPolicy {
    /// Agent set must equal the expected set.
    #[default]
    Exact,
    /// Agent set must contain every expected member.
    Covering,
}

/// What happens to agent filters the ground truth does not mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraPolicy {
    /// Recorded in the diagnostic, not a failure.
    #[default]
    Permissive,
    /// Any extra filter fails the match.
    Strict,
}

/// Whether comparison stops at the first failing field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    #[default]
    FirstFailure,
    Exhaustive,
}

/// Per-verifier comparison policy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchPolicy {
    pub sets: SetPolicy,
    /// Per-key overrides of `sets`.
    pub set_overrides: BTreeMap<String, SetPolicy>,
    pub extras: ExtraPolicy,
    pub location: LocationRule,
    pub report: ReportMode,
}

impl MatchPolicy {
    pub fn with_sets(mut self, sets: SetPolicy) -> Self {
        self.sets = sets;
        self
    }

    pub fn with_set_override(mut self, key: impl Into<String>, policy: SetPolicy) -> Self {
        self.set_overrides.insert(key.into(), policy);
        self
    }

    pub fn with_extras(mut self, extras: ExtraPolicy) -> Self {
        self.extras = extras;
        self
    }

    pub fn with_location(mut self, location: LocationRule) -> Self {
        self.location = location;
        self
    }

    pub fn with_report(mut self, report: ReportMode) -> Self {
        self.report = report;
        self
    }

    pub fn set_policy_for(&self, key: &str) -> SetPolicy {
        self.set_overrides.get(key).copied().unwrap_or(self.sets)
    }
}

/// Compare two filter values for one key.
pub fn values_match(agent: &FilterValue, expected: &FilterValue, sets: SetPolicy) -> bool {
    use FilterValue::*;

    match (agent, expected) {
        (Boolean(a), Boolean(b)) => a == b,
        (Boolean(true), Scalar(s)) | (Scalar(s), Boolean(true)) => is_truthy(s, &[]),
        (Boolean(false), Scalar(s)) | (Scalar(s), Boolean(false)) => !is_truthy(s, &[]),
        (Set(_), _) | (_, Set(_)) => match (agent.as_set(), expected.as_set()) {
            (Some(a), Some(e)) => match sets {
                SetPolicy::Exact => a == e,
                SetPolicy::Covering => e.is_subset(&a),
            },
            _ => false,
        },
        (a, e) => a == e,
    }
}

/// Compare an agent record against one expected record.
///
/// Checks run in a fixed order: category, location, then every expected
/// filter in key order, then agent-only extras. Under
/// [`ReportMode::FirstFailure`] the walk stops at the first failure.
pub fn compare(
    agent: &SearchRecord,
    expected: &SearchRecord,
    policy: &MatchPolicy,
) -> (bool, MatchDetails) {
    let mut details = MatchDetails::default();
    let exhaustive = policy.report == ReportMode::Exhaustive;
    let mut ok = true;

    let category_ok = agent.category == expected.category;
    details.checks.push(FieldCheck {
        field: "category".into(),
        agent_value: Some(agent.category.to_string()),
        expected_value: Some(expected.category.to_string()),
        passed: category_ok,
    });
    if !category_ok {
        tracing::debug!(agent = %agent.category, expected = %expected.category, "category mismatch");
        details.mismatches.push(
            Mismatch::new(MismatchKind::Category, "category").values(
                Some(agent.category.to_string()),
                Some(expected.category.to_string()),
            ),
        );
        ok = false;
        if !exhaustive {
            return (false, details);
        }
    }

    let location_ok = locations_match(&agent.location, &expected.location, policy.location);
    details.checks.push(FieldCheck {
        field: "location".into(),
        agent_value: Some(agent.location.to_string()),
        expected_value: Some(expected.location.to_string()),
        passed: location_ok,
    });
    if !location_ok {
        tracing::debug!(agent = %agent.location, expected = %expected.location, "location mismatch");
        details.mismatches.push(
            Mismatch::new(MismatchKind::Location, "location").values(
                Some(agent.location.to_string()),
                Some(expected.location.to_string()),
            ),
        );
        ok = false;
        if !exhaustive {
            return (false, details);
        }
    }

    for (key, want) in &expected.filters {
        let got = agent.filters.get(key);
        let passed = got
            .map(|g| values_match(g, want, policy.set_policy_for(key)))
            .unwrap_or(false);

        details.checks.push(FieldCheck {
            field: key.clone(),
            agent_value: got.map(ToString::to_string),
            expected_value: Some(want.to_string()),
            passed,
        });

        if !passed {
            let kind = if got.is_some() {
                MismatchKind::WrongValue
            } else {
                MismatchKind::MissingFilter
            };
            tracing::debug!(field = %key, ?kind, "filter mismatch");
            details.mismatches.push(
                Mismatch::new(kind, key.as_str())
                    .values(got.map(ToString::to_string), Some(want.to_string())),
            );
            ok = false;
            if !exhaustive {
                return (false, details);
            }
        }
    }

    details.extra_filters = agent
        .filters
        .keys()
        .filter(|k| !expected.filters.contains_key(*k))
        .cloned()
        .collect();

    if policy.extras == ExtraPolicy::Strict {
        for key in details.extra_filters.clone() {
            let value = agent.filters.get(&key).map(ToString::to_string);
            details.mismatches.push(
                Mismatch::new(MismatchKind::ExtraFilter, key.as_str()).values(value, None),
            );
            ok = false;
            if !exhaustive {
                break;
            }
        }
    } else if !details.extra_filters.is_empty() {
        tracing::debug!(extra = ?details.extra_filters, "extra filters allowed");
    }

    (ok, details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Location};

    fn record(filters: &[(&str, FilterValue)]) -> SearchRecord {
        SearchRecord {
            category: Category::Sale,
            location: Location::region("austin tx"),
            filters: filters
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    #[test]
    fn test_identical_records_match() {
        let r = record(&[("beds", FilterValue::scalar("3"))]);
        let (ok, details) = compare(&r, &r, &MatchPolicy::default());
        assert!(ok);
        assert!(details.mismatches.is_empty());
    }

    #[test]
    fn test_category_checked_first() {
        let gt = record(&[("beds", FilterValue::scalar("3"))]);
        let mut agent = gt.clone();
        agent.category = Category::Rent;
        agent.filters.clear();
        let (ok, details) = compare(&agent, &gt, &MatchPolicy::default());
        assert!(!ok);
        assert_eq!(details.mismatches.len(), 1);
        assert_eq!(details.mismatches[0].kind, MismatchKind::Category);
    }

    #[test]
    fn test_wrong_value_reports_both_sides() {
        let gt = record(&[("beds", FilterValue::scalar("4"))]);
        let agent = record(&[("beds", FilterValue::scalar("3"))]);
        let (ok, details) = compare(&agent, &gt, &MatchPolicy::default());
        assert!(!ok);
        let m = details.mismatch_for("beds").unwrap();
        assert_eq!(m.kind, MismatchKind::WrongValue);
        assert_eq!(m.agent_value.as_deref(), Some("3"));
        assert_eq!(m.expected_value.as_deref(), Some("4"));
    }

    #[test]
    fn test_missing_flag_is_hard_failure() {
        let gt = record(&[("show-recently-sold", FilterValue::flag())]);
        let agent = record(&[]);
        let (ok, details) = compare(&agent, &gt, &MatchPolicy::default());
        assert!(!ok);
        assert!(details.has_mismatch(MismatchKind::MissingFilter));
    }

    #[test]
    fn test_extras_permissive_vs_strict() {
        let gt = record(&[]);
        let agent = record(&[("pool", FilterValue::flag())]);

        let (ok, details) = compare(&agent, &gt, &MatchPolicy::default());
        assert!(ok);
        assert_eq!(details.extra_filters, vec!["pool".to_string()]);

        let strict = MatchPolicy::default().with_extras(ExtraPolicy::Strict);
        let (ok, details) = compare(&agent, &gt, &strict);
        assert!(!ok);
        assert!(details.has_mismatch(MismatchKind::ExtraFilter));
    }

    #[test]
    fn test_set_policies() {
        let want = FilterValue::set(["condo"]);
        let got = FilterValue::set(["condo", "house"]);
        assert!(!values_match(&got, &want, SetPolicy::Exact));
        assert!(values_match(&got, &want, SetPolicy::Covering));
        assert!(!values_match(&want, &got, SetPolicy::Covering));
    }

    #[test]
    fn test_set_override_per_key() {
        let policy = MatchPolicy::default().with_set_override("keywords", SetPolicy::Covering);
        assert_eq!(policy.set_policy_for("keywords"), SetPolicy::Covering);
        assert_eq!(policy.set_policy_for("am"), SetPolicy::Exact);
    }

    #[test]
    fn test_truthy_scalar_equals_flag() {
        assert!(values_match(&FilterValue::scalar("allowed"), &FilterValue::flag(), SetPolicy::Exact));
        assert!(!values_match(&FilterValue::scalar("cats"), &FilterValue::flag(), SetPolicy::Exact));
    }

    #[test]
    fn test_exhaustive_reports_every_failure() {
        let gt = record(&[
            ("beds", FilterValue::scalar("4")),
            ("baths", FilterValue::scalar("2")),
        ]);
        let mut agent = record(&[]);
        agent.category = Category::Rent;
        let policy = MatchPolicy::default().with_report(ReportMode::Exhaustive);
        let (ok, details) = compare(&agent, &gt, &policy);
        assert!(!ok);
        assert_eq!(details.mismatches.len(), 3);
    }

    #[test]
    fn test_policy_deserializes_with_defaults() {
        let policy: MatchPolicy = serde_json::from_str(r#"{"extras":"strict"}"#).unwrap();
        assert_eq!(policy.extras, ExtraPolicy::Strict);
        assert_eq!(policy.sets, SetPolicy::Exact);
    }
}
