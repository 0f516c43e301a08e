//! Verifier session: ground-truth alternatives plus a single agent-URL slot.
//!
//! Lifecycle is `reset` → `update`* → `compute`. The only mutable state is
//! the current agent URL; each `update` overwrites it.

use serde::{Deserialize, Serialize};

use crate::matcher::{compare, MatchPolicy};
use crate::sites::Site;
use crate::tokenizer::tokenize;
use crate::types::{
    MatchDetails, Mismatch, MismatchKind, SearchRecord, VerificationResult, VerifyError,
    VerifyResult,
};

/// Ground truth as callers supply it: one URL, a list, or a list of lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroundTruthInput {
    Single(String),
    List(Vec<String>),
    Nested(Vec<Vec<String>>),
}

impl GroundTruthInput {
    /// Flatten into the canonical ordered list.
    pub fn flatten(self) -> Vec<String> {
        match self {
            GroundTruthInput::Single(url) => vec![url],
            GroundTruthInput::List(urls) => urls,
            GroundTruthInput::Nested(groups) => groups.into_iter().flatten().collect(),
        }
    }

    /// First URL in input order, if any.
    pub fn first(&self) -> Option<&str> {
        match self {
            GroundTruthInput::Single(url) => Some(url),
            GroundTruthInput::List(urls) => urls.first().map(String::as_str),
            GroundTruthInput::Nested(groups) => groups.iter().flatten().next().map(String::as_str),
        }
    }
}

impl From<&str> for GroundTruthInput {
    fn from(url: &str) -> Self {
        GroundTruthInput::Single(url.to_string())
    }
}

impl From<String> for GroundTruthInput {
    fn from(url: String) -> Self {
        GroundTruthInput::Single(url)
    }
}

impl From<Vec<String>> for GroundTruthInput {
    fn from(urls: Vec<String>) -> Self {
        GroundTruthInput::List(urls)
    }
}

impl From<Vec<&str>> for GroundTruthInput {
    fn from(urls: Vec<&str>) -> Self {
        GroundTruthInput::List(urls.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<Vec<String>>> for GroundTruthInput {
    fn from(groups: Vec<Vec<String>>) -> Self {
        GroundTruthInput::Nested(groups)
    }
}

/// A ground-truth alternative and its parsed record.
#[derive(Debug, Clone)]
pub struct GroundTruth {
    pub url: String,
    pub record: SearchRecord,
}

/// What `update` did with a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOutcome {
    Stored,
    /// Blank input; the previous URL is kept.
    Blank,
    /// The dialect's domain gate rejected the URL; the previous URL is kept.
    ForeignDomain,
}

/// One verifier instance per task.
#[derive(Debug, Clone)]
pub struct Verifier {
    site: Site,
    policy: MatchPolicy,
    ground_truths: Vec<GroundTruth>,
    agent_url: Option<String>,
}

impl Verifier {
    /// Build a verifier. Ground truths are flattened and parsed once here.
    pub fn new(site: Site, ground_truth: impl Into<GroundTruthInput>) -> VerifyResult<Self> {
        let urls = ground_truth.into().flatten();
        if urls.is_empty() {
            return Err(VerifyError::EmptyGroundTruth);
        }

        let mut ground_truths = Vec::with_capacity(urls.len());
        for (index, url) in urls.into_iter().enumerate() {
            if url.trim().is_empty() {
                return Err(VerifyError::BlankGroundTruth { index });
            }
            let record = site.parse_url(&url)?;
            ground_truths.push(GroundTruth { url, record });
        }

        tracing::info!(site = %site, alternatives = ground_truths.len(), "verifier created");
        Ok(Self {
            site,
            policy: site.dialect().default_policy(),
            ground_truths,
            agent_url: None,
        })
    }

    /// Build a verifier for the site hosting the first ground-truth URL.
    pub fn detect(ground_truth: impl Into<GroundTruthInput>) -> VerifyResult<Self> {
        let input = ground_truth.into();
        let first = input.first().ok_or(VerifyError::EmptyGroundTruth)?;
        let site = Site::detect(first)?;
        Self::new(site, input)
    }

    /// Replace the dialect's default policy.
    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn site(&self) -> Site {
        self.site
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    pub fn ground_truths(&self) -> &[GroundTruth] {
        &self.ground_truths
    }

    pub fn ground_truth_urls(&self) -> impl Iterator<Item = &str> {
        self.ground_truths.iter().map(|gt| gt.url.as_str())
    }

    pub fn agent_url(&self) -> Option<&str> {
        self.agent_url.as_deref()
    }

    /// Clear the agent URL. Idempotent.
    pub fn reset(&mut self) {
        self.agent_url = None;
    }

    /// Store the latest agent URL, overwriting any previous one.
    ///
    /// A URL that fails to tokenize is still stored so `compute` can report
    /// the parse error.
    pub fn update(&mut self, url: &str) -> UpdateOutcome {
        let url = url.trim();
        if url.is_empty() {
            return UpdateOutcome::Blank;
        }
        if let Ok(tokens) = tokenize(url) {
            if !self.site.dialect().accepts(&tokens) {
                tracing::debug!(site = %self.site, url, "ignoring foreign URL");
                return UpdateOutcome::ForeignDomain;
            }
        }
        self.agent_url = Some(url.to_string());
        UpdateOutcome::Stored
    }

    fn first_ground_truth(&self) -> String {
        self.ground_truths
            .first()
            .map(|gt| gt.url.clone())
            .unwrap_or_default()
    }

    fn failure(&self, agent_url: String, mismatch: Mismatch) -> VerificationResult {
        let ground_truth_url = self.first_ground_truth();
        VerificationResult {
            score: 0.0,
            is_match: false,
            agent_url,
            matched_ground_truth_url: ground_truth_url.clone(),
            details: MatchDetails {
                ground_truth_url,
                mismatches: vec![mismatch],
                ..MatchDetails::default()
            },
        }
    }

    /// Score the current agent URL against every alternative. Never fails.
    pub fn compute(&self) -> VerificationResult {
        let Some(agent_url) = self.agent_url.clone() else {
            return self.failure(
                String::new(),
                Mismatch::new(MismatchKind::NoAgentUrl, "agent_url")
                    .message("no agent URL provided"),
            );
        };

        self.guarded(agent_url, |url| self.score(url))
    }

    /// Run a comparison, turning a panic into a parse-error result.
    fn guarded<F>(&self, agent_url: String, score: F) -> VerificationResult
    where
        F: FnOnce(String) -> VerificationResult,
    {
        let fallback_url = agent_url.clone();
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| score(agent_url))) {
            Ok(result) => result,
            Err(panic_info) => {
                let msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic".to_string()
                };
                tracing::error!(url = %fallback_url, "comparison panicked: {msg}");
                self.failure(
                    fallback_url,
                    Mismatch::new(MismatchKind::ParseError, "agent_url")
                        .message(format!("comparison panicked: {msg}")),
                )
            }
        }
    }

    fn score(&self, agent_url: String) -> VerificationResult {
        let agent = match self.site.parse_url(&agent_url) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(url = %agent_url, error = %e, "agent URL failed to parse");
                return self.failure(
                    agent_url,
                    Mismatch::new(MismatchKind::ParseError, "agent_url").message(e.to_string()),
                );
            }
        };

        let mut last = MatchDetails::default();
        for gt in &self.ground_truths {
            let (ok, mut details) = compare(&agent, &gt.record, &self.policy);
            details.ground_truth_url = gt.url.clone();
            if ok {
                tracing::info!(site = %self.site, ground_truth = %gt.url, "match found");
                return VerificationResult {
                    score: 1.0,
                    is_match: true,
                    agent_url,
                    matched_ground_truth_url: gt.url.clone(),
                    details,
                };
            }
            last = details;
        }

        tracing::info!(site = %self.site, mismatches = last.mismatches.len(), "no match");
        VerificationResult {
            score: 0.0,
            is_match: false,
            agent_url,
            matched_ground_truth_url: self.first_ground_truth(),
            details: last,
        }
    }
}

/// One-shot comparison of an agent URL against ground truth.
pub fn verify_once(
    site: Site,
    agent_url: &str,
    ground_truth: impl Into<GroundTruthInput>,
) -> VerifyResult<VerificationResult> {
    let mut verifier = Verifier::new(site, ground_truth)?;
    verifier.update(agent_url);
    Ok(verifier.compute())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{ReportMode, SetPolicy};

    const GT: &str = "https://www.realtor.com/realestateandhomes-search/Austin_TX/beds-3";

    #[test]
    fn test_ground_truth_shapes_flatten() {
        let nested: GroundTruthInput =
            serde_json::from_str(r#"[["a", "b"], ["c"]]"#).unwrap();
        assert_eq!(nested.flatten(), vec!["a", "b", "c"]);

        let single: GroundTruthInput = serde_json::from_str(r#""a""#).unwrap();
        assert_eq!(single.flatten(), vec!["a"]);

        let flat: GroundTruthInput = serde_json::from_str(r#"["a", "b"]"#).unwrap();
        assert_eq!(flat.flatten(), vec!["a", "b"]);
    }

    #[test]
    fn test_construction_errors() {
        assert!(matches!(
            Verifier::new(Site::Realtor, Vec::<String>::new()),
            Err(VerifyError::EmptyGroundTruth)
        ));
        assert!(matches!(
            Verifier::new(Site::Realtor, vec![GT, "  "]),
            Err(VerifyError::BlankGroundTruth { index: 1 })
        ));
    }

    #[test]
    fn test_compute_without_agent_url() {
        let v = Verifier::new(Site::Realtor, GT).unwrap();
        let result = v.compute();
        assert_eq!(result.score, 0.0);
        assert!(!result.is_match);
        assert_eq!(result.matched_ground_truth_url, GT);
        assert!(result.details.has_mismatch(MismatchKind::NoAgentUrl));
        assert_eq!(
            result.details.mismatches[0].message.as_deref(),
            Some("no agent URL provided")
        );
    }

    #[test]
    fn test_update_overwrites_and_reset_clears() {
        let mut v = Verifier::new(Site::Realtor, GT).unwrap();
        assert_eq!(v.update(&format!("{GT}/baths-2")), UpdateOutcome::Stored);
        assert_eq!(v.update(GT), UpdateOutcome::Stored);
        assert_eq!(v.compute().score, 1.0);

        assert_eq!(v.update("   "), UpdateOutcome::Blank);
        assert_eq!(v.agent_url(), Some(GT));

        v.reset();
        v.reset();
        assert!(v.agent_url().is_none());
        assert_eq!(v.compute().score, 0.0);
    }

    #[test]
    fn test_foreign_domain_is_ignored() {
        let mut v = Verifier::new(Site::Realtor, GT).unwrap();
        v.update(GT);
        assert_eq!(
            v.update("https://www.google.com/search?q=austin"),
            UpdateOutcome::ForeignDomain
        );
        assert_eq!(v.agent_url(), Some(GT));
    }

    #[test]
    fn test_first_matching_alternative_wins() {
        let alt = "https://www.realtor.com/realestateandhomes-search/Austin_TX/beds-4";
        let mut v = Verifier::new(Site::Realtor, vec![GT, alt]).unwrap();
        v.update(alt);
        let result = v.compute();
        assert!(result.is_match);
        assert_eq!(result.matched_ground_truth_url, alt);
        assert_eq!(result.details.ground_truth_url, alt);
    }

    #[test]
    fn test_no_match_reports_last_alternative() {
        let alt = "https://www.realtor.com/realestateandhomes-search/Austin_TX/beds-4";
        let mut v = Verifier::new(Site::Realtor, vec![GT, alt]).unwrap();
        v.update("https://www.realtor.com/realestateandhomes-search/Austin_TX/beds-5");
        let result = v.compute();
        assert!(!result.is_match);
        assert_eq!(result.matched_ground_truth_url, GT);
        assert_eq!(result.details.ground_truth_url, alt);
        let beds = result.details.mismatch_for("beds").unwrap();
        assert_eq!(beds.expected_value.as_deref(), Some("4"));
    }

    #[test]
    fn test_unparseable_agent_url_is_a_parse_error() {
        let mut v = Verifier::new(Site::Redfin, "https://www.redfin.com/city/30818/TX/Austin").unwrap();
        v.update("https://");
        let result = v.compute();
        assert_eq!(result.score, 0.0);
        assert!(result.details.has_mismatch(MismatchKind::ParseError));
    }

    #[test]
    fn test_detect_and_policy_override() {
        let v = Verifier::detect(GT).unwrap();
        assert_eq!(v.site(), Site::Realtor);

        let policy = MatchPolicy::default()
            .with_sets(SetPolicy::Covering)
            .with_report(ReportMode::Exhaustive);
        let v = v.with_policy(policy.clone());
        assert_eq!(v.policy(), &policy);
    }

    #[test]
    fn test_panicking_comparison_becomes_parse_error() {
        let verifier = Verifier::new(Site::Realtor, GT).unwrap();
        let result = verifier.guarded(GT.to_string(), |_| panic!("bad table"));
        assert_eq!(result.score, 0.0);
        assert!(!result.is_match);
        assert_eq!(result.agent_url, GT);
        let mismatch = &result.details.mismatches[0];
        assert_eq!(mismatch.kind, MismatchKind::ParseError);
        assert!(mismatch.message.as_deref().unwrap().contains("bad table"));
    }

    #[test]
    fn test_verify_once() {
        let result = verify_once(Site::Realtor, GT, GT).unwrap();
        assert!(result.is_match);
        assert_eq!(result.agent_url, GT);
    }
}
