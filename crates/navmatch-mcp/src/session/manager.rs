//! Live verifier sessions keyed by id.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use navmatch::{
    GroundTruthInput, MatchPolicy, Site, UpdateOutcome, VerificationResult, Verifier,
};

use crate::config::ServerConfig;
use crate::types::{McpError, McpResult};

/// One verifier plus bookkeeping.
pub struct VerifierEntry {
    pub verifier: Verifier,
    pub created_at: DateTime<Utc>,
}

/// Row returned by `verifier_list`.
#[derive(Debug, Clone, Serialize)]
pub struct VerifierSummary {
    pub verifier_id: String,
    pub site: Site,
    pub ground_truth_count: usize,
    pub created_at: DateTime<Utc>,
    pub has_agent_url: bool,
}

/// Owns every live verifier. Held behind `Arc<Mutex<_>>` by the server.
pub struct VerifierSessionManager {
    verifiers: HashMap<String, VerifierEntry>,
    config: ServerConfig,
}

impl Default for VerifierSessionManager {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

impl VerifierSessionManager {
    pub fn new(config: ServerConfig) -> Self {
        tracing::info!(
            "Verifier session manager ready (max {} verifiers)",
            config.max_verifiers
        );
        Self {
            verifiers: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn count(&self) -> usize {
        self.verifiers.len()
    }

    /// Build and register a verifier. Returns its id.
    pub fn create(
        &mut self,
        site: Option<Site>,
        ground_truth: GroundTruthInput,
        policy: Option<MatchPolicy>,
    ) -> McpResult<String> {
        if self.verifiers.len() >= self.config.max_verifiers {
            return Err(McpError::InvalidRequest(format!(
                "Verifier limit reached ({}); close one first",
                self.config.max_verifiers
            )));
        }

        let mut verifier = match site {
            Some(site) => Verifier::new(site, ground_truth)?,
            None => Verifier::detect(ground_truth)?,
        };
        if let Some(policy) = policy {
            verifier = verifier.with_policy(policy);
        }

        let id = uuid::Uuid::new_v4().to_string();
        tracing::info!("Created verifier {id} for {}", verifier.site());
        self.verifiers.insert(
            id.clone(),
            VerifierEntry {
                verifier,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    pub fn get(&self, id: &str) -> McpResult<&VerifierEntry> {
        self.verifiers
            .get(id)
            .ok_or_else(|| McpError::VerifierNotFound(id.to_string()))
    }

    fn get_mut(&mut self, id: &str) -> McpResult<&mut VerifierEntry> {
        self.verifiers
            .get_mut(id)
            .ok_or_else(|| McpError::VerifierNotFound(id.to_string()))
    }

    pub fn update(&mut self, id: &str, url: &str) -> McpResult<UpdateOutcome> {
        let entry = self.get_mut(id)?;
        let outcome = entry.verifier.update(url);
        tracing::debug!("Verifier {id} update: {outcome:?}");
        Ok(outcome)
    }

    pub fn reset(&mut self, id: &str) -> McpResult<()> {
        self.get_mut(id)?.verifier.reset();
        Ok(())
    }

    pub fn compute(&self, id: &str) -> McpResult<VerificationResult> {
        Ok(self.get(id)?.verifier.compute())
    }

    pub fn close(&mut self, id: &str) -> McpResult<()> {
        self.verifiers
            .remove(id)
            .map(|_| tracing::info!("Closed verifier {id}"))
            .ok_or_else(|| McpError::VerifierNotFound(id.to_string()))
    }

    /// Summaries of live verifiers, oldest first.
    pub fn list(&self) -> Vec<VerifierSummary> {
        let mut rows: Vec<VerifierSummary> = self
            .verifiers
            .iter()
            .map(|(id, entry)| VerifierSummary {
                verifier_id: id.clone(),
                site: entry.verifier.site(),
                ground_truth_count: entry.verifier.ground_truths().len(),
                created_at: entry.created_at,
                has_agent_url: entry.verifier.agent_url().is_some(),
            })
            .collect();
        rows.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.verifier_id.cmp(&b.verifier_id))
        });
        rows
    }
}
