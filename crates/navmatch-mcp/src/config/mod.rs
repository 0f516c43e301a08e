//! Configuration loading and resolution.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use navmatch::{GroundTruthInput, Site};

use crate::types::{McpError, McpResult};

/// Default cap on live verifier sessions.
pub const DEFAULT_MAX_VERIFIERS: usize = 256;

/// Server limits, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub max_verifiers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_verifiers: DEFAULT_MAX_VERIFIERS,
        }
    }
}

impl ServerConfig {
    /// Defaults, overridden by `NAVMATCH_MAX_VERIFIERS` when it parses.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("NAVMATCH_MAX_VERIFIERS") {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.max_verifiers = n,
                _ => tracing::warn!("Ignoring invalid NAVMATCH_MAX_VERIFIERS={raw:?}"),
            }
        }
        config
    }
}

/// Resolve the task file path.
pub fn resolve_tasks_path(explicit: Option<&str>) -> String {
    if let Some(path) = explicit {
        return path.to_string();
    }

    if let Ok(env_path) = std::env::var("NAVMATCH_TASKS") {
        return env_path;
    }

    let cwd_tasks = PathBuf::from(".navmatch/tasks.json");
    if cwd_tasks.exists() {
        return cwd_tasks.display().to_string();
    }

    resolve_default_tasks_path()
}

fn resolve_default_tasks_path() -> String {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());

    format!("{home}/.navmatch/tasks.json")
}

/// One benchmark task as stored in a task file.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSpec {
    pub task_id: String,
    #[serde(default)]
    pub site: Option<Site>,
    pub task_generation_config_json: Value,
}

/// Ground-truth keys a task config may use, in lookup order.
const GROUND_TRUTH_KEYS: &[&str] = &["gt_urls", "gt_url", "ground_truth_url"];

impl TaskSpec {
    /// The task's ground-truth URLs. The config may be an object or a
    /// JSON-encoded string holding one.
    pub fn ground_truth(&self) -> McpResult<GroundTruthInput> {
        let config = match &self.task_generation_config_json {
            Value::String(raw) => serde_json::from_str::<Value>(raw).map_err(|e| {
                McpError::InvalidParams(format!("task {}: bad config JSON: {e}", self.task_id))
            })?,
            other => other.clone(),
        };

        let raw = GROUND_TRUTH_KEYS
            .iter()
            .find_map(|key| config.get(*key))
            .ok_or_else(|| {
                McpError::InvalidParams(format!("task {}: no ground-truth URL", self.task_id))
            })?;

        serde_json::from_value(raw.clone()).map_err(|e| {
            McpError::InvalidParams(format!("task {}: bad ground truth: {e}", self.task_id))
        })
    }

    /// Explicit site, or the one hosting the first ground-truth URL.
    pub fn resolve_site(&self, ground_truth: &GroundTruthInput) -> McpResult<Site> {
        if let Some(site) = self.site {
            return Ok(site);
        }
        let first = ground_truth.first().ok_or_else(|| {
            McpError::InvalidParams(format!("task {}: empty ground truth", self.task_id))
        })?;
        Ok(Site::detect(first)?)
    }
}

/// Read and parse a task file.
pub fn load_tasks(path: &Path) -> McpResult<Vec<TaskSpec>> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        McpError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read task file {}: {e}", path.display()),
        ))
    })?;
    let tasks: Vec<TaskSpec> = serde_json::from_str(&raw)?;
    tracing::info!("Loaded {} tasks from {}", tasks.len(), path.display());
    Ok(tasks)
}
