//! Batch self-match check over a task file.
//!
//! Every ground-truth alternative of a task must score 1.0 against a
//! verifier built from the task's first alternative.

use std::io::Write;

use serde::Serialize;

use navmatch::{Mismatch, Verifier};

use crate::config::TaskSpec;
use crate::types::McpResult;

/// Totals printed at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CheckSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl CheckSummary {
    /// Passed fraction; 1.0 for an empty run.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.passed as f64 / self.total as f64
        }
    }
}

fn describe(m: &Mismatch) -> String {
    let mut out = format!("{:?} {}", m.kind, m.field);
    if m.agent_value.is_some() || m.expected_value.is_some() {
        out.push_str(&format!(
            " (agent={}, expected={})",
            m.agent_value.as_deref().unwrap_or("-"),
            m.expected_value.as_deref().unwrap_or("-")
        ));
    }
    if let Some(msg) = &m.message {
        out.push_str(&format!(": {msg}"));
    }
    out
}

/// Check one task. `Ok(None)` on pass, otherwise the failure lines.
fn check_task(task: &TaskSpec) -> McpResult<Option<Vec<String>>> {
    let ground_truth = task.ground_truth()?;
    let site = task.resolve_site(&ground_truth)?;
    let urls = ground_truth.flatten();
    let first = urls.first().cloned().unwrap_or_default();

    let mut verifier = Verifier::new(site, first)?;
    let mut failures = Vec::new();

    for url in &urls {
        verifier.update(url);
        let result = verifier.compute();
        if !result.is_match {
            let reasons: Vec<String> = result.details.mismatches.iter().map(describe).collect();
            failures.push(format!("  {url}: {}", reasons.join("; ")));
        }
    }

    Ok((!failures.is_empty()).then_some(failures))
}

/// Run every task, writing PASS/FAIL lines and a summary to `out`.
pub fn run_check(tasks: &[TaskSpec], out: &mut impl Write) -> McpResult<CheckSummary> {
    let mut summary = CheckSummary::default();

    for task in tasks {
        summary.total += 1;
        match check_task(task) {
            Ok(None) => {
                summary.passed += 1;
                writeln!(out, "PASS {}", task.task_id)?;
            }
            Ok(Some(lines)) => {
                summary.failed += 1;
                writeln!(out, "FAIL {}", task.task_id)?;
                for line in lines {
                    writeln!(out, "{line}")?;
                }
            }
            Err(e) => {
                summary.failed += 1;
                tracing::warn!("Task {} could not be checked: {e}", task.task_id);
                writeln!(out, "FAIL {}\n  error: {e}", task.task_id)?;
            }
        }
    }

    writeln!(
        out,
        "\ntotal: {}  passed: {}  failed: {}  accuracy: {:.1}%",
        summary.total,
        summary.passed,
        summary.failed,
        summary.accuracy() * 100.0
    )?;

    Ok(summary)
}
