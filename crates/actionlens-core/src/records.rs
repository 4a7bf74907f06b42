//! Typed execution records, deserialized once from the platform's REST payloads.
//!
//! The fetch layer hands these to the summariser; nothing past this module
//! looks at untyped JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Final state of a run, job or step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    Success,
    Failure,
    Cancelled,
    Skipped,
    TimedOut,
    ActionRequired,
    Neutral,
    Stale,
    StartupFailure,
    #[serde(other)]
    Unknown,
}

impl Conclusion {
    pub fn is_success(conclusion: Option<Conclusion>) -> bool {
        conclusion == Some(Conclusion::Success)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRef {
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub name: String,
    pub owner: OwnerRef,
}

/// One invocation of a whole workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: u64,
    pub workflow_id: u64,
    pub name: Option<String>,
    #[serde(default)]
    pub display_title: String,
    pub run_attempt: Option<u32>,
    pub conclusion: Option<Conclusion>,
    #[serde(default)]
    pub event: String,
    /// Workflow file path relative to the repository root.
    #[serde(default)]
    pub path: String,
    pub head_sha: Option<String>,
    pub created_at: DateTime<Utc>,
    pub run_started_at: Option<DateTime<Utc>>,
    pub repository: RepositoryRef,
}

impl RunRecord {
    pub fn attempt(&self) -> u32 {
        self.run_attempt.unwrap_or(1)
    }

    pub fn owner(&self) -> &str {
        &self.repository.owner.login
    }

    pub fn repo(&self) -> &str {
        &self.repository.name
    }
}

/// Billable time of one job run on a runner class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRunUsage {
    pub job_id: u64,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerUsage {
    #[serde(default)]
    pub total_ms: u64,
    #[serde(default)]
    pub jobs: u32,
    #[serde(default)]
    pub job_runs: Vec<JobRunUsage>,
}

/// Billing-usage snapshot of one run, keyed by runner class (`UBUNTU`, `WINDOWS`, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunUsage {
    #[serde(default)]
    pub billable: BTreeMap<String, RunnerUsage>,
    pub run_duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepExecutionRecord {
    pub name: String,
    #[serde(default)]
    pub number: u32,
    pub conclusion: Option<Conclusion>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl StepExecutionRecord {
    pub fn duration_secs(&self) -> u64 {
        elapsed_secs(self.started_at, self.completed_at)
    }

    pub fn is_success(&self) -> bool {
        Conclusion::is_success(self.conclusion)
    }
}

/// One job invocation within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobExecutionRecord {
    /// Job-run id, also the key into the billing usage.
    pub id: u64,
    pub run_id: u64,
    pub run_attempt: Option<u32>,
    pub workflow_name: Option<String>,
    /// Reported name, possibly matrix-expanded.
    pub name: String,
    pub conclusion: Option<Conclusion>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub steps: Vec<StepExecutionRecord>,
}

impl JobExecutionRecord {
    pub fn duration_secs(&self) -> u64 {
        elapsed_secs(self.started_at, self.completed_at)
    }

    pub fn is_success(&self) -> bool {
        Conclusion::is_success(self.conclusion)
    }
}

/// Whole seconds between two timestamps, never negative.
/// A missing timestamp yields 0.
pub fn elapsed_secs(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> u64 {
    match (start, end) {
        (Some(start), Some(end)) => (end - start).num_seconds().max(0) as u64,
        _ => 0,
    }
}
