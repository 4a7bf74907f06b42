//! Aggregate execution records into run, job and step summaries.
//!
//! Summaries are plain view objects rebuilt on every invocation. They borrow
//! the workflow definitions they were resolved against; a name that cannot be
//! resolved leaves the back-reference empty instead of failing.

pub mod billing;
pub mod stats;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::borrow::Borrow;
use std::collections::BTreeMap;

use crate::error::{Result, ScanError};
use crate::parser::model::{definitions_by_name, JobDefinition, StepDefinition, WorkflowDefinition};
use crate::records::{Conclusion, JobExecutionRecord, RunRecord, RunUsage, StepExecutionRecord};
use crate::resolver::{resolve_job, resolve_step};

pub use billing::{BillableJob, BillingIndex};
pub use stats::DurationStat;

/// One run paired with its usage snapshot and workflow definition.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary<'a> {
    pub run_id: u64,
    pub workflow_id: u64,
    pub name: String,
    pub display_title: String,
    pub conclusion: Option<Conclusion>,
    pub run_attempt: u32,
    pub run_started_at: Option<DateTime<Utc>>,
    pub owner: String,
    pub repo: String,
    pub usage: Option<&'a RunUsage>,
    #[serde(skip)]
    pub definition: &'a WorkflowDefinition,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepSummary<'a> {
    /// Reported step name.
    pub name: String,
    pub count: usize,
    pub success_count: usize,
    pub duration_stat_secs: DurationStat,
    #[serde(skip)]
    pub definition: Option<&'a StepDefinition>,
}

impl StepSummary<'_> {
    pub fn source_line(&self) -> Option<usize> {
        self.definition.map(|step| step.source_line)
    }

    pub fn html_url_with_line(&self) -> Option<String> {
        self.definition.and_then(|step| step.html_url_with_line())
    }
}

/// Statistics for one `(workflow name, reported job name)` group.
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary<'a> {
    pub workflow_name: String,
    /// Reported job name: the declared name if any, else the job id, with
    /// matrix values rendered in.
    pub job_name: String,
    pub count: usize,
    pub success_count: usize,
    pub duration_stat_secs: DurationStat,
    pub billable_stat_secs: BTreeMap<String, DurationStat>,
    pub step_summaries: Vec<StepSummary<'a>>,
    #[serde(skip)]
    pub workflow: Option<&'a WorkflowDefinition>,
    #[serde(skip)]
    pub definition: Option<&'a JobDefinition>,
}

impl JobSummary<'_> {
    pub fn job_id(&self) -> Option<&str> {
        self.definition.map(|job| job.id.as_str())
    }

    pub fn source_line(&self) -> Option<usize> {
        self.definition.map(|job| job.source_line)
    }

    pub fn html_url_with_line(&self) -> Option<String> {
        self.definition.and_then(|job| job.html_url_with_line())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary<'a> {
    pub runs: Vec<RunSummary<'a>>,
    pub jobs: Vec<JobSummary<'a>>,
}

/// Pair runs with their usage snapshots and definitions by position.
///
/// The three sequences must have equal length (usages may be absent
/// altogether); a mismatch is a caller bug and fails immediately.
pub fn summarise_runs<'a, D>(
    runs: &'a [RunRecord],
    usages: Option<&'a [RunUsage]>,
    definitions: &'a [D],
) -> Result<Vec<RunSummary<'a>>>
where
    D: Borrow<WorkflowDefinition>,
{
    if let Some(usages) = usages {
        if usages.len() != runs.len() {
            return Err(ScanError::LengthMismatch {
                what: "run usages",
                expected: runs.len(),
                actual: usages.len(),
            });
        }
    }
    if definitions.len() != runs.len() {
        return Err(ScanError::LengthMismatch {
            what: "workflow definitions",
            expected: runs.len(),
            actual: definitions.len(),
        });
    }

    let summaries = runs
        .iter()
        .zip(definitions)
        .enumerate()
        .map(|(i, (run, definition))| {
            let definition: &WorkflowDefinition = definition.borrow();
            RunSummary {
                run_id: run.id,
                workflow_id: run.workflow_id,
                name: run.name.clone().unwrap_or_else(|| definition.name.clone()),
                display_title: run.display_title.clone(),
                conclusion: run.conclusion,
                run_attempt: run.attempt(),
                run_started_at: run.run_started_at,
                owner: run.owner().to_string(),
                repo: run.repo().to_string(),
                usage: usages.and_then(|u| u.get(i)),
                definition,
            }
        })
        .collect();

    Ok(summaries)
}

/// Group job records by workflow and reported job name and summarise each group.
///
/// Groups are emitted in the order their first record appears. Definitions are
/// looked up by workflow name; when several runs carry definitions with the
/// same name, the last one is used.
pub fn summarise_jobs<'a>(
    runs: &[RunSummary<'a>],
    jobs: &[JobExecutionRecord],
) -> Vec<JobSummary<'a>> {
    let billing = BillingIndex::from_usages(runs.iter().map(|run| run.usage));
    let definitions = definitions_by_name(runs.iter().map(|run| run.definition));

    let mut groups: IndexMap<(&str, &str), Vec<&JobExecutionRecord>> = IndexMap::new();
    for job in jobs {
        let workflow_name = job.workflow_name.as_deref().unwrap_or("");
        groups
            .entry((workflow_name, job.name.as_str()))
            .or_default()
            .push(job);
    }

    tracing::debug!(
        records = jobs.len(),
        groups = groups.len(),
        billed_jobs = billing.len(),
        "Summarising jobs"
    );

    groups
        .into_iter()
        .map(|((workflow_name, job_name), records)| {
            let workflow = definitions.get(workflow_name).copied();
            if workflow.is_none() {
                tracing::debug!(workflow = workflow_name, "No workflow definition for job records");
            }
            let definition = workflow.and_then(|wf| resolve_job(&wf.jobs, job_name));

            let successful: Vec<&JobExecutionRecord> =
                records.iter().copied().filter(|job| job.is_success()).collect();
            let durations: Vec<f64> = successful
                .iter()
                .map(|job| job.duration_secs() as f64)
                .collect();

            JobSummary {
                workflow_name: workflow_name.to_string(),
                job_name: job_name.to_string(),
                count: records.len(),
                success_count: successful.len(),
                duration_stat_secs: DurationStat::from_secs(&durations),
                billable_stat_secs: billing.stats_for(records.iter().map(|job| job.id)),
                step_summaries: summarise_steps(&records, definition),
                workflow,
                definition,
            }
        })
        .collect()
}

fn summarise_steps<'a>(
    jobs: &[&JobExecutionRecord],
    definition: Option<&'a JobDefinition>,
) -> Vec<StepSummary<'a>> {
    let mut groups: IndexMap<&str, Vec<&StepExecutionRecord>> = IndexMap::new();
    for step in jobs.iter().flat_map(|job| job.steps.iter()) {
        groups.entry(step.name.as_str()).or_default().push(step);
    }

    groups
        .into_iter()
        .map(|(name, steps)| {
            let successful: Vec<&StepExecutionRecord> =
                steps.iter().copied().filter(|step| step.is_success()).collect();
            let durations: Vec<f64> = successful
                .iter()
                .map(|step| step.duration_secs() as f64)
                .collect();

            StepSummary {
                name: name.to_string(),
                count: steps.len(),
                success_count: successful.len(),
                duration_stat_secs: DurationStat::from_secs(&durations),
                definition: definition.and_then(|job| resolve_step(&job.steps, name)),
            }
        })
        .collect()
}

/// Run both summarisation stages over one batch.
pub fn summarise<'a, D>(
    runs: &'a [RunRecord],
    usages: Option<&'a [RunUsage]>,
    definitions: &'a [D],
    jobs: &[JobExecutionRecord],
) -> Result<Summary<'a>>
where
    D: Borrow<WorkflowDefinition>,
{
    let runs = summarise_runs(runs, usages, definitions)?;
    let jobs = summarise_jobs(&runs, jobs);

    tracing::info!(runs = runs.len(), jobs = jobs.len(), "Summarised workflow runs");

    Ok(Summary { runs, jobs })
}
