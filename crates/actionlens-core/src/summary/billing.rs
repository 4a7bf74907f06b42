use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::stats::DurationStat;
use crate::records::RunUsage;

/// Billable time of a single job run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillableJob {
    pub runner: String,
    pub duration_ms: u64,
}

/// Billable time of every job run in a batch, keyed by job-run id.
#[derive(Debug, Clone, Default)]
pub struct BillingIndex {
    jobs: HashMap<u64, BillableJob>,
}

impl BillingIndex {
    /// Flatten usage snapshots. Job-run ids are unique per execution; if one
    /// repeats anyway, the later snapshot overwrites the earlier one.
    pub fn from_usages<'a, I>(usages: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a RunUsage>>,
    {
        let mut jobs = HashMap::new();
        for usage in usages.into_iter().flatten() {
            for (runner, billable) in &usage.billable {
                for job_run in &billable.job_runs {
                    jobs.insert(
                        job_run.job_id,
                        BillableJob {
                            runner: runner.clone(),
                            duration_ms: job_run.duration_ms,
                        },
                    );
                }
            }
        }
        Self { jobs }
    }

    pub fn get(&self, job_id: u64) -> Option<&BillableJob> {
        self.jobs.get(&job_id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Per-runner-class duration stats, in seconds, over the given job runs.
    /// Job runs absent from the index are skipped.
    pub fn stats_for<I>(&self, job_ids: I) -> BTreeMap<String, DurationStat>
    where
        I: IntoIterator<Item = u64>,
    {
        let mut by_runner: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for job_id in job_ids {
            if let Some(billable) = self.jobs.get(&job_id) {
                by_runner
                    .entry(billable.runner.as_str())
                    .or_default()
                    .push(billable.duration_ms as f64 / 1000.0);
            }
        }

        by_runner
            .into_iter()
            .map(|(runner, secs)| (runner.to_string(), DurationStat::from_secs(&secs)))
            .collect()
    }
}
