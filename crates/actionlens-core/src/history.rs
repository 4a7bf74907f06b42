use crate::config::HistoryConfig;
use crate::records::RunRecord;

/// Result of [`filter_schedule_runs`].
#[derive(Debug, Clone)]
pub struct ScheduleFilter {
    /// Whether scheduled runs were removed.
    pub filtered: bool,
    pub runs: Vec<RunRecord>,
}

/// Drop scheduled runs when they make up more than the configured share of
/// the batch, so nightly jobs don't drown out push/PR statistics.
pub fn filter_schedule_runs(runs: Vec<RunRecord>, config: &HistoryConfig) -> ScheduleFilter {
    if config.include_schedule_runs || runs.is_empty() {
        return ScheduleFilter {
            filtered: false,
            runs,
        };
    }

    let scheduled = runs.iter().filter(|run| run.event == "schedule").count();
    let ratio = scheduled as f64 / runs.len() as f64;
    if ratio <= config.schedule_ratio_threshold {
        return ScheduleFilter {
            filtered: false,
            runs,
        };
    }

    tracing::info!(
        scheduled,
        total = runs.len(),
        "Excluding scheduled runs from history"
    );
    ScheduleFilter {
        filtered: true,
        runs: runs.into_iter().filter(|run| run.event != "schedule").collect(),
    }
}
