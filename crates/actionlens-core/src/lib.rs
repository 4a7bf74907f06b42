pub mod cache;
pub mod config;
pub mod error;
pub mod history;
pub mod parser;
pub mod records;
pub mod resolver;
pub mod summary;

pub use cache::{ContentKey, DefinitionCache};
pub use config::{load_config, ScanConfig};
pub use error::ScanError;
pub use parser::model::{ActionRef, JobDefinition, StepDefinition, WorkflowDefinition};
pub use parser::structural::StructuralIndex;
pub use parser::workflow::build_workflow_definition;
pub use records::{Conclusion, JobExecutionRecord, RunRecord, RunUsage, StepExecutionRecord};
pub use resolver::{resolve_job, resolve_step};
pub use summary::{
    summarise, summarise_jobs, summarise_runs, DurationStat, JobSummary, RunSummary, StepSummary,
    Summary,
};
