use crate::error::{Result, ScanError};
use crate::parser::model::*;
use crate::parser::structural::{IndexedJob, StructuralIndex};
use serde_yaml::Value;
use std::path::Path;

/// Parse workflow YAML into a [`WorkflowDefinition`].
///
/// `display_name_fallback` is used when the file declares no `name`; the
/// platform shows the workflow path in that case, so callers usually pass it.
pub fn build_workflow_definition(
    yaml_text: &str,
    display_name_fallback: &str,
) -> Result<WorkflowDefinition> {
    let yaml: Value = serde_yaml::from_str(yaml_text)?;
    let index = StructuralIndex::parse(yaml_text)?;

    let name = yaml
        .get("name")
        .and_then(scalar_string)
        .unwrap_or_else(|| display_name_fallback.to_string());

    let jobs = yaml
        .get("jobs")
        .and_then(|v| v.as_mapping())
        .ok_or(ScanError::MissingJobs)?;

    let indexed_jobs = index.jobs();
    if indexed_jobs.len() != jobs.len() {
        return Err(ScanError::IndexMismatch(format!(
            "{} jobs parsed but {} jobs indexed",
            jobs.len(),
            indexed_jobs.len()
        )));
    }

    let jobs = jobs
        .iter()
        .zip(indexed_jobs.iter())
        .map(|((job_key, job_config), indexed)| {
            // Non-string keys are normalised by serde_yaml (`0x10` becomes 16),
            // so the id is taken from the source text.
            if let Value::String(parsed) = job_key {
                if parsed != indexed.key {
                    return Err(ScanError::IndexMismatch(format!(
                        "job '{}' parsed where '{}' was indexed",
                        parsed, indexed.key
                    )));
                }
            }
            parse_job(indexed.key.to_string(), job_config, &index, indexed)
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(workflow = %name, jobs = jobs.len(), "Built workflow definition");

    Ok(WorkflowDefinition {
        name,
        jobs,
        html_url: None,
    })
}

/// Read and parse a workflow file from disk, falling back to its path as the name.
pub fn build_workflow_definition_from_file(path: &Path) -> anyhow::Result<WorkflowDefinition> {
    use anyhow::Context;

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read workflow file: {}", path.display()))?;
    build_workflow_definition(&content, &path.to_string_lossy())
        .with_context(|| format!("Failed to parse workflow file: {}", path.display()))
}

fn parse_job(
    job_id: String,
    config: &Value,
    index: &StructuralIndex,
    indexed: &IndexedJob<'_>,
) -> Result<JobDefinition> {
    let mut job = JobDefinition::new(job_id, index.line_of(indexed.start));

    job.declared_name = config.get("name").and_then(scalar_string);

    // A `matrix:` key counts even when its value is empty.
    job.is_matrix = config
        .get("strategy")
        .and_then(|strategy| strategy.get("matrix"))
        .is_some();

    job.uses = config.get("uses").and_then(scalar_string);
    job.is_reusable = job
        .uses
        .as_deref()
        .is_some_and(|uses| uses.starts_with("./"));

    let declared_steps = config.get("steps").and_then(|v| v.as_sequence());
    let step_offsets = index.steps_of(indexed);

    match (declared_steps, step_offsets) {
        (Some(steps), Some(offsets)) => {
            if steps.len() != offsets.len() {
                return Err(ScanError::IndexMismatch(format!(
                    "job '{}' has {} steps parsed but {} indexed",
                    job.id,
                    steps.len(),
                    offsets.len()
                )));
            }
            job.steps = steps
                .iter()
                .zip(offsets)
                .map(|(step, offset)| parse_step(step, index.line_of(offset)))
                .collect();
        }
        (None, None) => {}
        (parsed, indexed) => {
            return Err(ScanError::IndexMismatch(format!(
                "job '{}' steps parsed: {}, indexed: {}",
                job.id,
                parsed.is_some(),
                indexed.is_some()
            )));
        }
    }

    Ok(job)
}

fn parse_step(step: &Value, source_line: usize) -> StepDefinition {
    let uses = step.get("uses").and_then(scalar_string);
    let action_ref = uses.as_deref().map(ActionRef::parse);

    let resolved_name = step
        .get("name")
        .and_then(scalar_string)
        .or_else(|| step.get("run").and_then(scalar_string))
        .or_else(|| action_ref.as_ref().map(|r| r.action.clone()))
        .unwrap_or_default();

    // `./` is the repository itself, not a composite action directory.
    let is_composite = uses
        .as_deref()
        .is_some_and(|uses| uses != "./" && uses.starts_with("./"));

    StepDefinition {
        resolved_name,
        action_ref,
        is_composite,
        source_line,
        raw_node: step.clone(),
        html_url: None,
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
