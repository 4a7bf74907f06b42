//! Map platform-reported job and step names back to their definitions.
//!
//! The platform reports jobs and steps by a free-text name rendered at run
//! time: matrix values are appended or substituted into job names, and action
//! hooks are wrapped as `Pre ...` / `Post ...` steps. There is no stable step
//! id, so these functions invert the rendering heuristically.

use regex::Regex;
use std::sync::LazyLock;

use crate::parser::model::{JobDefinition, StepDefinition};

/// Pseudo-steps the runner adds to every job.
const LIFECYCLE_STEPS: [&str; 2] = ["Set up job", "Complete job"];

/// Two-word prefixes come first so `Pre Run ` is not cut down to `Run ...`.
const LIFECYCLE_PREFIXES: [&str; 5] = ["Pre Run ", "Post Run ", "Pre ", "Run ", "Post "];

static TEMPLATE_EXPR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{\{.*?\}\}").expect("template expression regex is valid"));

/// Find the job definition a reported job name belongs to.
///
/// Each rule is tried against every job in declaration order before moving to
/// the next, looser rule. Matrix jobs whose matrix has several keys may match
/// ambiguously; the first candidate wins.
pub fn resolve_job<'a>(jobs: &'a [JobDefinition], reported: &str) -> Option<&'a JobDefinition> {
    let found = jobs
        .iter()
        .find(|job| job.id == reported)
        .or_else(|| {
            jobs.iter()
                .find(|job| job.declared_name.as_deref() == Some(reported))
        })
        // Unnamed matrix jobs are reported as `id (value, ...)`.
        .or_else(|| {
            jobs.iter()
                .find(|job| job.is_matrix && reported.starts_with(job.id.as_str()))
        })
        .or_else(|| {
            jobs.iter().find(|job| {
                job.is_matrix
                    && job
                        .declared_name
                        .as_deref()
                        .is_some_and(|name| matches_template(name, reported))
            })
        });

    if found.is_none() {
        tracing::debug!(job = reported, "No job definition matches reported name");
    }
    found
}

/// Find the step definition a reported step name belongs to.
pub fn resolve_step<'a>(
    steps: &'a [StepDefinition],
    reported: &str,
) -> Option<&'a StepDefinition> {
    if LIFECYCLE_STEPS.contains(&reported) {
        return None;
    }

    let name = strip_lifecycle_prefix(reported);
    let action = name.split('@').next().unwrap_or(name);

    let found = steps
        .iter()
        .find(|step| step.resolved_name == name)
        .or_else(|| {
            steps.iter().find(|step| {
                step.action_ref
                    .as_ref()
                    .is_some_and(|r| r.action == action)
            })
        });

    if found.is_none() {
        tracing::debug!(step = reported, "No step definition matches reported name");
    }
    found
}

/// Remove at most one lifecycle prefix.
pub fn strip_lifecycle_prefix(reported: &str) -> &str {
    LIFECYCLE_PREFIXES
        .iter()
        .find_map(|prefix| reported.strip_prefix(prefix))
        .unwrap_or(reported)
}

/// Drop every `${{ ... }}` expression and surrounding whitespace.
pub fn strip_template_expressions(name: &str) -> String {
    TEMPLATE_EXPR.replace_all(name, "").trim().to_string()
}

fn matches_template(declared: &str, reported: &str) -> bool {
    let literal = strip_template_expressions(declared);
    // A name made only of expressions would otherwise match anything.
    !literal.is_empty() && reported.contains(&literal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::model::ActionRef;

    fn job(id: &str, name: Option<&str>, is_matrix: bool) -> JobDefinition {
        let mut job = JobDefinition::new(id.to_string(), 1);
        job.declared_name = name.map(String::from);
        job.is_matrix = is_matrix;
        job
    }

    fn step(resolved_name: &str, uses: Option<&str>) -> StepDefinition {
        StepDefinition {
            resolved_name: resolved_name.to_string(),
            action_ref: uses.map(ActionRef::parse),
            is_composite: false,
            source_line: 1,
            raw_node: serde_yaml::Value::Null,
            html_url: None,
        }
    }

    #[test]
    fn test_resolve_job_by_id_and_name() {
        let jobs = vec![job("build", Some("Build app"), false), job("lint", None, false)];
        assert_eq!(resolve_job(&jobs, "lint").unwrap().id, "lint");
        assert_eq!(resolve_job(&jobs, "Build app").unwrap().id, "build");
        assert!(resolve_job(&jobs, "build (linux)").is_none());
    }

    #[test]
    fn test_resolve_unnamed_matrix_job_by_prefix() {
        let jobs = vec![job("lint", None, false), job("test", None, true)];
        assert_eq!(resolve_job(&jobs, "test (node 18)").unwrap().id, "test");
    }

    #[test]
    fn test_resolve_named_matrix_job_by_template() {
        let jobs = vec![job("build", Some("build: node ${{ matrix.node }}"), true)];
        assert_eq!(resolve_job(&jobs, "build: node lts").unwrap().id, "build");
    }

    #[test]
    fn test_exact_match_beats_matrix_prefix_of_earlier_job() {
        let jobs = vec![job("test", None, true), job("test-e2e", None, false)];
        assert_eq!(resolve_job(&jobs, "test-e2e").unwrap().id, "test-e2e");
        assert_eq!(resolve_job(&jobs, "test (1)").unwrap().id, "test");
    }

    #[test]
    fn test_template_only_name_does_not_match_everything() {
        let jobs = vec![job("matrix", Some("${{ matrix.os }}"), true)];
        assert!(resolve_job(&jobs, "ubuntu-latest").is_none());
    }

    #[test]
    fn test_non_matrix_job_never_uses_loose_rules() {
        let jobs = vec![job("test", Some("test ${{ inputs.x }}"), false)];
        assert!(resolve_job(&jobs, "test (node 18)").is_none());
    }

    #[test]
    fn test_strip_template_expressions() {
        assert_eq!(
            strip_template_expressions("test ${{ matrix.os }} / ${{ matrix.node }}"),
            "test  /"
        );
    }

    #[test]
    fn test_resolve_step_with_lifecycle_prefixes() {
        let steps = vec![step("actions/checkout", Some("actions/checkout@v4")), step("Echo", None)];

        for reported in [
            "Run actions/checkout@v4",
            "Post Run actions/checkout@v4",
            "Pre Run actions/checkout@v4",
            "Post actions/checkout@v4",
        ] {
            let found = resolve_step(&steps, reported).unwrap();
            assert_eq!(found.resolved_name, "actions/checkout", "{reported}");
        }

        assert_eq!(resolve_step(&steps, "Echo").unwrap().resolved_name, "Echo");
    }

    #[test]
    fn test_resolve_step_rejects_lifecycle_pseudo_steps() {
        let steps = vec![step("Set up job", None), step("Complete job", None)];
        assert!(resolve_step(&steps, "Set up job").is_none());
        assert!(resolve_step(&steps, "Complete job").is_none());
    }

    #[test]
    fn test_prefix_is_stripped_before_name_match() {
        let steps = vec![step("tests", None), step("Run tests", None)];
        assert_eq!(resolve_step(&steps, "Run tests").unwrap().resolved_name, "tests");
        assert_eq!(resolve_step(&steps, "Post tests").unwrap().resolved_name, "tests");
    }

    #[test]
    fn test_resolve_run_step_by_command() {
        let steps = vec![
            step("actions/checkout", Some("actions/checkout@v4")),
            step("npm test", None),
        ];
        assert_eq!(resolve_step(&steps, "Run npm test").unwrap().resolved_name, "npm test");
    }

    #[test]
    fn test_resolve_step_with_bare_pre_prefix() {
        let steps = vec![
            step("Restore cache", Some("actions/cache@v4")),
            step("Build", None),
        ];
        assert_eq!(
            resolve_step(&steps, "Pre Restore cache").unwrap().resolved_name,
            "Restore cache"
        );
        assert_eq!(
            resolve_step(&steps, "Pre actions/cache@v4").unwrap().resolved_name,
            "Restore cache"
        );
    }

    #[test]
    fn test_resolve_step_prefers_name_over_action() {
        let steps = vec![
            step("actions/cache", Some("actions/cache@v3")),
            step("Restore cache", Some("actions/cache@v4")),
        ];
        let found = resolve_step(&steps, "Post Restore cache").unwrap();
        assert_eq!(found.resolved_name, "Restore cache");
    }

    #[test]
    fn test_resolve_step_miss() {
        let steps = vec![step("Build", None)];
        assert!(resolve_step(&steps, "Run something-else").is_none());
        assert!(resolve_step(&[], "Build").is_none());
    }
}
