use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Action reference of a step's `uses`, e.g. `actions/checkout@v4`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRef {
    pub action: String,
    pub version: Option<String>,
}

impl ActionRef {
    /// Split on the last `@`. A value without `@` is an action with no version.
    pub fn parse(uses: &str) -> Self {
        match uses.rsplit_once('@') {
            Some((action, version)) => Self {
                action: action.to_string(),
                version: Some(version.to_string()),
            },
            None => Self {
                action: uses.to_string(),
                version: None,
            },
        }
    }
}

/// A step as declared in the workflow file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Declared name, else the run command, else the action, else empty.
    pub resolved_name: String,
    pub action_ref: Option<ActionRef>,
    pub is_composite: bool,
    pub source_line: usize,
    /// The declaration exactly as parsed, for rendering fix suggestions.
    pub raw_node: serde_yaml::Value,
    pub html_url: Option<String>,
}

impl StepDefinition {
    pub fn html_url_with_line(&self) -> Option<String> {
        self.html_url
            .as_deref()
            .map(|url| line_url(url, self.source_line))
    }

    pub fn uses(&self) -> Option<&str> {
        self.raw_node.get("uses").and_then(|v| v.as_str())
    }
}

/// A job as declared in the workflow file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDefinition {
    /// The mapping key under `jobs`.
    pub id: String,
    /// May still contain `${{ ... }}` expressions.
    pub declared_name: Option<String>,
    pub is_matrix: bool,
    pub is_reusable: bool,
    pub uses: Option<String>,
    pub source_line: usize,
    pub steps: Vec<StepDefinition>,
    pub html_url: Option<String>,
}

impl JobDefinition {
    pub fn new(id: String, source_line: usize) -> Self {
        Self {
            id,
            declared_name: None,
            is_matrix: false,
            is_reusable: false,
            uses: None,
            source_line,
            steps: Vec::new(),
            html_url: None,
        }
    }

    pub fn html_url_with_line(&self) -> Option<String> {
        self.html_url
            .as_deref()
            .map(|url| line_url(url, self.source_line))
    }
}

/// A parsed workflow file. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Declared `name`, else the fallback display name (usually the file path).
    pub name: String,
    pub jobs: Vec<JobDefinition>,
    pub html_url: Option<String>,
}

impl WorkflowDefinition {
    /// Attach the hosted source URL to the workflow and every job and step.
    pub fn with_html_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        for job in &mut self.jobs {
            job.html_url = Some(url.clone());
            for step in &mut job.steps {
                step.html_url = Some(url.clone());
            }
        }
        self.html_url = Some(url);
        self
    }

    pub fn job(&self, id: &str) -> Option<&JobDefinition> {
        self.jobs.iter().find(|job| job.id == id)
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn step_count(&self) -> usize {
        self.jobs.iter().map(|job| job.steps.len()).sum()
    }
}

/// Index definitions by workflow name. Later definitions with the same name win.
pub fn definitions_by_name<'a, I>(definitions: I) -> HashMap<&'a str, &'a WorkflowDefinition>
where
    I: IntoIterator<Item = &'a WorkflowDefinition>,
{
    definitions
        .into_iter()
        .map(|def| (def.name.as_str(), def))
        .collect()
}

fn line_url(url: &str, line: usize) -> String {
    format!("{url}#L{line}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_ref_splits_on_last_at() {
        let r = ActionRef::parse("actions/checkout@v4");
        assert_eq!(r.action, "actions/checkout");
        assert_eq!(r.version.as_deref(), Some("v4"));

        let r = ActionRef::parse("docker://ghcr.io/owner/image@sha256:abc");
        assert_eq!(r.action, "docker://ghcr.io/owner/image");
        assert_eq!(r.version.as_deref(), Some("sha256:abc"));

        let r = ActionRef::parse("./.github/actions/setup");
        assert_eq!(r.action, "./.github/actions/setup");
        assert!(r.version.is_none());
    }

    #[test]
    fn test_definitions_by_name_last_wins() {
        let first = WorkflowDefinition {
            name: "CI".to_string(),
            jobs: vec![JobDefinition::new("old".to_string(), 3)],
            html_url: None,
        };
        let second = WorkflowDefinition {
            name: "CI".to_string(),
            jobs: vec![JobDefinition::new("new".to_string(), 3)],
            html_url: None,
        };
        let map = definitions_by_name([&first, &second]);
        assert_eq!(map.len(), 1);
        assert_eq!(map["CI"].jobs[0].id, "new");
    }

    #[test]
    fn test_html_url_with_line() {
        let def = WorkflowDefinition {
            name: "CI".to_string(),
            jobs: vec![JobDefinition::new("build".to_string(), 7)],
            html_url: None,
        }
        .with_html_url("https://github.com/o/r/blob/main/.github/workflows/ci.yml");

        assert_eq!(
            def.jobs[0].html_url_with_line().as_deref(),
            Some("https://github.com/o/r/blob/main/.github/workflows/ci.yml#L7")
        );
    }
}
