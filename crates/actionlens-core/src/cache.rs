use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::parser::model::WorkflowDefinition;
use crate::parser::workflow::build_workflow_definition;

/// Identity of a fetched file: repository, path and git ref.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentKey {
    pub owner: String,
    pub repo: String,
    pub path: String,
    pub git_ref: String,
}

impl ContentKey {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        path: impl Into<String>,
        git_ref: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            path: path.into(),
            git_ref: git_ref.into(),
        }
    }
}

/// Parsed workflow definitions shared across the runs of one batch.
///
/// Most runs of a workflow execute the same file revision, so each distinct
/// `(owner, repo, path, ref)` is parsed once. Entries live as long as the
/// cache; there is no eviction.
#[derive(Debug, Default)]
pub struct DefinitionCache {
    entries: HashMap<ContentKey, Arc<WorkflowDefinition>>,
}

impl DefinitionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ContentKey) -> Option<Arc<WorkflowDefinition>> {
        self.entries.get(key).cloned()
    }

    /// Return the cached definition for `key`, parsing `text` on first use.
    ///
    /// The key's path is the fallback display name. Parse failures are
    /// returned and not cached.
    pub fn get_or_build(
        &mut self,
        key: &ContentKey,
        text: &str,
        html_url: Option<&str>,
    ) -> Result<Arc<WorkflowDefinition>> {
        if let Some(definition) = self.entries.get(key) {
            tracing::debug!(path = %key.path, git_ref = %key.git_ref, "Workflow definition cache hit");
            return Ok(Arc::clone(definition));
        }

        let mut definition = build_workflow_definition(text, &key.path)?;
        if let Some(url) = html_url {
            definition = definition.with_html_url(url);
        }

        let definition = Arc::new(definition);
        self.entries.insert(key.clone(), Arc::clone(&definition));
        Ok(definition)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORKFLOW: &str = "name: CI\njobs:\n  build:\n    runs-on: ubuntu-latest\n    steps:\n      - run: make\n";

    #[test]
    fn test_same_key_is_parsed_once() {
        let mut cache = DefinitionCache::new();
        let key = ContentKey::new("octo", "repo", ".github/workflows/ci.yml", "abc123");

        let first = cache.get_or_build(&key, WORKFLOW, None).unwrap();
        // Different text under the same key is ignored: the key identifies the content.
        let second = cache.get_or_build(&key, "not: [valid", None).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_refs_are_separate_entries() {
        let mut cache = DefinitionCache::new();
        let a = ContentKey::new("octo", "repo", ".github/workflows/ci.yml", "abc");
        let b = ContentKey::new("octo", "repo", ".github/workflows/ci.yml", "def");

        cache.get_or_build(&a, WORKFLOW, None).unwrap();
        cache
            .get_or_build(&b, WORKFLOW, Some("https://github.com/octo/repo/blob/def/ci.yml"))
            .unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&a).unwrap().html_url.is_none());
        assert_eq!(
            cache.get(&b).unwrap().jobs[0].html_url_with_line().as_deref(),
            Some("https://github.com/octo/repo/blob/def/ci.yml#L3")
        );
    }

    #[test]
    fn test_parse_failure_is_not_cached() {
        let mut cache = DefinitionCache::new();
        let key = ContentKey::new("octo", "repo", "broken.yml", "abc");

        assert!(cache.get_or_build(&key, "jobs: [", None).is_err());
        assert!(cache.is_empty());

        let definition = cache.get_or_build(&key, WORKFLOW, None).unwrap();
        assert_eq!(definition.name, "CI");
    }
}
