use thiserror::Error;

/// Failures surfaced by the core.
///
/// Parse failures are fatal for a single workflow file only; callers scanning
/// a batch can check [`ScanError::is_parse_failure`] and move on. A length
/// mismatch between input sequences is a caller bug and is never recovered.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to parse workflow YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to index workflow YAML: {0}")]
    Scan(#[from] yaml_rust2::ScanError),

    #[error("No 'jobs' mapping found in workflow")]
    MissingJobs,

    #[error("Structural index disagrees with parsed workflow: {0}")]
    IndexMismatch(String),

    #[error("{what}: expected {expected} entries, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl ScanError {
    /// True for errors caused by the workflow source itself.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            ScanError::Yaml(_)
                | ScanError::Scan(_)
                | ScanError::MissingJobs
                | ScanError::IndexMismatch(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
