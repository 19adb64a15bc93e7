use std::path::{Path, PathBuf};

/// Errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Instance directory could not be listed.
    #[error("cannot open instance source {path}: {source}")]
    InstanceSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A profiled instance is not a regular file.
    #[error("instance not found: {path}")]
    InstanceMissing { path: PathBuf },

    /// Report file could not be created.
    #[error("cannot create report {path}: {source}")]
    ReportDestination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed writing report {path}: {source}")]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("task {index} finished without a result")]
    UnfilledSlot { index: usize },

    #[error("admission gate closed before every task was dispatched")]
    GateClosed(#[from] tokio::sync::AcquireError),
}

impl HarnessError {
    /// Stable identifier for machine-readable error output.
    pub fn code(&self) -> &'static str {
        match self {
            HarnessError::InstanceSource { .. } => "instance_source_unavailable",
            HarnessError::InstanceMissing { .. } => "instance_missing",
            HarnessError::ReportDestination { .. } => "report_destination_unavailable",
            HarnessError::ReportWrite { .. } => "report_write_failed",
            HarnessError::Config { .. } => "config_unreadable",
            HarnessError::ConfigParse { .. } => "config_invalid",
            HarnessError::UnfilledSlot { .. } | HarnessError::GateClosed(_) => "executor_failed",
        }
    }

    /// File or directory the error is about, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            HarnessError::InstanceSource { path, .. }
            | HarnessError::InstanceMissing { path }
            | HarnessError::ReportDestination { path, .. }
            | HarnessError::ReportWrite { path, .. }
            | HarnessError::Config { path, .. }
            | HarnessError::ConfigParse { path, .. } => Some(path),
            HarnessError::UnfilledSlot { .. } | HarnessError::GateClosed(_) => None,
        }
    }
}

/// Per-task failures. These never abort the run; the task is reported as an
/// all-NA row instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskFailure {
    #[error("solver unavailable: {reason}")]
    ExternalProcessUnavailable { reason: String },

    /// Solver produced no result line (fewer than two lines).
    #[error("incomplete solver output: {lines} line(s)")]
    IncompleteOutput { lines: usize },
}

impl TaskFailure {
    pub fn code(&self) -> &'static str {
        match self {
            TaskFailure::ExternalProcessUnavailable { .. } => "external_process_unavailable",
            TaskFailure::IncompleteOutput { .. } => "incomplete_output",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_errors_carry_code_and_path() {
        let err = HarnessError::ReportDestination {
            path: PathBuf::from("/nope/results.dat"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.code(), "report_destination_unavailable");
        assert_eq!(err.path(), Some(Path::new("/nope/results.dat")));

        let err = HarnessError::UnfilledSlot { index: 3 };
        assert_eq!(err.code(), "executor_failed");
        assert_eq!(err.path(), None);
    }
}
