use thiserror::Error;

/// Failures that abort an audit run.
///
/// Config problems never appear here: an absent or unparsable repository
/// config is recovered upstream and the scan proceeds with defaults. A scan
/// against a misconfigured manifest location is likewise not an error but a
/// [`ScanOutcome::Failed`](crate::scanner::ScanOutcome) surfaced to the user
/// as a report.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Scanner(#[from] ScannerError),
    #[error("failed to post report comment: {0}")]
    Comment(anyhow::Error),
}

/// Clone, pull, or checkout went wrong. Fatal to the run; no report is
/// posted.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid repository name {0:?}")]
    InvalidName(String),
    #[error("invalid branch name {0:?}")]
    InvalidBranch(String),
    #[error("git {operation} failed: {stderr}")]
    Git {
        operation: &'static str,
        stderr: String,
    },
    #[error("git {operation} timed out after {seconds}s")]
    Timeout {
        operation: &'static str,
        seconds: u64,
    },
    #[error("i/o failure during repository sync: {0}")]
    Io(#[from] std::io::Error),
}

/// The audit command could not be executed, or produced output that is not
/// audit JSON. A non-zero exit with vulnerabilities on stdout is not an
/// error (see the adapter's decision rule); unparsable captured output is,
/// and stays distinct from the missing-manifest case.
#[derive(Debug, Error)]
pub enum ScannerError {
    #[error("failed to run scanner {program:?}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("scan timed out after {seconds}s")]
    Timeout { seconds: u64 },
    #[error("scanner output is not valid audit JSON: {0}")]
    Parse(#[source] serde_json::Error),
}
